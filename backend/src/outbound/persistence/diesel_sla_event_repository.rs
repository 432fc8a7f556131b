//! PostgreSQL-backed `SlaEventRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SlaEventRepository, SlaEventRepositoryError};
use crate::domain::{SlaEvent, SlaEventId};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewSlaEventRow, new_document_id};
use super::pool::{DbPool, PoolError};
use super::schema::sla_events;

/// Diesel-backed, append-only SLA event store.
#[derive(Clone)]
pub struct DieselSlaEventRepository {
    pool: DbPool,
}

impl DieselSlaEventRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SlaEventRepositoryError {
    map_basic_pool_error(error, SlaEventRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SlaEventRepositoryError {
    map_basic_diesel_error(
        error,
        SlaEventRepositoryError::write,
        SlaEventRepositoryError::connection,
    )
}

#[async_trait]
impl SlaEventRepository for DieselSlaEventRepository {
    async fn append(&self, event: SlaEvent) -> Result<SlaEventId, SlaEventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = new_document_id("sla_event");

        diesel::insert_into(sla_events::table)
            .values(&NewSlaEventRow::new(&id, &event))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(SlaEventId::new(id))
    }
}
