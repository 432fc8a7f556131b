//! PostgreSQL-backed `BuildingRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BuildingRepository, BuildingRepositoryError};
use crate::domain::{Building, BuildingId, ClientSlaConfig};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::BuildingRow;
use super::pool::{DbPool, PoolError};
use super::schema::buildings;

/// Diesel-backed implementation of the building repository port.
#[derive(Clone)]
pub struct DieselBuildingRepository {
    pool: DbPool,
}

impl DieselBuildingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> BuildingRepositoryError {
    map_basic_pool_error(error, BuildingRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> BuildingRepositoryError {
    map_basic_diesel_error(
        error,
        BuildingRepositoryError::query,
        BuildingRepositoryError::connection,
    )
}

fn row_to_building(row: BuildingRow) -> Building {
    let BuildingRow {
        id,
        name,
        required_cleanings_per_day,
        cleaning_window_start,
        cleaning_window_end,
    } = row;

    let mut building = Building::new(
        BuildingId::new(id),
        ClientSlaConfig {
            required_cleanings_per_day,
            cleaning_window_start,
            cleaning_window_end,
        },
    );
    building.name = name;
    building
}

#[async_trait]
impl BuildingRepository for DieselBuildingRepository {
    async fn find_by_id(
        &self,
        id: &BuildingId,
    ) -> Result<Option<Building>, BuildingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = buildings::table
            .filter(buildings::id.eq(id.as_str()))
            .select(BuildingRow::as_select())
            .first::<BuildingRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_building))
    }
}
