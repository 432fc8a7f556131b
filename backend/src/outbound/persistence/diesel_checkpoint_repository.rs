//! PostgreSQL-backed `CheckpointRepository` implementation using Diesel ORM.
//!
//! `record_cleaning` locks the checkpoint row (`SELECT ... FOR UPDATE`) and
//! applies the domain freshness rule inside the same transaction, so two
//! logs for one checkpoint serialise and the later `cleaned_at` always wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{CheckpointCleaning, CheckpointRepository, CheckpointRepositoryError};
use crate::domain::{
    BuildingId, Checkpoint, CheckpointId, CheckpointStatus, CleaningTransition,
};

use super::diesel_error_mapping::{map_basic_pool_error, map_transactional_diesel_error};
use super::models::{CheckpointFreshnessUpdate, CheckpointRow, RowDecodeError};
use super::pool::{DbPool, PoolError};
use super::schema::checkpoints;

/// Diesel-backed implementation of the checkpoint repository port.
#[derive(Clone)]
pub struct DieselCheckpointRepository {
    pool: DbPool,
}

impl DieselCheckpointRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CheckpointRepositoryError {
    map_basic_pool_error(error, CheckpointRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CheckpointRepositoryError {
    map_transactional_diesel_error(
        error,
        CheckpointRepositoryError::query,
        CheckpointRepositoryError::connection,
        CheckpointRepositoryError::contention,
    )
}

/// Convert a database row into a domain checkpoint.
fn row_to_checkpoint(row: CheckpointRow) -> Result<Checkpoint, RowDecodeError> {
    let CheckpointRow {
        id,
        building_id,
        location_label,
        is_active,
        current_status,
        last_cleaned_at,
        updated_at,
    } = row;

    let status = CheckpointStatus::parse(&current_status).ok_or_else(|| {
        RowDecodeError::new(
            "checkpoints",
            &id,
            "current_status",
            format!("unknown value {current_status}"),
        )
    })?;

    let mut checkpoint =
        Checkpoint::new(CheckpointId::new(id), BuildingId::new(building_id)).with_active(is_active);
    if let Some(at) = last_cleaned_at {
        checkpoint = checkpoint.with_last_cleaned_at(at);
    }
    checkpoint.location_label = location_label;
    checkpoint.updated_at = updated_at;
    Ok(checkpoint.with_status(status))
}

fn rows_to_checkpoints(rows: Vec<CheckpointRow>) -> Result<Vec<Checkpoint>, CheckpointRepositoryError> {
    rows.into_iter()
        .map(row_to_checkpoint)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| CheckpointRepositoryError::query(err.to_string()))
}

#[async_trait]
impl CheckpointRepository for DieselCheckpointRepository {
    async fn find_by_id(
        &self,
        id: &CheckpointId,
    ) -> Result<Option<Checkpoint>, CheckpointRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = checkpoints::table
            .filter(checkpoints::id.eq(id.as_str()))
            .select(CheckpointRow::as_select())
            .first::<CheckpointRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_checkpoint)
            .transpose()
            .map_err(|err| CheckpointRepositoryError::query(err.to_string()))
    }

    async fn record_cleaning(
        &self,
        id: &CheckpointId,
        cleaned_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<CheckpointCleaning>, CheckpointRepositoryError> {
        let checkpoint_id = id.as_str().to_owned();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let row = checkpoints::table
                    .filter(checkpoints::id.eq(&checkpoint_id))
                    .select(CheckpointRow::as_select())
                    .for_update()
                    .first::<CheckpointRow>(conn)
                    .await
                    .optional()?;
                let Some(row) = row else {
                    return Ok(None);
                };

                let mut checkpoint = row_to_checkpoint(row).map_err(RowDecodeError::into_diesel)?;
                let transition = checkpoint.record_cleaning(cleaned_at, now);
                if matches!(transition, CleaningTransition::Advanced { .. }) {
                    diesel::update(checkpoints::table.find(&checkpoint_id))
                        .set(CheckpointFreshnessUpdate::from(&checkpoint))
                        .execute(conn)
                        .await?;
                }

                Ok(Some(CheckpointCleaning {
                    building_id: checkpoint.building_id,
                    transition,
                }))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_overdue(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Checkpoint>, CheckpointRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // NULL timestamps never compare, so never-cleaned rows stay out.
        let rows: Vec<CheckpointRow> = checkpoints::table
            .filter(checkpoints::is_active.eq(true))
            .filter(checkpoints::last_cleaned_timestamp.lt(threshold.timestamp_millis()))
            .order(checkpoints::id.asc())
            .select(CheckpointRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_checkpoints(rows)
    }

    async fn list_never_cleaned(&self) -> Result<Vec<Checkpoint>, CheckpointRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CheckpointRow> = checkpoints::table
            .filter(checkpoints::is_active.eq(true))
            .filter(checkpoints::last_cleaned_timestamp.is_null())
            .order(checkpoints::id.asc())
            .select(CheckpointRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_checkpoints(rows)
    }

    async fn mark_overdue(
        &self,
        ids: &[CheckpointId],
        now: DateTime<Utc>,
    ) -> Result<(), CheckpointRepositoryError> {
        if ids.is_empty() {
            return Ok(());
        }
        let checkpoint_ids: Vec<&str> = ids.iter().map(CheckpointId::as_str).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(checkpoints::table.filter(checkpoints::id.eq_any(checkpoint_ids)))
            .set((
                checkpoints::current_status.eq(CheckpointStatus::Overdue.as_str()),
                checkpoints::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).single().expect("valid time")
    }

    #[fixture]
    fn row() -> CheckpointRow {
        CheckpointRow {
            id: "cp-1".to_owned(),
            building_id: "b-1".to_owned(),
            location_label: Some("Lobby restroom".to_owned()),
            is_active: true,
            current_status: "OVERDUE".to_owned(),
            last_cleaned_at: Some(at(6)),
            updated_at: Some(at(11)),
        }
    }

    #[rstest]
    fn stored_status_survives_the_freshness_restore(row: CheckpointRow) {
        let checkpoint = row_to_checkpoint(row).expect("row decodes");

        assert_eq!(checkpoint.current_status, CheckpointStatus::Overdue);
        assert_eq!(checkpoint.last_cleaned_at(), Some(at(6)));
        assert_eq!(checkpoint.updated_at, Some(at(11)));
        assert_eq!(checkpoint.location_label.as_deref(), Some("Lobby restroom"));
    }

    #[rstest]
    fn never_cleaned_row_has_no_timestamp(mut row: CheckpointRow) {
        row.current_status = "UNKNOWN".to_owned();
        row.last_cleaned_at = None;

        let checkpoint = row_to_checkpoint(row).expect("row decodes");

        assert_eq!(checkpoint.last_cleaned_timestamp(), None);
        assert_eq!(checkpoint.current_status, CheckpointStatus::Unknown);
    }

    #[rstest]
    fn restored_row_applies_the_freshness_guard(row: CheckpointRow) {
        let mut checkpoint = row_to_checkpoint(row).expect("row decodes");

        let stale = checkpoint.record_cleaning(at(5), at(12));
        let fresh = checkpoint.record_cleaning(at(9), at(12));

        assert_eq!(stale, CleaningTransition::Stale { current: at(6) });
        assert_eq!(
            fresh,
            CleaningTransition::Advanced {
                previous: Some(at(6))
            }
        );
    }

    #[rstest]
    fn unknown_status_is_a_decode_error(mut row: CheckpointRow) {
        row.current_status = "DIRTY".to_owned();

        let err = row_to_checkpoint(row).expect_err("status is unknown");

        assert_eq!(err.column, "current_status");
    }
}
