//! PostgreSQL-backed `CleanerRepository` implementation using Diesel ORM.
//!
//! The streak row is created on first use, then locked for the rest of the
//! transaction. The audit alert, when the threshold is reached, is written in
//! the same transaction as the streak reset.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    CleanerRepository, CleanerRepositoryError, StreakOutcome, StreakUpdate,
};
use crate::domain::{AlertId, CleanerId, CleanerStreak, LogId, StreakAdvance};

use super::diesel_alert_repository::insert_alert_row;
use super::diesel_error_mapping::{map_basic_pool_error, map_transactional_diesel_error};
use super::models::{CleanerStreakRow, NewAlertRow, RowDecodeError, new_document_id};
use super::pool::{DbPool, PoolError};
use super::schema::cleaner_streaks;

/// Diesel-backed implementation of the cleaner repository port.
#[derive(Clone)]
pub struct DieselCleanerRepository {
    pool: DbPool,
}

impl DieselCleanerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CleanerRepositoryError {
    map_basic_pool_error(error, CleanerRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CleanerRepositoryError {
    map_transactional_diesel_error(
        error,
        CleanerRepositoryError::query,
        CleanerRepositoryError::connection,
        CleanerRepositoryError::contention,
    )
}

/// Convert a database row into domain streak state.
fn row_to_streak(row: CleanerStreakRow) -> Result<CleanerStreak, RowDecodeError> {
    let CleanerStreakRow {
        cleaner_id,
        verified_streak,
        counted_log_ids,
    } = row;

    let streak = u32::try_from(verified_streak).map_err(|_| {
        RowDecodeError::new(
            "cleaner_streaks",
            &cleaner_id,
            "verified_streak",
            format!("negative streak {verified_streak}"),
        )
    })?;

    Ok(CleanerStreak::restore(
        CleanerId::new(cleaner_id),
        streak,
        counted_log_ids.into_iter().map(LogId::new),
    ))
}

/// Convert domain streak state back into a row.
fn streak_to_row(streak: &CleanerStreak) -> Result<CleanerStreakRow, RowDecodeError> {
    let verified_streak = i32::try_from(streak.verified_streak()).map_err(|_| {
        RowDecodeError::new(
            "cleaner_streaks",
            streak.cleaner_id.as_str(),
            "verified_streak",
            "streak exceeds the column range",
        )
    })?;

    Ok(CleanerStreakRow {
        cleaner_id: streak.cleaner_id.as_str().to_owned(),
        verified_streak,
        counted_log_ids: streak
            .counted_log_ids()
            .map(|id| id.as_str().to_owned())
            .collect(),
    })
}

#[async_trait]
impl CleanerRepository for DieselCleanerRepository {
    async fn advance_streak(
        &self,
        update: StreakUpdate,
    ) -> Result<StreakOutcome, CleanerRepositoryError> {
        let StreakUpdate {
            cleaner_id,
            log_id,
            threshold,
            audit_alert,
        } = update;
        let audit_details = serde_json::to_value(&audit_alert.details).map_err(|err| {
            CleanerRepositoryError::query(format!("serialise audit details: {err}"))
        })?;
        let audit_id = new_document_id("alert");
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(cleaner_streaks::table)
                    .values(&CleanerStreakRow::empty(cleaner_id.as_str()))
                    .on_conflict(cleaner_streaks::cleaner_id)
                    .do_nothing()
                    .execute(conn)
                    .await?;

                let row = cleaner_streaks::table
                    .find(cleaner_id.as_str())
                    .select(CleanerStreakRow::as_select())
                    .for_update()
                    .first::<CleanerStreakRow>(conn)
                    .await?;
                let mut streak = row_to_streak(row).map_err(RowDecodeError::into_diesel)?;

                let advance = streak.advance(&log_id, threshold);
                if advance == StreakAdvance::AlreadyCounted {
                    return Ok(StreakOutcome {
                        advance,
                        audit_alert_id: None,
                    });
                }

                let next = streak_to_row(&streak).map_err(RowDecodeError::into_diesel)?;
                diesel::update(cleaner_streaks::table.find(cleaner_id.as_str()))
                    .set((
                        cleaner_streaks::verified_streak.eq(next.verified_streak),
                        cleaner_streaks::counted_log_ids.eq(&next.counted_log_ids),
                    ))
                    .execute(conn)
                    .await?;

                let audit_alert_id = match advance {
                    StreakAdvance::AuditTriggered { .. } => {
                        let row = NewAlertRow::open(&audit_id, &audit_alert, &audit_details);
                        let written = insert_alert_row(conn, &row).await?;
                        if written.is_none() {
                            debug!(cleaner_id = %cleaner_id, "audit alert already recorded");
                        }
                        written.map(AlertId::new)
                    }
                    StreakAdvance::Incremented(_) | StreakAdvance::AlreadyCounted => None,
                };

                Ok(StreakOutcome {
                    advance,
                    audit_alert_id,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn reset_streak(&self, cleaner_id: &CleanerId) -> Result<(), CleanerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(cleaner_streaks::table)
            .values(&CleanerStreakRow::empty(cleaner_id.as_str()))
            .on_conflict(cleaner_streaks::cleaner_id)
            .do_update()
            .set(cleaner_streaks::verified_streak.eq(0))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
