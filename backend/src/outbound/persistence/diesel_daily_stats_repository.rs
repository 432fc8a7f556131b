//! PostgreSQL-backed `DailyStatsRepository` implementation using Diesel ORM.
//!
//! `daily_stats_logs` records which logs a day has already absorbed. The
//! marker insert and the counter upsert share one transaction, so a
//! redelivered log leaves the counters untouched.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::DailyStatsIncrement;
use crate::domain::ports::{DailyStatsRepository, DailyStatsRepositoryError};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewDailyStatsLogRow, NewDailyStatsRow};
use super::pool::{DbPool, PoolError};
use super::schema::{daily_stats, daily_stats_logs};

/// Diesel-backed implementation of the daily stats repository port.
#[derive(Clone)]
pub struct DieselDailyStatsRepository {
    pool: DbPool,
}

impl DieselDailyStatsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DailyStatsRepositoryError {
    map_basic_pool_error(error, DailyStatsRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DailyStatsRepositoryError {
    map_basic_diesel_error(
        error,
        DailyStatsRepositoryError::write,
        DailyStatsRepositoryError::connection,
    )
}

fn first_count_row(increment: &DailyStatsIncrement) -> NewDailyStatsRow<'_> {
    NewDailyStatsRow {
        building_id: increment.key.building_id.as_str(),
        stats_date: increment.key.date,
        total_logs: 1,
        verified_count: i64::from(increment.verified),
        score_sum: increment.score,
        last_updated: Some(increment.at),
    }
}

#[async_trait]
impl DailyStatsRepository for DieselDailyStatsRepository {
    async fn apply(&self, increment: DailyStatsIncrement) -> Result<bool, DailyStatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let marker = NewDailyStatsLogRow {
                    building_id: increment.key.building_id.as_str(),
                    stats_date: increment.key.date,
                    log_id: increment.log_id.as_str(),
                };
                let marked = diesel::insert_into(daily_stats_logs::table)
                    .values(&marker)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
                if marked == 0 {
                    return Ok(false);
                }

                diesel::insert_into(daily_stats::table)
                    .values(&first_count_row(&increment))
                    .on_conflict((daily_stats::building_id, daily_stats::stats_date))
                    .do_update()
                    .set((
                        daily_stats::total_logs.eq(daily_stats::total_logs + 1_i64),
                        daily_stats::verified_count
                            .eq(daily_stats::verified_count + excluded(daily_stats::verified_count)),
                        daily_stats::score_sum
                            .eq(daily_stats::score_sum + excluded(daily_stats::score_sum)),
                        daily_stats::last_updated.eq(excluded(daily_stats::last_updated)),
                    ))
                    .execute(conn)
                    .await?;

                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::{BuildingId, DailyStatsKey, LogId};

    #[rstest]
    #[case(true, 1)]
    #[case(false, 0)]
    fn first_row_counts_the_log_once(#[case] verified: bool, #[case] expected: i64) {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).single().expect("valid time");
        let increment = DailyStatsIncrement {
            key: DailyStatsKey::for_log(&BuildingId::new("b-1"), at),
            log_id: LogId::new("log-1"),
            verified,
            score: 88.0,
            at,
        };

        let row = first_count_row(&increment);

        assert_eq!(row.total_logs, 1);
        assert_eq!(row.verified_count, expected);
        assert_eq!(row.stats_date, at.date_naive());
        assert_eq!(row.last_updated, Some(at));
    }
}
