//! PostgreSQL-backed `AlertRepository` implementation using Diesel ORM.
//!
//! Two partial unique indexes back the port's deduplication rules:
//! `(related_log_id, kind)` for inspection alerts, and one OPEN
//! `SLA_MISSING_CLEAN` alert per checkpoint. Inserts use `ON CONFLICT DO
//! NOTHING`, so a racing writer yields the existing row instead of an error.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{AlertRepository, AlertRepositoryError, DeduplicatedInsert};
use crate::domain::{
    Alert, AlertDetails, AlertId, AlertKind, AlertResolution, AlertSeverity, AlertStatus,
    BuildingId, CheckpointId, LogId, NewAlert,
};

use super::diesel_error_mapping::{map_basic_pool_error, map_transactional_diesel_error};
use super::models::{AlertRow, NewAlertRow, RowDecodeError, new_document_id};
use super::pool::{DbPool, PoolError};
use super::schema::alerts;

/// Diesel-backed implementation of the alert repository port.
#[derive(Clone)]
pub struct DieselAlertRepository {
    pool: DbPool,
}

impl DieselAlertRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AlertRepositoryError {
    map_basic_pool_error(error, AlertRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AlertRepositoryError {
    map_transactional_diesel_error(
        error,
        AlertRepositoryError::query,
        AlertRepositoryError::connection,
        AlertRepositoryError::contention,
    )
}

/// An alert ready to insert: its fresh id and serialised details.
struct PreparedAlert {
    id: String,
    details: serde_json::Value,
    alert: NewAlert,
}

impl PreparedAlert {
    fn new(alert: NewAlert) -> Result<Self, AlertRepositoryError> {
        let details = serde_json::to_value(&alert.details)
            .map_err(|err| AlertRepositoryError::query(format!("serialise details: {err}")))?;
        Ok(Self {
            id: new_document_id("alert"),
            details,
            alert,
        })
    }

    fn row(&self) -> NewAlertRow<'_> {
        NewAlertRow::open(&self.id, &self.alert, &self.details)
    }
}

/// Insert unless a unique index already holds a matching alert. Returns the
/// new id, or `None` when the insert was absorbed by a conflict.
pub(super) async fn insert_alert_row(
    conn: &mut AsyncPgConnection,
    row: &NewAlertRow<'_>,
) -> Result<Option<String>, diesel::result::Error> {
    diesel::insert_into(alerts::table)
        .values(row)
        .on_conflict_do_nothing()
        .returning(alerts::id)
        .get_result::<String>(conn)
        .await
        .optional()
}

fn parse_column<T>(
    id: &str,
    column: &'static str,
    raw: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, RowDecodeError> {
    parse(raw).ok_or_else(|| RowDecodeError::new("alerts", id, column, format!("unknown value {raw}")))
}

/// Convert a database row into a domain alert.
fn row_to_alert(row: AlertRow) -> Result<Alert, RowDecodeError> {
    let AlertRow {
        id,
        checkpoint_id,
        building_id,
        kind,
        severity,
        status,
        message,
        details,
        related_log_id,
        created_at,
        resolved_at,
        resolved_by_log_id,
    } = row;

    let alert_kind = parse_column(&id, "kind", &kind, AlertKind::parse)?;
    let alert_severity = parse_column(&id, "severity", &severity, AlertSeverity::parse)?;
    let alert_status = parse_column(&id, "status", &status, AlertStatus::parse)?;
    let alert_details: AlertDetails = serde_json::from_value(details)
        .map_err(|err| RowDecodeError::new("alerts", &id, "details", err.to_string()))?;
    let resolution = resolved_at
        .zip(resolved_by_log_id)
        .map(|(at, log_id)| AlertResolution {
            resolved_at: at,
            resolved_by_log_id: LogId::new(log_id),
        });

    Ok(Alert {
        id: AlertId::new(id),
        checkpoint_id: CheckpointId::new(checkpoint_id),
        building_id: BuildingId::new(building_id),
        kind: alert_kind,
        severity: alert_severity,
        status: alert_status,
        message,
        details: alert_details,
        related_log_id: related_log_id.map(LogId::new),
        created_at,
        resolution,
    })
}

#[async_trait]
impl AlertRepository for DieselAlertRepository {
    async fn insert(&self, alert: NewAlert) -> Result<AlertId, AlertRepositoryError> {
        let prepared = PreparedAlert::new(alert)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        if let Some(id) = insert_alert_row(&mut conn, &prepared.row())
            .await
            .map_err(map_diesel_error)?
        {
            return Ok(AlertId::new(id));
        }

        // The insert lost to a unique index; hand back the row that won.
        let mut existing = alerts::table
            .filter(alerts::kind.eq(prepared.alert.kind.as_str()))
            .select(alerts::id)
            .into_boxed();
        existing = match prepared.alert.related_log_id.as_ref() {
            Some(log_id) => existing.filter(alerts::related_log_id.eq(log_id.as_str())),
            None => existing.filter(
                alerts::checkpoint_id
                    .eq(prepared.alert.checkpoint_id.as_str())
                    .and(alerts::status.eq(AlertStatus::Open.as_str())),
            ),
        };
        let id = existing
            .first::<String>(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(alert_id = %id, kind = %prepared.alert.kind, "alert already recorded");
        Ok(AlertId::new(id))
    }

    async fn find_open(
        &self,
        checkpoint_ids: &[CheckpointId],
        kind: AlertKind,
    ) -> Result<Vec<Alert>, AlertRepositoryError> {
        if checkpoint_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<&str> = checkpoint_ids.iter().map(CheckpointId::as_str).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<AlertRow> = alerts::table
            .filter(alerts::checkpoint_id.eq_any(ids))
            .filter(alerts::kind.eq(kind.as_str()))
            .filter(alerts::status.eq(AlertStatus::Open.as_str()))
            .order((alerts::created_at.asc(), alerts::id.asc()))
            .select(AlertRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(row_to_alert)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| AlertRepositoryError::query(err.to_string()))
    }

    async fn resolve_batch(
        &self,
        ids: &[AlertId],
        resolution: &AlertResolution,
    ) -> Result<usize, AlertRepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let alert_ids: Vec<&str> = ids.iter().map(AlertId::as_str).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // One statement, so the batch commits or fails as a whole.
        diesel::update(
            alerts::table
                .filter(alerts::id.eq_any(alert_ids))
                .filter(alerts::status.eq(AlertStatus::Open.as_str())),
        )
        .set((
            alerts::status.eq(AlertStatus::Resolved.as_str()),
            alerts::resolved_at.eq(resolution.resolved_at),
            alerts::resolved_by_log_id.eq(resolution.resolved_by_log_id.as_str()),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_deduplicated_batch(
        &self,
        alerts: Vec<NewAlert>,
    ) -> Result<DeduplicatedInsert, AlertRepositoryError> {
        if alerts.is_empty() {
            return Ok(DeduplicatedInsert::default());
        }
        let prepared = alerts
            .into_iter()
            .map(PreparedAlert::new)
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let mut outcome = DeduplicatedInsert::default();
                for candidate in &prepared {
                    let checkpoint_id = &candidate.alert.checkpoint_id;
                    let open = alerts::table
                        .filter(alerts::checkpoint_id.eq(checkpoint_id.as_str()))
                        .filter(alerts::kind.eq(candidate.alert.kind.as_str()))
                        .filter(alerts::status.eq(AlertStatus::Open.as_str()))
                        .select(alerts::id)
                        .first::<String>(conn)
                        .await
                        .optional()?;
                    if open.is_some() {
                        outcome.skipped.push(checkpoint_id.clone());
                        continue;
                    }
                    match insert_alert_row(conn, &candidate.row()).await? {
                        Some(id) => outcome
                            .created
                            .push((checkpoint_id.clone(), AlertId::new(id))),
                        None => outcome.skipped.push(checkpoint_id.clone()),
                    }
                }
                Ok(outcome)
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
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::ports::TransientError;

    #[fixture]
    fn row() -> AlertRow {
        AlertRow {
            id: "alert_1".to_owned(),
            checkpoint_id: "cp-1".to_owned(),
            building_id: "b-1".to_owned(),
            kind: "SLA_MISSING_CLEAN".to_owned(),
            severity: "HIGH".to_owned(),
            status: "OPEN".to_owned(),
            message: Some("Checkpoint cp-1 overdue".to_owned()),
            details: json!({
                "hours_overdue": 5.5,
                "sla_threshold_hours": 4,
                "last_cleaned_at": null
            }),
            related_log_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).single().expect("valid time"),
            resolved_at: None,
            resolved_by_log_id: None,
        }
    }

    #[rstest]
    fn open_row_decodes(row: AlertRow) {
        let alert = row_to_alert(row).expect("row decodes");

        assert!(alert.is_open());
        assert_eq!(alert.kind, AlertKind::SlaMissingClean);
        assert_eq!(alert.severity, AlertSeverity::High);
        assert!(matches!(
            alert.details,
            AlertDetails::MissingClean {
                sla_threshold_hours: 4,
                ..
            }
        ));
        assert!(alert.resolution.is_none());
    }

    #[rstest]
    fn resolved_row_carries_its_resolution(mut row: AlertRow) {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time");
        row.status = "RESOLVED".to_owned();
        row.resolved_at = Some(at);
        row.resolved_by_log_id = Some("log-9".to_owned());

        let alert = row_to_alert(row).expect("row decodes");

        assert_eq!(
            alert.resolution,
            Some(AlertResolution {
                resolved_at: at,
                resolved_by_log_id: LogId::new("log-9"),
            })
        );
    }

    #[rstest]
    #[case("kind", "SLA_LATE")]
    #[case("status", "PENDING")]
    fn unknown_enum_values_are_rejected(
        mut row: AlertRow,
        #[case] column: &str,
        #[case] value: &str,
    ) {
        match column {
            "kind" => row.kind = value.to_owned(),
            _ => row.status = value.to_owned(),
        }

        let err = row_to_alert(row).expect_err("value is unknown");

        assert_eq!(err.column, column);
    }

    #[rstest]
    fn lost_transaction_race_is_retryable() {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let err = map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access".to_owned()),
        ));

        assert!(matches!(err, AlertRepositoryError::Contention { .. }));
        assert!(err.is_transient());
    }
}
