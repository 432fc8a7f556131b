//! Internal Diesel row structs for the entity store.
//!
//! These types never leave the persistence layer. Each repository converts
//! rows into domain values with its own `row_to_*` function; a stored value
//! the domain cannot represent surfaces as [`RowDecodeError`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{Checkpoint, NewAlert, SlaEvent};

use super::schema::{
    alerts, buildings, checkpoints, cleaner_streaks, cleaning_logs, daily_stats,
    daily_stats_logs, sla_events,
};

/// A stored column held a value the domain does not accept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{table} row {id} has invalid {column}: {reason}")]
pub(crate) struct RowDecodeError {
    pub table: &'static str,
    pub id: String,
    pub column: &'static str,
    pub reason: String,
}

impl RowDecodeError {
    pub fn new(
        table: &'static str,
        id: &str,
        column: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            table,
            id: id.to_owned(),
            column,
            reason: reason.into(),
        }
    }

    /// Wrap for returning from inside a Diesel transaction.
    pub fn into_diesel(self) -> diesel::result::Error {
        diesel::result::Error::DeserializationError(Box::new(self))
    }
}

/// Fresh id for a row this service creates, e.g. `alert_3f2a...`.
pub(crate) fn new_document_id(collection: &str) -> String {
    format!("{collection}_{}", Uuid::new_v4().simple())
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = buildings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BuildingRow {
    pub id: String,
    pub name: Option<String>,
    pub required_cleanings_per_day: i64,
    pub cleaning_window_start: Option<NaiveTime>,
    pub cleaning_window_end: Option<NaiveTime>,
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// `last_cleaned_timestamp` is derived from `last_cleaned_at` and only
/// filtered on, so it is not selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = checkpoints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CheckpointRow {
    pub id: String,
    pub building_id: String,
    pub location_label: Option<String>,
    pub is_active: bool,
    pub current_status: String,
    pub last_cleaned_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Freshness columns written after an advancing cleaning.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = checkpoints)]
pub(crate) struct CheckpointFreshnessUpdate<'a> {
    pub current_status: &'a str,
    pub last_cleaned_at: Option<DateTime<Utc>>,
    pub last_cleaned_timestamp: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Checkpoint> for CheckpointFreshnessUpdate<'a> {
    fn from(checkpoint: &'a Checkpoint) -> Self {
        Self {
            current_status: checkpoint.current_status.as_str(),
            last_cleaned_at: checkpoint.last_cleaned_at(),
            last_cleaned_timestamp: checkpoint.last_cleaned_timestamp(),
            updated_at: checkpoint.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaning logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cleaning_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CleaningLogRow {
    pub id: String,
    pub cleaner_id: String,
    pub checkpoint_id: String,
    pub building_id: String,
    pub created_at: DateTime<Utc>,
    pub proof_of_presence: Option<serde_json::Value>,
    pub proof_of_quality: Option<serde_json::Value>,
    pub status: String,
    pub flag_reason: Option<String>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cleaning_logs)]
pub(crate) struct NewCleaningLogRow<'a> {
    pub id: &'a str,
    pub cleaner_id: &'a str,
    pub checkpoint_id: &'a str,
    pub building_id: &'a str,
    pub created_at: DateTime<Utc>,
    pub proof_of_presence: Option<&'a serde_json::Value>,
    pub proof_of_quality: Option<&'a serde_json::Value>,
    pub status: &'a str,
    pub flag_reason: Option<&'a str>,
    pub rejection_reason: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = alerts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AlertRow {
    pub id: String,
    pub checkpoint_id: String,
    pub building_id: String,
    pub kind: String,
    pub severity: String,
    pub status: String,
    pub message: Option<String>,
    pub details: serde_json::Value,
    pub related_log_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by_log_id: Option<String>,
}

/// Insertable OPEN alert.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = alerts)]
pub(crate) struct NewAlertRow<'a> {
    pub id: &'a str,
    pub checkpoint_id: &'a str,
    pub building_id: &'a str,
    pub kind: &'static str,
    pub severity: &'static str,
    pub status: &'static str,
    pub message: Option<&'a str>,
    pub details: &'a serde_json::Value,
    pub related_log_id: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewAlertRow<'a> {
    pub fn open(id: &'a str, alert: &'a NewAlert, details: &'a serde_json::Value) -> Self {
        Self {
            id,
            checkpoint_id: alert.checkpoint_id.as_str(),
            building_id: alert.building_id.as_str(),
            kind: alert.kind.as_str(),
            severity: alert.severity.as_str(),
            status: crate::domain::AlertStatus::Open.as_str(),
            message: alert.message.as_deref(),
            details,
            related_log_id: alert.related_log_id.as_ref().map(|id| id.as_str()),
            created_at: alert.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// SLA events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sla_events)]
pub(crate) struct NewSlaEventRow<'a> {
    pub id: &'a str,
    pub kind: &'static str,
    pub checkpoint_id: &'a str,
    pub building_id: &'a str,
    pub cleaner_id: &'a str,
    pub gap_duration_ms: i64,
    pub gap_duration_hours: f64,
    pub allowed_duration_ms: i64,
    pub allowed_duration_hours: f64,
    pub previous_cleaning_at: DateTime<Utc>,
    pub recovered_at: DateTime<Utc>,
    pub recovered_by_log_id: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewSlaEventRow<'a> {
    pub fn new(id: &'a str, event: &'a SlaEvent) -> Self {
        Self {
            id,
            kind: event.kind.as_str(),
            checkpoint_id: event.checkpoint_id.as_str(),
            building_id: event.building_id.as_str(),
            cleaner_id: event.cleaner_id.as_str(),
            gap_duration_ms: event.gap_duration_ms,
            gap_duration_hours: event.gap_duration_hours,
            allowed_duration_ms: event.allowed_duration_ms,
            allowed_duration_hours: event.allowed_duration_hours,
            previous_cleaning_at: event.previous_cleaning_at,
            recovered_at: event.recovered_at,
            recovered_by_log_id: event.recovered_by_log_id.as_str(),
            created_at: event.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaner streaks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = cleaner_streaks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CleanerStreakRow {
    pub cleaner_id: String,
    pub verified_streak: i32,
    pub counted_log_ids: Vec<String>,
}

impl CleanerStreakRow {
    /// A cleaner with no counted logs.
    pub fn empty(cleaner_id: &str) -> Self {
        Self {
            cleaner_id: cleaner_id.to_owned(),
            verified_streak: 0,
            counted_log_ids: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Daily stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = daily_stats)]
pub(crate) struct NewDailyStatsRow<'a> {
    pub building_id: &'a str,
    pub stats_date: NaiveDate,
    pub total_logs: i64,
    pub verified_count: i64,
    pub score_sum: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = daily_stats_logs)]
pub(crate) struct NewDailyStatsLogRow<'a> {
    pub building_id: &'a str,
    pub stats_date: NaiveDate,
    pub log_id: &'a str,
}
