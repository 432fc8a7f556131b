//! Append-only SLA audit records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::sla::hours_rounded;
use crate::domain::{BuildingId, CheckpointId, CleanerId, LogId};

/// Event discriminator stored under `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaEventKind {
    /// A verified cleaning closed a gap longer than the allowed one.
    SlaBreachRecovered,
}

impl SlaEventKind {
    /// Stored discriminator, e.g. `SLA_BREACH_RECOVERED`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SlaBreachRecovered => "SLA_BREACH_RECOVERED",
        }
    }
}

/// A breach that was closed by a verified cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaEvent {
    /// Event category.
    #[serde(rename = "type")]
    pub kind: SlaEventKind,
    /// Checkpoint that recovered.
    pub checkpoint_id: CheckpointId,
    /// Building owning the checkpoint.
    pub building_id: BuildingId,
    /// Cleaner whose log ended the breach.
    pub cleaner_id: CleanerId,
    /// Time between the two cleanings.
    pub gap_duration_ms: i64,
    /// `gap_duration_ms` in hours, two decimals.
    pub gap_duration_hours: f64,
    /// SLA gap the building allows.
    pub allowed_duration_ms: i64,
    /// `allowed_duration_ms` in hours, two decimals.
    pub allowed_duration_hours: f64,
    /// Cleaning before the breach.
    pub previous_cleaning_at: DateTime<Utc>,
    /// Cleaning that ended the breach.
    pub recovered_at: DateTime<Utc>,
    /// Log that ended the breach.
    pub recovered_by_log_id: LogId,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Inputs describing one recovered breach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreachRecovery {
    /// Checkpoint that recovered.
    pub checkpoint_id: CheckpointId,
    /// Building owning the checkpoint.
    pub building_id: BuildingId,
    /// Cleaner who submitted the log.
    pub cleaner_id: CleanerId,
    /// Log that ended the breach.
    pub log_id: LogId,
    /// Freshness timestamp before the log.
    pub previous_cleaning_at: DateTime<Utc>,
    /// Cleaning time of the log.
    pub recovered_at: DateTime<Utc>,
    /// Observed gap in milliseconds.
    pub gap_ms: i64,
    /// Allowed gap in milliseconds.
    pub allowed_ms: i64,
}

impl SlaEvent {
    /// Build the audit record, deriving the hour fields.
    #[must_use]
    pub fn breach_recovered(recovery: BreachRecovery, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: SlaEventKind::SlaBreachRecovered,
            checkpoint_id: recovery.checkpoint_id,
            building_id: recovery.building_id,
            cleaner_id: recovery.cleaner_id,
            gap_duration_ms: recovery.gap_ms,
            gap_duration_hours: hours_rounded(recovery.gap_ms),
            allowed_duration_ms: recovery.allowed_ms,
            allowed_duration_hours: hours_rounded(recovery.allowed_ms),
            previous_cleaning_at: recovery.previous_cleaning_at,
            recovered_at: recovery.recovered_at,
            recovered_by_log_id: recovery.log_id,
            created_at,
        }
    }
}
