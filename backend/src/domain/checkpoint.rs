//! Checkpoint aggregate: a cleanable zone with denormalised freshness.
//!
//! `last_cleaned_at` is the single source of truth. The comparable
//! millisecond timestamp used by range queries and the ISO-8601 rendering
//! stored alongside it are both derived from it, so they cannot diverge.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BuildingId, CheckpointId};

/// Freshness status shown on the facility map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointStatus {
    /// Cleaned within its SLA gap.
    Clean,
    /// Flagged by the watchdog as past its SLA gap.
    Overdue,
    /// No verified cleaning recorded yet.
    Unknown,
}

impl CheckpointStatus {
    /// Stored document value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "CLEAN",
            Self::Overdue => "OVERDUE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Inverse of [`Self::as_str`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "CLEAN" => Some(Self::Clean),
            "OVERDUE" => Some(Self::Overdue),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Result of applying a verified cleaning to a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningTransition {
    /// The cleaning moved (or re-confirmed) the freshness timestamp. Carries
    /// the value held before the write; `None` marks the first cleaning.
    Advanced {
        /// Freshness timestamp before this cleaning.
        previous: Option<DateTime<Utc>>,
    },
    /// The cleaning predates the stored timestamp and was not applied.
    Stale {
        /// Freshness timestamp that was kept.
        current: DateTime<Utc>,
    },
}

/// Checkpoint document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Document id.
    pub id: CheckpointId,
    /// Owning building.
    pub building_id: BuildingId,
    /// Human-readable zone name shown on the facility map.
    pub location_label: Option<String>,
    /// Inactive checkpoints are skipped by the watchdog.
    pub is_active: bool,
    /// Freshness status shown on the facility map.
    pub current_status: CheckpointStatus,
    /// Last write by this service.
    pub updated_at: Option<DateTime<Utc>>,
    last_cleaned_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// An active checkpoint that has never been cleaned.
    pub fn new(id: CheckpointId, building_id: BuildingId) -> Self {
        Self {
            id,
            building_id,
            location_label: None,
            is_active: true,
            current_status: CheckpointStatus::Unknown,
            updated_at: None,
            last_cleaned_at: None,
        }
    }

    /// Attach a zone label.
    #[must_use]
    pub fn with_location_label(mut self, label: impl Into<String>) -> Self {
        self.location_label = Some(label.into());
        self
    }

    /// Toggle whether the watchdog considers the checkpoint.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Seed the freshness fields, e.g. when loading from storage.
    #[must_use]
    pub fn with_last_cleaned_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_cleaned_at = Some(at);
        self.current_status = CheckpointStatus::Clean;
        self
    }

    /// Override the freshness status, e.g. when loading from storage.
    #[must_use]
    pub fn with_status(mut self, status: CheckpointStatus) -> Self {
        self.current_status = status;
        self
    }

    /// Time of the most recent applied verified cleaning.
    #[must_use]
    pub fn last_cleaned_at(&self) -> Option<DateTime<Utc>> {
        self.last_cleaned_at
    }

    /// Comparable epoch-millisecond form of [`Self::last_cleaned_at`].
    #[must_use]
    pub fn last_cleaned_timestamp(&self) -> Option<i64> {
        self.last_cleaned_at.map(|at| at.timestamp_millis())
    }

    /// ISO-8601 form of [`Self::last_cleaned_at`], as stored in documents.
    #[must_use]
    pub fn last_cleaned_at_iso(&self) -> Option<String> {
        self.last_cleaned_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Apply a verified cleaning observed at `cleaned_at`.
    ///
    /// The timestamp never moves backwards. Re-applying the stored value is
    /// accepted and leaves the same fields in place apart from `updated_at`.
    pub fn record_cleaning(
        &mut self,
        cleaned_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CleaningTransition {
        match self.last_cleaned_at {
            Some(current) if cleaned_at < current => CleaningTransition::Stale { current },
            previous => {
                self.last_cleaned_at = Some(cleaned_at);
                self.current_status = CheckpointStatus::Clean;
                self.updated_at = Some(now);
                CleaningTransition::Advanced { previous }
            }
        }
    }

    /// Flag the checkpoint as overdue.
    pub fn mark_overdue(&mut self, now: DateTime<Utc>) {
        self.current_status = CheckpointStatus::Overdue;
        self.updated_at = Some(now);
    }

    /// Whether the watchdog should consider this checkpoint overdue.
    #[must_use]
    pub fn is_overdue_at(&self, threshold: DateTime<Utc>, include_never_cleaned: bool) -> bool {
        if !self.is_active {
            return false;
        }
        match self.last_cleaned_timestamp() {
            Some(ts) => ts < threshold.timestamp_millis(),
            None => include_never_cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeDelta;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T12:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[fixture]
    fn checkpoint() -> Checkpoint {
        Checkpoint::new(CheckpointId::new("cp_001"), BuildingId::new("bldg_001"))
    }

    #[rstest]
    fn first_cleaning_reports_no_previous(mut checkpoint: Checkpoint, now: DateTime<Utc>) {
        let transition = checkpoint.record_cleaning(now, now);
        assert_eq!(transition, CleaningTransition::Advanced { previous: None });
        assert_eq!(checkpoint.current_status, CheckpointStatus::Clean);
        assert_eq!(
            checkpoint.last_cleaned_timestamp(),
            Some(now.timestamp_millis())
        );
    }

    #[rstest]
    fn repeat_cleaning_is_idempotent(mut checkpoint: Checkpoint, now: DateTime<Utc>) {
        checkpoint.record_cleaning(now, now);
        let snapshot = checkpoint.clone();
        let transition = checkpoint.record_cleaning(now, now);
        assert_eq!(
            transition,
            CleaningTransition::Advanced {
                previous: Some(now)
            }
        );
        assert_eq!(checkpoint, snapshot);
    }

    #[rstest]
    fn older_cleaning_does_not_regress(mut checkpoint: Checkpoint, now: DateTime<Utc>) {
        checkpoint.record_cleaning(now, now);
        let earlier = now - TimeDelta::hours(1);
        let transition = checkpoint.record_cleaning(earlier, now);
        assert_eq!(transition, CleaningTransition::Stale { current: now });
        assert_eq!(checkpoint.last_cleaned_at(), Some(now));
    }

    #[rstest]
    fn iso_rendering_tracks_timestamp(checkpoint: Checkpoint, now: DateTime<Utc>) {
        let cleaned = checkpoint.with_last_cleaned_at(now);
        assert_eq!(
            cleaned.last_cleaned_at_iso().as_deref(),
            Some("2026-03-02T12:00:00.000Z")
        );
    }

    #[rstest]
    #[case(true, Some(5), false, true)]
    #[case(true, Some(2), false, false)]
    #[case(false, Some(9), false, false)]
    #[case(true, None, false, false)]
    #[case(true, None, true, true)]
    #[case(false, None, true, false)]
    fn overdue_predicate(
        checkpoint: Checkpoint,
        now: DateTime<Utc>,
        #[case] active: bool,
        #[case] hours_ago: Option<i64>,
        #[case] include_never_cleaned: bool,
        #[case] expected: bool,
    ) {
        let mut checkpoint = checkpoint.with_active(active);
        if let Some(hours) = hours_ago {
            checkpoint = checkpoint.with_last_cleaned_at(now - TimeDelta::hours(hours));
        }
        let threshold = now - TimeDelta::hours(4);
        assert_eq!(
            checkpoint.is_overdue_at(threshold, include_never_cleaned),
            expected
        );
    }
}
