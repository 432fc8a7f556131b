//! Per-building daily cleaning counters.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{BuildingId, LogId};

/// Document key `{building_id}_{YYYY-MM-DD}` (UTC date).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DailyStatsKey {
    /// Building the counters belong to.
    pub building_id: BuildingId,
    /// UTC calendar day.
    pub date: NaiveDate,
}

impl DailyStatsKey {
    /// Key of the UTC day a log created at `created_at` falls on.
    #[must_use]
    pub fn for_log(building_id: &BuildingId, created_at: DateTime<Utc>) -> Self {
        Self {
            building_id: building_id.clone(),
            date: created_at.date_naive(),
        }
    }
}

impl std::fmt::Display for DailyStatsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.building_id, self.date.format("%Y-%m-%d"))
    }
}

/// Contribution of a single log.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyStatsIncrement {
    /// Target day.
    pub key: DailyStatsKey,
    /// Log being counted; repeats are ignored.
    pub log_id: LogId,
    /// Whether the log counts towards `verified_count`.
    pub verified: bool,
    /// Quality score added to `score_sum`.
    pub score: f64,
    /// Service time of the update.
    pub at: DateTime<Utc>,
}

/// Aggregated counters for one building and day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyStats {
    /// Building and day.
    pub key: DailyStatsKey,
    /// Logs counted.
    pub total_logs: u64,
    /// Verified logs counted.
    pub verified_count: u64,
    /// Sum of quality scores.
    pub score_sum: f64,
    /// Time of the latest increment.
    pub last_updated: Option<DateTime<Utc>>,
    counted: BTreeSet<LogId>,
}

impl DailyStats {
    /// Empty counters for `key`.
    pub fn new(key: DailyStatsKey) -> Self {
        Self {
            key,
            total_logs: 0,
            verified_count: 0,
            score_sum: 0.0,
            last_updated: None,
            counted: BTreeSet::new(),
        }
    }

    /// Fold one log into the counters. Returns `false` when the log was
    /// already counted.
    pub fn apply(&mut self, increment: &DailyStatsIncrement) -> bool {
        if !self.counted.insert(increment.log_id.clone()) {
            return false;
        }
        self.total_logs += 1;
        if increment.verified {
            self.verified_count += 1;
        }
        self.score_sum += increment.score;
        self.last_updated = Some(increment.at);
        true
    }

    /// Mean quality score across all counted logs.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        reason = "daily log counts are far below 2^52"
    )]
    pub fn average_score(&self) -> Option<f64> {
        (self.total_logs > 0).then(|| self.score_sum / self.total_logs as f64)
    }
}
