//! Driving port invoked once per newly created cleaning log.
//!
//! Delivery is at least once. Implementations must tolerate the same log
//! arriving more than once; an `Err` asks the delivery layer to retry.

use async_trait::async_trait;

use crate::domain::{
    AlertId, AlertKind, CleaningLog, Error, LogId, SlaEventId, StreakAdvance,
};

/// Safety or quality alert raised from the log's inspection data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyAlertRaised {
    /// Alert that was written, or the one already present on redelivery.
    pub alert_id: AlertId,
    /// Safety or quality.
    pub kind: AlertKind,
}

/// What happened to the checkpoint's freshness fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointUpdate {
    /// Timestamp written; `first_cleaning` when no earlier value existed.
    Advanced {
        /// No earlier cleaning was recorded.
        first_cleaning: bool,
    },
    /// An equal or newer cleaning was already recorded.
    Stale,
    /// The referenced checkpoint does not exist.
    Missing,
}

/// Result of the breach-recovery check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreachCheck {
    /// The gap exceeded the SLA and a recovery event was appended.
    Recorded {
        /// Appended event.
        event_id: SlaEventId,
        /// Observed gap.
        gap_ms: i64,
        /// Allowed gap.
        allowed_ms: i64,
    },
    /// The gap was within the SLA.
    WithinSla {
        /// Observed gap.
        gap_ms: i64,
        /// Allowed gap.
        allowed_ms: i64,
    },
    /// No earlier cleaning to measure from.
    FirstCleaning,
    /// The log predates the stored cleaning, so no gap can be measured.
    OutOfOrder,
    /// The checkpoint does not exist.
    MissingCheckpoint,
    /// The owning building does not exist.
    MissingBuilding,
}

/// Result of the cleaner streak step. Failures are reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreakStep {
    /// The streak moved without reaching the threshold.
    Advanced(StreakAdvance),
    /// The threshold was reached and the streak reset.
    AuditRequested {
        /// Audit alert, unless it was already recorded.
        alert_id: Option<AlertId>,
    },
    /// The streak transaction failed; the rest of the log was processed.
    Failed {
        /// Store error text.
        message: String,
    },
}

/// Steps taken for a `verified` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOutcome {
    /// Freshness update.
    pub checkpoint: CheckpointUpdate,
    /// OPEN missing-clean alerts closed by the log.
    pub resolved_alerts: usize,
    /// Breach-recovery check.
    pub breach: BreachCheck,
    /// Cleaner streak step.
    pub streak: StreakStep,
}

/// Branch taken on the log's verification status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationBranch {
    /// Freshness, alert resolution, breach and streak steps ran.
    Verified(VerifiedOutcome),
    /// The cleaner's streak was reset.
    Rejected,
    /// Any other status; only the safety check ran.
    NoAction,
}

/// Summary of one log-created invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCreatedOutcome {
    /// Processed log.
    pub log_id: LogId,
    /// Inspection alert, if the log warranted one.
    pub safety_alert: Option<SafetyAlertRaised>,
    /// Status-specific steps.
    pub branch: VerificationBranch,
}

/// Driving port for the log-created trigger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogCreatedCommand: Send + Sync {
    /// React to a newly created cleaning log.
    async fn handle_log_created(&self, log: CleaningLog) -> Result<LogCreatedOutcome, Error>;
}

/// Fixture command that performs no work.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLogCreatedCommand;

#[async_trait]
impl LogCreatedCommand for FixtureLogCreatedCommand {
    async fn handle_log_created(&self, log: CleaningLog) -> Result<LogCreatedOutcome, Error> {
        Ok(LogCreatedOutcome {
            log_id: log.id,
            safety_alert: None,
            branch: VerificationBranch::NoAction,
        })
    }
}
