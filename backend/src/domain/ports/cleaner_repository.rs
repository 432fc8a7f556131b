//! Port for the cleaner streak transaction.

use async_trait::async_trait;

use crate::domain::{AlertId, CleanerId, LogId, NewAlert, StreakAdvance};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cleaner repository adapters.
    pub enum CleanerRepositoryError {
        /// Repository connection could not be established.
        [transient]
        Connection { message: String } =>
            "cleaner repository connection failed: {message}",
        /// The streak transaction lost a race and may succeed when retried.
        [transient]
        Contention { message: String } =>
            "cleaner repository transaction aborted: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "cleaner repository query failed: {message}",
    }
}

/// Input for one streak transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StreakUpdate {
    /// Cleaner whose streak advances.
    pub cleaner_id: CleanerId,
    /// Idempotency key; a log is counted at most once.
    pub log_id: LogId,
    /// Streak value that triggers the audit.
    pub threshold: u32,
    /// Alert inserted in the same transaction when the threshold is reached.
    pub audit_alert: NewAlert,
}

/// Outcome of [`CleanerRepository::advance_streak`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakOutcome {
    /// What the log did to the streak.
    pub advance: StreakAdvance,
    /// Set when the audit alert was written.
    pub audit_alert_id: Option<AlertId>,
}

/// Access to the streak fields of `users` documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CleanerRepository: Send + Sync {
    /// Read, increment and maybe reset the streak atomically. A missing user
    /// document starts from zero.
    async fn advance_streak(
        &self,
        update: StreakUpdate,
    ) -> Result<StreakOutcome, CleanerRepositoryError>;

    /// Set the streak to zero with a merge write.
    async fn reset_streak(&self, cleaner_id: &CleanerId) -> Result<(), CleanerRepositoryError>;
}

/// Fixture implementation whose streak never grows.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCleanerRepository;

#[async_trait]
impl CleanerRepository for FixtureCleanerRepository {
    async fn advance_streak(
        &self,
        _update: StreakUpdate,
    ) -> Result<StreakOutcome, CleanerRepositoryError> {
        Ok(StreakOutcome {
            advance: StreakAdvance::Incremented(1),
            audit_alert_id: None,
        })
    }

    async fn reset_streak(&self, _cleaner_id: &CleanerId) -> Result<(), CleanerRepositoryError> {
        Ok(())
    }
}
