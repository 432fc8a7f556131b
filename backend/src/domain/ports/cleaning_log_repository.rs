//! Port for storing delivered cleaning logs, the narrow queries over them,
//! and the feedback override.

use async_trait::async_trait;

use crate::domain::{CheckpointId, CleaningLog, LogId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cleaning log repository adapters.
    pub enum CleaningLogRepositoryError {
        /// Repository connection could not be established.
        [transient]
        Connection { message: String } =>
            "cleaning log repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "cleaning log repository query failed: {message}",
    }
}

/// Access to `cleaning_logs` documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CleaningLogRepository: Send + Sync {
    /// Store a delivered log unless a log with the same id exists. Returns
    /// `false` for a redelivery; the stored copy, including any later
    /// override of its verification result, is left untouched.
    async fn save(&self, log: &CleaningLog) -> Result<bool, CleaningLogRepositoryError>;

    /// Most recent `verified` log for a checkpoint, by `created_at`.
    async fn find_latest_verified(
        &self,
        checkpoint_id: &CheckpointId,
    ) -> Result<Option<CleaningLog>, CleaningLogRepositoryError>;

    /// Set the log's status to `flagged_for_review` with `reason`. Returns
    /// `false` when the log no longer exists.
    async fn flag_for_review(
        &self,
        log_id: &LogId,
        reason: &str,
    ) -> Result<bool, CleaningLogRepositoryError>;
}

/// Fixture implementation holding no logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCleaningLogRepository;

#[async_trait]
impl CleaningLogRepository for FixtureCleaningLogRepository {
    async fn save(&self, _log: &CleaningLog) -> Result<bool, CleaningLogRepositoryError> {
        Ok(true)
    }

    async fn find_latest_verified(
        &self,
        _checkpoint_id: &CheckpointId,
    ) -> Result<Option<CleaningLog>, CleaningLogRepositoryError> {
        Ok(None)
    }

    async fn flag_for_review(
        &self,
        _log_id: &LogId,
        _reason: &str,
    ) -> Result<bool, CleaningLogRepositoryError> {
        Ok(false)
    }
}
