//! Port for the per-building daily counters.

use async_trait::async_trait;

use crate::domain::DailyStatsIncrement;

use super::define_port_error;

define_port_error! {
    /// Errors raised by daily stats repository adapters.
    pub enum DailyStatsRepositoryError {
        /// Repository connection could not be established.
        [transient]
        Connection { message: String } =>
            "daily stats repository connection failed: {message}",
        /// Mutation failed during execution.
        Write { message: String } =>
            "daily stats repository write failed: {message}",
    }
}

/// Access to `stats_daily` documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DailyStatsRepository: Send + Sync {
    /// Merge one log into its day document, creating it when absent.
    /// Returns `false` when the log had already been counted.
    async fn apply(&self, increment: DailyStatsIncrement) -> Result<bool, DailyStatsRepositoryError>;
}

/// Fixture implementation that counts nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDailyStatsRepository;

#[async_trait]
impl DailyStatsRepository for FixtureDailyStatsRepository {
    async fn apply(
        &self,
        _increment: DailyStatsIncrement,
    ) -> Result<bool, DailyStatsRepositoryError> {
        Ok(true)
    }
}
