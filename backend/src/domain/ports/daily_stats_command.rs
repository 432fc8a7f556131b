//! Driving port for the daily statistics trigger.

use async_trait::async_trait;

use crate::domain::{CleaningLog, DailyStatsKey, Error};

/// Result of folding one log into the daily counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyStatsOutcome {
    /// The log was added to the day's counters.
    Counted(DailyStatsKey),
    /// The day already included the log.
    AlreadyCounted(DailyStatsKey),
}

/// Driving port invoked once per created cleaning log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DailyStatsCommand: Send + Sync {
    async fn record_log(&self, log: CleaningLog) -> Result<DailyStatsOutcome, Error>;
}

/// Fixture command that reports every log as counted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDailyStatsCommand;

#[async_trait]
impl DailyStatsCommand for FixtureDailyStatsCommand {
    async fn record_log(&self, log: CleaningLog) -> Result<DailyStatsOutcome, Error> {
        Ok(DailyStatsOutcome::Counted(DailyStatsKey::for_log(
            &log.building_id,
            log.created_at,
        )))
    }
}
