//! Driving port for one SLA watchdog sweep.
//!
//! Sweeps are triggered by the in-process scheduler or by an external
//! scheduler through HTTP. Only one sweep runs at a time per process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AlertId, CheckpointId, Error};

/// Counters for a sweep that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    /// Checkpoints last cleaned before this instant were overdue.
    pub threshold: DateTime<Utc>,
    /// Active checkpoints past the threshold.
    pub overdue_checkpoints: usize,
    /// Overdue checkpoints that already had an OPEN alert.
    pub already_alerted: usize,
    /// Missing-clean alerts written by this sweep.
    pub alerts_created: Vec<(CheckpointId, AlertId)>,
    /// Checkpoints whose status was set to OVERDUE.
    pub marked_overdue: usize,
}

/// Result of a sweep request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepReport {
    /// The sweep ran.
    Completed(SweepSummary),
    /// Another sweep was still running; this request did nothing.
    AlreadyRunning,
}

/// Driving port for the watchdog trigger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlaSweepCommand: Send + Sync {
    async fn run_sweep(&self) -> Result<SweepReport, Error>;
}

/// Fixture command that reports an empty sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSlaSweepCommand;

#[async_trait]
impl SlaSweepCommand for FixtureSlaSweepCommand {
    async fn run_sweep(&self) -> Result<SweepReport, Error> {
        Ok(SweepReport::Completed(SweepSummary {
            threshold: Utc::now(),
            overdue_checkpoints: 0,
            already_alerted: 0,
            alerts_created: Vec::new(),
            marked_overdue: 0,
        }))
    }
}
