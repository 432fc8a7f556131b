//! In-process timer driving the SLA watchdog.
//!
//! Each tick runs one sweep under a freshly generated [`CorrelationId`] so
//! the sweep's log lines and alerts can be traced together. Ticks missed
//! while a sweep overruns are skipped rather than queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info, warn};

use crate::domain::CorrelationId;
use crate::domain::ports::{SlaSweepCommand, SweepReport};

/// Shortest accepted period between sweeps.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic driver for a [`SlaSweepCommand`].
#[derive(Clone)]
pub struct WatchdogSchedule {
    sweep: Arc<dyn SlaSweepCommand>,
    period: Duration,
}

impl WatchdogSchedule {
    /// Create a schedule firing every `period`, clamped to
    /// [`MIN_SWEEP_INTERVAL`].
    pub fn new(sweep: Arc<dyn SlaSweepCommand>, period: Duration) -> Self {
        Self {
            sweep,
            period: period.max(MIN_SWEEP_INTERVAL),
        }
    }

    /// Interval between sweeps, after clamping.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Run the schedule on the current Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Tick forever. The first sweep runs one period after start.
    pub async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = self.period.as_secs(), "sla watchdog schedule started");
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Run a single sweep. Failures are logged; the next tick retries.
    pub async fn tick(&self) -> Option<SweepReport> {
        let correlation_id = CorrelationId::generate();
        let sweep = Arc::clone(&self.sweep);
        CorrelationId::scope(correlation_id.clone(), async move {
            match sweep.run_sweep().await {
                Ok(SweepReport::Completed(summary)) => {
                    info!(
                        correlation_id = %correlation_id,
                        overdue = summary.overdue_checkpoints,
                        alerts_created = summary.alerts_created.len(),
                        "scheduled sla sweep finished"
                    );
                    Some(SweepReport::Completed(summary))
                }
                Ok(SweepReport::AlreadyRunning) => {
                    warn!(correlation_id = %correlation_id, "previous sla sweep still running");
                    Some(SweepReport::AlreadyRunning)
                }
                Err(err) => {
                    error!(
                        correlation_id = %correlation_id,
                        code = ?err.code(),
                        message = err.message(),
                        "scheduled sla sweep failed"
                    );
                    None
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::Error;
    use crate::domain::ports::{MockSlaSweepCommand, SweepSummary};
    use crate::test_support::at;

    fn empty_summary() -> SweepSummary {
        SweepSummary {
            threshold: at("2026-03-02T10:00:00Z"),
            overdue_checkpoints: 0,
            already_alerted: 0,
            alerts_created: Vec::new(),
            marked_overdue: 0,
        }
    }

    #[tokio::test]
    async fn tick_runs_the_sweep_under_a_correlation_id() {
        let mut sweep = MockSlaSweepCommand::new();
        sweep.expect_run_sweep().times(1).returning(|| {
            assert!(CorrelationId::current().is_some());
            Ok(SweepReport::Completed(empty_summary()))
        });
        let schedule = WatchdogSchedule::new(Arc::new(sweep), Duration::from_secs(900));

        let report = schedule.tick().await;

        assert!(matches!(report, Some(SweepReport::Completed(_))));
    }

    #[tokio::test]
    async fn failed_sweeps_do_not_stop_the_schedule() {
        let mut sweep = MockSlaSweepCommand::new();
        sweep
            .expect_run_sweep()
            .times(1)
            .returning(|| Err(Error::service_unavailable("store unavailable")));
        let schedule = WatchdogSchedule::new(Arc::new(sweep), Duration::from_secs(900));

        assert!(schedule.tick().await.is_none());
    }

    #[test]
    fn zero_periods_are_clamped() {
        let schedule =
            WatchdogSchedule::new(Arc::new(MockSlaSweepCommand::new()), Duration::ZERO);
        assert_eq!(schedule.period(), MIN_SWEEP_INTERVAL);
    }

    #[tokio::test]
    async fn run_fires_repeatedly() {
        let mut sweep = MockSlaSweepCommand::new();
        sweep
            .expect_run_sweep()
            .times(1..)
            .returning(|| Ok(SweepReport::Completed(empty_summary())));
        let schedule = WatchdogSchedule::new(Arc::new(sweep), MIN_SWEEP_INTERVAL);

        let outcome =
            tokio::time::timeout(MIN_SWEEP_INTERVAL * 2 + Duration::from_millis(500), schedule.run())
                .await;

        assert!(outcome.is_err(), "schedule never returns");
    }
}
