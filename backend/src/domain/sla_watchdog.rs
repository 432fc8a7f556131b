//! Scheduled sweep for checkpoints that have gone too long without a clean.
//!
//! The sweep uses one global gap for every building. The per-log breach
//! check in the log-created reactor is per building, so the two can
//! disagree about the same checkpoint.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::alert_service::AlertService;
use crate::domain::facility_state::FacilityStateUpdater;
use crate::domain::ports::{
    CheckpointRepository, SlaSweepCommand, SweepReport, SweepSummary, map_port_error,
};
use crate::domain::sla::{HOUR_MS, hours_rounded};
use crate::domain::{
    AlertDetails, AlertKind, AlertSeverity, Checkpoint, CheckpointId, Error, NewAlert,
};

/// Hours without a verified cleaning before a checkpoint is overdue.
pub const DEFAULT_MAX_GAP_HOURS: i64 = 4;

/// Tunables for [`SlaWatchdog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaWatchdogConfig {
    /// Hours without a verified cleaning before a checkpoint is overdue.
    pub max_gap_hours: i64,
    /// Treat active checkpoints with no cleaning on record as overdue.
    pub flag_never_cleaned: bool,
}

impl SlaWatchdogConfig {
    /// Whether `hours` can serve as a gap: positive and representable as a
    /// millisecond duration.
    #[must_use]
    pub fn accepts_gap_hours(hours: i64) -> bool {
        hours > 0 && TimeDelta::try_hours(hours).is_some()
    }

    /// The gap in force at `now` and its overdue threshold. A gap that is
    /// non-positive or reaches past the earliest representable instant
    /// falls back to [`DEFAULT_MAX_GAP_HOURS`].
    fn effective_gap(&self, now: DateTime<Utc>) -> (i64, DateTime<Utc>) {
        let threshold = self
            .max_gap_hours
            .checked_mul(HOUR_MS)
            .filter(|ms| *ms > 0)
            .and_then(TimeDelta::try_milliseconds)
            .and_then(|gap| now.checked_sub_signed(gap));
        match threshold {
            Some(at) => (self.max_gap_hours, at),
            None => {
                warn!(
                    max_gap_hours = self.max_gap_hours,
                    fallback = DEFAULT_MAX_GAP_HOURS,
                    "sla gap out of range; using default"
                );
                (
                    DEFAULT_MAX_GAP_HOURS,
                    now - TimeDelta::milliseconds(DEFAULT_MAX_GAP_HOURS * HOUR_MS),
                )
            }
        }
    }
}

impl Default for SlaWatchdogConfig {
    fn default() -> Self {
        Self {
            max_gap_hours: DEFAULT_MAX_GAP_HOURS,
            flag_never_cleaned: false,
        }
    }
}

/// Raises SLA_MISSING_CLEAN alerts and marks checkpoints OVERDUE.
///
/// Only one sweep runs at a time per watchdog; a request that arrives while
/// another sweep holds the guard returns [`SweepReport::AlreadyRunning`].
#[derive(Clone)]
pub struct SlaWatchdog {
    checkpoints: Arc<dyn CheckpointRepository>,
    alerts: AlertService,
    facility: FacilityStateUpdater,
    clock: Arc<dyn Clock>,
    config: SlaWatchdogConfig,
    guard: Arc<Mutex<()>>,
}

impl SlaWatchdog {
    /// Watchdog over `checkpoints`, raising alerts through `alerts` and
    /// marking checkpoints through `facility`.
    pub fn new(
        checkpoints: Arc<dyn CheckpointRepository>,
        alerts: AlertService,
        facility: FacilityStateUpdater,
        clock: Arc<dyn Clock>,
        config: SlaWatchdogConfig,
    ) -> Self {
        Self {
            checkpoints,
            alerts,
            facility,
            clock,
            config,
            guard: Arc::new(Mutex::new(())),
        }
    }

    async fn find_overdue(&self, threshold: DateTime<Utc>) -> Result<Vec<Checkpoint>, Error> {
        let mut overdue = self
            .checkpoints
            .list_overdue(threshold)
            .await
            .map_err(map_port_error)?;
        if self.config.flag_never_cleaned {
            let never = self
                .checkpoints
                .list_never_cleaned()
                .await
                .map_err(map_port_error)?;
            overdue.extend(never);
        }
        overdue.retain(|checkpoint| checkpoint.is_active);
        Ok(overdue)
    }

    fn stage_alert(checkpoint: &Checkpoint, sla_hours: i64, now: DateTime<Utc>) -> NewAlert {
        let last_cleaned_at = checkpoint.last_cleaned_at();
        let hours_overdue = last_cleaned_at.map(|at| hours_rounded((now - at).num_milliseconds()));
        let message = match hours_overdue {
            Some(hours) => {
                format!("Area has not been cleaned in {hours} hours (SLA: {sla_hours}h).")
            }
            None => format!("Area has never been cleaned (SLA: {sla_hours}h)."),
        };
        NewAlert {
            checkpoint_id: checkpoint.id.clone(),
            building_id: checkpoint.building_id.clone(),
            kind: AlertKind::SlaMissingClean,
            severity: AlertSeverity::Medium,
            message: Some(message),
            details: AlertDetails::MissingClean {
                hours_overdue,
                sla_threshold_hours: sla_hours,
                last_cleaned_at,
            },
            related_log_id: None,
            created_at: now,
        }
    }

    async fn sweep(&self) -> Result<SweepSummary, Error> {
        let now = self.clock.utc();
        let (sla_hours, threshold) = self.config.effective_gap(now);
        let overdue = self.find_overdue(threshold).await?;

        let mut summary = SweepSummary {
            threshold,
            overdue_checkpoints: overdue.len(),
            already_alerted: 0,
            alerts_created: Vec::new(),
            marked_overdue: 0,
        };
        if overdue.is_empty() {
            info!(threshold = %threshold, "no overdue checkpoints");
            return Ok(summary);
        }

        let ids: Vec<CheckpointId> = overdue.iter().map(|cp| cp.id.clone()).collect();
        let alerted = self.alerts.checkpoints_with_open_missing_clean(&ids).await?;
        let staged: Vec<NewAlert> = overdue
            .iter()
            .filter(|cp| !alerted.contains(&cp.id))
            .map(|cp| Self::stage_alert(cp, sla_hours, now))
            .collect();
        summary.already_alerted = overdue.len() - staged.len();

        let inserted = self.alerts.create_missing_clean_alerts(staged).await?;
        if !inserted.skipped.is_empty() {
            warn!(
                skipped = inserted.skipped.len(),
                "open alerts appeared during the sweep; skipped"
            );
            summary.already_alerted += inserted.skipped.len();
        }

        let flagged: Vec<CheckpointId> = inserted
            .created
            .iter()
            .map(|(checkpoint_id, _)| checkpoint_id.clone())
            .collect();
        summary.marked_overdue = self.facility.mark_overdue(&flagged).await?;
        summary.alerts_created = inserted.created;

        info!(
            threshold = %threshold,
            overdue = summary.overdue_checkpoints,
            already_alerted = summary.already_alerted,
            created = summary.alerts_created.len(),
            "sla sweep completed"
        );
        Ok(summary)
    }
}

#[async_trait]
impl SlaSweepCommand for SlaWatchdog {
    async fn run_sweep(&self) -> Result<SweepReport, Error> {
        let Ok(_running) = self.guard.try_lock() else {
            warn!("sla sweep already running; skipped");
            return Ok(SweepReport::AlreadyRunning);
        };
        self.sweep().await.map(SweepReport::Completed)
    }
}

#[cfg(test)]
#[path = "sla_watchdog_tests.rs"]
mod tests;
