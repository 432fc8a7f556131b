//! Per-log orchestration of alerts, freshness, SLA recovery, and streaks.
//!
//! Invoked once per created cleaning log, at least once. Every step is safe
//! to repeat: the delivered log is stored only if absent, inspection alerts
//! are keyed on (log, kind), the freshness write is monotonic, resolving
//! resolved alerts is a no-op, and the streak counts a log id at most once.
//!
//! Failures propagate so the delivery layer redelivers the log, except in
//! the streak step. That step runs last and its errors are logged and
//! reported without undoing the writes that already committed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::alert_service::AlertService;
use crate::domain::cleaner_audit::CleanerAuditTrigger;
use crate::domain::facility_state::FacilityStateUpdater;
use crate::domain::ports::{
    BreachCheck, BuildingRepository, CheckpointCleaning, CleaningLogRepository, CheckpointUpdate, LogCreatedCommand,
    LogCreatedOutcome, StreakStep, VerificationBranch, VerifiedOutcome, map_port_error,
};
use crate::domain::sla_event_recorder::SlaEventRecorder;
use crate::domain::{
    BreachRecovery, Building, BuildingId, CleaningLog, CleaningTransition, Error,
    VerificationStatus, sla,
};

/// Collaborators of the [`LogCreatedReactor`].
#[derive(Clone)]
pub struct LogCreatedServices {
    /// Store of delivered logs, read back by the feedback reactor.
    pub logs: Arc<dyn CleaningLogRepository>,
    /// Inspection alerts and missing-clean resolution.
    pub alerts: AlertService,
    /// Checkpoint freshness writes.
    pub facility: FacilityStateUpdater,
    /// Breach-recovery audit trail.
    pub sla_events: SlaEventRecorder,
    /// Cleaner streak and supervisor audit requests.
    pub audits: CleanerAuditTrigger,
    /// SLA configuration lookup for the breach check.
    pub buildings: Arc<dyn BuildingRepository>,
}

/// Handles the log-created trigger.
#[derive(Clone)]
pub struct LogCreatedReactor {
    services: LogCreatedServices,
}

impl LogCreatedReactor {
    /// Build the reactor over its collaborators.
    pub fn new(services: LogCreatedServices) -> Self {
        Self { services }
    }

    async fn process(&self, log: &CleaningLog) -> Result<LogCreatedOutcome, Error> {
        let stored = self.services.logs.save(log).await.map_err(map_port_error)?;
        if stored {
            info!(log_id = %log.id, checkpoint_id = %log.checkpoint_id, "cleaning log stored");
        } else {
            debug!(log_id = %log.id, "cleaning log already stored; redelivery");
        }

        let safety_alert = self.services.alerts.create_safety_alert(log).await?;

        let branch = match log.status() {
            VerificationStatus::Verified => {
                VerificationBranch::Verified(self.process_verified(log).await?)
            }
            VerificationStatus::Rejected => {
                self.services.audits.reset_streak(&log.cleaner_id).await?;
                VerificationBranch::Rejected
            }
            other => {
                debug!(log_id = %log.id, status = other.as_str(), "no state change for status");
                VerificationBranch::NoAction
            }
        };

        Ok(LogCreatedOutcome {
            log_id: log.id.clone(),
            safety_alert,
            branch,
        })
    }

    async fn process_verified(&self, log: &CleaningLog) -> Result<VerifiedOutcome, Error> {
        let cleaning = self
            .services
            .facility
            .update_checkpoint_state(&log.checkpoint_id, log.created_at)
            .await?;

        let resolved_alerts = self
            .services
            .alerts
            .resolve_missing_clean_alerts(&log.checkpoint_id, &log.id)
            .await?;

        let (checkpoint, breach) = match cleaning {
            None => (CheckpointUpdate::Missing, BreachCheck::MissingCheckpoint),
            Some(CheckpointCleaning {
                building_id,
                transition,
            }) => match transition {
                CleaningTransition::Stale { .. } => {
                    (CheckpointUpdate::Stale, BreachCheck::OutOfOrder)
                }
                CleaningTransition::Advanced { previous: None } => (
                    CheckpointUpdate::Advanced {
                        first_cleaning: true,
                    },
                    BreachCheck::FirstCleaning,
                ),
                CleaningTransition::Advanced {
                    previous: Some(previous),
                } => (
                    CheckpointUpdate::Advanced {
                        first_cleaning: false,
                    },
                    self.check_breach_recovery(log, &building_id, previous)
                        .await?,
                ),
            },
        };

        let streak = match self.services.audits.record_verified_log(log).await {
            Ok(step) => step,
            Err(err) => {
                warn!(
                    log_id = %log.id,
                    cleaner_id = %log.cleaner_id,
                    error = %err,
                    "streak update failed; continuing"
                );
                StreakStep::Failed {
                    message: err.to_string(),
                }
            }
        };

        Ok(VerifiedOutcome {
            checkpoint,
            resolved_alerts,
            breach,
            streak,
        })
    }

    /// Building owning the checkpoint, falling back to the one named on the
    /// log when the checkpoint's reference is dangling.
    async fn resolve_building(
        &self,
        checkpoint_building: &BuildingId,
        log: &CleaningLog,
    ) -> Result<Option<Building>, Error> {
        let buildings = &self.services.buildings;
        if let Some(building) = buildings
            .find_by_id(checkpoint_building)
            .await
            .map_err(map_port_error)?
        {
            return Ok(Some(building));
        }
        if &log.building_id == checkpoint_building {
            return Ok(None);
        }
        buildings
            .find_by_id(&log.building_id)
            .await
            .map_err(map_port_error)
    }

    async fn check_breach_recovery(
        &self,
        log: &CleaningLog,
        building_id: &BuildingId,
        previous: DateTime<Utc>,
    ) -> Result<BreachCheck, Error> {
        let Some(building) = self.resolve_building(building_id, log).await? else {
            warn!(
                checkpoint_id = %log.checkpoint_id,
                building_id = %building_id,
                "building not found; skipping breach check"
            );
            return Ok(BreachCheck::MissingBuilding);
        };

        let allowed_ms = sla::max_gap_ms(building.client_sla_config.required_cleanings_per_day);
        let gap_ms = (log.created_at - previous).num_milliseconds();
        if gap_ms <= allowed_ms {
            return Ok(BreachCheck::WithinSla { gap_ms, allowed_ms });
        }

        let event_id = self
            .services
            .sla_events
            .record_breach_recovery(BreachRecovery {
                checkpoint_id: log.checkpoint_id.clone(),
                building_id: building.id,
                cleaner_id: log.cleaner_id.clone(),
                log_id: log.id.clone(),
                previous_cleaning_at: previous,
                recovered_at: log.created_at,
                gap_ms,
                allowed_ms,
            })
            .await?;
        Ok(BreachCheck::Recorded {
            event_id,
            gap_ms,
            allowed_ms,
        })
    }
}

#[async_trait]
impl LogCreatedCommand for LogCreatedReactor {
    async fn handle_log_created(&self, log: CleaningLog) -> Result<LogCreatedOutcome, Error> {
        let result = self.process(&log).await;
        if let Err(err) = &result {
            error!(
                log_id = %log.id,
                checkpoint_id = %log.checkpoint_id,
                code = ?err.code(),
                error = %err,
                "log-created handling failed"
            );
        }
        result
    }
}

#[cfg(test)]
#[path = "log_created_reactor_tests.rs"]
mod tests;
