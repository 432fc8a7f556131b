//! Periodic manual audit requests driven by cleaner streaks.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    CleanerRepository, StreakStep, StreakUpdate, map_port_error,
};
use crate::domain::{
    AlertDetails, AlertKind, AlertSeverity, CleanerId, CleaningLog, Error, NewAlert,
    StreakAdvance,
};

/// Counts consecutive verified logs per cleaner and asks for a supervisor
/// spot check every `threshold` logs.
#[derive(Clone)]
pub struct CleanerAuditTrigger {
    cleaners: Arc<dyn CleanerRepository>,
    clock: Arc<dyn Clock>,
    threshold: u32,
}

impl CleanerAuditTrigger {
    /// Trigger over `cleaners`. A zero `threshold` is raised to 1.
    pub fn new(cleaners: Arc<dyn CleanerRepository>, clock: Arc<dyn Clock>, threshold: u32) -> Self {
        Self {
            cleaners,
            clock,
            threshold: threshold.max(1),
        }
    }

    fn audit_alert(&self, log: &CleaningLog) -> NewAlert {
        NewAlert {
            checkpoint_id: log.checkpoint_id.clone(),
            building_id: log.building_id.clone(),
            kind: AlertKind::SupervisorAuditRequest,
            severity: AlertSeverity::Medium,
            message: Some(format!(
                "Cleaner streak reached {}. Manual spot check requested for {}.",
                self.threshold, log.checkpoint_id
            )),
            details: AlertDetails::AuditRequest {
                cleaner_id: log.cleaner_id.clone(),
                streak: self.threshold,
            },
            related_log_id: Some(log.id.clone()),
            created_at: self.clock.utc(),
        }
    }

    /// Count a verified log. Reaching the threshold inserts the audit alert
    /// and resets the streak in the same store transaction.
    pub async fn record_verified_log(&self, log: &CleaningLog) -> Result<StreakStep, Error> {
        let outcome = self
            .cleaners
            .advance_streak(StreakUpdate {
                cleaner_id: log.cleaner_id.clone(),
                log_id: log.id.clone(),
                threshold: self.threshold,
                audit_alert: self.audit_alert(log),
            })
            .await
            .map_err(map_port_error)?;

        Ok(match outcome.advance {
            StreakAdvance::AuditTriggered { reached } => {
                info!(
                    cleaner_id = %log.cleaner_id,
                    checkpoint_id = %log.checkpoint_id,
                    reached,
                    "supervisor audit requested"
                );
                StreakStep::AuditRequested {
                    alert_id: outcome.audit_alert_id,
                }
            }
            StreakAdvance::AlreadyCounted => {
                debug!(log_id = %log.id, "log already counted towards streak");
                StreakStep::Advanced(StreakAdvance::AlreadyCounted)
            }
            advance @ StreakAdvance::Incremented(_) => StreakStep::Advanced(advance),
        })
    }

    /// Reset the streak after a rejected log.
    pub async fn reset_streak(&self, cleaner_id: &CleanerId) -> Result<(), Error> {
        self.cleaners
            .reset_streak(cleaner_id)
            .await
            .map_err(map_port_error)?;
        info!(cleaner_id = %cleaner_id, "verified streak reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::AlertId;
    use crate::domain::ports::{MockCleanerRepository, StreakOutcome};
    use crate::test_support::{LogBuilder, MutableClock, at};

    fn trigger(repo: MockCleanerRepository) -> CleanerAuditTrigger {
        CleanerAuditTrigger::new(
            Arc::new(repo),
            Arc::new(MutableClock::new(at("2026-03-02T12:00:00Z"))),
            10,
        )
    }

    #[tokio::test]
    async fn audit_alert_names_the_checkpoint() {
        let log = LogBuilder::verified("log_10", "cp_lobby", at("2026-03-02T11:00:00Z")).build();
        let mut repo = MockCleanerRepository::new();
        repo.expect_advance_streak()
            .withf(|update| {
                update.threshold == 10
                    && update.log_id.as_str() == "log_10"
                    && update.audit_alert.kind == AlertKind::SupervisorAuditRequest
                    && update.audit_alert.severity == AlertSeverity::Medium
                    && update.audit_alert.message.as_deref()
                        == Some("Cleaner streak reached 10. Manual spot check requested for cp_lobby.")
            })
            .times(1)
            .return_once(|_| {
                Ok(StreakOutcome {
                    advance: StreakAdvance::AuditTriggered { reached: 10 },
                    audit_alert_id: Some(AlertId::new("audit_1")),
                })
            });

        let step = trigger(repo)
            .record_verified_log(&log)
            .await
            .expect("streak recorded");

        assert_eq!(
            step,
            StreakStep::AuditRequested {
                alert_id: Some(AlertId::new("audit_1"))
            }
        );
    }

    #[tokio::test]
    async fn reset_delegates_to_store() {
        let mut repo = MockCleanerRepository::new();
        repo.expect_reset_streak()
            .withf(|id| id.as_str() == "cleaner_001")
            .times(1)
            .return_once(|_| Ok(()));

        trigger(repo)
            .reset_streak(&CleanerId::new("cleaner_001"))
            .await
            .expect("reset succeeds");
    }
}
