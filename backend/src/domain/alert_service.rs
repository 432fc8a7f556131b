//! Alert creation and resolution.
//!
//! Safety and quality alerts are raised once per failing log. They are not
//! deduplicated across logs, but the store keys them on (log, kind), so a
//! redelivered log gets back the alert its first delivery raised.
//! SLA_MISSING_CLEAN alerts are deduplicated per checkpoint by the store's
//! atomic check-and-insert batch.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    AlertRepository, DeduplicatedInsert, SafetyAlertRaised, map_port_error,
};
use crate::domain::{
    AlertDetails, AlertKind, AlertResolution, AlertSeverity, CheckpointId, CleaningLog, Error,
    LogId, NewAlert,
};

/// Scores strictly below this raise a QUALITY_FAILURE alert.
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 70.0;

/// Checkpoint ids per "in" lookup.
pub const DEFAULT_LOOKUP_CHUNK_SIZE: usize = 10;

/// Tunables for [`AlertService`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertServiceConfig {
    /// Scores below this raise a quality alert.
    pub quality_threshold: f64,
    /// Checkpoints per open-alert lookup.
    pub lookup_chunk_size: usize,
}

impl Default for AlertServiceConfig {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            lookup_chunk_size: DEFAULT_LOOKUP_CHUNK_SIZE,
        }
    }
}

/// Creates and resolves alerts.
#[derive(Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertRepository>,
    clock: Arc<dyn Clock>,
    config: AlertServiceConfig,
}

impl AlertService {
    /// Service writing through `alerts`.
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        clock: Arc<dyn Clock>,
        config: AlertServiceConfig,
    ) -> Self {
        Self {
            alerts,
            clock,
            config,
        }
    }

    /// Decide which inspection alert, if any, a log warrants.
    ///
    /// Hazards take precedence over a low score.
    #[must_use]
    pub fn classify_inspection(&self, log: &CleaningLog) -> Option<AlertKind> {
        if !log.hazard_labels().is_empty() {
            Some(AlertKind::SafetyHazard)
        } else if log.quality_score() < self.config.quality_threshold {
            Some(AlertKind::QualityFailure)
        } else {
            None
        }
    }

    /// Raise a SAFETY_HAZARD or QUALITY_FAILURE alert for `log` when its
    /// inspection data calls for one.
    pub async fn create_safety_alert(
        &self,
        log: &CleaningLog,
    ) -> Result<Option<SafetyAlertRaised>, Error> {
        let Some(kind) = self.classify_inspection(log) else {
            debug!(log_id = %log.id, "inspection passed; no alert");
            return Ok(None);
        };
        let score = log.quality_score();
        let hazards = log.hazard_labels();
        let alert = NewAlert {
            checkpoint_id: log.checkpoint_id.clone(),
            building_id: log.building_id.clone(),
            kind,
            severity: AlertSeverity::High,
            message: None,
            details: AlertDetails::Inspection {
                score,
                detected_hazards: hazards,
            },
            related_log_id: Some(log.id.clone()),
            created_at: self.clock.utc(),
        };
        let alert_id = self.alerts.insert(alert).await.map_err(map_port_error)?;
        info!(
            log_id = %log.id,
            alert_id = %alert_id,
            alert_type = kind.as_str(),
            score,
            "inspection alert created"
        );
        Ok(Some(SafetyAlertRaised { alert_id, kind }))
    }

    /// Resolve every OPEN SLA_MISSING_CLEAN alert on a checkpoint in one
    /// batch. Writes nothing when there are none.
    pub async fn resolve_missing_clean_alerts(
        &self,
        checkpoint_id: &CheckpointId,
        resolved_by: &LogId,
    ) -> Result<usize, Error> {
        let open = self
            .alerts
            .find_open(std::slice::from_ref(checkpoint_id), AlertKind::SlaMissingClean)
            .await
            .map_err(map_port_error)?;
        if open.is_empty() {
            return Ok(0);
        }
        let ids: Vec<_> = open.into_iter().map(|alert| alert.id).collect();
        let resolution = AlertResolution {
            resolved_at: self.clock.utc(),
            resolved_by_log_id: resolved_by.clone(),
        };
        let resolved = self
            .alerts
            .resolve_batch(&ids, &resolution)
            .await
            .map_err(map_port_error)?;
        info!(
            checkpoint_id = %checkpoint_id,
            log_id = %resolved_by,
            resolved,
            "missing-clean alerts resolved"
        );
        Ok(resolved)
    }

    /// Checkpoints among `ids` that already hold an OPEN SLA_MISSING_CLEAN
    /// alert, looked up in chunks.
    pub async fn checkpoints_with_open_missing_clean(
        &self,
        ids: &[CheckpointId],
    ) -> Result<HashSet<CheckpointId>, Error> {
        let mut alerted = HashSet::new();
        for chunk in ids.chunks(self.config.lookup_chunk_size.max(1)) {
            let open = self
                .alerts
                .find_open(chunk, AlertKind::SlaMissingClean)
                .await
                .map_err(map_port_error)?;
            alerted.extend(open.into_iter().map(|alert| alert.checkpoint_id));
        }
        Ok(alerted)
    }

    /// Insert staged SLA_MISSING_CLEAN alerts as one deduplicating batch.
    pub async fn create_missing_clean_alerts(
        &self,
        staged: Vec<NewAlert>,
    ) -> Result<DeduplicatedInsert, Error> {
        if staged.is_empty() {
            return Ok(DeduplicatedInsert::default());
        }
        self.alerts
            .insert_deduplicated_batch(staged)
            .await
            .map_err(map_port_error)
    }
}

#[cfg(test)]
#[path = "alert_service_tests.rs"]
mod tests;
