//! Alert documents raised against checkpoints.
//!
//! SLA_MISSING_CLEAN and SUPERVISOR_AUDIT_REQUEST alerts describe a standing
//! condition; at most one should be OPEN per checkpoint. Safety and quality
//! alerts describe a single failing log: one per (log, kind), never
//! deduplicated across logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AlertId, BuildingId, CheckpointId, CleanerId, LogId};

/// Alert category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// The inspection detected a hazard.
    SafetyHazard,
    /// The inspection score fell below the quality threshold.
    QualityFailure,
    /// A checkpoint went longer than its SLA gap without a cleaning.
    SlaMissingClean,
    /// A cleaner's verified streak reached the audit threshold.
    SupervisorAuditRequest,
}

impl AlertKind {
    /// Stored document value, e.g. `SLA_MISSING_CLEAN`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SafetyHazard => "SAFETY_HAZARD",
            Self::QualityFailure => "QUALITY_FAILURE",
            Self::SlaMissingClean => "SLA_MISSING_CLEAN",
            Self::SupervisorAuditRequest => "SUPERVISOR_AUDIT_REQUEST",
        }
    }

    /// Inverse of [`Self::as_str`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SAFETY_HAZARD" => Some(Self::SafetyHazard),
            "QUALITY_FAILURE" => Some(Self::QualityFailure),
            "SLA_MISSING_CLEAN" => Some(Self::SlaMissingClean),
            "SUPERVISOR_AUDIT_REQUEST" => Some(Self::SupervisorAuditRequest),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently an alert needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    /// Safety and quality inspection failures.
    High,
    /// Missed cleanings and audit requests.
    Medium,
}

impl AlertSeverity {
    /// Stored document value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
        }
    }

    /// Inverse of [`Self::as_str`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            _ => None,
        }
    }
}

/// Alert lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    /// Awaiting action.
    Open,
    /// Closed, usually by a verified cleaning.
    Resolved,
}

impl AlertStatus {
    /// Stored document value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Resolved => "RESOLVED",
        }
    }

    /// Inverse of [`Self::as_str`].
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "OPEN" => Some(Self::Open),
            "RESOLVED" => Some(Self::Resolved),
            _ => None,
        }
    }
}

/// Structured payload stored under `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertDetails {
    /// Inspection result that triggered a safety or quality alert.
    Inspection {
        /// Overall inspection score, 0 when none was reported.
        score: f64,
        /// Labels of the hazards the inspection found.
        detected_hazards: Vec<String>,
    },
    /// Overdue cleaning found by the watchdog.
    MissingClean {
        /// Hours since the last cleaning, rounded to two decimals.
        hours_overdue: Option<f64>,
        /// Maximum allowed gap the checkpoint exceeded.
        sla_threshold_hours: i64,
        /// Last recorded cleaning, if any.
        last_cleaned_at: Option<DateTime<Utc>>,
    },
    /// Streak milestone that asks a supervisor for a spot check.
    AuditRequest {
        /// Cleaner whose work should be checked.
        cleaner_id: CleanerId,
        /// Streak value that reached the threshold.
        streak: u32,
    },
}

/// An alert ready to be inserted. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    /// Checkpoint the alert is raised against.
    pub checkpoint_id: CheckpointId,
    /// Building owning the checkpoint.
    pub building_id: BuildingId,
    /// Alert category.
    pub kind: AlertKind,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Human-readable summary.
    pub message: Option<String>,
    /// Structured payload for the category.
    pub details: AlertDetails,
    /// Log that triggered the alert. Inspection alerts are unique per
    /// (log, kind).
    pub related_log_id: Option<LogId>,
    /// Creation time from the service clock.
    pub created_at: DateTime<Utc>,
}

/// Marker written onto alerts closed by a verified cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertResolution {
    /// When the alert was closed.
    pub resolved_at: DateTime<Utc>,
    /// Verified log that closed it.
    pub resolved_by_log_id: LogId,
}

/// Persisted alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Store-assigned identifier.
    pub id: AlertId,
    /// Checkpoint the alert is raised against.
    pub checkpoint_id: CheckpointId,
    /// Building owning the checkpoint.
    pub building_id: BuildingId,
    /// Alert category.
    pub kind: AlertKind,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Lifecycle state.
    pub status: AlertStatus,
    /// Human-readable summary.
    pub message: Option<String>,
    /// Structured payload for the category.
    pub details: AlertDetails,
    /// Log that triggered the alert, if any.
    pub related_log_id: Option<LogId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set once the alert is resolved.
    pub resolution: Option<AlertResolution>,
}

impl Alert {
    /// Materialise a staged alert under the id chosen by the store.
    #[must_use]
    pub fn open(id: AlertId, new: NewAlert) -> Self {
        Self {
            id,
            checkpoint_id: new.checkpoint_id,
            building_id: new.building_id,
            kind: new.kind,
            severity: new.severity,
            status: AlertStatus::Open,
            message: new.message,
            details: new.details,
            related_log_id: new.related_log_id,
            created_at: new.created_at,
            resolution: None,
        }
    }

    /// Whether the alert still awaits resolution.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == AlertStatus::Open
    }

    /// Close the alert. Returns `false` when it was already resolved, in
    /// which case the original resolution is kept.
    pub fn resolve(&mut self, resolution: AlertResolution) -> bool {
        if !self.is_open() {
            return false;
        }
        self.status = AlertStatus::Resolved;
        self.resolution = Some(resolution);
        true
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use serde_json::json;

    fn sample() -> Alert {
        Alert::open(
            AlertId::new("alert_1"),
            NewAlert {
                checkpoint_id: CheckpointId::new("cp_001"),
                building_id: BuildingId::new("bldg_001"),
                kind: AlertKind::SlaMissingClean,
                severity: AlertSeverity::Medium,
                message: None,
                details: AlertDetails::MissingClean {
                    hours_overdue: Some(5.0),
                    sla_threshold_hours: 4,
                    last_cleaned_at: None,
                },
                related_log_id: None,
                created_at: Utc::now(),
            },
        )
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut alert = sample();
        let first = AlertResolution {
            resolved_at: Utc::now(),
            resolved_by_log_id: LogId::new("log_a"),
        };
        assert!(alert.resolve(first.clone()));
        let second = AlertResolution {
            resolved_at: Utc::now(),
            resolved_by_log_id: LogId::new("log_b"),
        };
        assert!(!alert.resolve(second));
        assert_eq!(alert.resolution, Some(first));
        assert_eq!(alert.status, AlertStatus::Resolved);
    }

    #[test]
    fn kinds_serialise_in_document_form() {
        assert_eq!(
            serde_json::to_value(AlertKind::SupervisorAuditRequest).expect("kind"),
            json!("SUPERVISOR_AUDIT_REQUEST")
        );
        assert_eq!(AlertKind::SlaMissingClean.to_string(), "SLA_MISSING_CLEAN");
    }

    #[test]
    fn inspection_details_use_document_field_names() {
        let details = AlertDetails::Inspection {
            score: 69.0,
            detected_hazards: vec!["wet_floor".to_owned()],
        };
        assert_eq!(
            serde_json::to_value(details).expect("details"),
            json!({ "score": 69.0, "detected_hazards": ["wet_floor"] })
        );
    }
}
