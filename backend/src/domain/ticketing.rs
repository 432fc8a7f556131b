//! Ticket requests handed to external incident trackers.
//!
//! Connectors for concrete trackers live outside this crate. The domain
//! builds the request from an alert and fans it out to every configured
//! connector, falling back to a connector in mock mode when none is.
//!
//! [`dispatch_ticket`] is an integration entry point for callers embedding
//! this crate. The HTTP service does not route to it; ticket creation is
//! triggered by whoever owns the tracker connectors.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::TicketingConnector;
use crate::domain::{Alert, AlertDetails, AlertId, AlertKind, AlertSeverity, BuildingId, CheckpointId};

/// Tracker urgency, 1 being the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TicketPriority {
    /// Safety hazards.
    Critical = 1,
    /// Other high-severity alerts.
    High = 2,
    /// Medium-severity alerts.
    Medium = 3,
    /// Informational.
    Low = 4,
}

impl TicketPriority {
    /// Numeric level sent to trackers.
    #[must_use]
    pub const fn level(self) -> u8 {
        self as u8
    }

    /// Priority used when escalating an alert.
    #[must_use]
    pub const fn for_alert(kind: AlertKind, severity: AlertSeverity) -> Self {
        match (kind, severity) {
            (AlertKind::SafetyHazard, AlertSeverity::High) => Self::Critical,
            (_, AlertSeverity::High) => Self::High,
            (_, AlertSeverity::Medium) => Self::Medium,
        }
    }
}

/// Tracker receiving the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalSystem {
    /// ServiceNow incident table.
    ServiceNow,
    /// Jira service desk.
    Jira,
}

impl ExternalSystem {
    /// Connector name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServiceNow => "servicenow",
            Self::Jira => "jira",
        }
    }
}

/// Tracker-neutral ticket creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRequest {
    /// `{kind}: {location}`.
    pub title: String,
    /// Alert message, or a generated summary.
    pub description: String,
    /// Tracker urgency.
    pub priority: TicketPriority,
    /// Category of the source alert.
    pub alert_type: AlertKind,
    /// Source alert.
    pub alert_id: AlertId,
    /// Building owning the checkpoint.
    pub building_id: BuildingId,
    /// Checkpoint the alert concerns.
    pub checkpoint_id: CheckpointId,
    /// Checkpoint location label.
    pub location: Option<String>,
    /// Hazard labels from the inspection.
    pub detected_issues: Option<Vec<String>>,
    /// Inspection score.
    pub score: Option<f64>,
}

impl TicketRequest {
    /// Derive a request from an alert and the checkpoint's location label.
    #[must_use]
    pub fn for_alert(alert: &Alert, location: Option<&str>) -> Self {
        let place = location.unwrap_or(alert.checkpoint_id.as_str());
        let (detected_issues, score) = match &alert.details {
            AlertDetails::Inspection {
                score,
                detected_hazards,
            } => (
                (!detected_hazards.is_empty()).then(|| detected_hazards.clone()),
                Some(*score),
            ),
            AlertDetails::MissingClean { .. } | AlertDetails::AuditRequest { .. } => (None, None),
        };
        let description = alert
            .message
            .clone()
            .unwrap_or_else(|| format!("{} raised for checkpoint {}.", alert.kind, alert.checkpoint_id));
        Self {
            title: format!("{}: {place}", alert.kind),
            description,
            priority: TicketPriority::for_alert(alert.kind, alert.severity),
            alert_type: alert.kind,
            alert_id: alert.id.clone(),
            building_id: alert.building_id.clone(),
            checkpoint_id: alert.checkpoint_id.clone(),
            location: location.map(str::to_owned),
            detected_issues,
            score,
        }
    }
}

/// Tracker answer. Failures are reported in-band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketResponse {
    /// Whether the tracker accepted the ticket.
    pub success: bool,
    /// Tracker-side identifier.
    pub ticket_id: Option<String>,
    /// Link to the ticket.
    pub ticket_url: Option<String>,
    /// Tracker that answered.
    pub external_system: ExternalSystem,
    /// Failure description.
    pub error: Option<String>,
}

impl TicketResponse {
    /// A failed answer from `external_system`.
    #[must_use]
    pub fn failed(external_system: ExternalSystem, error: impl Into<String>) -> Self {
        Self {
            success: false,
            ticket_id: None,
            ticket_url: None,
            external_system,
            error: Some(error.into()),
        }
    }
}

/// Raise `request` in every configured tracker.
///
/// When none is configured the request goes to `fallback`, which is expected
/// to run in mock mode. Connector errors become unsuccessful responses.
pub async fn dispatch_ticket(
    connectors: &[Arc<dyn TicketingConnector>],
    fallback: &dyn TicketingConnector,
    request: &TicketRequest,
) -> Vec<TicketResponse> {
    let mut targets: Vec<&dyn TicketingConnector> = connectors
        .iter()
        .filter(|connector| connector.is_configured())
        .map(|connector| &**connector)
        .collect();
    if targets.is_empty() {
        info!(alert_id = %request.alert_id, "no ticketing system configured; using mock mode");
        targets.push(fallback);
    }

    let mut responses = Vec::with_capacity(targets.len());
    for connector in targets {
        let system = connector.system();
        match connector.create_ticket(request).await {
            Ok(response) => responses.push(response),
            Err(err) => {
                warn!(system = system.as_str(), error = %err, "ticket creation failed");
                responses.push(TicketResponse::failed(system, err.to_string()));
            }
        }
    }
    responses
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::NewAlert;
    use crate::domain::ports::{
        FixtureTicketingConnector, MockTicketingConnector, TicketingConnectorError,
    };
    use chrono::Utc;
    use rstest::rstest;

    fn alert(kind: AlertKind, severity: AlertSeverity, details: AlertDetails) -> Alert {
        Alert::open(
            AlertId::new("alert_1"),
            NewAlert {
                checkpoint_id: CheckpointId::new("cp_001"),
                building_id: BuildingId::new("bldg_001"),
                kind,
                severity,
                message: None,
                details,
                related_log_id: None,
                created_at: Utc::now(),
            },
        )
    }

    #[rstest]
    #[case(AlertKind::SafetyHazard, AlertSeverity::High, 1)]
    #[case(AlertKind::QualityFailure, AlertSeverity::High, 2)]
    #[case(AlertKind::SlaMissingClean, AlertSeverity::Medium, 3)]
    #[case(AlertKind::SupervisorAuditRequest, AlertSeverity::Medium, 3)]
    fn priority_tracks_kind_and_severity(
        #[case] kind: AlertKind,
        #[case] severity: AlertSeverity,
        #[case] level: u8,
    ) {
        assert_eq!(TicketPriority::for_alert(kind, severity).level(), level);
    }

    #[test]
    fn request_carries_inspection_findings() {
        let source = alert(
            AlertKind::SafetyHazard,
            AlertSeverity::High,
            AlertDetails::Inspection {
                score: 82.0,
                detected_hazards: vec!["wet_floor".to_owned()],
            },
        );
        let request = TicketRequest::for_alert(&source, Some("Lobby restroom"));
        assert_eq!(request.title, "SAFETY_HAZARD: Lobby restroom");
        assert_eq!(request.priority, TicketPriority::Critical);
        assert_eq!(request.detected_issues, Some(vec!["wet_floor".to_owned()]));
        assert_eq!(request.score, Some(82.0));
    }

    #[tokio::test]
    async fn falls_back_to_mock_mode_when_nothing_is_configured() {
        let mut unconfigured = MockTicketingConnector::new();
        unconfigured.expect_is_configured().return_const(false);
        unconfigured.expect_create_ticket().never();
        let connectors: Vec<Arc<dyn TicketingConnector>> = vec![Arc::new(unconfigured)];
        let fallback = FixtureTicketingConnector::new(ExternalSystem::ServiceNow);
        let request = TicketRequest::for_alert(
            &alert(
                AlertKind::QualityFailure,
                AlertSeverity::High,
                AlertDetails::Inspection {
                    score: 40.0,
                    detected_hazards: Vec::new(),
                },
            ),
            None,
        );

        let responses = dispatch_ticket(&connectors, &fallback, &request).await;

        assert_eq!(responses.len(), 1);
        assert!(responses[0].success);
        assert_eq!(responses[0].external_system, ExternalSystem::ServiceNow);
    }

    #[tokio::test]
    async fn connector_errors_are_reported_in_band() {
        let mut jira = MockTicketingConnector::new();
        jira.expect_is_configured().return_const(true);
        jira.expect_system().return_const(ExternalSystem::Jira);
        jira.expect_create_ticket()
            .times(1)
            .return_once(|_| Err(TicketingConnectorError::rejected("HTTP 400")));
        let connectors: Vec<Arc<dyn TicketingConnector>> = vec![Arc::new(jira)];
        let fallback = FixtureTicketingConnector::new(ExternalSystem::ServiceNow);
        let request = TicketRequest::for_alert(
            &alert(
                AlertKind::SlaMissingClean,
                AlertSeverity::Medium,
                AlertDetails::MissingClean {
                    hours_overdue: Some(5.0),
                    sla_threshold_hours: 4,
                    last_cleaned_at: None,
                },
            ),
            None,
        );

        let responses = dispatch_ticket(&connectors, &fallback, &request).await;

        assert_eq!(responses.len(), 1);
        assert!(!responses[0].success);
        assert_eq!(responses[0].external_system, ExternalSystem::Jira);
        assert!(responses[0].error.as_deref().is_some_and(|e| e.contains("HTTP 400")));
    }
}
