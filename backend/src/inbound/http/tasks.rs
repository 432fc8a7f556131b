//! Scheduled task HTTP handlers.
//!
//! ```text
//! POST /tasks/sla-watchdog
//! ```
//!
//! Lets an external scheduler drive the watchdog when the in-process
//! schedule is disabled.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::SweepReport;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Alert raised by a sweep.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepAlertBody {
    /// Overdue checkpoint.
    #[schema(example = "cp_001")]
    pub checkpoint_id: String,
    /// Missing-clean alert written for it.
    #[schema(example = "alert_000001")]
    pub alert_id: String,
}

/// Result of one watchdog sweep.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepResponse {
    /// `completed`, or `already_running` when another sweep holds the guard.
    pub status: String,
    /// Cleanings before this instant were overdue.
    #[schema(format = "date-time")]
    pub threshold: Option<String>,
    /// Active checkpoints past the threshold.
    pub overdue_checkpoints: usize,
    /// Overdue checkpoints that already had an OPEN alert.
    pub already_alerted: usize,
    /// Alerts written by this sweep.
    pub alerts_created: Vec<SweepAlertBody>,
    /// Checkpoints set to OVERDUE.
    pub marked_overdue: usize,
}

impl From<SweepReport> for SweepResponse {
    fn from(value: SweepReport) -> Self {
        match value {
            SweepReport::Completed(summary) => Self {
                status: "completed".to_owned(),
                threshold: Some(summary.threshold.to_rfc3339()),
                overdue_checkpoints: summary.overdue_checkpoints,
                already_alerted: summary.already_alerted,
                alerts_created: summary
                    .alerts_created
                    .into_iter()
                    .map(|(checkpoint_id, alert_id)| SweepAlertBody {
                        checkpoint_id: checkpoint_id.to_string(),
                        alert_id: alert_id.to_string(),
                    })
                    .collect(),
                marked_overdue: summary.marked_overdue,
            },
            SweepReport::AlreadyRunning => Self {
                status: "already_running".to_owned(),
                threshold: None,
                overdue_checkpoints: 0,
                already_alerted: 0,
                alerts_created: Vec::new(),
                marked_overdue: 0,
            },
        }
    }
}

/// Run one SLA watchdog sweep.
#[utoipa::path(
    post,
    path = "/tasks/sla-watchdog",
    responses(
        (status = 200, description = "Sweep finished or skipped", body = SweepResponse),
        (status = 500, description = "Sweep failed", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "runSlaWatchdog"
)]
#[post("/tasks/sla-watchdog")]
pub async fn run_sla_watchdog(state: web::Data<HttpState>) -> ApiResult<web::Json<SweepResponse>> {
    let report = state
        .bounded("sla watchdog sweep", state.sla_sweep.run_sweep())
        .await?;
    Ok(web::Json(SweepResponse::from(report)))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    use super::*;
    use crate::domain::ports::{MockSlaSweepCommand, SweepSummary};
    use crate::domain::{AlertId, CheckpointId, Error};
    use crate::inbound::http::state::HttpStatePorts;
    use crate::test_support::at;

    async fn call(command: MockSlaSweepCommand) -> actix_web::dev::ServiceResponse {
        let ports = HttpStatePorts {
            sla_sweep: Arc::new(command),
            ..HttpStatePorts::default()
        };
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(HttpState::new(ports, Duration::from_secs(5))))
                .service(run_sla_watchdog),
        )
        .await;
        let request = actix_test::TestRequest::post()
            .uri("/tasks/sla-watchdog")
            .to_request();
        actix_test::call_service(&app, request).await
    }

    #[actix_web::test]
    async fn completed_sweeps_list_created_alerts() {
        let mut command = MockSlaSweepCommand::new();
        command.expect_run_sweep().times(1).return_once(|| {
            Ok(SweepReport::Completed(SweepSummary {
                threshold: at("2026-03-02T10:00:00Z"),
                overdue_checkpoints: 3,
                already_alerted: 1,
                alerts_created: vec![
                    (CheckpointId::new("cp_001"), AlertId::new("alert_000001")),
                    (CheckpointId::new("cp_002"), AlertId::new("alert_000002")),
                ],
                marked_overdue: 2,
            }))
        });

        let response = call(command).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["threshold"], "2026-03-02T10:00:00+00:00");
        assert_eq!(body["already_alerted"], 1);
        assert_eq!(body["alerts_created"][1]["checkpoint_id"], "cp_002");
        assert_eq!(body["marked_overdue"], 2);
    }

    #[actix_web::test]
    async fn overlapping_sweeps_are_reported() {
        let mut command = MockSlaSweepCommand::new();
        command
            .expect_run_sweep()
            .times(1)
            .return_once(|| Ok(SweepReport::AlreadyRunning));

        let body: Value = actix_test::read_body_json(call(command).await).await;

        assert_eq!(body["status"], "already_running");
        assert_eq!(body["threshold"], Value::Null);
    }

    #[actix_web::test]
    async fn failed_sweeps_answer_unavailable() {
        let mut command = MockSlaSweepCommand::new();
        command
            .expect_run_sweep()
            .times(1)
            .return_once(|| Err(Error::service_unavailable("store unavailable")));

        assert_eq!(call(command).await.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
