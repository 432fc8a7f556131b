//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the HTTP interface. It registers:
//!
//! - **Paths**: the event delivery, task, and health endpoints
//! - **Schemas**: request and response payloads plus the domain error
//!   wrappers ([`ErrorSchema`], [`ErrorCodeSchema`]) that provide OpenAPI
//!   definitions without coupling domain types to utoipa
//!
//! The generated specification is served by Swagger UI in debug builds.

use crate::inbound::http::events::{
    CleaningLogDocument, CleaningLogEvent, DailyStatsResponse, FeedbackDocument, FeedbackEvent,
    FeedbackResponse, LogCreatedResponse, VerificationResultBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::tasks::{SweepAlertBody, SweepResponse};
use utoipa::OpenApi;

/// OpenAPI document for the HTTP interface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VeriClean event backend",
        description = "Reactions to cleaning logs and occupant feedback, plus the SLA watchdog."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::events::cleaning_log_created,
        crate::inbound::http::events::cleaning_log_daily_stats,
        crate::inbound::http::events::occupant_feedback,
        crate::inbound::http::tasks::run_sla_watchdog,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        CleaningLogEvent,
        CleaningLogDocument,
        VerificationResultBody,
        FeedbackEvent,
        FeedbackDocument,
        LogCreatedResponse,
        DailyStatsResponse,
        FeedbackResponse,
        SweepResponse,
        SweepAlertBody,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "events", description = "Document-created triggers from the event-delivery layer"),
        (name = "tasks", description = "Scheduled maintenance"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
