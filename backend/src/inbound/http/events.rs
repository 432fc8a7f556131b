//! Event delivery HTTP handlers.
//!
//! ```text
//! POST /events/cleaning-logs
//! POST /events/cleaning-logs/daily-stats
//! POST /events/occupant-feedback
//! ```
//!
//! Bodies carry the created document exactly as stored (snake_case) next to
//! its document id.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    BreachCheck, CheckpointUpdate, DailyStatsOutcome, FeedbackOutcome, LogCreatedOutcome,
    StreakStep, VerificationBranch,
};
use crate::domain::{
    BuildingId, CheckpointId, CleanerId, CleaningLog, Error, FeedbackId, FeedbackKind, LogId,
    OccupantFeedback, ProofOfPresence, ProofOfQuality, StreakAdvance, VerificationResult,
    VerificationStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_document_id, parse_rfc3339_timestamp,
};

/// Delivery of a created `cleaning_logs` document.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CleaningLogEvent {
    /// Id of the created document.
    #[schema(example = "log_001")]
    pub log_id: Option<String>,
    /// Document body.
    pub log: Option<CleaningLogDocument>,
}

/// Stored shape of a cleaning log.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CleaningLogDocument {
    /// Submitting cleaner.
    #[serde(default)]
    pub cleaner_id: Option<String>,
    /// Cleaned checkpoint.
    #[serde(default)]
    pub checkpoint_id: Option<String>,
    /// Building owning the checkpoint.
    #[serde(default)]
    pub building_id: Option<String>,
    /// Capture time, RFC 3339.
    #[serde(default)]
    #[schema(format = "date-time")]
    pub created_at: Option<String>,
    /// NFC and location evidence.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub proof_of_presence: Option<ProofOfPresence>,
    /// Photo inference output.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub proof_of_quality: Option<ProofOfQuality>,
    /// Capture-time verdict.
    #[serde(default)]
    pub verification_result: Option<VerificationResultBody>,
}

/// Capture-time verification verdict.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct VerificationResultBody {
    /// `verified`, `rejected`, `flagged_for_review` or another value.
    #[serde(default)]
    #[schema(example = "verified")]
    pub status: Option<String>,
    /// Reason for a review flag.
    #[serde(default)]
    pub flag_reason: Option<String>,
    /// Reason for a rejection.
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Delivery of a created `feedback` document.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct FeedbackEvent {
    /// Id of the created document.
    #[schema(example = "fb_001")]
    pub feedback_id: Option<String>,
    /// Document body.
    pub feedback: Option<FeedbackDocument>,
}

/// Stored shape of occupant feedback.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct FeedbackDocument {
    /// Checkpoint the occupant scanned.
    #[serde(default)]
    pub checkpoint_id: Option<String>,
    /// Feedback type.
    #[serde(default, rename = "type")]
    #[schema(example = "BAD_SMELL")]
    pub kind: Option<String>,
    /// Free-text comment.
    #[serde(default)]
    pub details: Option<String>,
}

/// Summary of the log-created reaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogCreatedResponse {
    /// Processed log.
    pub log_id: String,
    /// `SAFETY_HAZARD` or `QUALITY_FAILURE` when an inspection alert was raised.
    pub safety_alert_type: Option<String>,
    /// Inspection alert id.
    pub safety_alert_id: Option<String>,
    /// `verified`, `rejected` or `no_action`.
    pub branch: String,
    /// `advanced`, `first_cleaning`, `stale` or `missing`.
    pub checkpoint_update: Option<String>,
    /// Missing-clean alerts closed by the log.
    pub resolved_alerts: Option<usize>,
    /// `recorded`, `within_sla`, `first_cleaning`, `out_of_order`,
    /// `missing_checkpoint` or `missing_building`.
    pub breach: Option<String>,
    /// Recorded breach-recovery event.
    pub sla_event_id: Option<String>,
    /// `incremented`, `audit_requested`, `already_counted` or `failed`.
    pub streak: Option<String>,
    /// Streak after the log, or the value that triggered the audit.
    pub streak_value: Option<u32>,
}

/// Result of a daily stats increment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyStatsResponse {
    /// Daily stats document key.
    #[schema(example = "bldg_001_2026-03-02")]
    pub stats_key: String,
    /// `false` when the log had already been counted.
    pub counted: bool,
}

/// Result of an occupant feedback reaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackResponse {
    /// `ignored`, `no_verified_log` or `flagged`.
    pub outcome: String,
    /// Flagged log.
    pub log_id: Option<String>,
    /// Reason written onto the log.
    pub flag_reason: Option<String>,
}

/// JSON extractor configuration answering malformed bodies with the
/// standard error payload.
#[must_use]
pub fn payload_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("malformed event payload: {err}")).into()
    })
}

fn required(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

fn parse_cleaning_log(event: CleaningLogEvent) -> Result<CleaningLog, Error> {
    let log_field = FieldName::new("log_id");
    let id = parse_document_id(required(event.log_id, log_field)?, log_field, LogId::parse)?;
    let document = event.log.ok_or_else(|| missing_field_error(FieldName::new("log")))?;

    let cleaner_field = FieldName::new("cleaner_id");
    let checkpoint_field = FieldName::new("checkpoint_id");
    let building_field = FieldName::new("building_id");
    let created_field = FieldName::new("created_at");

    let verification_result = document.verification_result.unwrap_or_default();
    Ok(CleaningLog {
        id,
        cleaner_id: parse_document_id(
            required(document.cleaner_id, cleaner_field)?,
            cleaner_field,
            CleanerId::parse,
        )?,
        checkpoint_id: parse_document_id(
            required(document.checkpoint_id, checkpoint_field)?,
            checkpoint_field,
            CheckpointId::parse,
        )?,
        building_id: parse_document_id(
            required(document.building_id, building_field)?,
            building_field,
            BuildingId::parse,
        )?,
        created_at: parse_rfc3339_timestamp(
            required(document.created_at, created_field)?,
            created_field,
        )?,
        proof_of_presence: document.proof_of_presence,
        proof_of_quality: document.proof_of_quality,
        verification_result: VerificationResult {
            status: VerificationStatus::from(verification_result.status.unwrap_or_default()),
            flag_reason: verification_result.flag_reason,
            rejection_reason: verification_result.rejection_reason,
        },
    })
}

fn parse_feedback(event: FeedbackEvent) -> Result<OccupantFeedback, Error> {
    let id_field = FieldName::new("feedback_id");
    let id = parse_document_id(required(event.feedback_id, id_field)?, id_field, FeedbackId::parse)?;
    let document = event
        .feedback
        .ok_or_else(|| missing_field_error(FieldName::new("feedback")))?;
    let checkpoint_field = FieldName::new("checkpoint_id");
    Ok(OccupantFeedback {
        id,
        checkpoint_id: parse_document_id(
            required(document.checkpoint_id, checkpoint_field)?,
            checkpoint_field,
            CheckpointId::parse,
        )?,
        kind: FeedbackKind::from(document.kind.unwrap_or_default()),
        details: document.details,
    })
}

const fn checkpoint_label(update: CheckpointUpdate) -> &'static str {
    match update {
        CheckpointUpdate::Advanced {
            first_cleaning: true,
        } => "first_cleaning",
        CheckpointUpdate::Advanced {
            first_cleaning: false,
        } => "advanced",
        CheckpointUpdate::Stale => "stale",
        CheckpointUpdate::Missing => "missing",
    }
}

fn breach_label(breach: &BreachCheck) -> (&'static str, Option<String>) {
    match breach {
        BreachCheck::Recorded { event_id, .. } => ("recorded", Some(event_id.to_string())),
        BreachCheck::WithinSla { .. } => ("within_sla", None),
        BreachCheck::FirstCleaning => ("first_cleaning", None),
        BreachCheck::OutOfOrder => ("out_of_order", None),
        BreachCheck::MissingCheckpoint => ("missing_checkpoint", None),
        BreachCheck::MissingBuilding => ("missing_building", None),
    }
}

fn streak_label(step: &StreakStep) -> (&'static str, Option<u32>) {
    match step {
        StreakStep::Advanced(StreakAdvance::Incremented(value)) => ("incremented", Some(*value)),
        StreakStep::Advanced(StreakAdvance::AuditTriggered { reached }) => {
            ("audit_requested", Some(*reached))
        }
        StreakStep::AuditRequested { .. } => ("audit_requested", None),
        StreakStep::Advanced(StreakAdvance::AlreadyCounted) => ("already_counted", None),
        StreakStep::Failed { .. } => ("failed", None),
    }
}

impl From<LogCreatedOutcome> for LogCreatedResponse {
    fn from(value: LogCreatedOutcome) -> Self {
        let (safety_alert_type, safety_alert_id) = value
            .safety_alert
            .map(|raised| (raised.kind.as_str().to_owned(), raised.alert_id.to_string()))
            .unzip();
        let mut response = Self {
            log_id: value.log_id.to_string(),
            safety_alert_type,
            safety_alert_id,
            branch: String::new(),
            checkpoint_update: None,
            resolved_alerts: None,
            breach: None,
            sla_event_id: None,
            streak: None,
            streak_value: None,
        };
        match value.branch {
            VerificationBranch::Verified(verified) => {
                let (breach, sla_event_id) = breach_label(&verified.breach);
                let (streak, streak_value) = streak_label(&verified.streak);
                response.branch = "verified".to_owned();
                response.checkpoint_update = Some(checkpoint_label(verified.checkpoint).to_owned());
                response.resolved_alerts = Some(verified.resolved_alerts);
                response.breach = Some(breach.to_owned());
                response.sla_event_id = sla_event_id;
                response.streak = Some(streak.to_owned());
                response.streak_value = streak_value;
            }
            VerificationBranch::Rejected => response.branch = "rejected".to_owned(),
            VerificationBranch::NoAction => response.branch = "no_action".to_owned(),
        }
        response
    }
}

impl From<DailyStatsOutcome> for DailyStatsResponse {
    fn from(value: DailyStatsOutcome) -> Self {
        match value {
            DailyStatsOutcome::Counted(key) => Self {
                stats_key: key.to_string(),
                counted: true,
            },
            DailyStatsOutcome::AlreadyCounted(key) => Self {
                stats_key: key.to_string(),
                counted: false,
            },
        }
    }
}

impl From<FeedbackOutcome> for FeedbackResponse {
    fn from(value: FeedbackOutcome) -> Self {
        match value {
            FeedbackOutcome::Ignored => Self {
                outcome: "ignored".to_owned(),
                log_id: None,
                flag_reason: None,
            },
            FeedbackOutcome::NoVerifiedLog => Self {
                outcome: "no_verified_log".to_owned(),
                log_id: None,
                flag_reason: None,
            },
            FeedbackOutcome::Flagged { log_id, reason } => Self {
                outcome: "flagged".to_owned(),
                log_id: Some(log_id.to_string()),
                flag_reason: Some(reason),
            },
        }
    }
}

/// React to a newly created cleaning log.
#[utoipa::path(
    post,
    path = "/events/cleaning-logs",
    request_body = CleaningLogEvent,
    responses(
        (status = 200, description = "Log processed", body = LogCreatedResponse),
        (status = 400, description = "Malformed document", body = ErrorSchema),
        (status = 500, description = "Processing failed; redeliver", body = ErrorSchema),
        (status = 503, description = "Store unavailable; redeliver", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "handleCleaningLogCreated"
)]
#[post("/events/cleaning-logs")]
pub async fn cleaning_log_created(
    state: web::Data<HttpState>,
    payload: web::Json<CleaningLogEvent>,
) -> ApiResult<web::Json<LogCreatedResponse>> {
    let log = parse_cleaning_log(payload.into_inner())?;
    let outcome = state
        .bounded("cleaning log reaction", state.log_created.handle_log_created(log))
        .await?;
    Ok(web::Json(LogCreatedResponse::from(outcome)))
}

/// Fold a newly created cleaning log into the building's daily stats.
#[utoipa::path(
    post,
    path = "/events/cleaning-logs/daily-stats",
    request_body = CleaningLogEvent,
    responses(
        (status = 200, description = "Stats updated", body = DailyStatsResponse),
        (status = 400, description = "Malformed document", body = ErrorSchema),
        (status = 500, description = "Processing failed; redeliver", body = ErrorSchema),
        (status = 503, description = "Store unavailable; redeliver", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "aggregateDailyStats"
)]
#[post("/events/cleaning-logs/daily-stats")]
pub async fn cleaning_log_daily_stats(
    state: web::Data<HttpState>,
    payload: web::Json<CleaningLogEvent>,
) -> ApiResult<web::Json<DailyStatsResponse>> {
    let log = parse_cleaning_log(payload.into_inner())?;
    let outcome = state
        .bounded("daily stats aggregation", state.daily_stats.record_log(log))
        .await?;
    Ok(web::Json(DailyStatsResponse::from(outcome)))
}

/// React to newly submitted occupant feedback.
#[utoipa::path(
    post,
    path = "/events/occupant-feedback",
    request_body = FeedbackEvent,
    responses(
        (status = 200, description = "Feedback processed", body = FeedbackResponse),
        (status = 400, description = "Malformed document", body = ErrorSchema),
        (status = 500, description = "Processing failed; redeliver", body = ErrorSchema),
        (status = 503, description = "Store unavailable; redeliver", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "handleOccupantFeedback"
)]
#[post("/events/occupant-feedback")]
pub async fn occupant_feedback(
    state: web::Data<HttpState>,
    payload: web::Json<FeedbackEvent>,
) -> ApiResult<web::Json<FeedbackResponse>> {
    let feedback = parse_feedback(payload.into_inner())?;
    let outcome = state
        .bounded("occupant feedback reaction", state.feedback.handle_feedback(feedback))
        .await?;
    Ok(web::Json(FeedbackResponse::from(outcome)))
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
