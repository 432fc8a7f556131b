//! Occupant complaints that cast doubt on the latest verified cleaning.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::ports::{
    CleaningLogRepository, FeedbackOutcome, OccupantFeedbackCommand, map_port_error,
};
use crate::domain::{Error, OccupantFeedback};

/// Sends the checkpoint's most recent verified log back for review when an
/// occupant reports a problem.
#[derive(Clone)]
pub struct OccupantFeedbackReactor {
    logs: Arc<dyn CleaningLogRepository>,
}

impl OccupantFeedbackReactor {
    /// Reactor flagging logs through `logs`.
    pub fn new(logs: Arc<dyn CleaningLogRepository>) -> Self {
        Self { logs }
    }

    async fn process(&self, feedback: &OccupantFeedback) -> Result<FeedbackOutcome, Error> {
        if !feedback.kind.is_negative() {
            debug!(
                feedback_id = %feedback.id,
                kind = feedback.kind.as_str(),
                "feedback type does not flag logs"
            );
            return Ok(FeedbackOutcome::Ignored);
        }

        let Some(log) = self
            .logs
            .find_latest_verified(&feedback.checkpoint_id)
            .await
            .map_err(map_port_error)?
        else {
            info!(
                checkpoint_id = %feedback.checkpoint_id,
                "no verified log to flag"
            );
            return Ok(FeedbackOutcome::NoVerifiedLog);
        };

        let reason = feedback.flag_reason();
        let flagged = self
            .logs
            .flag_for_review(&log.id, &reason)
            .await
            .map_err(map_port_error)?;
        if !flagged {
            info!(log_id = %log.id, "log disappeared before it could be flagged");
            return Ok(FeedbackOutcome::NoVerifiedLog);
        }
        info!(
            log_id = %log.id,
            checkpoint_id = %feedback.checkpoint_id,
            kind = feedback.kind.as_str(),
            "log flagged for review"
        );
        Ok(FeedbackOutcome::Flagged {
            log_id: log.id,
            reason,
        })
    }
}

#[async_trait]
impl OccupantFeedbackCommand for OccupantFeedbackReactor {
    async fn handle_feedback(&self, feedback: OccupantFeedback) -> Result<FeedbackOutcome, Error> {
        let result = self.process(&feedback).await;
        if let Err(err) = &result {
            error!(
                feedback_id = %feedback.id,
                code = ?err.code(),
                error = %err,
                "occupant feedback handling failed"
            );
        }
        result
    }
}
