//! Driving port invoked once per occupant feedback document.

use async_trait::async_trait;

use crate::domain::{Error, LogId, OccupantFeedback};

/// Result of handling one feedback document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// The feedback type does not act on cleaning logs.
    Ignored,
    /// No verified log exists for the checkpoint.
    NoVerifiedLog,
    /// The latest verified log was sent back for review.
    Flagged {
        /// Log that was flagged.
        log_id: LogId,
        /// Reason written onto the log.
        reason: String,
    },
}

/// Driving port for the occupant feedback trigger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OccupantFeedbackCommand: Send + Sync {
    async fn handle_feedback(&self, feedback: OccupantFeedback) -> Result<FeedbackOutcome, Error>;
}

/// Fixture command that ignores all feedback.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOccupantFeedbackCommand;

#[async_trait]
impl OccupantFeedbackCommand for FixtureOccupantFeedbackCommand {
    async fn handle_feedback(
        &self,
        _feedback: OccupantFeedback,
    ) -> Result<FeedbackOutcome, Error> {
        Ok(FeedbackOutcome::Ignored)
    }
}
