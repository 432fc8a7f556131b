//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`TicketingConnector`]) describe what the
//! domain needs from the entity store and external trackers. Driving ports
//! (`*Command`) are what the inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod alert_repository;
mod building_repository;
mod checkpoint_repository;
mod cleaner_repository;
mod cleaning_log_repository;
mod daily_stats_command;
mod daily_stats_repository;
mod log_created_command;
mod occupant_feedback_command;
mod sla_event_repository;
mod sla_sweep_command;
mod ticketing_connector;

use crate::domain::Error;

#[cfg(test)]
pub use alert_repository::MockAlertRepository;
pub use alert_repository::{
    AlertRepository, AlertRepositoryError, DeduplicatedInsert, FixtureAlertRepository,
};
#[cfg(test)]
pub use building_repository::MockBuildingRepository;
pub use building_repository::{
    BuildingRepository, BuildingRepositoryError, FixtureBuildingRepository,
};
#[cfg(test)]
pub use checkpoint_repository::MockCheckpointRepository;
pub use checkpoint_repository::{
    CheckpointCleaning, CheckpointRepository, CheckpointRepositoryError,
    FixtureCheckpointRepository,
};
#[cfg(test)]
pub use cleaner_repository::MockCleanerRepository;
pub use cleaner_repository::{
    CleanerRepository, CleanerRepositoryError, FixtureCleanerRepository, StreakOutcome,
    StreakUpdate,
};
#[cfg(test)]
pub use cleaning_log_repository::MockCleaningLogRepository;
pub use cleaning_log_repository::{
    CleaningLogRepository, CleaningLogRepositoryError, FixtureCleaningLogRepository,
};
#[cfg(test)]
pub use daily_stats_command::MockDailyStatsCommand;
pub use daily_stats_command::{DailyStatsCommand, DailyStatsOutcome, FixtureDailyStatsCommand};
#[cfg(test)]
pub use daily_stats_repository::MockDailyStatsRepository;
pub use daily_stats_repository::{
    DailyStatsRepository, DailyStatsRepositoryError, FixtureDailyStatsRepository,
};
#[cfg(test)]
pub use log_created_command::MockLogCreatedCommand;
pub use log_created_command::{
    BreachCheck, CheckpointUpdate, FixtureLogCreatedCommand, LogCreatedCommand,
    LogCreatedOutcome, SafetyAlertRaised, StreakStep, VerificationBranch, VerifiedOutcome,
};
#[cfg(test)]
pub use occupant_feedback_command::MockOccupantFeedbackCommand;
pub use occupant_feedback_command::{
    FeedbackOutcome, FixtureOccupantFeedbackCommand, OccupantFeedbackCommand,
};
#[cfg(test)]
pub use sla_event_repository::MockSlaEventRepository;
pub use sla_event_repository::{
    FixtureSlaEventRepository, SlaEventRepository, SlaEventRepositoryError,
};
#[cfg(test)]
pub use sla_sweep_command::MockSlaSweepCommand;
pub use sla_sweep_command::{FixtureSlaSweepCommand, SlaSweepCommand, SweepReport, SweepSummary};
#[cfg(test)]
pub use ticketing_connector::MockTicketingConnector;
pub use ticketing_connector::{
    FixtureTicketingConnector, TicketingConnector, TicketingConnectorError,
};

/// Port errors that distinguish retryable failures.
pub trait TransientError {
    /// Whether retrying the same operation may succeed.
    fn is_transient(&self) -> bool;
}

/// Map a port error onto the domain error taxonomy.
///
/// Transient failures become [`ErrorCode::ServiceUnavailable`]; anything else
/// is an internal error. Both trigger redelivery of the inbound event.
///
/// [`ErrorCode::ServiceUnavailable`]: crate::domain::ErrorCode::ServiceUnavailable
pub fn map_port_error<E>(err: E) -> Error
where
    E: TransientError + std::fmt::Display,
{
    if err.is_transient() {
        Error::service_unavailable(err.to_string())
    } else {
        Error::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;

    #[test]
    fn transient_errors_map_to_service_unavailable() {
        let err = map_port_error(AlertRepositoryError::connection("reset by peer"));
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert!(err.message().contains("reset by peer"));
    }

    #[test]
    fn permanent_errors_map_to_internal() {
        let err = map_port_error(AlertRepositoryError::query("bad index"));
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
