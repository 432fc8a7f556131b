//! Domain primitives, aggregates, and services.
//!
//! Purpose: Model the facility-cleaning documents (buildings, checkpoints,
//! cleaning logs, alerts, SLA events, cleaner streaks, feedback, daily
//! stats) and the services that react to them. Nothing here knows about
//! HTTP or a concrete store; adapters reach the domain through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - LogCreatedReactor, SlaWatchdog, OccupantFeedbackReactor,
//!   DailyStatsAggregator: implementations of the driving ports.

pub mod alert;
pub mod alert_service;
pub mod building;
pub mod checkpoint;
pub mod cleaner;
pub mod cleaner_audit;
pub mod cleaning_log;
pub mod correlation_id;
pub mod daily_stats;
pub mod daily_stats_service;
pub mod error;
pub mod facility_state;
pub mod feedback;
pub mod ids;
pub mod log_created_reactor;
pub mod occupant_feedback;
pub mod ports;
pub mod privacy;
pub mod sla;
pub mod sla_event;
pub mod sla_event_recorder;
pub mod sla_watchdog;
pub mod ticketing;

pub use self::alert::{
    Alert, AlertDetails, AlertKind, AlertResolution, AlertSeverity, AlertStatus, NewAlert,
};
pub use self::alert_service::{AlertService, AlertServiceConfig};
pub use self::building::{Building, ClientSlaConfig};
pub use self::checkpoint::{Checkpoint, CheckpointStatus, CleaningTransition};
pub use self::cleaner::{CleanerStreak, StreakAdvance};
pub use self::cleaner_audit::CleanerAuditTrigger;
pub use self::cleaning_log::{
    CleaningLog, DetectedObject, GeoLocation, ProofOfPresence, ProofOfQuality,
    VerificationResult, VerificationStatus,
};
pub use self::correlation_id::CorrelationId;
pub use self::daily_stats::{DailyStats, DailyStatsIncrement, DailyStatsKey};
pub use self::daily_stats_service::DailyStatsAggregator;
pub use self::error::{Error, ErrorCode};
pub use self::facility_state::FacilityStateUpdater;
pub use self::feedback::{FeedbackKind, OccupantFeedback};
pub use self::ids::{
    AlertId, BlankDocumentId, BuildingId, CheckpointId, CleanerId, FeedbackId, LogId,
    SlaEventId,
};
pub use self::log_created_reactor::{LogCreatedReactor, LogCreatedServices};
pub use self::occupant_feedback::OccupantFeedbackReactor;
pub use self::sla_event::{BreachRecovery, SlaEvent, SlaEventKind};
pub use self::sla_event_recorder::SlaEventRecorder;
pub use self::sla_watchdog::{SlaWatchdog, SlaWatchdogConfig};
