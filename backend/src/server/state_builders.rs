//! Builders wiring the domain services onto the entity store.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use vericlean::domain::{
    AlertService, CleanerAuditTrigger, DailyStatsAggregator, FacilityStateUpdater,
    LogCreatedReactor, LogCreatedServices, OccupantFeedbackReactor, SlaEventRecorder,
    SlaWatchdog,
};
use vericlean::inbound::http::state::HttpStatePorts;
use vericlean::outbound::persistence::EntityStorePorts;
use vericlean::settings::Settings;

/// Build every driving port over one set of repositories.
pub fn build_ports(repos: &EntityStorePorts, settings: &Settings) -> HttpStatePorts {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let alerts = AlertService::new(repos.alerts.clone(), clock.clone(), settings.alert_service());
    let facility = FacilityStateUpdater::new(repos.checkpoints.clone(), clock.clone());

    let log_created = LogCreatedReactor::new(LogCreatedServices {
        logs: repos.logs.clone(),
        alerts: alerts.clone(),
        facility: facility.clone(),
        sla_events: SlaEventRecorder::new(repos.sla_events.clone(), clock.clone()),
        audits: CleanerAuditTrigger::new(
            repos.cleaners.clone(),
            clock.clone(),
            settings.audit_threshold(),
        ),
        buildings: repos.buildings.clone(),
    });
    let sla_sweep = SlaWatchdog::new(
        repos.checkpoints.clone(),
        alerts,
        facility,
        clock.clone(),
        settings.watchdog(),
    );

    HttpStatePorts {
        log_created: Arc::new(log_created),
        daily_stats: Arc::new(DailyStatsAggregator::new(repos.daily_stats.clone(), clock)),
        feedback: Arc::new(OccupantFeedbackReactor::new(repos.logs.clone())),
        sla_sweep: Arc::new(sla_sweep),
    }
}
