//! Shared wiring for integration tests: every reactor over one in-memory
//! store and a clock the test controls.

use std::sync::Arc;

use vericlean::domain::{
    AlertService, AlertServiceConfig, Building, BuildingId, Checkpoint, CheckpointId,
    CleanerAuditTrigger, ClientSlaConfig, DailyStatsAggregator, FacilityStateUpdater,
    LogCreatedReactor, LogCreatedServices, OccupantFeedbackReactor, SlaEventRecorder,
    SlaWatchdog, SlaWatchdogConfig,
};
use vericlean::inbound::http::state::HttpStatePorts;
use vericlean::outbound::persistence::{EntityStorePorts, InMemoryEntityStore};
use vericlean::test_support::{MutableClock, at};

pub const NOW: &str = "2026-03-02T14:00:00Z";

pub struct Harness {
    pub store: Arc<InMemoryEntityStore>,
    pub clock: Arc<MutableClock>,
    pub log_created: Arc<LogCreatedReactor>,
    pub watchdog: Arc<SlaWatchdog>,
    pub feedback: Arc<OccupantFeedbackReactor>,
    pub daily_stats: Arc<DailyStatsAggregator>,
    pub alerts: AlertService,
    pub facility: FacilityStateUpdater,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_watchdog(SlaWatchdogConfig::default())
    }

    pub fn with_watchdog(config: SlaWatchdogConfig) -> Self {
        let store = Arc::new(InMemoryEntityStore::new());
        let clock = Arc::new(MutableClock::new(at(NOW)));
        let repos = EntityStorePorts::in_memory(&store);

        let alerts = AlertService::new(repos.alerts, clock.clone(), AlertServiceConfig::default());
        let facility = FacilityStateUpdater::new(repos.checkpoints.clone(), clock.clone());
        let log_created = LogCreatedReactor::new(LogCreatedServices {
            logs: repos.logs.clone(),
            alerts: alerts.clone(),
            facility: facility.clone(),
            sla_events: SlaEventRecorder::new(repos.sla_events, clock.clone()),
            audits: CleanerAuditTrigger::new(repos.cleaners, clock.clone(), 10),
            buildings: repos.buildings,
        });
        let watchdog = SlaWatchdog::new(
            repos.checkpoints,
            alerts.clone(),
            facility.clone(),
            clock.clone(),
            config,
        );

        Self {
            log_created: Arc::new(log_created),
            watchdog: Arc::new(watchdog),
            feedback: Arc::new(OccupantFeedbackReactor::new(repos.logs)),
            daily_stats: Arc::new(DailyStatsAggregator::new(repos.daily_stats, clock.clone())),
            alerts,
            facility,
            store,
            clock,
        }
    }

    /// Seed `bldg_001` with the given daily cleaning requirement.
    pub fn building(&self, required_per_day: i64) -> &Self {
        self.store.put_building(Building::new(
            BuildingId::new("bldg_001"),
            ClientSlaConfig::per_day(required_per_day),
        ));
        self
    }

    /// Seed an active checkpoint in `bldg_001`, last cleaned at `cleaned`.
    pub fn checkpoint(&self, id: &str, cleaned: Option<&str>) -> &Self {
        let checkpoint = Checkpoint::new(CheckpointId::new(id), BuildingId::new("bldg_001"));
        let checkpoint = match cleaned {
            Some(raw) => checkpoint.with_last_cleaned_at(at(raw)),
            None => checkpoint,
        };
        self.store.put_checkpoint(checkpoint);
        self
    }

    pub fn ports(&self) -> HttpStatePorts {
        HttpStatePorts {
            log_created: self.log_created.clone(),
            daily_stats: self.daily_stats.clone(),
            feedback: self.feedback.clone(),
            sla_sweep: self.watchdog.clone(),
        }
    }
}
