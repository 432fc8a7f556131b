//! In-process entity store backing every repository port.
//!
//! All collections sit behind one mutex, so each port call is a single
//! atomic step: the alert batches, the streak transaction, and the
//! checkpoint read-old/write-new all commit or fail as a whole.
//!
//! Document ids are assigned as `{collection}_{n:06}` from one counter,
//! which keeps listings in insertion order.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ports::{
    AlertRepository, AlertRepositoryError, BuildingRepository, BuildingRepositoryError,
    CheckpointCleaning, CheckpointRepository, CheckpointRepositoryError, CleanerRepository,
    CleanerRepositoryError, CleaningLogRepository, CleaningLogRepositoryError,
    DailyStatsRepository, DailyStatsRepositoryError, DeduplicatedInsert, SlaEventRepository,
    SlaEventRepositoryError, StreakOutcome, StreakUpdate,
};
use crate::domain::{
    Alert, AlertId, AlertKind, AlertResolution, Building, BuildingId, Checkpoint, CheckpointId,
    CleanerId, CleanerStreak, CleaningLog, CleaningTransition, DailyStats, DailyStatsIncrement,
    DailyStatsKey, LogId, NewAlert, SlaEvent, SlaEventId, StreakAdvance, VerificationStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
enum StoreFault {
    #[error("injected transient failure")]
    Injected,
    #[error("store lock poisoned by a panicking writer")]
    Poisoned,
}

macro_rules! impl_from_store_fault {
    ($($error:ident => $transient:ident, $permanent:ident;)*) => {
        $(
            impl From<StoreFault> for $error {
                fn from(fault: StoreFault) -> Self {
                    match fault {
                        StoreFault::Injected => Self::$transient(fault.to_string()),
                        StoreFault::Poisoned => Self::$permanent(fault.to_string()),
                    }
                }
            }
        )*
    };
}

impl_from_store_fault! {
    AlertRepositoryError => connection, query;
    BuildingRepositoryError => connection, query;
    CheckpointRepositoryError => connection, query;
    CleanerRepositoryError => connection, query;
    CleaningLogRepositoryError => connection, query;
    DailyStatsRepositoryError => connection, write;
    SlaEventRepositoryError => connection, write;
}

#[derive(Debug, Default)]
struct Collections {
    buildings: HashMap<BuildingId, Building>,
    checkpoints: BTreeMap<CheckpointId, Checkpoint>,
    logs: BTreeMap<LogId, CleaningLog>,
    alerts: BTreeMap<AlertId, Alert>,
    sla_events: BTreeMap<SlaEventId, SlaEvent>,
    cleaners: HashMap<CleanerId, CleanerStreak>,
    daily_stats: BTreeMap<DailyStatsKey, DailyStats>,
    next_id: u64,
    writes: u64,
}

impl Collections {
    fn next_id(&mut self, collection: &str) -> String {
        self.next_id += 1;
        format!("{collection}_{:06}", self.next_id)
    }

    fn insert_alert(&mut self, alert: NewAlert) -> AlertId {
        let id = AlertId::new(self.next_id("alert"));
        self.alerts.insert(id.clone(), Alert::open(id.clone(), alert));
        self.writes += 1;
        id
    }

    fn alert_for_log(&self, log_id: &LogId, kind: AlertKind) -> Option<AlertId> {
        self.alerts
            .values()
            .find(|alert| alert.kind == kind && alert.related_log_id.as_ref() == Some(log_id))
            .map(|alert| alert.id.clone())
    }

    fn has_open_alert(&self, checkpoint_id: &CheckpointId, kind: AlertKind) -> bool {
        self.alerts
            .values()
            .any(|alert| alert.is_open() && alert.kind == kind && &alert.checkpoint_id == checkpoint_id)
    }
}

/// Entity store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    state: Mutex<Collections>,
    injected_failures: AtomicU32,
}

impl InMemoryEntityStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` port calls with a transient error.
    pub fn inject_transient_failures(&self, count: u32) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreFault> {
        self.state.lock().map_err(|_| StoreFault::Poisoned)
    }

    fn with_state<T>(&self, op: impl FnOnce(&mut Collections) -> T) -> Result<T, StoreFault> {
        if self.take_injected_failure() {
            debug!("in-memory store failing call on request");
            return Err(StoreFault::Injected);
        }
        let mut state = self.lock()?;
        Ok(op(&mut state))
    }

    /// Seeding and inspection bypass fault injection and read through a
    /// poisoned lock.
    fn unchecked(&self) -> MutexGuard<'_, Collections> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, op: impl FnOnce(&Collections) -> T) -> T {
        op(&self.unchecked())
    }

    fn seed(&self, op: impl FnOnce(&mut Collections)) {
        op(&mut self.unchecked());
    }

    /// Seed a building.
    pub fn put_building(&self, building: Building) {
        self.seed(|state| {
            state.buildings.insert(building.id.clone(), building);
        });
    }

    /// Seed a checkpoint.
    pub fn put_checkpoint(&self, checkpoint: Checkpoint) {
        self.seed(|state| {
            state.checkpoints.insert(checkpoint.id.clone(), checkpoint);
        });
    }

    /// Seed a cleaning log.
    pub fn put_log(&self, log: CleaningLog) {
        self.seed(|state| {
            state.logs.insert(log.id.clone(), log);
        });
    }

    /// Seed a cleaner's streak state.
    pub fn put_cleaner(&self, streak: CleanerStreak) {
        self.seed(|state| {
            state.cleaners.insert(streak.cleaner_id.clone(), streak);
        });
    }

    /// Document writes committed through the ports since creation.
    pub fn write_count(&self) -> u64 {
        self.read(|state| state.writes)
    }

    /// Stored checkpoint.
    pub fn checkpoint(&self, id: &CheckpointId) -> Option<Checkpoint> {
        self.read(|state| state.checkpoints.get(id).cloned())
    }

    /// Stored log.
    pub fn log(&self, id: &LogId) -> Option<CleaningLog> {
        self.read(|state| state.logs.get(id).cloned())
    }

    /// Every stored alert, in id order.
    pub fn alerts(&self) -> Vec<Alert> {
        self.read(|state| state.alerts.values().cloned().collect())
    }

    /// Stored alerts of one kind.
    pub fn alerts_of_kind(&self, kind: AlertKind) -> Vec<Alert> {
        self.read(|state| {
            state
                .alerts
                .values()
                .filter(|alert| alert.kind == kind)
                .cloned()
                .collect()
        })
    }

    /// Every appended SLA event.
    pub fn sla_events(&self) -> Vec<SlaEvent> {
        self.read(|state| state.sla_events.values().cloned().collect())
    }

    /// Stored streak state.
    pub fn cleaner(&self, id: &CleanerId) -> Option<CleanerStreak> {
        self.read(|state| state.cleaners.get(id).cloned())
    }

    /// Stored counters for one building and day.
    pub fn daily_stats(&self, key: &DailyStatsKey) -> Option<DailyStats> {
        self.read(|state| state.daily_stats.get(key).cloned())
    }
}

#[async_trait]
impl AlertRepository for InMemoryEntityStore {
    async fn insert(&self, alert: NewAlert) -> Result<AlertId, AlertRepositoryError> {
        Ok(self.with_state(|state| {
            let existing = alert
                .related_log_id
                .as_ref()
                .and_then(|log_id| state.alert_for_log(log_id, alert.kind));
            existing.unwrap_or_else(|| state.insert_alert(alert))
        })?)
    }

    async fn find_open(
        &self,
        checkpoint_ids: &[CheckpointId],
        kind: AlertKind,
    ) -> Result<Vec<Alert>, AlertRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .alerts
                .values()
                .filter(|alert| {
                    alert.is_open()
                        && alert.kind == kind
                        && checkpoint_ids.contains(&alert.checkpoint_id)
                })
                .cloned()
                .collect()
        })?)
    }

    async fn resolve_batch(
        &self,
        ids: &[AlertId],
        resolution: &AlertResolution,
    ) -> Result<usize, AlertRepositoryError> {
        Ok(self.with_state(|state| {
            let mut resolved = 0;
            for id in ids {
                if let Some(alert) = state.alerts.get_mut(id)
                    && alert.resolve(resolution.clone())
                {
                    resolved += 1;
                }
            }
            state.writes += resolved as u64;
            resolved
        })?)
    }

    async fn insert_deduplicated_batch(
        &self,
        alerts: Vec<NewAlert>,
    ) -> Result<DeduplicatedInsert, AlertRepositoryError> {
        Ok(self.with_state(|state| {
            let mut outcome = DeduplicatedInsert::default();
            for alert in alerts {
                if state.has_open_alert(&alert.checkpoint_id, alert.kind) {
                    outcome.skipped.push(alert.checkpoint_id);
                    continue;
                }
                let checkpoint_id = alert.checkpoint_id.clone();
                let id = state.insert_alert(alert);
                outcome.created.push((checkpoint_id, id));
            }
            outcome
        })?)
    }
}

#[async_trait]
impl BuildingRepository for InMemoryEntityStore {
    async fn find_by_id(
        &self,
        id: &BuildingId,
    ) -> Result<Option<Building>, BuildingRepositoryError> {
        Ok(self.with_state(|state| state.buildings.get(id).cloned())?)
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryEntityStore {
    async fn find_by_id(
        &self,
        id: &CheckpointId,
    ) -> Result<Option<Checkpoint>, CheckpointRepositoryError> {
        Ok(self.with_state(|state| state.checkpoints.get(id).cloned())?)
    }

    async fn record_cleaning(
        &self,
        id: &CheckpointId,
        cleaned_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<CheckpointCleaning>, CheckpointRepositoryError> {
        Ok(self.with_state(|state| {
            let checkpoint = state.checkpoints.get_mut(id)?;
            let transition = checkpoint.record_cleaning(cleaned_at, now);
            let building_id = checkpoint.building_id.clone();
            if matches!(transition, CleaningTransition::Advanced { .. }) {
                state.writes += 1;
            }
            Some(CheckpointCleaning {
                building_id,
                transition,
            })
        })?)
    }

    async fn list_overdue(
        &self,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Checkpoint>, CheckpointRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .checkpoints
                .values()
                .filter(|checkpoint| checkpoint.is_overdue_at(threshold, false))
                .cloned()
                .collect()
        })?)
    }

    async fn list_never_cleaned(&self) -> Result<Vec<Checkpoint>, CheckpointRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .checkpoints
                .values()
                .filter(|checkpoint| checkpoint.is_active && checkpoint.last_cleaned_at().is_none())
                .cloned()
                .collect()
        })?)
    }

    async fn mark_overdue(
        &self,
        ids: &[CheckpointId],
        now: DateTime<Utc>,
    ) -> Result<(), CheckpointRepositoryError> {
        Ok(self.with_state(|state| {
            for id in ids {
                if let Some(checkpoint) = state.checkpoints.get_mut(id) {
                    checkpoint.mark_overdue(now);
                    state.writes += 1;
                }
            }
        })?)
    }
}

#[async_trait]
impl CleanerRepository for InMemoryEntityStore {
    async fn advance_streak(
        &self,
        update: StreakUpdate,
    ) -> Result<StreakOutcome, CleanerRepositoryError> {
        Ok(self.with_state(|state| {
            let streak = state
                .cleaners
                .entry(update.cleaner_id.clone())
                .or_insert_with(|| CleanerStreak::new(update.cleaner_id.clone()));
            let advance = streak.advance(&update.log_id, update.threshold);
            let audit_alert_id = match advance {
                StreakAdvance::AlreadyCounted => None,
                StreakAdvance::Incremented(_) => {
                    state.writes += 1;
                    None
                }
                StreakAdvance::AuditTriggered { .. } => {
                    state.writes += 1;
                    Some(state.insert_alert(update.audit_alert))
                }
            };
            StreakOutcome {
                advance,
                audit_alert_id,
            }
        })?)
    }

    async fn reset_streak(&self, cleaner_id: &CleanerId) -> Result<(), CleanerRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .cleaners
                .entry(cleaner_id.clone())
                .or_insert_with(|| CleanerStreak::new(cleaner_id.clone()))
                .reset();
            state.writes += 1;
        })?)
    }
}

#[async_trait]
impl CleaningLogRepository for InMemoryEntityStore {
    async fn save(&self, log: &CleaningLog) -> Result<bool, CleaningLogRepositoryError> {
        Ok(self.with_state(|state| {
            if state.logs.contains_key(&log.id) {
                return false;
            }
            state.logs.insert(log.id.clone(), log.clone());
            state.writes += 1;
            true
        })?)
    }

    async fn find_latest_verified(
        &self,
        checkpoint_id: &CheckpointId,
    ) -> Result<Option<CleaningLog>, CleaningLogRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .logs
                .values()
                .filter(|log| &log.checkpoint_id == checkpoint_id && log.is_verified())
                .max_by_key(|log| log.created_at)
                .cloned()
        })?)
    }

    async fn flag_for_review(
        &self,
        log_id: &LogId,
        reason: &str,
    ) -> Result<bool, CleaningLogRepositoryError> {
        Ok(self.with_state(|state| {
            let Some(log) = state.logs.get_mut(log_id) else {
                return false;
            };
            log.verification_result.status = VerificationStatus::FlaggedForReview;
            log.verification_result.flag_reason = Some(reason.to_owned());
            state.writes += 1;
            true
        })?)
    }
}

#[async_trait]
impl DailyStatsRepository for InMemoryEntityStore {
    async fn apply(&self, increment: DailyStatsIncrement) -> Result<bool, DailyStatsRepositoryError> {
        Ok(self.with_state(|state| {
            let counted = state
                .daily_stats
                .entry(increment.key.clone())
                .or_insert_with(|| DailyStats::new(increment.key.clone()))
                .apply(&increment);
            if counted {
                state.writes += 1;
            }
            counted
        })?)
    }
}

#[async_trait]
impl SlaEventRepository for InMemoryEntityStore {
    async fn append(&self, event: SlaEvent) -> Result<SlaEventId, SlaEventRepositoryError> {
        Ok(self.with_state(|state| {
            let id = SlaEventId::new(state.next_id("sla_event"));
            state.sla_events.insert(id.clone(), event);
            state.writes += 1;
            id
        })?)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::TransientError;
    use crate::domain::{AlertDetails, AlertSeverity, ClientSlaConfig};
    use crate::test_support::{LogBuilder, at};
    use rstest::{fixture, rstest};

    fn missing_clean(checkpoint: &str) -> NewAlert {
        NewAlert {
            checkpoint_id: CheckpointId::new(checkpoint),
            building_id: BuildingId::new("bldg_001"),
            kind: AlertKind::SlaMissingClean,
            severity: AlertSeverity::Medium,
            message: None,
            details: AlertDetails::MissingClean {
                hours_overdue: Some(5.0),
                sla_threshold_hours: 4,
                last_cleaned_at: None,
            },
            related_log_id: None,
            created_at: at("2026-03-02T12:00:00Z"),
        }
    }

    #[fixture]
    fn store() -> InMemoryEntityStore {
        let store = InMemoryEntityStore::new();
        store.put_building(Building::new(
            BuildingId::new("bldg_001"),
            ClientSlaConfig::per_day(6),
        ));
        store.put_checkpoint(Checkpoint::new(
            CheckpointId::new("cp_001"),
            BuildingId::new("bldg_001"),
        ));
        store
    }

    #[rstest]
    #[tokio::test]
    async fn deduplicated_batch_skips_open_and_repeated(store: InMemoryEntityStore) {
        AlertRepository::insert(&store, missing_clean("cp_a"))
            .await
            .expect("insert");

        let outcome = store
            .insert_deduplicated_batch(vec![
                missing_clean("cp_a"),
                missing_clean("cp_b"),
                missing_clean("cp_b"),
            ])
            .await
            .expect("batch");

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].0, CheckpointId::new("cp_b"));
        assert_eq!(
            outcome.skipped,
            vec![CheckpointId::new("cp_a"), CheckpointId::new("cp_b")]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn record_cleaning_returns_previous_value(store: InMemoryEntityStore) {
        let id = CheckpointId::new("cp_001");
        let first = at("2026-03-02T08:00:00Z");
        let second = at("2026-03-02T10:00:00Z");
        store
            .record_cleaning(&id, first, second)
            .await
            .expect("first write");

        let outcome = store
            .record_cleaning(&id, second, second)
            .await
            .expect("second write")
            .expect("checkpoint exists");

        assert_eq!(
            outcome.transition,
            CleaningTransition::Advanced {
                previous: Some(first)
            }
        );
        assert_eq!(outcome.building_id, BuildingId::new("bldg_001"));
    }

    #[rstest]
    #[tokio::test]
    async fn latest_verified_ignores_other_statuses(store: InMemoryEntityStore) {
        store.put_log(LogBuilder::verified("log_old", "cp_001", at("2026-03-02T08:00:00Z")).build());
        store.put_log(
            LogBuilder::verified("log_rej", "cp_001", at("2026-03-02T11:00:00Z"))
                .status(VerificationStatus::Rejected)
                .build(),
        );
        store.put_log(LogBuilder::verified("log_new", "cp_001", at("2026-03-02T10:00:00Z")).build());

        let latest = store
            .find_latest_verified(&CheckpointId::new("cp_001"))
            .await
            .expect("query")
            .expect("a verified log");

        assert_eq!(latest.id, LogId::new("log_new"));
    }

    #[rstest]
    #[tokio::test]
    async fn injected_failures_are_transient_and_finite(store: InMemoryEntityStore) {
        store.inject_transient_failures(1);

        let err = BuildingRepository::find_by_id(&store, &BuildingId::new("bldg_001"))
            .await
            .expect_err("first call fails");
        assert!(err.is_transient());

        let building = BuildingRepository::find_by_id(&store, &BuildingId::new("bldg_001"))
            .await
            .expect("second call succeeds");
        assert!(building.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn inspection_alert_is_written_once_per_log(store: InMemoryEntityStore) {
        let alert = NewAlert {
            kind: AlertKind::QualityFailure,
            severity: AlertSeverity::High,
            related_log_id: Some(LogId::new("log_low")),
            details: AlertDetails::Inspection {
                score: 40.0,
                detected_hazards: Vec::new(),
            },
            ..missing_clean("cp_001")
        };

        let first = AlertRepository::insert(&store, alert.clone())
            .await
            .expect("first insert");
        let second = AlertRepository::insert(&store, alert.clone())
            .await
            .expect("second insert");
        let other_kind = AlertRepository::insert(
            &store,
            NewAlert {
                kind: AlertKind::SafetyHazard,
                ..alert
            },
        )
        .await
        .expect("other kind");

        assert_eq!(first, second);
        assert_ne!(first, other_kind);
        assert_eq!(store.alerts().len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn saving_a_known_log_keeps_the_stored_copy(store: InMemoryEntityStore) {
        let log = LogBuilder::verified("log_001", "cp_001", at("2026-03-02T10:00:00Z")).build();
        assert!(store.save(&log).await.expect("first save"));
        store
            .flag_for_review(&log.id, "Occupant reported SPILL: No details provided")
            .await
            .expect("flag");

        assert!(!store.save(&log).await.expect("second save"));

        let stored = store.log(&log.id).expect("stored log");
        assert_eq!(
            stored.verification_result.status,
            VerificationStatus::FlaggedForReview
        );
    }
}
