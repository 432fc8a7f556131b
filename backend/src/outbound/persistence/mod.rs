//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Every repository port has a Diesel implementation backed by one shared
//! `bb8` pool through `diesel-async`. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay private to this module; adapters only
//! translate between rows and domain values.
//!
//! Writes that the domain needs to be atomic (the checkpoint read-old/
//! write-new, the streak transaction, the alert dedup batch, the daily
//! counter merge) each run in a single database transaction.
//!
//! `InMemoryEntityStore` implements the same ports in process memory for
//! tests (feature `test-support`).
//!
//! # Example
//!
//! ```no_run
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! use vericlean::outbound::persistence::{DbPool, EntityStorePorts, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/vericlean")).await?;
//! let ports = EntityStorePorts::postgres(&pool);
//! # let _ = ports;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::domain::ports::{
    AlertRepository, BuildingRepository, CheckpointRepository, CleanerRepository,
    CleaningLogRepository, DailyStatsRepository, SlaEventRepository,
};

mod diesel_alert_repository;
mod diesel_building_repository;
mod diesel_checkpoint_repository;
mod diesel_cleaner_repository;
mod diesel_cleaning_log_repository;
mod diesel_daily_stats_repository;
mod diesel_error_mapping;
mod diesel_sla_event_repository;
#[cfg(any(test, feature = "test-support"))]
mod in_memory_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_alert_repository::DieselAlertRepository;
pub use diesel_building_repository::DieselBuildingRepository;
pub use diesel_checkpoint_repository::DieselCheckpointRepository;
pub use diesel_cleaner_repository::DieselCleanerRepository;
pub use diesel_cleaning_log_repository::DieselCleaningLogRepository;
pub use diesel_daily_stats_repository::DieselDailyStatsRepository;
pub use diesel_sla_event_repository::DieselSlaEventRepository;
#[cfg(any(test, feature = "test-support"))]
pub use in_memory_store::InMemoryEntityStore;
pub use migrations::{MigrationError, apply_migrations, apply_migrations_blocking};
pub use pool::{DbPool, PoolConfig, PoolError};

/// One handle per repository port, all over the same store.
#[derive(Clone)]
pub struct EntityStorePorts {
    /// `alerts` access.
    pub alerts: Arc<dyn AlertRepository>,
    /// `buildings` access.
    pub buildings: Arc<dyn BuildingRepository>,
    /// `checkpoints` access.
    pub checkpoints: Arc<dyn CheckpointRepository>,
    /// Cleaner streak access.
    pub cleaners: Arc<dyn CleanerRepository>,
    /// `cleaning_logs` access.
    pub logs: Arc<dyn CleaningLogRepository>,
    /// Daily counter access.
    pub daily_stats: Arc<dyn DailyStatsRepository>,
    /// `sla_events` access.
    pub sla_events: Arc<dyn SlaEventRepository>,
}

impl EntityStorePorts {
    /// Diesel repositories sharing `pool`.
    #[must_use]
    pub fn postgres(pool: &DbPool) -> Self {
        Self {
            alerts: Arc::new(DieselAlertRepository::new(pool.clone())),
            buildings: Arc::new(DieselBuildingRepository::new(pool.clone())),
            checkpoints: Arc::new(DieselCheckpointRepository::new(pool.clone())),
            cleaners: Arc::new(DieselCleanerRepository::new(pool.clone())),
            logs: Arc::new(DieselCleaningLogRepository::new(pool.clone())),
            daily_stats: Arc::new(DieselDailyStatsRepository::new(pool.clone())),
            sla_events: Arc::new(DieselSlaEventRepository::new(pool.clone())),
        }
    }

    /// Every port backed by the same in-memory store.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn in_memory(store: &Arc<InMemoryEntityStore>) -> Self {
        Self {
            alerts: store.clone(),
            buildings: store.clone(),
            checkpoints: store.clone(),
            cleaners: store.clone(),
            logs: store.clone(),
            daily_stats: store.clone(),
            sla_events: store.clone(),
        }
    }
}
