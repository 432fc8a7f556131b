//! Backend entry-point: loads settings, migrates and pools the database,
//! starts the SLA watchdog schedule, and serves the event endpoints.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, build_ports, create_server};
use vericlean::inbound::http::health::HealthState;
use vericlean::inbound::schedule::WatchdogSchedule;
use vericlean::outbound::persistence::{
    DbPool, EntityStorePorts, PoolConfig, apply_migrations_blocking,
};
use vericlean::settings::Settings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = Settings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;

    let database_url = settings
        .database_url()
        .ok_or_else(|| std::io::Error::other("VERICLEAN_DATABASE_URL is required"))?
        .to_owned();
    let applied = apply_migrations_blocking(database_url.clone())
        .await
        .map_err(|e| std::io::Error::other(format!("failed to migrate database: {e}")))?;
    info!(applied, "database schema up to date");

    let pool_config = PoolConfig::new(database_url).with_max_size(settings.db_pool_max_size());
    let pool = DbPool::new(pool_config)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to build database pool: {e}")))?;
    let ports = build_ports(&EntityStorePorts::postgres(&pool), &settings);

    if settings.watchdog_enabled {
        WatchdogSchedule::new(ports.sla_sweep.clone(), settings.watchdog_interval()).spawn();
    } else {
        info!("in-process sla watchdog disabled; expecting POST /tasks/sla-watchdog");
    }

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(settings.bind_addr(), ports)
        .with_handler_timeout(settings.handler_timeout());
    info!(bind_addr = %settings.bind_addr(), "starting http server");
    create_server(health_state, config)?.await
}
