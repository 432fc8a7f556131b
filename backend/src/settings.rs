//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `VERICLEAN_*` environment variables, command-line flags,
//! or a configuration file. Every setting is optional; the accessors supply
//! the production defaults.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::alert_service::{DEFAULT_LOOKUP_CHUNK_SIZE, DEFAULT_QUALITY_THRESHOLD};
use crate::domain::cleaner::DEFAULT_AUDIT_THRESHOLD;
use crate::domain::sla_watchdog::DEFAULT_MAX_GAP_HOURS;
use crate::domain::{AlertServiceConfig, SlaWatchdogConfig};
use crate::inbound::http::state::DEFAULT_HANDLER_TIMEOUT;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 8080);
const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_DB_POOL_MAX_SIZE: u32 = 10;

/// Configuration values for the HTTP server and the reactors.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VERICLEAN")]
pub struct Settings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// Run the SLA watchdog on an in-process timer.
    #[ortho_config(default = true)]
    pub watchdog_enabled: bool,
    /// Seconds between watchdog sweeps.
    pub watchdog_interval_secs: Option<u64>,
    /// Hours without a verified cleaning before a checkpoint is overdue.
    pub max_gap_hours: Option<i64>,
    /// Raise SLA alerts for active checkpoints that were never cleaned.
    #[ortho_config(default = false)]
    pub flag_never_cleaned: bool,
    /// Checkpoints per open-alert lookup query.
    pub alert_lookup_chunk_size: Option<usize>,
    /// Consecutive verified logs before a supervisor audit is requested.
    pub audit_threshold: Option<u32>,
    /// Quality scores strictly below this raise a quality alert.
    pub quality_threshold: Option<f64>,
    /// Seconds one event invocation may run before answering 503.
    pub handler_timeout_secs: Option<u64>,
    /// PostgreSQL connection URL for the entity store.
    pub database_url: Option<String>,
    /// Maximum connections held by the database pool.
    pub db_pool_max_size: Option<u32>,
}

impl Settings {
    /// Bind address, `0.0.0.0:8080` by default.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Database URL, if one is configured and not blank.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool size; zero falls back to the default of 10.
    #[must_use]
    pub fn db_pool_max_size(&self) -> u32 {
        self.db_pool_max_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_DB_POOL_MAX_SIZE)
    }

    /// Period of the in-process watchdog, 15 minutes by default.
    #[must_use]
    pub fn watchdog_interval(&self) -> Duration {
        self.watchdog_interval_secs
            .map_or(DEFAULT_WATCHDOG_INTERVAL, Duration::from_secs)
    }

    /// Per-invocation deadline, 55 seconds by default.
    #[must_use]
    pub fn handler_timeout(&self) -> Duration {
        self.handler_timeout_secs
            .map_or(DEFAULT_HANDLER_TIMEOUT, Duration::from_secs)
    }

    /// Verified-log streak that triggers a supervisor audit.
    #[must_use]
    pub fn audit_threshold(&self) -> u32 {
        self.audit_threshold.unwrap_or(DEFAULT_AUDIT_THRESHOLD)
    }

    /// Alert service tunables. A zero chunk size falls back to the default.
    #[must_use]
    pub fn alert_service(&self) -> AlertServiceConfig {
        AlertServiceConfig {
            quality_threshold: self.quality_threshold.unwrap_or(DEFAULT_QUALITY_THRESHOLD),
            lookup_chunk_size: self
                .alert_lookup_chunk_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_LOOKUP_CHUNK_SIZE),
        }
    }

    /// Watchdog tunables. A gap that is non-positive or too large to
    /// express as a duration falls back to the default.
    #[must_use]
    pub fn watchdog(&self) -> SlaWatchdogConfig {
        SlaWatchdogConfig {
            max_gap_hours: self
                .max_gap_hours
                .filter(|hours| SlaWatchdogConfig::accepts_gap_hours(*hours))
                .unwrap_or(DEFAULT_MAX_GAP_HOURS),
            flag_never_cleaned: self.flag_never_cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 12] = [
        "VERICLEAN_BIND_ADDR",
        "VERICLEAN_WATCHDOG_ENABLED",
        "VERICLEAN_WATCHDOG_INTERVAL_SECS",
        "VERICLEAN_MAX_GAP_HOURS",
        "VERICLEAN_FLAG_NEVER_CLEANED",
        "VERICLEAN_ALERT_LOOKUP_CHUNK_SIZE",
        "VERICLEAN_AUDIT_THRESHOLD",
        "VERICLEAN_QUALITY_THRESHOLD",
        "VERICLEAN_HANDLER_TIMEOUT_SECS",
        "VERICLEAN_DATABASE_URL",
        "VERICLEAN_DB_POOL_MAX_SIZE",
        "VERICLEAN_CONFIG_PATH",
    ];

    fn load_from_empty_args() -> Settings {
        Settings::load_from_iter([OsString::from("vericlean")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().to_string(), "0.0.0.0:8080");
        assert!(settings.watchdog_enabled);
        assert_eq!(settings.watchdog_interval(), Duration::from_secs(900));
        assert_eq!(settings.handler_timeout(), Duration::from_secs(55));
        assert_eq!(settings.audit_threshold(), 10);
        assert_eq!(settings.alert_service(), AlertServiceConfig::default());
        assert_eq!(settings.watchdog(), SlaWatchdogConfig::default());
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.db_pool_max_size(), 10);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut overrides = VARS.map(|name| (name, None::<String>));
        let values = [
            Some("127.0.0.1:9090"),
            Some("false"),
            Some("60"),
            Some("6"),
            Some("true"),
            Some("25"),
            Some("5"),
            Some("80"),
            Some("20"),
            Some("postgres://vericlean@db/vericlean"),
            Some("4"),
            None,
        ];
        for (slot, value) in overrides.iter_mut().zip(values) {
            slot.1 = value.map(str::to_owned);
        }
        let _guard = lock_env(overrides);

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr().to_string(), "127.0.0.1:9090");
        assert!(!settings.watchdog_enabled);
        assert_eq!(settings.watchdog_interval(), Duration::from_secs(60));
        assert_eq!(settings.handler_timeout(), Duration::from_secs(20));
        assert_eq!(settings.audit_threshold(), 5);
        assert_eq!(
            settings.database_url(),
            Some("postgres://vericlean@db/vericlean")
        );
        assert_eq!(settings.db_pool_max_size(), 4);
        assert_eq!(
            settings.alert_service(),
            AlertServiceConfig {
                quality_threshold: 80.0,
                lookup_chunk_size: 25,
            }
        );
        assert_eq!(
            settings.watchdog(),
            SlaWatchdogConfig {
                max_gap_hours: 6,
                flag_never_cleaned: true,
            }
        );
    }

    #[rstest]
    #[case(Some("0"), None)]
    #[case(None, Some("-2"))]
    #[case(None, Some("9223372036854775807"))]
    fn degenerate_values_fall_back(#[case] chunk: Option<&str>, #[case] gap: Option<&str>) {
        let mut overrides = VARS.map(|name| (name, None::<String>));
        for slot in &mut overrides {
            match slot.0 {
                "VERICLEAN_ALERT_LOOKUP_CHUNK_SIZE" => slot.1 = chunk.map(str::to_owned),
                "VERICLEAN_MAX_GAP_HOURS" => slot.1 = gap.map(str::to_owned),
                _ => {}
            }
        }
        let _guard = lock_env(overrides);

        let settings = load_from_empty_args();
        assert_eq!(settings.alert_service().lookup_chunk_size, 10);
        assert_eq!(settings.watchdog().max_gap_hours, 4);
    }
}
