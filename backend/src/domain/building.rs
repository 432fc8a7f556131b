//! Building aggregate and its SLA configuration.

use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::domain::BuildingId;
use crate::domain::sla;

/// Per-building cleaning agreement.
///
/// The cleaning window is informational; the SLA interval ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSlaConfig {
    /// Cleanings the client pays for per day.
    pub required_cleanings_per_day: i64,
    /// Start of the cleaning window, local time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaning_window_start: Option<NaiveTime>,
    /// End of the cleaning window, local time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaning_window_end: Option<NaiveTime>,
}

impl ClientSlaConfig {
    /// Configuration requiring `required` cleanings per day with no window.
    #[must_use]
    pub fn per_day(required: i64) -> Self {
        Self {
            required_cleanings_per_day: required,
            cleaning_window_start: None,
            cleaning_window_end: None,
        }
    }

    /// Longest tolerated interval between two verified cleanings.
    #[must_use]
    pub fn max_gap(&self) -> TimeDelta {
        sla::max_gap(self.required_cleanings_per_day)
    }
}

/// A facility owning a set of checkpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Building {
    /// Document id.
    pub id: BuildingId,
    /// Display name.
    pub name: Option<String>,
    /// Cleaning agreement.
    pub client_sla_config: ClientSlaConfig,
}

impl Building {
    /// An unnamed building under `client_sla_config`.
    pub fn new(id: BuildingId, client_sla_config: ClientSlaConfig) -> Self {
        Self {
            id,
            name: None,
            client_sla_config,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn max_gap_follows_required_cleanings() {
        let building = Building::new(BuildingId::new("bldg_001"), ClientSlaConfig::per_day(6));
        assert_eq!(building.client_sla_config.max_gap(), TimeDelta::hours(4));
    }

    #[test]
    fn sla_config_reads_window_times() {
        let config: ClientSlaConfig = serde_json::from_value(serde_json::json!({
            "required_cleanings_per_day": 3,
            "cleaning_window_start": "06:00:00",
            "cleaning_window_end": "22:00:00"
        }))
        .expect("valid config");
        assert_eq!(
            config.cleaning_window_start,
            NaiveTime::from_hms_opt(6, 0, 0)
        );
        assert_eq!(config.max_gap(), TimeDelta::hours(8));
    }
}
