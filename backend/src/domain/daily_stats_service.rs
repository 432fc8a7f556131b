//! Folds created cleaning logs into per-building daily counters.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error};

use crate::domain::ports::{
    DailyStatsCommand, DailyStatsOutcome, DailyStatsRepository, map_port_error,
};
use crate::domain::{CleaningLog, DailyStatsIncrement, DailyStatsKey, Error};

/// Maintains `stats_daily` documents. The log id keeps redelivery from
/// double counting.
#[derive(Clone)]
pub struct DailyStatsAggregator {
    stats: Arc<dyn DailyStatsRepository>,
    clock: Arc<dyn Clock>,
}

impl DailyStatsAggregator {
    /// Aggregator writing through `stats`.
    pub fn new(stats: Arc<dyn DailyStatsRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { stats, clock }
    }
}

#[async_trait]
impl DailyStatsCommand for DailyStatsAggregator {
    async fn record_log(&self, log: CleaningLog) -> Result<DailyStatsOutcome, Error> {
        let key = DailyStatsKey::for_log(&log.building_id, log.created_at);
        let increment = DailyStatsIncrement {
            key: key.clone(),
            log_id: log.id.clone(),
            verified: log.is_verified(),
            score: log.quality_score(),
            at: self.clock.utc(),
        };
        let counted = self.stats.apply(increment).await.map_err(|err| {
            error!(log_id = %log.id, stats_key = %key, error = %err, "daily stats update failed");
            map_port_error(err)
        })?;
        if counted {
            debug!(log_id = %log.id, stats_key = %key, "daily stats updated");
            Ok(DailyStatsOutcome::Counted(key))
        } else {
            debug!(log_id = %log.id, stats_key = %key, "log already counted");
            Ok(DailyStatsOutcome::AlreadyCounted(key))
        }
    }
}
