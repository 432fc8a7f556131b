//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::Error;
use crate::domain::ports::{
    DailyStatsCommand, FixtureDailyStatsCommand, FixtureLogCreatedCommand,
    FixtureOccupantFeedbackCommand, FixtureSlaSweepCommand, LogCreatedCommand,
    OccupantFeedbackCommand, SlaSweepCommand,
};

/// Default bound on one handler invocation.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(55);

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Log-created reactor.
    pub log_created: Arc<dyn LogCreatedCommand>,
    /// Daily counter aggregator.
    pub daily_stats: Arc<dyn DailyStatsCommand>,
    /// Occupant feedback reactor.
    pub feedback: Arc<dyn OccupantFeedbackCommand>,
    /// SLA watchdog sweep.
    pub sla_sweep: Arc<dyn SlaSweepCommand>,
}

impl Default for HttpStatePorts {
    fn default() -> Self {
        Self {
            log_created: Arc::new(FixtureLogCreatedCommand),
            daily_stats: Arc::new(FixtureDailyStatsCommand),
            feedback: Arc::new(FixtureOccupantFeedbackCommand),
            sla_sweep: Arc::new(FixtureSlaSweepCommand),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Log-created reactor.
    pub log_created: Arc<dyn LogCreatedCommand>,
    /// Daily counter aggregator.
    pub daily_stats: Arc<dyn DailyStatsCommand>,
    /// Occupant feedback reactor.
    pub feedback: Arc<dyn OccupantFeedbackCommand>,
    /// SLA watchdog sweep.
    pub sla_sweep: Arc<dyn SlaSweepCommand>,
    /// Invocations running longer than this answer 503 so the delivery
    /// layer retries.
    pub handler_timeout: Duration,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports, DEFAULT_HANDLER_TIMEOUT)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    ///
    /// use vericlean::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts::default(), Duration::from_secs(5));
    /// assert_eq!(state.handler_timeout, Duration::from_secs(5));
    /// ```
    pub fn new(ports: HttpStatePorts, handler_timeout: Duration) -> Self {
        let HttpStatePorts {
            log_created,
            daily_stats,
            feedback,
            sla_sweep,
        } = ports;
        Self {
            log_created,
            daily_stats,
            feedback,
            sla_sweep,
            handler_timeout,
        }
    }

    /// Drive `fut` to completion within [`HttpState::handler_timeout`].
    ///
    /// An elapsed deadline becomes [`Error::service_unavailable`], so the
    /// delivery layer redelivers the document.
    pub(crate) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        if let Ok(result) = tokio::time::timeout(self.handler_timeout, fut).await {
            result
        } else {
            warn!(operation, timeout = ?self.handler_timeout, "handler deadline elapsed");
            Err(Error::service_unavailable(format!("{operation} timed out")))
        }
    }
}
