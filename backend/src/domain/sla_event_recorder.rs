//! Audit trail for recovered SLA breaches.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::{SlaEventRepository, map_port_error};
use crate::domain::{BreachRecovery, Error, SlaEvent, SlaEventId};

/// Appends SLA_BREACH_RECOVERED events. Events are never read back here.
#[derive(Clone)]
pub struct SlaEventRecorder {
    events: Arc<dyn SlaEventRepository>,
    clock: Arc<dyn Clock>,
}

impl SlaEventRecorder {
    /// Recorder appending to `events`.
    pub fn new(events: Arc<dyn SlaEventRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { events, clock }
    }

    /// Append a breach-recovery event and return its id.
    ///
    /// # Errors
    ///
    /// Returns service-unavailable for transient store failures, internal
    /// otherwise.
    pub async fn record_breach_recovery(
        &self,
        recovery: BreachRecovery,
    ) -> Result<SlaEventId, Error> {
        let event = SlaEvent::breach_recovered(recovery, self.clock.utc());
        let checkpoint_id = event.checkpoint_id.clone();
        let gap_hours = event.gap_duration_hours;
        let allowed_hours = event.allowed_duration_hours;
        let id = self.events.append(event).await.map_err(map_port_error)?;
        info!(
            checkpoint_id = %checkpoint_id,
            event_id = %id,
            gap_hours,
            allowed_hours,
            "sla breach recovered"
        );
        Ok(id)
    }
}
