//! Port for appending SLA audit events.

use async_trait::async_trait;

use crate::domain::{SlaEvent, SlaEventId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by SLA event repository adapters.
    pub enum SlaEventRepositoryError {
        /// Repository connection could not be established.
        [transient]
        Connection { message: String } =>
            "sla event repository connection failed: {message}",
        /// Insert failed during execution.
        Write { message: String } =>
            "sla event repository write failed: {message}",
    }
}

/// Append-only access to `sla_events`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlaEventRepository: Send + Sync {
    /// Persist a new event and return its id.
    async fn append(&self, event: SlaEvent) -> Result<SlaEventId, SlaEventRepositoryError>;
}

/// Fixture implementation that discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSlaEventRepository;

#[async_trait]
impl SlaEventRepository for FixtureSlaEventRepository {
    async fn append(&self, _event: SlaEvent) -> Result<SlaEventId, SlaEventRepositoryError> {
        Ok(SlaEventId::new("fixture-sla-event"))
    }
}
