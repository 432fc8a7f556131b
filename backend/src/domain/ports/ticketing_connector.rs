//! Port for external incident trackers.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::domain::ticketing::{ExternalSystem, TicketRequest, TicketResponse};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ticketing connectors.
    pub enum TicketingConnectorError {
        /// The tracker could not be reached.
        [transient]
        Unreachable { message: String } =>
            "ticketing system unreachable: {message}",
        /// The tracker refused the ticket.
        Rejected { message: String } =>
            "ticketing system rejected the ticket: {message}",
    }
}

/// Connection to one incident tracker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketingConnector: Send + Sync {
    fn system(&self) -> ExternalSystem;

    /// Whether real credentials are present.
    fn is_configured(&self) -> bool;

    async fn create_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<TicketResponse, TicketingConnectorError>;
}

/// Connector in mock mode: never configured, always succeeds, and hands out
/// sequential ticket ids.
#[derive(Debug)]
pub struct FixtureTicketingConnector {
    system: ExternalSystem,
    next: AtomicU32,
}

impl FixtureTicketingConnector {
    /// A connector answering as `system`, numbering tickets from 1.
    #[must_use]
    pub fn new(system: ExternalSystem) -> Self {
        Self {
            system,
            next: AtomicU32::new(1),
        }
    }
}

#[async_trait]
impl TicketingConnector for FixtureTicketingConnector {
    fn system(&self) -> ExternalSystem {
        self.system
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn create_ticket(
        &self,
        request: &TicketRequest,
    ) -> Result<TicketResponse, TicketingConnectorError> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let (ticket_id, ticket_url) = match self.system {
            ExternalSystem::ServiceNow => {
                let id = format!("INC{n:07}");
                let url = format!("https://mock.service-now.com/incident/{id}");
                (id, url)
            }
            ExternalSystem::Jira => {
                let id = format!("CLEAN-{n}");
                let url = format!("https://mock-jira.atlassian.net/browse/{id}");
                (id, url)
            }
        };
        tracing::info!(
            system = self.system.as_str(),
            ticket_id = %ticket_id,
            alert_id = %request.alert_id,
            priority = request.priority.level(),
            "mock ticket created"
        );
        Ok(TicketResponse {
            success: true,
            ticket_id: Some(ticket_id),
            ticket_url: Some(ticket_url),
            external_system: self.system,
            error: None,
        })
    }
}
