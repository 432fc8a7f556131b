//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use vericlean::inbound::http::state::{DEFAULT_HANDLER_TIMEOUT, HttpStatePorts};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) ports: HttpStatePorts,
    pub(crate) handler_timeout: Duration,
}

impl ServerConfig {
    /// Construct a server configuration around the reactors it serves.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, ports: HttpStatePorts) -> Self {
        Self {
            bind_addr,
            ports,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }

    /// Bound each event invocation; slower calls answer 503.
    #[must_use]
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }
}
