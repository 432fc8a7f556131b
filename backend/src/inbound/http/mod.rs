//! HTTP inbound adapter exposing the event and task endpoints.
//!
//! Endpoints accept documents pushed by the event-delivery layer. A 2xx
//! answer acknowledges the delivery; 5xx asks for redelivery; 4xx marks the
//! document as undeliverable.

pub mod error;
pub mod events;
pub mod health;
pub mod schemas;
pub mod state;
pub mod tasks;
pub mod validation;

pub use error::ApiResult;
