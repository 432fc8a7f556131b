//! Inbound adapters that translate external triggers into domain service
//! calls while keeping framework details at the edge.
//!
//! Event deliveries and task calls arrive over [`http`]; [`schedule`] drives
//! the SLA watchdog from inside the process.

pub mod http;
pub mod schedule;
