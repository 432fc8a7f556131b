//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories (Diesel) behind every port
//!
//! Adapters are thin translators between domain types and the storage
//! representation. They contain no business logic.

pub mod persistence;
