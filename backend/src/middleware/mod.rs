//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such
//! as delivery correlation.

pub mod correlation;

pub use correlation::{CORRELATION_ID_HEADER, Correlation, DELIVERY_ID_HEADER};
