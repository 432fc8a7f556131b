//! Delivery-scoped correlation identifier for logs and errors.
//!
//! Each inbound event delivery (or scheduled sweep) runs inside a
//! [`CorrelationId::scope`]. The identifier is taken from the delivery layer
//! when it supplies one, so redeliveries of the same document share it.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`CorrelationId::scope`] when spawning new tasks so the identifier follows
//! the work.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

const MAX_DELIVERY_ID_LEN: usize = 128;

task_local! {
    static CORRELATION_ID: CorrelationId;
}

/// Correlation identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use vericlean::domain::CorrelationId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let id = CorrelationId::from_delivery("projects/p/messages/17").expect("valid id");
/// let observed = CorrelationId::scope(id.clone(), async { CorrelationId::current() }).await;
/// assert_eq!(observed, Some(id));
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh identifier for work without a delivery id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Adopt an identifier supplied by the delivery layer.
    ///
    /// Blank, oversized, or non-printable values are rejected so they never
    /// reach response headers.
    #[must_use]
    pub fn from_delivery(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let acceptable = !trimmed.is_empty()
            && trimmed.len() <= MAX_DELIVERY_ID_LEN
            && trimmed.chars().all(|c| c.is_ascii_graphic());
        acceptable.then(|| Self(trimmed.to_owned()))
    }

    /// Returns the identifier in scope, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CORRELATION_ID.try_with(Clone::clone).ok()
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Execute the provided future with the supplied identifier in scope.
    pub async fn scope<Fut>(id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CORRELATION_ID.scope(id, fut).await
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn current_is_none_out_of_scope() {
        assert!(CorrelationId::current().is_none());
    }

    #[tokio::test]
    async fn generated_ids_are_uuids() {
        let id = CorrelationId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("has space")]
    #[case("tab\tinside")]
    fn rejects_unusable_delivery_ids(#[case] raw: &str) {
        assert!(CorrelationId::from_delivery(raw).is_none());
    }

    #[test]
    fn rejects_oversized_delivery_ids() {
        let raw = "x".repeat(MAX_DELIVERY_ID_LEN + 1);
        assert!(CorrelationId::from_delivery(&raw).is_none());
    }

    #[test]
    fn trims_delivery_ids() {
        let id = CorrelationId::from_delivery("  abc-123 ").expect("valid id");
        assert_eq!(id.as_str(), "abc-123");
    }
}
