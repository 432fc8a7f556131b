//! Domain-level error type.
//!
//! These errors are transport agnostic. The HTTP adapter maps them to status
//! codes; the event-delivery layer treats any retryable failure as a request
//! to redeliver the triggering document.

use serde::Serialize;
use serde_json::Value;

use crate::domain::CorrelationId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The delivered document or request is malformed.
    InvalidRequest,
    /// The requested resource does not exist.
    NotFound,
    /// The operation lost a race against a concurrent writer.
    Conflict,
    /// A backing store is temporarily unreachable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

impl ErrorCode {
    /// Return true when redelivering the triggering event may succeed.
    ///
    /// # Examples
    /// ```
    /// use vericlean::domain::ErrorCode;
    ///
    /// assert!(ErrorCode::ServiceUnavailable.is_retryable());
    /// assert!(!ErrorCode::InvalidRequest.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Conflict | Self::ServiceUnavailable | Self::InternalError
        )
    }
}

/// Domain error payload.
///
/// The active [`CorrelationId`] is captured on construction so logs and
/// error responses for one delivery can be joined.
///
/// # Examples
/// ```
/// use vericlean::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("checkpoint cp_001 not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "checkpoint cp_001 not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl Error {
    /// Create a new error, capturing the correlation identifier in scope.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            correlation_id: CorrelationId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured when the error was raised.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Supplementary error details.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach a correlation identifier explicitly.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use vericlean::domain::Error;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "log_id" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ErrorCode::InvalidRequest, false)]
    #[case(ErrorCode::NotFound, false)]
    #[case(ErrorCode::Conflict, true)]
    #[case(ErrorCode::ServiceUnavailable, true)]
    #[case(ErrorCode::InternalError, true)]
    fn retryable_codes_trigger_redelivery(#[case] code: ErrorCode, #[case] expected: bool) {
        assert_eq!(code.is_retryable(), expected);
    }

    #[tokio::test]
    async fn captures_correlation_id_in_scope() {
        let id = CorrelationId::from_delivery("delivery-42").expect("valid id");
        let err = CorrelationId::scope(id, async { Error::internal("boom") }).await;
        assert_eq!(err.correlation_id(), Some("delivery-42"));
    }

    #[test]
    fn serialises_camel_case_without_empty_fields() {
        let err = Error::invalid_request("bad").with_details(json!({ "field": "log_id" }));
        let value = serde_json::to_value(&err).expect("serialise error");
        assert_eq!(value["code"], "invalid_request");
        assert_eq!(value["details"]["field"], "log_id");
        assert!(value.get("correlationId").is_none());
    }
}
