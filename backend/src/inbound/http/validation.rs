//! Shared validation helpers for inbound HTTP adapters.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{BlankDocumentId, Error};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidTimestamp,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

/// Parse a required document id, rejecting blank values.
pub(crate) fn parse_document_id<T>(
    value: String,
    field: FieldName,
    parse: impl FnOnce(String) -> Result<T, BlankDocumentId>,
) -> Result<T, Error> {
    parse(value).map_err(|_| missing_field_error(field))
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: String,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, &value))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ErrorCode as DomainErrorCode, LogId};
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_ids_are_missing_fields(#[case] raw: &str) {
        let err = parse_document_id(raw.to_owned(), FieldName::new("log_id"), LogId::parse)
            .expect_err("blank id rejected");
        assert_eq!(err.code(), DomainErrorCode::InvalidRequest);
        assert_eq!(
            err.details(),
            Some(&json!({ "field": "log_id", "code": "missing_field" }))
        );
    }

    #[test]
    fn timestamps_are_normalised_to_utc() {
        let parsed = parse_rfc3339_timestamp(
            "2026-03-02T14:00:00+02:00".to_owned(),
            FieldName::new("created_at"),
        )
        .expect("valid timestamp");
        assert_eq!(parsed.to_rfc3339(), "2026-03-02T12:00:00+00:00");
    }

    #[test]
    fn malformed_timestamps_echo_the_value() {
        let err = parse_rfc3339_timestamp("yesterday".to_owned(), FieldName::new("created_at"))
            .expect_err("rejected");
        assert_eq!(
            err.details(),
            Some(&json!({
                "field": "created_at",
                "value": "yesterday",
                "code": "invalid_timestamp",
            }))
        );
    }
}
