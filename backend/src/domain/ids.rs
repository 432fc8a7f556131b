//! Document identifiers for the entity store collections.
//!
//! Identifiers are opaque strings chosen by the store (for example
//! `cp_001`). Each collection gets its own newtype so a checkpoint id can
//! never be passed where a cleaner id is expected.

use std::fmt;

/// Validation error raised when an identifier is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("document identifier must not be blank")]
pub struct BlankDocumentId;

macro_rules! define_document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier without validation.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Wrap an identifier, rejecting blank input.
            pub fn parse(value: impl Into<String>) -> Result<Self, BlankDocumentId> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(BlankDocumentId);
                }
                Ok(Self(value))
            }

            /// Borrow the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_document_id! {
    /// Identifier of a `buildings` document.
    BuildingId
}

define_document_id! {
    /// Identifier of a `checkpoints` document.
    CheckpointId
}

define_document_id! {
    /// Identifier of a `cleaning_logs` document.
    LogId
}

define_document_id! {
    /// Identifier of a `users` document for a cleaner.
    CleanerId
}

define_document_id! {
    /// Identifier of an `alerts` document.
    AlertId
}

define_document_id! {
    /// Identifier of an `sla_events` document.
    SlaEventId
}

define_document_id! {
    /// Identifier of an `occupant_feedback` document.
    FeedbackId
}
