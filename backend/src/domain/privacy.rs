//! Strip cleaner identity from documents before they leave the service.
//!
//! Alerts and logs are sometimes summarised by an external AI service. Only
//! facility data may be shared; anything identifying a worker is removed at
//! every nesting level.
//!
//! [`sanitise_document`] is an integration entry point for the component
//! that forwards documents to the AI service. No HTTP route calls it.

use serde_json::{Map, Value};

/// Keys that identify a person, wherever they appear.
const PERSONAL_FIELDS: &[&str] = &[
    "cleaner_id",
    "cleaner_name",
    "display_name",
    "email",
    "phone",
    "uid",
    "user_id",
    "nfc_payload_hash",
    "geo_location",
];

/// Why a document was sanitised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitisationPurpose {
    /// Summarisation by the external AI service.
    AiAnalysis,
    /// Ticket payload for an incident tracker.
    ExternalTicket,
}

impl SanitisationPurpose {
    /// Label used in compliance logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AiAnalysis => "ai_analysis",
            Self::ExternalTicket => "external_ticket",
        }
    }
}

/// Record of what was removed, kept for compliance logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyAudit {
    /// Destination the document was prepared for.
    pub purpose: SanitisationPurpose,
    /// Dotted paths of removed fields, e.g. `details.cleaner_id`.
    pub fields_removed: Vec<String>,
}

/// Return a copy of `document` without personal fields, plus the audit.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use vericlean::domain::privacy::{sanitise_document, SanitisationPurpose};
///
/// let (clean, audit) = sanitise_document(
///     &json!({ "type": "SUPERVISOR_AUDIT_REQUEST", "details": { "cleaner_id": "u1", "streak": 10 } }),
///     SanitisationPurpose::AiAnalysis,
/// );
/// assert_eq!(clean, json!({ "type": "SUPERVISOR_AUDIT_REQUEST", "details": { "streak": 10 } }));
/// assert_eq!(audit.fields_removed, vec!["details.cleaner_id"]);
/// ```
#[must_use]
pub fn sanitise_document(document: &Value, purpose: SanitisationPurpose) -> (Value, PrivacyAudit) {
    let mut removed = Vec::new();
    let sanitised = strip(document, "", &mut removed);
    let audit = PrivacyAudit {
        purpose,
        fields_removed: removed,
    };
    if !audit.fields_removed.is_empty() {
        tracing::debug!(
            purpose = purpose.as_str(),
            removed = audit.fields_removed.len(),
            "personal fields removed"
        );
    }
    (sanitised, audit)
}

fn strip(value: &Value, path: &str, removed: &mut Vec<String>) -> Value {
    match value {
        Value::Object(fields) => {
            let mut kept = Map::with_capacity(fields.len());
            for (key, child) in fields {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                if PERSONAL_FIELDS.contains(&key.as_str()) {
                    removed.push(child_path);
                } else {
                    kept.insert(key.clone(), strip(child, &child_path, removed));
                }
            }
            Value::Object(kept)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| strip(item, &format!("{path}[{index}]"), removed))
                .collect(),
        ),
        other => other.clone(),
    }
}
