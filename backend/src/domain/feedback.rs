//! Occupant feedback submitted from the public QR page.

use serde::{Deserialize, Serialize};

use crate::domain::{CheckpointId, FeedbackId};

const NO_DETAILS: &str = "No details provided";

/// Feedback type. Only the listed negative kinds act on cleaning logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedbackKind {
    /// `BAD_SMELL`.
    BadSmell,
    /// `DIRTY`.
    Dirty,
    /// `SPILL`.
    Spill,
    /// `ISSUE`.
    Issue,
    /// `OTHER`.
    Other,
    /// Anything outside the negative vocabulary, such as praise.
    Unrecognised(String),
}

impl FeedbackKind {
    /// Stored document value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BadSmell => "BAD_SMELL",
            Self::Dirty => "DIRTY",
            Self::Spill => "SPILL",
            Self::Issue => "ISSUE",
            Self::Other => "OTHER",
            Self::Unrecognised(raw) => raw.as_str(),
        }
    }

    /// Whether this feedback casts doubt on the latest verified cleaning.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        !matches!(self, Self::Unrecognised(_))
    }
}

impl From<String> for FeedbackKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "BAD_SMELL" => Self::BadSmell,
            "DIRTY" => Self::Dirty,
            "SPILL" => Self::Spill,
            "ISSUE" => Self::Issue,
            "OTHER" => Self::Other,
            _ => Self::Unrecognised(value),
        }
    }
}

impl From<FeedbackKind> for String {
    fn from(value: FeedbackKind) -> Self {
        match value {
            FeedbackKind::Unrecognised(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

/// Feedback document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupantFeedback {
    /// Document id.
    pub id: FeedbackId,
    /// Checkpoint the occupant scanned.
    pub checkpoint_id: CheckpointId,
    /// Feedback type.
    pub kind: FeedbackKind,
    /// Free-text comment.
    pub details: Option<String>,
}

impl OccupantFeedback {
    /// Reason recorded on the cleaning log this feedback flags.
    ///
    /// # Examples
    /// ```
    /// use vericlean::domain::{FeedbackKind, OccupantFeedback};
    ///
    /// let feedback = OccupantFeedback {
    ///     id: "fb_1".into(),
    ///     checkpoint_id: "cp_1".into(),
    ///     kind: FeedbackKind::Spill,
    ///     details: None,
    /// };
    /// assert_eq!(feedback.flag_reason(), "Occupant reported SPILL: No details provided");
    /// ```
    #[must_use]
    pub fn flag_reason(&self) -> String {
        let details = self
            .details
            .as_deref()
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_DETAILS);
        format!("Occupant reported {}: {details}", self.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("BAD_SMELL", true)]
    #[case("DIRTY", true)]
    #[case("SPILL", true)]
    #[case("ISSUE", true)]
    #[case("OTHER", true)]
    #[case("PRAISE", false)]
    #[case("spill", false)]
    fn negative_vocabulary(#[case] raw: &str, #[case] negative: bool) {
        assert_eq!(FeedbackKind::from(raw.to_owned()).is_negative(), negative);
    }

    #[test]
    fn flag_reason_embeds_details() {
        let feedback = OccupantFeedback {
            id: FeedbackId::new("fb_1"),
            checkpoint_id: CheckpointId::new("cp_1"),
            kind: FeedbackKind::BadSmell,
            details: Some("near the sinks".to_owned()),
        };
        assert_eq!(
            feedback.flag_reason(),
            "Occupant reported BAD_SMELL: near the sinks"
        );
    }
}
