//! Cleaning verification record produced by the mobile capture flow.
//!
//! Logs are immutable once created; the only later mutation is the
//! occupant-feedback override of `verification_result`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BuildingId, CheckpointId, CleanerId, LogId};

/// Outcome of the capture-time verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    /// Passed verification; drives freshness and streaks.
    Verified,
    /// Failed verification.
    Rejected,
    /// Held for a supervisor, e.g. after occupant feedback.
    FlaggedForReview,
    /// Any status this service does not act on.
    Other(String),
}

impl VerificationStatus {
    /// Stored document value, e.g. `flagged_for_review`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::FlaggedForReview => "flagged_for_review",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for VerificationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "verified" => Self::Verified,
            "rejected" => Self::Rejected,
            "flagged_for_review" => Self::FlaggedForReview,
            _ => Self::Other(value),
        }
    }
}

impl From<VerificationStatus> for String {
    fn from(value: VerificationStatus) -> Self {
        match value {
            VerificationStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl Serialize for VerificationStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VerificationStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Verification verdict and the optional reason attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Verdict.
    pub status: VerificationStatus,
    /// Why the log was flagged for review.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
    /// Why the log was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl VerificationResult {
    /// A verdict with no reasons attached.
    #[must_use]
    pub fn with_status(status: VerificationStatus) -> Self {
        Self {
            status,
            flag_reason: None,
            rejection_reason: None,
        }
    }
}

/// Geolocation captured with the NFC tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Reported accuracy radius in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Evidence that the cleaner was physically present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofOfPresence {
    /// Hash of the tag payload read at the checkpoint.
    #[serde(default)]
    pub nfc_payload_hash: Option<String>,
    /// Device-reported tap time, as sent.
    #[serde(default)]
    pub nfc_tap_timestamp: Option<String>,
    /// Position at tap time.
    #[serde(default)]
    pub geo_location: Option<GeoLocation>,
}

/// One object reported by the photo inference pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Object class, e.g. `wet_floor`.
    pub label: String,
    /// Detector confidence in `0..=1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Photo inference output. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofOfQuality {
    /// Cleanliness score out of 100.
    #[serde(default)]
    pub overall_score: Option<f64>,
    /// Model that produced the score.
    #[serde(default)]
    pub ai_model_used: Option<String>,
    /// Objects found in the photo.
    #[serde(default)]
    pub detected_objects: Option<Vec<DetectedObject>>,
}

/// Cleaning log document.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningLog {
    /// Document id.
    pub id: LogId,
    /// Cleaner who submitted the log.
    pub cleaner_id: CleanerId,
    /// Checkpoint that was cleaned.
    pub checkpoint_id: CheckpointId,
    /// Building owning the checkpoint.
    pub building_id: BuildingId,
    /// Capture time; used as the cleaning time.
    pub created_at: DateTime<Utc>,
    /// NFC and location evidence.
    pub proof_of_presence: Option<ProofOfPresence>,
    /// Photo inference output.
    pub proof_of_quality: Option<ProofOfQuality>,
    /// Verdict, overridable by occupant feedback.
    pub verification_result: VerificationResult,
}

impl CleaningLog {
    /// Quality score, defaulting to zero when inference did not run.
    ///
    /// # Examples
    /// ```
    /// # use chrono::Utc;
    /// # use vericlean::domain::{CleaningLog, VerificationResult, VerificationStatus};
    /// let log = CleaningLog {
    ///     id: "log_1".into(),
    ///     cleaner_id: "cleaner_1".into(),
    ///     checkpoint_id: "cp_1".into(),
    ///     building_id: "bldg_1".into(),
    ///     created_at: Utc::now(),
    ///     proof_of_presence: None,
    ///     proof_of_quality: None,
    ///     verification_result: VerificationResult::with_status(VerificationStatus::Verified),
    /// };
    /// assert_eq!(log.quality_score(), 0.0);
    /// ```
    #[must_use]
    pub fn quality_score(&self) -> f64 {
        self.proof_of_quality
            .as_ref()
            .and_then(|quality| quality.overall_score)
            .unwrap_or(0.0)
    }

    /// Labels of detected hazards; empty when absent or null.
    #[must_use]
    pub fn hazard_labels(&self) -> Vec<String> {
        self.proof_of_quality
            .as_ref()
            .and_then(|quality| quality.detected_objects.as_ref())
            .map(|objects| objects.iter().map(|o| o.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Current verdict.
    #[must_use]
    pub fn status(&self) -> &VerificationStatus {
        &self.verification_result.status
    }

    /// Whether the verdict is `verified`.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self.status(), VerificationStatus::Verified)
    }
}
