//! Test utilities for the vericlean crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`,
//! through the `test-support` feature).

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::{
    BuildingId, CheckpointId, CleanerId, CleaningLog, DetectedObject, LogId, ProofOfPresence,
    ProofOfQuality, VerificationResult, VerificationStatus,
};

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// A clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Parse an RFC 3339 fixture timestamp.
pub fn at(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(error) => panic!("invalid fixture timestamp {raw}: {error}"),
    }
}

/// Builder for cleaning logs in tests.
#[derive(Debug, Clone)]
pub struct LogBuilder {
    log: CleaningLog,
}

impl LogBuilder {
    /// A verified log with a passing score and no hazards.
    pub fn verified(id: &str, checkpoint: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            log: CleaningLog {
                id: LogId::new(id),
                cleaner_id: CleanerId::new("cleaner_001"),
                checkpoint_id: CheckpointId::new(checkpoint),
                building_id: BuildingId::new("bldg_001"),
                created_at,
                proof_of_presence: Some(ProofOfPresence {
                    nfc_payload_hash: Some("nfc-hash".to_owned()),
                    nfc_tap_timestamp: Some(created_at.to_rfc3339()),
                    geo_location: None,
                }),
                proof_of_quality: Some(ProofOfQuality {
                    overall_score: Some(95.0),
                    ai_model_used: Some("vision-v2".to_owned()),
                    detected_objects: Some(Vec::new()),
                }),
                verification_result: VerificationResult::with_status(VerificationStatus::Verified),
            },
        }
    }

    /// Replace the verdict.
    pub fn status(mut self, status: VerificationStatus) -> Self {
        self.log.verification_result = VerificationResult::with_status(status);
        self
    }

    /// Attribute the log to `cleaner`.
    pub fn cleaner(mut self, cleaner: &str) -> Self {
        self.log.cleaner_id = CleanerId::new(cleaner);
        self
    }

    /// Move the log to `building`.
    pub fn building(mut self, building: &str) -> Self {
        self.log.building_id = BuildingId::new(building);
        self
    }

    /// Set or clear the quality score.
    pub fn score(mut self, score: Option<f64>) -> Self {
        let quality = self.log.proof_of_quality.get_or_insert_with(ProofOfQuality::default);
        quality.overall_score = score;
        self
    }

    /// Report the given objects as detected.
    pub fn hazards(mut self, labels: &[&str]) -> Self {
        let quality = self.log.proof_of_quality.get_or_insert_with(ProofOfQuality::default);
        quality.detected_objects = Some(
            labels
                .iter()
                .map(|label| DetectedObject {
                    label: (*label).to_owned(),
                    confidence: Some(0.9),
                })
                .collect(),
        );
        self
    }

    /// Drop the photo inference output.
    pub fn without_quality(mut self) -> Self {
        self.log.proof_of_quality = None;
        self
    }

    /// Finish the log.
    pub fn build(self) -> CleaningLog {
        self.log
    }
}
