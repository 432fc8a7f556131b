//! Personal data never survives sanitisation of delivered documents.

use rstest::rstest;
use serde_json::{Value, json};
use vericlean::domain::privacy::{SanitisationPurpose, sanitise_document};

fn delivered_log() -> Value {
    json!({
        "log_id": "log_001",
        "log": {
            "cleaner_id": "cleaner_001",
            "checkpoint_id": "cp_001",
            "proof_of_presence": {
                "nfc_payload_hash": "abc",
                "geo_location": {"lat": 51.5, "lng": -0.12}
            },
            "proof_of_quality": {"overall_score": 64.0, "detected_objects": [{"label": "spill"}]}
        },
        "reviewers": [{"email": "sup@example.com", "role": "supervisor"}]
    })
}

#[rstest]
#[case(SanitisationPurpose::AiAnalysis)]
#[case(SanitisationPurpose::ExternalTicket)]
fn nested_identity_fields_are_removed(#[case] purpose: SanitisationPurpose) {
    let (clean, audit) = sanitise_document(&delivered_log(), purpose);

    let mut removed = audit.fields_removed.clone();
    removed.sort();
    assert_eq!(
        removed,
        vec![
            "log.cleaner_id",
            "log.proof_of_presence.geo_location",
            "log.proof_of_presence.nfc_payload_hash",
            "reviewers[0].email",
        ]
    );
    assert_eq!(audit.purpose, purpose);
    assert_eq!(clean["log"]["checkpoint_id"], "cp_001");
    assert_eq!(clean["log"]["proof_of_quality"]["overall_score"], 64.0);
    assert_eq!(clean["reviewers"][0], json!({"role": "supervisor"}));
}

#[test]
fn documents_without_personal_fields_are_unchanged() {
    let alert = json!({"type": "SLA_MISSING_CLEAN", "details": {"hours_overdue": 5.0}});

    let (clean, audit) = sanitise_document(&alert, SanitisationPurpose::AiAnalysis);

    assert_eq!(clean, alert);
    assert!(audit.fields_removed.is_empty());
}
