//! Tests for the alert service.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{AlertRepositoryError, MockAlertRepository};
use crate::domain::{Alert, AlertId, BuildingId, ErrorCode};
use crate::test_support::{LogBuilder, MutableClock, at};

#[fixture]
fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(at("2026-03-02T12:00:00Z")))
}

fn service(repo: MockAlertRepository, clock: Arc<MutableClock>) -> AlertService {
    AlertService::new(Arc::new(repo), clock, AlertServiceConfig::default())
}

fn open_alert(id: &str, checkpoint: &str) -> Alert {
    Alert::open(
        AlertId::new(id),
        NewAlert {
            checkpoint_id: CheckpointId::new(checkpoint),
            building_id: BuildingId::new("bldg_001"),
            kind: AlertKind::SlaMissingClean,
            severity: AlertSeverity::Medium,
            message: None,
            details: AlertDetails::MissingClean {
                hours_overdue: Some(5.0),
                sla_threshold_hours: 4,
                last_cleaned_at: None,
            },
            related_log_id: None,
            created_at: at("2026-03-02T08:00:00Z"),
        },
    )
}

#[rstest]
#[case(Some(70.0), &[], None)]
#[case(Some(69.0), &[], Some(AlertKind::QualityFailure))]
#[case(Some(100.0), &["wet_floor"], Some(AlertKind::SafetyHazard))]
#[case(Some(10.0), &["wet_floor"], Some(AlertKind::SafetyHazard))]
#[case(None, &[], Some(AlertKind::QualityFailure))]
fn classification_follows_precedence(
    clock: Arc<MutableClock>,
    #[case] score: Option<f64>,
    #[case] hazards: &[&str],
    #[case] expected: Option<AlertKind>,
) {
    let log = LogBuilder::verified("log_1", "cp_001", clock.utc())
        .score(score)
        .hazards(hazards)
        .build();
    let svc = service(MockAlertRepository::new(), clock);
    assert_eq!(svc.classify_inspection(&log), expected);
}

#[rstest]
#[tokio::test]
async fn score_69_creates_quality_failure_with_score(clock: Arc<MutableClock>) {
    let log = LogBuilder::verified("log_69", "cp_001", clock.utc())
        .score(Some(69.0))
        .build();
    let mut repo = MockAlertRepository::new();
    repo.expect_insert()
        .withf(|alert| {
            alert.kind == AlertKind::QualityFailure
                && alert.severity == AlertSeverity::High
                && alert.related_log_id == Some(LogId::new("log_69"))
                && alert.details
                    == AlertDetails::Inspection {
                        score: 69.0,
                        detected_hazards: Vec::new(),
                    }
        })
        .times(1)
        .return_once(|_| Ok(AlertId::new("alert_1")));

    let raised = service(repo, clock)
        .create_safety_alert(&log)
        .await
        .expect("alert created");

    assert_eq!(
        raised,
        Some(SafetyAlertRaised {
            alert_id: AlertId::new("alert_1"),
            kind: AlertKind::QualityFailure,
        })
    );
}

#[rstest]
#[tokio::test]
async fn missing_quality_defaults_score_to_zero(clock: Arc<MutableClock>) {
    let log = LogBuilder::verified("log_nq", "cp_001", clock.utc())
        .without_quality()
        .build();
    let mut repo = MockAlertRepository::new();
    repo.expect_insert()
        .withf(|alert| {
            matches!(
                &alert.details,
                AlertDetails::Inspection { score, detected_hazards }
                    if *score == 0.0 && detected_hazards.is_empty()
            )
        })
        .times(1)
        .return_once(|_| Ok(AlertId::new("alert_2")));

    let raised = service(repo, clock)
        .create_safety_alert(&log)
        .await
        .expect("alert created");

    assert_eq!(raised.map(|r| r.kind), Some(AlertKind::QualityFailure));
}

#[rstest]
#[tokio::test]
async fn passing_log_writes_nothing(clock: Arc<MutableClock>) {
    let log = LogBuilder::verified("log_ok", "cp_001", clock.utc())
        .score(Some(70.0))
        .build();
    let mut repo = MockAlertRepository::new();
    repo.expect_insert().never();

    let raised = service(repo, clock)
        .create_safety_alert(&log)
        .await
        .expect("no alert");

    assert!(raised.is_none());
}

#[rstest]
#[tokio::test]
async fn insert_failure_is_service_unavailable(clock: Arc<MutableClock>) {
    let log = LogBuilder::verified("log_bad", "cp_001", clock.utc())
        .score(Some(10.0))
        .build();
    let mut repo = MockAlertRepository::new();
    repo.expect_insert()
        .times(1)
        .return_once(|_| Err(AlertRepositoryError::connection("timeout")));

    let err = service(repo, clock)
        .create_safety_alert(&log)
        .await
        .expect_err("insert fails");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn resolve_without_open_alerts_performs_no_writes(clock: Arc<MutableClock>) {
    let mut repo = MockAlertRepository::new();
    repo.expect_find_open()
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));
    repo.expect_resolve_batch().never();

    let resolved = service(repo, clock)
        .resolve_missing_clean_alerts(&CheckpointId::new("cp_001"), &LogId::new("log_1"))
        .await
        .expect("resolve succeeds");

    assert_eq!(resolved, 0);
}

#[rstest]
#[tokio::test]
async fn resolve_closes_all_open_alerts_in_one_batch(clock: Arc<MutableClock>) {
    let now = clock.utc();
    let mut repo = MockAlertRepository::new();
    repo.expect_find_open()
        .withf(|ids, kind| {
            ids.to_vec() == vec![CheckpointId::new("cp_001")] && *kind == AlertKind::SlaMissingClean
        })
        .times(1)
        .return_once(|_, _| Ok(vec![open_alert("a1", "cp_001"), open_alert("a2", "cp_001")]));
    repo.expect_resolve_batch()
        .withf(move |ids, resolution| {
            ids.to_vec() == vec![AlertId::new("a1"), AlertId::new("a2")]
                && resolution.resolved_at == now
                && resolution.resolved_by_log_id == LogId::new("log_9")
        })
        .times(1)
        .return_once(|ids, _| Ok(ids.len()));

    let resolved = service(repo, clock)
        .resolve_missing_clean_alerts(&CheckpointId::new("cp_001"), &LogId::new("log_9"))
        .await
        .expect("resolve succeeds");

    assert_eq!(resolved, 2);
}

#[rstest]
#[tokio::test]
async fn open_alert_lookup_is_chunked(clock: Arc<MutableClock>) {
    let ids: Vec<CheckpointId> = (0..23)
        .map(|n| CheckpointId::new(format!("cp_{n:03}")))
        .collect();
    let mut repo = MockAlertRepository::new();
    repo.expect_find_open()
        .withf(|chunk, _| chunk.len() <= DEFAULT_LOOKUP_CHUNK_SIZE)
        .times(3)
        .returning(|chunk, _| {
            Ok(chunk
                .iter()
                .filter(|id| id.as_str() == "cp_004" || id.as_str() == "cp_017")
                .map(|id| open_alert("existing", id.as_str()))
                .collect())
        });

    let alerted = service(repo, clock)
        .checkpoints_with_open_missing_clean(&ids)
        .await
        .expect("lookup succeeds");

    assert_eq!(alerted.len(), 2);
    assert!(alerted.contains(&CheckpointId::new("cp_017")));
}

#[rstest]
#[tokio::test]
async fn empty_missing_clean_batch_skips_the_store(clock: Arc<MutableClock>) {
    let mut repo = MockAlertRepository::new();
    repo.expect_insert_deduplicated_batch().never();

    let outcome = service(repo, clock)
        .create_missing_clean_alerts(Vec::new())
        .await
        .expect("no-op succeeds");

    assert_eq!(outcome, DeduplicatedInsert::default());
}
