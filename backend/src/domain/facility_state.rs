//! Denormalised checkpoint freshness.
//!
//! The updater is the only writer of `last_cleaned_at` and, with the
//! watchdog, of `current_status`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{CheckpointCleaning, CheckpointRepository, map_port_error};
use crate::domain::{CheckpointId, CleaningTransition, Error};

/// Writes cleaning timestamps and overdue flags onto checkpoints.
#[derive(Clone)]
pub struct FacilityStateUpdater {
    checkpoints: Arc<dyn CheckpointRepository>,
    clock: Arc<dyn Clock>,
}

impl FacilityStateUpdater {
    /// Updater writing through `checkpoints`.
    pub fn new(checkpoints: Arc<dyn CheckpointRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { checkpoints, clock }
    }

    /// Record a verified cleaning at `cleaned_at`, returning what the
    /// checkpoint held before. `None` when the checkpoint does not exist.
    ///
    /// The read of the previous value and the write happen in one store
    /// transaction. Older cleanings never move the timestamp backwards.
    pub async fn update_checkpoint_state(
        &self,
        checkpoint_id: &CheckpointId,
        cleaned_at: DateTime<Utc>,
    ) -> Result<Option<CheckpointCleaning>, Error> {
        let outcome = self
            .checkpoints
            .record_cleaning(checkpoint_id, cleaned_at, self.clock.utc())
            .await
            .map_err(map_port_error)?;
        match &outcome {
            None => warn!(checkpoint_id = %checkpoint_id, "checkpoint not found; state not updated"),
            Some(CheckpointCleaning {
                transition: CleaningTransition::Advanced { previous },
                ..
            }) => info!(
                checkpoint_id = %checkpoint_id,
                cleaned_at = %cleaned_at,
                first_cleaning = previous.is_none(),
                "checkpoint marked clean"
            ),
            Some(CheckpointCleaning {
                transition: CleaningTransition::Stale { current },
                ..
            }) => debug!(
                checkpoint_id = %checkpoint_id,
                cleaned_at = %cleaned_at,
                current = %current,
                "cleaning predates stored timestamp; ignored"
            ),
        }
        Ok(outcome)
    }

    /// Flag checkpoints as OVERDUE in one batch.
    pub async fn mark_overdue(&self, checkpoint_ids: &[CheckpointId]) -> Result<usize, Error> {
        if checkpoint_ids.is_empty() {
            return Ok(0);
        }
        self.checkpoints
            .mark_overdue(checkpoint_ids, self.clock.utc())
            .await
            .map_err(map_port_error)?;
        Ok(checkpoint_ids.len())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{CheckpointRepositoryError, MockCheckpointRepository};
    use crate::domain::{BuildingId, ErrorCode};
    use crate::test_support::{MutableClock, at};

    fn updater(repo: MockCheckpointRepository) -> FacilityStateUpdater {
        FacilityStateUpdater::new(
            Arc::new(repo),
            Arc::new(MutableClock::new(at("2026-03-02T12:00:00Z"))),
        )
    }

    #[tokio::test]
    async fn passes_cleaned_at_and_server_time() {
        let cleaned_at = at("2026-03-02T11:55:00Z");
        let mut repo = MockCheckpointRepository::new();
        repo.expect_record_cleaning()
            .withf(move |id, at_arg, now| {
                id.as_str() == "cp_001"
                    && *at_arg == cleaned_at
                    && *now == at("2026-03-02T12:00:00Z")
            })
            .times(1)
            .return_once(|_, _, _| {
                Ok(Some(CheckpointCleaning {
                    building_id: BuildingId::new("bldg_001"),
                    transition: CleaningTransition::Advanced { previous: None },
                }))
            });

        let outcome = updater(repo)
            .update_checkpoint_state(&CheckpointId::new("cp_001"), cleaned_at)
            .await
            .expect("update succeeds");

        assert!(outcome.is_some());
    }

    #[tokio::test]
    async fn contention_is_retryable() {
        let mut repo = MockCheckpointRepository::new();
        repo.expect_record_cleaning()
            .times(1)
            .return_once(|_, _, _| Err(CheckpointRepositoryError::contention("aborted")));

        let err = updater(repo)
            .update_checkpoint_state(&CheckpointId::new("cp_001"), Utc::now())
            .await
            .expect_err("update fails");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn empty_overdue_batch_is_skipped() {
        let mut repo = MockCheckpointRepository::new();
        repo.expect_mark_overdue().never();
        let marked = updater(repo).mark_overdue(&[]).await.expect("no-op");
        assert_eq!(marked, 0);
    }
}
