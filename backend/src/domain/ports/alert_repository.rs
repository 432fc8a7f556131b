//! Port for alert persistence.

use async_trait::async_trait;

use crate::domain::{Alert, AlertId, AlertKind, AlertResolution, CheckpointId, NewAlert};

use super::define_port_error;

define_port_error! {
    /// Errors raised by alert repository adapters.
    pub enum AlertRepositoryError {
        /// Repository connection could not be established.
        [transient]
        Connection { message: String } =>
            "alert repository connection failed: {message}",
        /// A batch or transaction lost a race and may succeed when retried.
        [transient]
        Contention { message: String } =>
            "alert repository batch aborted: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "alert repository query failed: {message}",
    }
}

/// Result of an atomic check-and-insert batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeduplicatedInsert {
    /// Alerts written, keyed by checkpoint.
    pub created: Vec<(CheckpointId, AlertId)>,
    /// Checkpoints that already held an OPEN alert of the same kind.
    pub skipped: Vec<CheckpointId>,
}

/// Access to `alerts` documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Insert one OPEN alert.
    ///
    /// An alert naming a related log is written at most once per
    /// (log, kind): when one already exists its id is returned and nothing
    /// is written. Alerts without a related log are never deduplicated here.
    async fn insert(&self, alert: NewAlert) -> Result<AlertId, AlertRepositoryError>;

    /// OPEN alerts of `kind` on any of `checkpoint_ids`.
    ///
    /// Adapters may cap the list length per query; callers chunk.
    async fn find_open(
        &self,
        checkpoint_ids: &[CheckpointId],
        kind: AlertKind,
    ) -> Result<Vec<Alert>, AlertRepositoryError>;

    /// Resolve all listed alerts in one all-or-nothing batch. Returns the
    /// number of alerts that changed state.
    async fn resolve_batch(
        &self,
        ids: &[AlertId],
        resolution: &AlertResolution,
    ) -> Result<usize, AlertRepositoryError>;

    /// Insert every alert whose (checkpoint, kind) has no OPEN alert yet, as
    /// one atomic batch. The presence check runs inside the same scope.
    async fn insert_deduplicated_batch(
        &self,
        alerts: Vec<NewAlert>,
    ) -> Result<DeduplicatedInsert, AlertRepositoryError>;
}

/// Fixture implementation that accepts every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAlertRepository;

#[async_trait]
impl AlertRepository for FixtureAlertRepository {
    async fn insert(&self, _alert: NewAlert) -> Result<AlertId, AlertRepositoryError> {
        Ok(AlertId::new("fixture-alert"))
    }

    async fn find_open(
        &self,
        _checkpoint_ids: &[CheckpointId],
        _kind: AlertKind,
    ) -> Result<Vec<Alert>, AlertRepositoryError> {
        Ok(Vec::new())
    }

    async fn resolve_batch(
        &self,
        _ids: &[AlertId],
        _resolution: &AlertResolution,
    ) -> Result<usize, AlertRepositoryError> {
        Ok(0)
    }

    async fn insert_deduplicated_batch(
        &self,
        alerts: Vec<NewAlert>,
    ) -> Result<DeduplicatedInsert, AlertRepositoryError> {
        let created = alerts
            .into_iter()
            .enumerate()
            .map(|(n, alert)| (alert.checkpoint_id, AlertId::new(format!("fixture-alert-{n}"))))
            .collect();
        Ok(DeduplicatedInsert {
            created,
            skipped: Vec::new(),
        })
    }
}
