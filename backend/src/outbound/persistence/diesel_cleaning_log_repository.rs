//! PostgreSQL-backed `CleaningLogRepository` implementation using Diesel ORM.
//!
//! Logs are written once, on first delivery. The proof payloads are stored
//! as JSONB exactly as the capture app sent them; only the verification
//! result is split into columns so the feedback lookup can filter on it.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CleaningLogRepository, CleaningLogRepositoryError};
use crate::domain::{
    BuildingId, CheckpointId, CleanerId, CleaningLog, LogId, VerificationResult,
    VerificationStatus,
};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{CleaningLogRow, NewCleaningLogRow, RowDecodeError};
use super::pool::{DbPool, PoolError};
use super::schema::cleaning_logs;

/// Diesel-backed implementation of the cleaning log repository port.
#[derive(Clone)]
pub struct DieselCleaningLogRepository {
    pool: DbPool,
}

impl DieselCleaningLogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CleaningLogRepositoryError {
    map_basic_pool_error(error, CleaningLogRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CleaningLogRepositoryError {
    map_basic_diesel_error(
        error,
        CleaningLogRepositoryError::query,
        CleaningLogRepositoryError::connection,
    )
}

fn encode_proof<T: serde::Serialize>(
    proof: Option<&T>,
    field: &str,
) -> Result<Option<serde_json::Value>, CleaningLogRepositoryError> {
    proof
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| CleaningLogRepositoryError::query(format!("serialise {field}: {err}")))
}

fn decode_proof<T: serde::de::DeserializeOwned>(
    id: &str,
    column: &'static str,
    value: Option<serde_json::Value>,
) -> Result<Option<T>, RowDecodeError> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(|err| RowDecodeError::new("cleaning_logs", id, column, err.to_string()))
}

/// Convert a database row into a domain cleaning log.
fn row_to_cleaning_log(row: CleaningLogRow) -> Result<CleaningLog, RowDecodeError> {
    let CleaningLogRow {
        id,
        cleaner_id,
        checkpoint_id,
        building_id,
        created_at,
        proof_of_presence,
        proof_of_quality,
        status,
        flag_reason,
        rejection_reason,
    } = row;

    let presence = decode_proof(&id, "proof_of_presence", proof_of_presence)?;
    let quality = decode_proof(&id, "proof_of_quality", proof_of_quality)?;

    Ok(CleaningLog {
        id: LogId::new(id),
        cleaner_id: CleanerId::new(cleaner_id),
        checkpoint_id: CheckpointId::new(checkpoint_id),
        building_id: BuildingId::new(building_id),
        created_at,
        proof_of_presence: presence,
        proof_of_quality: quality,
        verification_result: VerificationResult {
            status: VerificationStatus::from(status),
            flag_reason,
            rejection_reason,
        },
    })
}

#[async_trait]
impl CleaningLogRepository for DieselCleaningLogRepository {
    async fn save(&self, log: &CleaningLog) -> Result<bool, CleaningLogRepositoryError> {
        let presence = encode_proof(log.proof_of_presence.as_ref(), "proof_of_presence")?;
        let quality = encode_proof(log.proof_of_quality.as_ref(), "proof_of_quality")?;
        let result = &log.verification_result;
        let new_row = NewCleaningLogRow {
            id: log.id.as_str(),
            cleaner_id: log.cleaner_id.as_str(),
            checkpoint_id: log.checkpoint_id.as_str(),
            building_id: log.building_id.as_str(),
            created_at: log.created_at,
            proof_of_presence: presence.as_ref(),
            proof_of_quality: quality.as_ref(),
            status: result.status.as_str(),
            flag_reason: result.flag_reason.as_deref(),
            rejection_reason: result.rejection_reason.as_deref(),
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let inserted = diesel::insert_into(cleaning_logs::table)
            .values(&new_row)
            .on_conflict(cleaning_logs::id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(inserted == 1)
    }

    async fn find_latest_verified(
        &self,
        checkpoint_id: &CheckpointId,
    ) -> Result<Option<CleaningLog>, CleaningLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = cleaning_logs::table
            .filter(
                cleaning_logs::checkpoint_id
                    .eq(checkpoint_id.as_str())
                    .and(cleaning_logs::status.eq(VerificationStatus::Verified.as_str())),
            )
            .order((cleaning_logs::created_at.desc(), cleaning_logs::id.desc()))
            .select(CleaningLogRow::as_select())
            .first::<CleaningLogRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_cleaning_log)
            .transpose()
            .map_err(|err| CleaningLogRepositoryError::query(err.to_string()))
    }

    async fn flag_for_review(
        &self,
        log_id: &LogId,
        reason: &str,
    ) -> Result<bool, CleaningLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(cleaning_logs::table.find(log_id.as_str()))
            .set((
                cleaning_logs::status.eq(VerificationStatus::FlaggedForReview.as_str()),
                cleaning_logs::flag_reason.eq(reason),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }
}
