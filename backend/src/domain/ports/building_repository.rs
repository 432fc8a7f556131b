//! Port for reading building SLA configuration.

use async_trait::async_trait;

use crate::domain::{Building, BuildingId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by building repository adapters.
    pub enum BuildingRepositoryError {
        /// Repository connection could not be established.
        [transient]
        Connection { message: String } =>
            "building repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "building repository query failed: {message}",
    }
}

/// Read access to `buildings` documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildingRepository: Send + Sync {
    /// Find a building by id.
    async fn find_by_id(&self, id: &BuildingId)
    -> Result<Option<Building>, BuildingRepositoryError>;
}

/// Fixture implementation for tests that never resolve a building.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBuildingRepository;

#[async_trait]
impl BuildingRepository for FixtureBuildingRepository {
    async fn find_by_id(
        &self,
        _id: &BuildingId,
    ) -> Result<Option<Building>, BuildingRepositoryError> {
        Ok(None)
    }
}
