//! The stage storage collaborator.

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::stage::Stage;

/// Port to whatever persists stage records.
///
/// Storage is assumed eventually consistent; a fetched list is treated as a
/// snapshot valid for one compilation. Nothing in this crate depends on the
/// storage technology behind it.
#[async_trait]
pub trait StageStore: Send + Sync {
    /// Lists all stages owned by `owner_id`.
    async fn list(&self, owner_id: &str) -> Result<Vec<Stage>, StorageError>;

    /// Persists a new stage.
    async fn create(&self, owner_id: &str, stage: &Stage) -> Result<(), StorageError>;

    /// Persists changes to an existing stage.
    async fn update(&self, owner_id: &str, stage: &Stage) -> Result<(), StorageError>;

    /// Deletes a stage.
    async fn delete(&self, owner_id: &str, stage_id: &str) -> Result<(), StorageError>;

    /// Persists a single ordinal change.
    ///
    /// Reordering issues one of these per changed stage; see
    /// [`crate::reorder::ReorderTransaction`] for the rollback contract.
    async fn update_ordinal(
        &self,
        owner_id: &str,
        stage_id: &str,
        ordinal: u32,
    ) -> Result<(), StorageError>;
}
