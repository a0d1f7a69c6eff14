//! Scripted backend and in-memory stage store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::backend::{GenerationBackend, GenerationResult, StatusReport, SubmitResponse};
use crate::compile::GenerationRequest;
use crate::errors::{BackendError, StorageError};
use crate::launch::ExecutionHandle;
use crate::stage::Stage;
use crate::storage::StageStore;

type QueryHook = Box<dyn Fn(usize) + Send + Sync>;

/// A generation backend that replays a scripted sequence of responses.
///
/// Submissions answer with a fixed [`SubmitResponse`]; status queries pop a
/// scripted queue and fall back to a perpetual `PROCESSING` report once the
/// script is exhausted, so open-ended polling scenarios need no padding.
pub struct ScriptedBackend {
    submit_response: SubmitResponse,
    submit_error: Mutex<Option<BackendError>>,
    status_script: Mutex<VecDeque<Result<StatusReport, BackendError>>>,
    submit_count: Mutex<usize>,
    query_count: Mutex<usize>,
    last_request: Mutex<Option<GenerationRequest>>,
    query_hook: Mutex<Option<QueryHook>>,
}

impl ScriptedBackend {
    fn with_submit_response(submit_response: SubmitResponse) -> Self {
        Self {
            submit_response,
            submit_error: Mutex::new(None),
            status_script: Mutex::new(VecDeque::new()),
            submit_count: Mutex::new(0),
            query_count: Mutex::new(0),
            last_request: Mutex::new(None),
            query_hook: Mutex::new(None),
        }
    }

    /// A backend whose submissions defer to the given execution id.
    #[must_use]
    pub fn deferred(execution_id: impl Into<String>) -> Self {
        Self::with_submit_response(SubmitResponse::deferred(execution_id))
    }

    /// A backend whose submissions complete directly with the given result.
    #[must_use]
    pub fn direct(result: GenerationResult) -> Self {
        Self::with_submit_response(SubmitResponse::direct(result))
    }

    /// A backend whose next submission fails with the given error.
    #[must_use]
    pub fn failing_submit(error: BackendError) -> Self {
        let backend = Self::with_submit_response(SubmitResponse::default());
        *backend.submit_error.lock() = Some(error);
        backend
    }

    /// Queues a status report.
    pub fn push_status(&self, report: StatusReport) {
        self.status_script.lock().push_back(Ok(report));
    }

    /// Queues a status-query failure.
    pub fn push_status_error(&self, error: BackendError) {
        self.status_script.lock().push_back(Err(error));
    }

    /// Registers a hook invoked with the 1-based count after each query.
    pub fn set_query_hook<F>(&self, hook: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        *self.query_hook.lock() = Some(Box::new(hook));
    }

    /// The number of submissions made.
    #[must_use]
    pub fn submit_count(&self) -> usize {
        *self.submit_count.lock()
    }

    /// The number of status queries made.
    #[must_use]
    pub fn query_count(&self) -> usize {
        *self.query_count.lock()
    }

    /// The request from the most recent submission.
    #[must_use]
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().clone()
    }
}

impl std::fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedBackend")
            .field("submit_count", &self.submit_count())
            .field("query_count", &self.query_count())
            .finish()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitResponse, BackendError> {
        *self.submit_count.lock() += 1;
        *self.last_request.lock() = Some(request.clone());
        if let Some(error) = self.submit_error.lock().take() {
            return Err(error);
        }
        Ok(self.submit_response.clone())
    }

    async fn query_status(&self, _handle: &ExecutionHandle) -> Result<StatusReport, BackendError> {
        let count = {
            let mut lock = self.query_count.lock();
            *lock += 1;
            *lock
        };

        let answer = self
            .status_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::running("PROCESSING")));

        if let Some(hook) = self.query_hook.lock().as_ref() {
            hook(count);
        }

        answer
    }
}

/// An in-memory stage store with write counting and failure injection.
pub struct MemoryStageStore {
    stages: Mutex<HashMap<String, Vec<Stage>>>,
    ordinal_writes: Mutex<Vec<(String, u32)>>,
    fail_ordinal_after: Mutex<Option<usize>>,
}

impl Default for MemoryStageStore {
    fn default() -> Self {
        Self {
            stages: Mutex::new(HashMap::new()),
            ordinal_writes: Mutex::new(Vec::new()),
            fail_ordinal_after: Mutex::new(None),
        }
    }
}

impl MemoryStageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with stages for an owner.
    pub fn seed(&self, owner_id: impl Into<String>, stages: Vec<Stage>) {
        self.stages.lock().insert(owner_id.into(), stages);
    }

    /// Makes every ordinal write after the first `n` successful ones fail.
    pub fn fail_ordinal_writes_after(&self, n: usize) {
        *self.fail_ordinal_after.lock() = Some(n);
    }

    /// The successful ordinal writes, in order.
    #[must_use]
    pub fn ordinal_writes(&self) -> Vec<(String, u32)> {
        self.ordinal_writes.lock().clone()
    }
}

impl std::fmt::Debug for MemoryStageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStageStore")
            .field("owners", &self.stages.lock().len())
            .field("ordinal_writes", &self.ordinal_writes.lock().len())
            .finish()
    }
}

#[async_trait]
impl StageStore for MemoryStageStore {
    async fn list(&self, owner_id: &str) -> Result<Vec<Stage>, StorageError> {
        Ok(self.stages.lock().get(owner_id).cloned().unwrap_or_default())
    }

    async fn create(&self, owner_id: &str, stage: &Stage) -> Result<(), StorageError> {
        let mut stages = self.stages.lock();
        let owned = stages.entry(owner_id.to_string()).or_default();
        if owned.iter().any(|s| s.id == stage.id) {
            return Err(StorageError::new(format!(
                "stage '{}' already exists",
                stage.id
            )));
        }
        owned.push(stage.clone());
        Ok(())
    }

    async fn update(&self, owner_id: &str, stage: &Stage) -> Result<(), StorageError> {
        let mut stages = self.stages.lock();
        let owned = stages
            .get_mut(owner_id)
            .ok_or_else(|| StorageError::new(format!("unknown owner '{owner_id}'")))?;
        let slot = owned
            .iter_mut()
            .find(|s| s.id == stage.id)
            .ok_or_else(|| StorageError::new(format!("unknown stage '{}'", stage.id)))?;
        *slot = stage.clone();
        Ok(())
    }

    async fn delete(&self, owner_id: &str, stage_id: &str) -> Result<(), StorageError> {
        let mut stages = self.stages.lock();
        let owned = stages
            .get_mut(owner_id)
            .ok_or_else(|| StorageError::new(format!("unknown owner '{owner_id}'")))?;
        let before = owned.len();
        owned.retain(|s| s.id != stage_id);
        if owned.len() == before {
            return Err(StorageError::new(format!("unknown stage '{stage_id}'")));
        }
        Ok(())
    }

    async fn update_ordinal(
        &self,
        owner_id: &str,
        stage_id: &str,
        ordinal: u32,
    ) -> Result<(), StorageError> {
        {
            let writes_done = self.ordinal_writes.lock().len();
            if let Some(limit) = *self.fail_ordinal_after.lock() {
                if writes_done >= limit {
                    return Err(StorageError::new(format!(
                        "injected write failure for stage '{stage_id}'"
                    )));
                }
            }
        }

        let mut stages = self.stages.lock();
        if let Some(owned) = stages.get_mut(owner_id) {
            if let Some(stage) = owned.iter_mut().find(|s| s.id == stage_id) {
                stage.ordinal = ordinal;
            }
        }
        self.ordinal_writes
            .lock()
            .push((stage_id.to_string(), ordinal));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageCategory;

    #[tokio::test]
    async fn test_scripted_backend_falls_back_to_processing() {
        let backend = ScriptedBackend::deferred("exec-1");
        let report = backend
            .query_status(&ExecutionHandle::new("exec-1"))
            .await
            .unwrap();
        assert_eq!(report.status, "PROCESSING");
        assert_eq!(backend.query_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_backend_replays_in_order() {
        let backend = ScriptedBackend::deferred("exec-1");
        backend.push_status(StatusReport::running("STARTED"));
        backend.push_status(StatusReport::failed("nope"));

        let handle = ExecutionHandle::new("exec-1");
        assert_eq!(
            backend.query_status(&handle).await.unwrap().status,
            "STARTED"
        );
        assert_eq!(backend.query_status(&handle).await.unwrap().status, "FAILED");
    }

    #[tokio::test]
    async fn test_memory_store_crud() {
        let store = MemoryStageStore::new();
        let stage = Stage::new(StageCategory::Role).with_id("s1");

        store.create("owner", &stage).await.unwrap();
        assert_eq!(store.list("owner").await.unwrap().len(), 1);

        let mut edited = stage.clone();
        edited.body = "edited".to_string();
        store.update("owner", &edited).await.unwrap();
        assert_eq!(store.list("owner").await.unwrap()[0].body, "edited");

        store.delete("owner", "s1").await.unwrap();
        assert!(store.list("owner").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ordinal_write_failure_injection() {
        let store = MemoryStageStore::new();
        store.seed(
            "owner",
            vec![Stage::new(StageCategory::Role).with_id("s1")],
        );
        store.fail_ordinal_writes_after(1);

        assert!(store.update_ordinal("owner", "s1", 2).await.is_ok());
        assert!(store.update_ordinal("owner", "s1", 3).await.is_err());
        assert_eq!(store.ordinal_writes(), vec![("s1".to_string(), 2)]);
    }
}
