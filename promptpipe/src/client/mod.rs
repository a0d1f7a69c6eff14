//! End-to-end orchestration: compile, launch, and track to completion.

use std::sync::Arc;
use tracing::debug;

use crate::backend::{GenerationBackend, GenerationResult};
use crate::cancellation::CancellationToken;
use crate::compile::{compile, RequestOverrides};
use crate::errors::PromptpipeError;
use crate::launch::{launch, LaunchOutcome};
use crate::poll::{ExecutionPoller, ExecutionState, PollerConfig};
use crate::progress::{ProgressProjector, ProgressSink};
use crate::stage::StageSet;
use crate::storage::StageStore;

/// Drives one generation from a stage set to a terminal outcome.
///
/// The client holds no per-execution state; any number of `generate` calls
/// may run concurrently, each owning its own handle, retry budget, and
/// cancellation token.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    poller_config: PollerConfig,
}

impl GenerationClient {
    /// Creates a client with the default polling configuration.
    #[must_use]
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            poller_config: PollerConfig::default(),
        }
    }

    /// Sets the polling configuration used for deferred executions.
    #[must_use]
    pub fn with_poller_config(mut self, config: PollerConfig) -> Self {
        self.poller_config = config;
        self
    }

    /// Fetches an owner's stages from storage as a compilation snapshot.
    pub async fn load_stage_set(
        &self,
        store: &dyn StageStore,
        owner_id: &str,
    ) -> Result<StageSet, PromptpipeError> {
        let stages = store.list(owner_id).await?;
        debug!(owner_id, count = stages.len(), "loaded stage configuration");
        Ok(StageSet::from_stages(stages))
    }

    /// Compiles, submits, and tracks a generation to a terminal outcome.
    ///
    /// The stage set is snapshotted up front, so concurrent edits to the
    /// caller's set cannot leak into this compilation. In direct mode the
    /// sink receives a started event followed immediately by a completed
    /// one; in deferred mode it receives one event per observed state
    /// transition.
    pub async fn generate(
        &self,
        stages: &StageSet,
        input: &str,
        overrides: &RequestOverrides,
        token: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Result<GenerationResult, PromptpipeError> {
        let snapshot = stages.snapshot();
        let request = compile(&snapshot, input, overrides)?;

        match launch(self.backend.as_ref(), &request).await? {
            LaunchOutcome::Direct(result) => {
                let mut projector = ProgressProjector::direct();
                for state in [ExecutionState::Started, ExecutionState::Completed] {
                    if let Some(event) = projector.observe(state) {
                        sink.emit(&event).await;
                    }
                }
                Ok(result)
            }
            LaunchOutcome::Deferred(handle) => {
                let poller =
                    ExecutionPoller::new(self.backend.as_ref(), self.poller_config.clone());
                Ok(poller.poll(&handle, token, sink).await?)
            }
        }
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("poller_config", &self.poller_config)
            .finish()
    }
}
