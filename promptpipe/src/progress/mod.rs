//! Projection of execution states onto human-facing progress labels.

mod sink;

pub use sink::{CollectingProgressSink, LoggingProgressSink, NoOpProgressSink, ProgressSink};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::poll::ExecutionState;

/// The fixed, ordered list of human-facing progress labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStage {
    /// Loading the stage configuration.
    FetchConfiguration,
    /// Compiling the stages into a request.
    BuildRequest,
    /// The model is generating.
    InvokeModel,
    /// Persisting the generated result.
    PersistResult,
}

impl ProgressStage {
    /// All labels in presentation order.
    pub const ALL: [Self; 4] = [
        Self::FetchConfiguration,
        Self::BuildRequest,
        Self::InvokeModel,
        Self::PersistResult,
    ];
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchConfiguration => write!(f, "fetch-configuration"),
            Self::BuildRequest => write!(f, "build-request"),
            Self::InvokeModel => write!(f, "invoke-model"),
            Self::PersistResult => write!(f, "persist-result"),
        }
    }
}

/// One progress report delivered to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Which of the fixed labels this report belongs to.
    pub stage: ProgressStage,
    /// A textual status message.
    pub message: String,
}

impl ProgressEvent {
    /// Creates a progress event.
    #[must_use]
    pub fn new(stage: ProgressStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Whether the execution runs synchronously or through a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// The result came back on submission.
    Direct,
    /// The execution is tracked through status polling.
    Deferred,
}

/// Maps `(mode, ExecutionState)` onto progress events, once per transition.
///
/// One projector per polling session. Repeated observations of the same
/// state yield `None` so the caller never receives duplicate events.
#[derive(Debug)]
pub struct ProgressProjector {
    mode: ExecutionMode,
    last_state: Option<ExecutionState>,
    last_stage: ProgressStage,
}

impl ProgressProjector {
    /// A projector for a direct-mode session.
    #[must_use]
    pub fn direct() -> Self {
        Self::new(ExecutionMode::Direct)
    }

    /// A projector for a deferred-mode session.
    #[must_use]
    pub fn deferred() -> Self {
        Self::new(ExecutionMode::Deferred)
    }

    fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            last_state: None,
            last_stage: match mode {
                ExecutionMode::Direct => ProgressStage::InvokeModel,
                ExecutionMode::Deferred => ProgressStage::FetchConfiguration,
            },
        }
    }

    /// Observes a state; returns an event only when the state changed.
    pub fn observe(&mut self, state: ExecutionState) -> Option<ProgressEvent> {
        if self.last_state == Some(state) {
            return None;
        }
        self.last_state = Some(state);

        let event = self.project(state);
        self.last_stage = event.stage;
        Some(event)
    }

    fn project(&self, state: ExecutionState) -> ProgressEvent {
        match state {
            ExecutionState::Started => match self.mode {
                ExecutionMode::Direct => {
                    ProgressEvent::new(ProgressStage::InvokeModel, "generation started")
                }
                ExecutionMode::Deferred => {
                    ProgressEvent::new(ProgressStage::FetchConfiguration, "execution started")
                }
            },
            ExecutionState::Processing => {
                ProgressEvent::new(ProgressStage::BuildRequest, "preparing the request")
            }
            ExecutionState::Generating => {
                ProgressEvent::new(ProgressStage::InvokeModel, "model is generating")
            }
            ExecutionState::Saving => {
                ProgressEvent::new(ProgressStage::PersistResult, "persisting the result")
            }
            ExecutionState::Completed => {
                ProgressEvent::new(ProgressStage::PersistResult, "execution completed")
            }
            // Failures keep the label of the last stage that was reached.
            ExecutionState::Failed => ProgressEvent::new(self.last_stage, "execution failed"),
            ExecutionState::TimedOut => {
                ProgressEvent::new(self.last_stage, "execution time exceeded")
            }
            ExecutionState::Aborted => ProgressEvent::new(self.last_stage, "execution was aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_kebab_case() {
        assert_eq!(
            ProgressStage::FetchConfiguration.to_string(),
            "fetch-configuration"
        );
        let json = serde_json::to_string(&ProgressStage::InvokeModel).unwrap();
        assert_eq!(json, r#""invoke-model""#);
    }

    #[test]
    fn test_deferred_projection_walks_the_labels() {
        let mut projector = ProgressProjector::deferred();
        let stages: Vec<ProgressStage> = [
            ExecutionState::Started,
            ExecutionState::Processing,
            ExecutionState::Generating,
            ExecutionState::Saving,
            ExecutionState::Completed,
        ]
        .into_iter()
        .filter_map(|s| projector.observe(s))
        .map(|e| e.stage)
        .collect();

        assert_eq!(
            stages,
            vec![
                ProgressStage::FetchConfiguration,
                ProgressStage::BuildRequest,
                ProgressStage::InvokeModel,
                ProgressStage::PersistResult,
                ProgressStage::PersistResult,
            ]
        );
    }

    #[test]
    fn test_repeated_states_emit_nothing() {
        let mut projector = ProgressProjector::deferred();
        assert!(projector.observe(ExecutionState::Generating).is_some());
        assert!(projector.observe(ExecutionState::Generating).is_none());
        assert!(projector.observe(ExecutionState::Generating).is_none());
        assert!(projector.observe(ExecutionState::Saving).is_some());
    }

    #[test]
    fn test_direct_mode_started_then_completed() {
        let mut projector = ProgressProjector::direct();
        let started = projector.observe(ExecutionState::Started).unwrap();
        assert_eq!(started.stage, ProgressStage::InvokeModel);

        let completed = projector.observe(ExecutionState::Completed).unwrap();
        assert_eq!(completed.stage, ProgressStage::PersistResult);
    }

    #[test]
    fn test_failure_keeps_last_reached_label() {
        let mut projector = ProgressProjector::deferred();
        projector.observe(ExecutionState::Started);
        projector.observe(ExecutionState::Generating);

        let failed = projector.observe(ExecutionState::Failed).unwrap();
        assert_eq!(failed.stage, ProgressStage::InvokeModel);
        assert_eq!(failed.message, "execution failed");
    }
}
