//! Error types for promptpipe.
//!
//! Each failure domain has its own enum so callers can match on the exact
//! condition; [`PromptpipeError`] aggregates them for the orchestration layer.

use thiserror::Error;

/// The main error type for promptpipe operations.
#[derive(Debug, Error)]
pub enum PromptpipeError {
    /// Request compilation failed.
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Submission to the generation backend failed.
    #[error("{0}")]
    Launch(#[from] LaunchError),

    /// A deferred execution ended in a non-success terminal outcome.
    #[error("{0}")]
    Poll(#[from] PollFailure),

    /// Stage storage failed.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// A reorder transaction failed.
    #[error("{0}")]
    Reorder(#[from] ReorderError),
}

/// Errors produced while compiling a stage set into a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// No enabled stage specifies a model and no override was given.
    ///
    /// Compilation never falls back to an arbitrary model; the caller must
    /// fix the configuration before resubmitting.
    #[error("no model resolved: no enabled stage specifies a model and no override was given")]
    NoModelResolved,
}

/// Errors produced by the generation backend transport.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never reached the backend or the connection dropped.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend answered with a payload the client cannot interpret.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// An HTTP-level error from the reqwest transport.
    #[cfg(feature = "http")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// Errors produced when submitting a request for execution.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The submit response carried neither or both of a result and a handle.
    ///
    /// Mixed-mode backends are a known source of bugs, so the launcher
    /// refuses to guess which mode was intended.
    #[error(
        "ambiguous submit response (result present: {has_result}, handle present: {has_handle})"
    )]
    AmbiguousResponse {
        /// Whether the response carried a completed result.
        has_result: bool,
        /// Whether the response carried an execution handle.
        has_handle: bool,
    },

    /// The submission itself failed in transit.
    #[error("submit failed: {0}")]
    Backend(#[from] BackendError),
}

/// Terminal non-success outcomes of a polling session.
///
/// The three flavours of "it did not complete" are deliberately distinct:
/// a backend-reported failure, a local retry-budget timeout, and the loss of
/// the ability to observe the job at all. Callers route each differently.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PollFailure {
    /// The execution handle was empty; no status query was made.
    #[error("no execution handle was provided")]
    MissingHandle,

    /// The backend reported the execution as failed.
    #[error("generation failed: {message}")]
    Backend {
        /// The backend-reported error message.
        message: String,
    },

    /// The backend reported a server-side timeout.
    #[error("execution time exceeded")]
    BackendTimeout,

    /// The backend reported the execution as aborted.
    #[error("execution was aborted")]
    BackendAborted,

    /// The local retry budget ran out while the execution was still running.
    ///
    /// Independent of and stricter than any server-side timeout; no
    /// `TIMED_OUT` status was observed from the backend.
    #[error("no terminal status after {queries} status queries")]
    LocalTimeout {
        /// The number of status queries made before giving up.
        queries: u32,
    },

    /// Repeated status-query failures exhausted the retry budget.
    ///
    /// The job itself may still be running; the client lost the ability to
    /// observe it.
    #[error("lost the ability to observe the execution: {last_error}")]
    ObservabilityLost {
        /// The last query error seen before the budget ran out.
        last_error: String,
    },

    /// The caller cancelled the polling session.
    ///
    /// A first-class outcome, not a defect.
    #[error("aborted by caller: {reason}")]
    Cancelled {
        /// The reason given at cancellation.
        reason: String,
    },
}

/// An error from the stage storage collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("storage error: {message}")]
pub struct StorageError {
    /// A human-readable description of the failure.
    pub message: String,
}

impl StorageError {
    /// Creates a new storage error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors produced by a reorder transaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReorderError {
    /// The moved stage does not exist in the stage set.
    #[error("unknown stage: {id}")]
    UnknownStage {
        /// The id that was not found.
        id: String,
    },

    /// Persisting one of the changed ordinals failed.
    ///
    /// The in-memory stage set has been restored to its pre-reorder
    /// ordinals by the time this is returned.
    #[error("failed to persist ordinal for stage '{stage_id}': {source}")]
    PersistFailed {
        /// The stage whose write failed.
        stage_id: String,
        /// The underlying storage error.
        #[source]
        source: StorageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_failure_messages_are_distinguishable() {
        let backend = PollFailure::Backend {
            message: "boom".to_string(),
        };
        let local = PollFailure::LocalTimeout { queries: 30 };
        let lost = PollFailure::ObservabilityLost {
            last_error: "connection reset".to_string(),
        };

        assert_ne!(backend, local);
        assert_ne!(local, lost);
        assert!(backend.to_string().contains("boom"));
        assert!(local.to_string().contains("30"));
        assert!(lost.to_string().contains("connection reset"));
    }

    #[test]
    fn test_backend_terminal_messages() {
        assert_eq!(
            PollFailure::BackendTimeout.to_string(),
            "execution time exceeded"
        );
        assert_eq!(
            PollFailure::BackendAborted.to_string(),
            "execution was aborted"
        );
    }

    #[test]
    fn test_promptpipe_error_from_compile() {
        let err: PromptpipeError = CompileError::NoModelResolved.into();
        assert!(matches!(err, PromptpipeError::Compile(_)));
    }

    #[test]
    fn test_reorder_error_carries_source() {
        let err = ReorderError::PersistFailed {
            stage_id: "s1".to_string(),
            source: StorageError::new("disk full"),
        };
        assert!(err.to_string().contains("s1"));
        assert!(err.to_string().contains("disk full"));
    }
}
