//! The local finite-state representation of a deferred execution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The poller's local view of a deferred execution's lifecycle.
///
/// The remote vocabulary is open-ended and extended informally over time.
/// [`ExecutionState::from_remote`] parses the known strings; anything else
/// yields `None` and the poller keeps its current state, treating the job
/// as still running. That tolerates vocabulary drift without crashing, at
/// the cost of not recognizing genuinely new terminal states until this
/// enum learns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// The execution has been accepted.
    Started,
    /// Input is being prepared.
    Processing,
    /// The model is generating.
    Generating,
    /// The result is being persisted.
    Saving,
    /// Terminal: the execution succeeded.
    Completed,
    /// Terminal: the backend reported a failure.
    Failed,
    /// Terminal: the backend reported a server-side timeout.
    TimedOut,
    /// Terminal: the execution was aborted remotely.
    Aborted,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::Started
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Processing => write!(f, "processing"),
            Self::Generating => write!(f, "generating"),
            Self::Saving => write!(f, "saving"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::TimedOut => write!(f, "timed_out"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

impl ExecutionState {
    /// Parses a remote status string; unrecognized strings yield `None`.
    #[must_use]
    pub fn from_remote(raw: &str) -> Option<Self> {
        match raw.trim() {
            "STARTED" => Some(Self::Started),
            "PROCESSING" => Some(Self::Processing),
            "GENERATING" => Some(Self::Generating),
            "SAVING" => Some(Self::Saving),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "TIMED_OUT" => Some(Self::TimedOut),
            "ABORTED" => Some(Self::Aborted),
            _ => None,
        }
    }

    /// Returns true if the state admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::TimedOut | Self::Aborted
        )
    }

    /// Returns true for the successful terminal state.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true for a non-success terminal state.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut | Self::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_remote_known_vocabulary() {
        assert_eq!(
            ExecutionState::from_remote("STARTED"),
            Some(ExecutionState::Started)
        );
        assert_eq!(
            ExecutionState::from_remote("TIMED_OUT"),
            Some(ExecutionState::TimedOut)
        );
        assert_eq!(
            ExecutionState::from_remote(" COMPLETED "),
            Some(ExecutionState::Completed)
        );
    }

    #[test]
    fn test_from_remote_unknown_yields_none() {
        assert_eq!(ExecutionState::from_remote("WARMING_UP"), None);
        assert_eq!(ExecutionState::from_remote(""), None);
        assert_eq!(ExecutionState::from_remote("completed"), None);
    }

    #[test]
    fn test_terminal_partition() {
        assert!(ExecutionState::Completed.is_terminal());
        assert!(ExecutionState::Failed.is_terminal());
        assert!(ExecutionState::TimedOut.is_terminal());
        assert!(ExecutionState::Aborted.is_terminal());
        assert!(!ExecutionState::Started.is_terminal());
        assert!(!ExecutionState::Processing.is_terminal());
        assert!(!ExecutionState::Generating.is_terminal());
        assert!(!ExecutionState::Saving.is_terminal());
    }

    #[test]
    fn test_success_and_failure_are_disjoint() {
        assert!(ExecutionState::Completed.is_success());
        assert!(!ExecutionState::Completed.is_failure());
        assert!(ExecutionState::Aborted.is_failure());
        assert!(!ExecutionState::Aborted.is_success());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ExecutionState::TimedOut).unwrap();
        assert_eq!(json, r#""timed_out""#);
        let back: ExecutionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ExecutionState::TimedOut);
    }
}
