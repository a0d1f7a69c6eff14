//! The generation backend interface and its wire types.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::compile::GenerationRequest;
use crate::errors::BackendError;
use crate::launch::ExecutionHandle;
use crate::utils::Timestamp;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpGenerationBackend;

/// Token usage reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Tokens consumed by the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    /// Tokens produced in the candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
}

impl UsageMetadata {
    /// Returns total tokens.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.unwrap_or(0) + self.output_tokens.unwrap_or(0)
    }
}

/// A completed generation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated candidates, best first.
    pub candidates: Vec<String>,
    /// Token usage, if the backend reported it.
    #[serde(default)]
    pub usage: UsageMetadata,
    /// When the result was produced.
    pub created_at: Timestamp,
}

impl GenerationResult {
    /// Creates a result stamped with the current time.
    #[must_use]
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            usage: UsageMetadata::default(),
            created_at: Utc::now(),
        }
    }

    /// Sets the usage metadata.
    #[must_use]
    pub fn with_usage(mut self, usage: UsageMetadata) -> Self {
        self.usage = usage;
        self
    }

    /// The best candidate, if any was generated.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

/// The raw payload returned by a submission.
///
/// Exactly one of `result` and `execution_id` should be present; the
/// launcher refuses to interpret anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// The completed result (direct mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    /// The execution identifier (deferred mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
}

impl SubmitResponse {
    /// A direct-mode response carrying a completed result.
    #[must_use]
    pub fn direct(result: GenerationResult) -> Self {
        Self {
            result: Some(result),
            execution_id: None,
        }
    }

    /// A deferred-mode response carrying an execution identifier.
    #[must_use]
    pub fn deferred(execution_id: impl Into<String>) -> Self {
        Self {
            result: None,
            execution_id: Some(execution_id.into()),
        }
    }
}

/// The raw payload returned by a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// The remote status string; vocabulary is open-ended.
    pub status: String,
    /// The result payload, present once the execution completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    /// A backend-reported error message, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    /// A report for a still-running execution.
    #[must_use]
    pub fn running(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            result: None,
            error: None,
        }
    }

    /// A completed report carrying the result payload.
    #[must_use]
    pub fn completed(result: GenerationResult) -> Self {
        Self {
            status: "COMPLETED".to_string(),
            result: Some(result),
            error: None,
        }
    }

    /// A failed report carrying a backend error message.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: "FAILED".to_string(),
            result: None,
            error: Some(error.into()),
        }
    }
}

/// The generation backend collaborator.
///
/// `submit` must be called exactly once per launch; retry policy belongs to
/// the caller or the poller, never inside an implementation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submits a compiled request for generation.
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitResponse, BackendError>;

    /// Queries the status of a deferred execution.
    async fn query_status(&self, handle: &ExecutionHandle) -> Result<StatusReport, BackendError>;
}
