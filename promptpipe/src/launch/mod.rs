//! Submission of a compiled request and launch-mode disambiguation.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::backend::{GenerationBackend, GenerationResult};
use crate::compile::GenerationRequest;
use crate::errors::LaunchError;

/// Opaque reference to an in-flight deferred execution.
///
/// Carries no semantic fields beyond identity; it is solely the poller's
/// query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    /// Wraps an execution identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the handle is degenerate (empty identifier).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The outcome of a submission.
#[derive(Debug, Clone)]
pub enum LaunchOutcome {
    /// The backend completed synchronously; no polling is needed.
    Direct(GenerationResult),
    /// The backend accepted the work; the caller must drive a poller.
    Deferred(ExecutionHandle),
}

impl LaunchOutcome {
    /// Returns true for a direct (synchronous) outcome.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }

    /// Returns true for a deferred outcome.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

/// Submits a request to the backend, exactly once.
///
/// The two response shapes are disambiguated strictly: a result field means
/// direct mode, an execution id means deferred mode, and anything else is
/// [`LaunchError::AmbiguousResponse`]. The launcher never retries; a single
/// submission may have side effects downstream (billing, usage), so retry
/// policy stays with the caller.
pub async fn launch(
    backend: &dyn GenerationBackend,
    request: &GenerationRequest,
) -> Result<LaunchOutcome, LaunchError> {
    let response = backend.submit(request).await?;

    match (response.result, response.execution_id) {
        (Some(result), None) => {
            debug!(model = %request.model, "submission completed in direct mode");
            Ok(LaunchOutcome::Direct(result))
        }
        (None, Some(id)) => {
            debug!(model = %request.model, execution_id = %id, "submission deferred");
            Ok(LaunchOutcome::Deferred(ExecutionHandle::new(id)))
        }
        (result, execution_id) => Err(LaunchError::AmbiguousResponse {
            has_result: result.is_some(),
            has_handle: execution_id.is_some(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{StatusReport, SubmitResponse};
    use crate::errors::BackendError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FixedBackend {
        response: Mutex<Option<Result<SubmitResponse, BackendError>>>,
        submit_count: Mutex<usize>,
    }

    impl FixedBackend {
        fn new(response: Result<SubmitResponse, BackendError>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                submit_count: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for FixedBackend {
        async fn submit(
            &self,
            _request: &GenerationRequest,
        ) -> Result<SubmitResponse, BackendError> {
            *self.submit_count.lock() += 1;
            self.response
                .lock()
                .take()
                .unwrap_or_else(|| Ok(SubmitResponse::default()))
        }

        async fn query_status(
            &self,
            _handle: &ExecutionHandle,
        ) -> Result<StatusReport, BackendError> {
            panic!("launcher must never query status");
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            instructions: String::new(),
            input: "text".to_string(),
            model: "gemini-pro".to_string(),
            temperature: 0.7,
            max_output_tokens: None,
            candidate_count: 1,
        }
    }

    #[tokio::test]
    async fn test_direct_response_returns_result_without_polling() {
        let result = GenerationResult::new(vec!["done".to_string()]);
        let backend = FixedBackend::new(Ok(SubmitResponse::direct(result.clone())));

        let outcome = launch(&backend, &request()).await.unwrap();
        match outcome {
            LaunchOutcome::Direct(r) => assert_eq!(r.candidates, result.candidates),
            LaunchOutcome::Deferred(_) => panic!("expected direct outcome"),
        }
        assert_eq!(*backend.submit_count.lock(), 1);
    }

    #[tokio::test]
    async fn test_deferred_response_returns_handle() {
        let backend = FixedBackend::new(Ok(SubmitResponse::deferred("exec-7")));
        let outcome = launch(&backend, &request()).await.unwrap();
        match outcome {
            LaunchOutcome::Deferred(handle) => assert_eq!(handle.as_str(), "exec-7"),
            LaunchOutcome::Direct(_) => panic!("expected deferred outcome"),
        }
    }

    #[tokio::test]
    async fn test_empty_response_is_ambiguous() {
        let backend = FixedBackend::new(Ok(SubmitResponse::default()));
        let err = launch(&backend, &request()).await.unwrap_err();
        assert!(matches!(
            err,
            LaunchError::AmbiguousResponse {
                has_result: false,
                has_handle: false,
            }
        ));
    }

    #[tokio::test]
    async fn test_both_fields_present_is_ambiguous() {
        let response = SubmitResponse {
            result: Some(GenerationResult::new(vec![])),
            execution_id: Some("exec-7".to_string()),
        };
        let backend = FixedBackend::new(Ok(response));
        let err = launch(&backend, &request()).await.unwrap_err();
        assert!(matches!(
            err,
            LaunchError::AmbiguousResponse {
                has_result: true,
                has_handle: true,
            }
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces_immediately() {
        let backend = FixedBackend::new(Err(BackendError::transport("connection refused")));
        let err = launch(&backend, &request()).await.unwrap_err();
        assert!(matches!(err, LaunchError::Backend(_)));
        // No retry: exactly one submission was attempted.
        assert_eq!(*backend.submit_count.lock(), 1);
    }

    #[test]
    fn test_handle_emptiness() {
        assert!(ExecutionHandle::new("").is_empty());
        assert!(!ExecutionHandle::new("exec-1").is_empty());
    }
}
