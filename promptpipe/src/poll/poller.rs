//! The bounded polling loop over a deferred execution.

use std::time::Duration;
use tracing::{debug, warn};

use super::ExecutionState;
use crate::backend::{GenerationBackend, GenerationResult};
use crate::cancellation::CancellationToken;
use crate::errors::PollFailure;
use crate::launch::ExecutionHandle;
use crate::progress::{ProgressProjector, ProgressSink};

/// Configuration for one polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// The total number of status queries allowed, successful or not.
    pub max_retries: u32,
    /// Sleep between queries. Zero skips sleeping entirely (test mode).
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_retries: 30,
            interval: Duration::from_millis(2000),
        }
    }
}

impl PollerConfig {
    /// Creates the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the inter-query interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Drives a deferred execution to a terminal local outcome.
///
/// One poller per execution; nothing is shared across sessions, so
/// concurrent executions each own their retry budget and handle.
pub struct ExecutionPoller<'a> {
    backend: &'a dyn GenerationBackend,
    config: PollerConfig,
}

impl std::fmt::Debug for ExecutionPoller<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPoller")
            .field("config", &self.config)
            .finish()
    }
}

impl<'a> ExecutionPoller<'a> {
    /// Creates a poller over a backend.
    #[must_use]
    pub fn new(backend: &'a dyn GenerationBackend, config: PollerConfig) -> Self {
        Self { backend, config }
    }

    /// Polls until a terminal outcome.
    ///
    /// Every exit path is explicit:
    /// - `Ok` with the result payload when the backend reports `COMPLETED`;
    /// - [`PollFailure::Backend`], [`PollFailure::BackendTimeout`] or
    ///   [`PollFailure::BackendAborted`] for remote terminal failures;
    /// - [`PollFailure::LocalTimeout`] when the budget runs out on
    ///   non-terminal statuses (exactly `max_retries` queries are made);
    /// - [`PollFailure::ObservabilityLost`] when the budget runs out on a
    ///   transient query error;
    /// - [`PollFailure::Cancelled`] when the token fires between queries;
    /// - [`PollFailure::MissingHandle`] for an empty handle, before any
    ///   network call.
    ///
    /// Transient query errors count against the same budget as regular
    /// polls; the budget is never reset. Unrecognized remote statuses keep
    /// the current state (the job is treated as still running) and are
    /// logged so vocabulary drift stays observable.
    pub async fn poll(
        &self,
        handle: &ExecutionHandle,
        token: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Result<GenerationResult, PollFailure> {
        if handle.is_empty() {
            return Err(PollFailure::MissingHandle);
        }

        let mut projector = ProgressProjector::deferred();
        let mut state = ExecutionState::default();
        let mut remaining = self.config.max_retries;
        let mut queries: u32 = 0;
        let mut last_query_error: Option<String> = None;

        loop {
            // Interruption happens only between queries, never mid-call.
            if token.is_cancelled() {
                return Err(PollFailure::Cancelled {
                    reason: token
                        .reason()
                        .unwrap_or_else(|| "aborted by caller".to_string()),
                });
            }

            if remaining == 0 {
                return Err(match last_query_error {
                    Some(last_error) => PollFailure::ObservabilityLost { last_error },
                    None => PollFailure::LocalTimeout { queries },
                });
            }
            remaining -= 1;
            queries += 1;

            match self.backend.query_status(handle).await {
                Err(err) => {
                    debug!(
                        handle = %handle,
                        query = queries,
                        error = %err,
                        "status query failed; counting against the budget"
                    );
                    last_query_error = Some(err.to_string());
                }
                Ok(report) => {
                    last_query_error = None;

                    match ExecutionState::from_remote(&report.status) {
                        Some(next) => {
                            debug!(handle = %handle, query = queries, state = %next, "status observed");
                            state = next;
                            if let Some(event) = projector.observe(state) {
                                sink.emit(&event).await;
                            }
                        }
                        None => {
                            warn!(
                                handle = %handle,
                                status = %report.status,
                                "unrecognized execution status; still polling"
                            );
                        }
                    }

                    match state {
                        ExecutionState::Completed => {
                            return report.result.ok_or_else(|| PollFailure::Backend {
                                message: "backend reported completion without a result payload"
                                    .to_string(),
                            });
                        }
                        ExecutionState::Failed => {
                            return Err(PollFailure::Backend {
                                message: report
                                    .error
                                    .unwrap_or_else(|| "backend reported failure".to_string()),
                            });
                        }
                        ExecutionState::TimedOut => return Err(PollFailure::BackendTimeout),
                        ExecutionState::Aborted => return Err(PollFailure::BackendAborted),
                        _ => {}
                    }
                }
            }

            if !self.config.interval.is_zero() {
                tokio::time::sleep(self.config.interval).await;
            }
        }
    }
}
