//! # Promptpipe
//!
//! A client for compiling staged prompt pipelines and tracking deferred
//! generation jobs to completion.
//!
//! Promptpipe turns an ordered set of user-editable prompt stages into a
//! single generation request, submits it, and follows the execution through
//! a bounded polling loop:
//!
//! - **Stage sets**: ordered, toggle-able configuration fragments with a
//!   deterministic `(ordinal, id)` ordering
//! - **Pure compilation**: stage set snapshot in, byte-identical request out
//! - **Dual-mode launch**: direct results and deferred execution handles,
//!   disambiguated strictly
//! - **Bounded polling**: a local state machine with retry budget, timeout,
//!   cancellation, and distinguishable failure reasons
//! - **Progress projection**: deduplicated, human-facing progress events
//! - **Transactional reordering**: ordinal permutations with full rollback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use promptpipe::prelude::*;
//!
//! let client = GenerationClient::new(backend);
//! let stages = client.load_stage_set(&store, "owner-1").await?;
//! let token = CancellationToken::new();
//!
//! let result = client
//!     .generate(&stages, article, &RequestOverrides::new(), &token, &sink)
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod backend;
pub mod cancellation;
pub mod client;
pub mod compile;
pub mod errors;
pub mod launch;
pub mod poll;
pub mod progress;
pub mod reorder;
pub mod stage;
pub mod storage;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::{
        GenerationBackend, GenerationResult, StatusReport, SubmitResponse, UsageMetadata,
    };
    pub use crate::cancellation::CancellationToken;
    pub use crate::client::GenerationClient;
    pub use crate::compile::{compile, GenerationRequest, RequestOverrides};
    pub use crate::errors::{
        BackendError, CompileError, LaunchError, PollFailure, PromptpipeError, ReorderError,
        StorageError,
    };
    pub use crate::launch::{launch, ExecutionHandle, LaunchOutcome};
    pub use crate::poll::{ExecutionPoller, ExecutionState, PollerConfig};
    pub use crate::progress::{
        LoggingProgressSink, NoOpProgressSink, ProgressEvent, ProgressProjector, ProgressSink,
        ProgressStage,
    };
    pub use crate::reorder::ReorderTransaction;
    pub use crate::stage::{Stage, StageCategory, StageSet};
    pub use crate::storage::StageStore;
    pub use crate::utils::{generate_stage_id, Timestamp};
}
