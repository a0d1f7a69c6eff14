//! Test doubles for the backend, storage and progress seams.
//!
//! These are real implementations of the crate's ports with scripted
//! behaviour, usable from unit tests and from downstream crates' tests.

mod mocks;

pub use mocks::{MemoryStageStore, ScriptedBackend};

pub use crate::progress::CollectingProgressSink;
