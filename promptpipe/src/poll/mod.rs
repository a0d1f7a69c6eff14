//! Status polling for deferred executions.
//!
//! The poller converts a remote job's arbitrary-latency lifecycle into the
//! local [`ExecutionState`] machine, bounded by a retry budget and
//! interruptible by a cancellation token.

mod poller;
mod state;

pub use poller::{ExecutionPoller, PollerConfig};
pub use state::ExecutionState;
