//! Stage records and the ordered stage set.
//!
//! A [`Stage`] is one toggle-able configuration fragment of the generation
//! pipeline; a [`StageSet`] holds all stages of one pipeline and owns the
//! deterministic `(ordinal, id)` ordering that compilation relies on.

mod record;
mod set;

pub use record::{Stage, StageCategory};
pub use set::StageSet;
