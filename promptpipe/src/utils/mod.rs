//! Small shared utilities.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Timestamp type used across the crate.
pub type Timestamp = DateTime<Utc>;

/// Generates an opaque unique stage id.
///
/// Ids are stable across reorders; ordering never derives from them except
/// as a deterministic tie-breaker on ordinal collisions.
#[must_use]
pub fn generate_stage_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ids_are_unique() {
        let a = generate_stage_id();
        let b = generate_stage_id();
        assert_ne!(a, b);
    }
}
