//! The ordered, uniquely keyed collection of stages for one pipeline.

use serde::{Deserialize, Serialize};

use super::Stage;

/// All stages belonging to one pipeline.
///
/// Compilation and reordering always operate on the deterministic
/// `(ordinal, id)` order; insertion order of the underlying vector is
/// irrelevant. `snapshot` yields an immutable copy so that compilation never
/// observes a half-updated set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSet {
    stages: Vec<Stage>,
}

impl StageSet {
    /// Creates an empty stage set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a stage set from existing records.
    ///
    /// Duplicate ids keep the first occurrence; later duplicates are dropped.
    #[must_use]
    pub fn from_stages(stages: Vec<Stage>) -> Self {
        let mut set = Self::new();
        for stage in stages {
            if set.get(&stage.id).is_none() {
                set.stages.push(stage);
            }
        }
        set
    }

    /// Adds a new stage, assigning it the next free ordinal.
    ///
    /// Returns `false` (and leaves the set untouched) if the id is taken.
    pub fn add(&mut self, mut stage: Stage) -> bool {
        if self.get(&stage.id).is_some() {
            return false;
        }
        stage.ordinal = self.next_free_ordinal();
        self.stages.push(stage);
        true
    }

    /// The next ordinal after the current maximum, starting at 1.
    #[must_use]
    pub fn next_free_ordinal(&self) -> u32 {
        self.stages.iter().map(|s| s.ordinal).max().unwrap_or(0) + 1
    }

    /// Looks up a stage by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Looks up a stage by id for mutation.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.id == id)
    }

    /// Removes a stage by id.
    ///
    /// Remaining stages are not renumbered; ordinals are positions, not
    /// dense indices.
    pub fn remove(&mut self, id: &str) -> Option<Stage> {
        let index = self.stages.iter().position(|s| s.id == id)?;
        Some(self.stages.remove(index))
    }

    /// Enables or disables a stage. Returns `false` if the id is unknown.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.get_mut(id) {
            Some(stage) => {
                stage.enabled = enabled;
                stage.touch();
                true
            }
            None => false,
        }
    }

    /// All stages in `(ordinal, id)` order, regardless of the enabled flag.
    #[must_use]
    pub fn visible_sorted(&self) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self.stages.iter().collect();
        stages.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        stages
    }

    /// Enabled stages in `(ordinal, id)` order.
    #[must_use]
    pub fn enabled_sorted(&self) -> Vec<&Stage> {
        let mut stages: Vec<&Stage> = self.stages.iter().filter(|s| s.enabled).collect();
        stages.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        stages
    }

    /// An immutable copy for compilation.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Iterates over stages in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    /// The number of stages, enabled or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the set holds no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
