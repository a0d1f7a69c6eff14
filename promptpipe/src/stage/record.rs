//! The stage record and its category vocabulary.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{generate_stage_id, Timestamp};

/// The informational category of a stage.
///
/// A closed vocabulary; it never affects ordering or compilation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    /// Defines the role the model should assume.
    Role,
    /// General behavioural guidelines.
    Guideline,
    /// Step-by-step workflow instructions.
    Workflow,
    /// Constraints on the output format.
    OutputFormat,
    /// Few-shot examples.
    Example,
    /// Scoring or evaluation criteria.
    Scoring,
}

impl Default for StageCategory {
    fn default() -> Self {
        Self::Guideline
    }
}

impl fmt::Display for StageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role => write!(f, "role"),
            Self::Guideline => write!(f, "guideline"),
            Self::Workflow => write!(f, "workflow"),
            Self::OutputFormat => write!(f, "output_format"),
            Self::Example => write!(f, "example"),
            Self::Scoring => write!(f, "scoring"),
        }
    }
}

/// One configurable unit of the generation pipeline.
///
/// Ordinals are positions, not dense indices: removal does not renumber the
/// remaining stages, so execution order must always be re-derived by sorting
/// on `(ordinal, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Opaque unique id, stable across reorders.
    pub id: String,
    /// Execution position; ascending order, unique among enabled stages.
    pub ordinal: u32,
    /// Disabled stages are excluded from compilation but retained in storage.
    pub enabled: bool,
    /// Informational category.
    #[serde(default)]
    pub category: StageCategory,
    /// Model to request, if this stage specifies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature in `[0.0, 1.0]`.
    pub temperature: f32,
    /// Free-text instruction content; may be empty.
    pub body: String,
    /// Last edit time; drives most-recently-edited parameter resolution.
    pub updated_at: Timestamp,
}

impl Stage {
    /// Creates a new enabled stage with a generated id and ordinal `0`.
    ///
    /// The ordinal is assigned when the stage is added to a [`super::StageSet`].
    #[must_use]
    pub fn new(category: StageCategory) -> Self {
        Self {
            id: generate_stage_id(),
            ordinal: 0,
            enabled: true,
            category,
            model: None,
            temperature: 0.7,
            body: String::new(),
            updated_at: Utc::now(),
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the ordinal.
    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the temperature, clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Marks the stage as edited now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The deterministic ordering key: ordinal first, id as tie-breaker.
    ///
    /// Ordinal collisions are possible after a partial-failure reorder, so
    /// the tie-breaker is load-bearing, not cosmetic.
    #[must_use]
    pub fn order_key(&self) -> (u32, &str) {
        (self.ordinal, self.id.as_str())
    }
}
