//! Compilation of a stage set into a generation request.
//!
//! [`compile`] is a pure function: same snapshot in, byte-identical request
//! out. All side effects (submission, polling) live elsewhere.

use serde::{Deserialize, Serialize};

use crate::errors::CompileError;
use crate::stage::{Stage, StageSet};

/// Delimiter between stage bodies in the compiled instruction section.
pub const STAGE_DELIMITER: &str = "\n\n---\n\n";

/// Temperature used when neither an override nor any enabled stage sets one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Candidate count used when no override is given.
pub const DEFAULT_CANDIDATE_COUNT: u32 = 1;

/// Per-call overrides applied on top of the stage configuration.
///
/// Every field is optional; an override always wins over stage-derived
/// values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOverrides {
    /// Model to use instead of any stage-specified model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token budget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Number of candidates to request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
}

impl RequestOverrides {
    /// Creates an empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model override.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the temperature override.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the output token budget.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Sets the candidate count.
    #[must_use]
    pub fn with_candidate_count(mut self, count: u32) -> Self {
        self.candidate_count = Some(count);
        self
    }
}

/// The compiled, ephemeral payload submitted for generation.
///
/// Never persisted; reconstructed from a fresh snapshot on each submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Ordered concatenation of enabled stage bodies.
    pub instructions: String,
    /// The raw user input (the subject section).
    pub input: String,
    /// The resolved model id.
    pub model: String,
    /// The resolved sampling temperature.
    pub temperature: f32,
    /// Output token budget, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Number of candidates to request.
    pub candidate_count: u32,
}

/// Compiles a stage set snapshot and raw input into a request.
///
/// Enabled stages are taken in ascending `(ordinal, id)` order and their
/// bodies joined with [`STAGE_DELIMITER`]. An empty enabled set is valid; a
/// request carrying only the raw input is still a request. Model resolution
/// never falls back silently: with no override and no enabled stage
/// specifying a model, compilation fails with
/// [`CompileError::NoModelResolved`].
pub fn compile(
    set: &StageSet,
    input: &str,
    overrides: &RequestOverrides,
) -> Result<GenerationRequest, CompileError> {
    let enabled = set.enabled_sorted();

    let instructions = enabled
        .iter()
        .map(|s| s.body.as_str())
        .collect::<Vec<_>>()
        .join(STAGE_DELIMITER);

    let model = overrides
        .model
        .clone()
        .or_else(|| resolve_stage_model(&enabled))
        .ok_or(CompileError::NoModelResolved)?;

    let temperature = overrides
        .temperature
        .or_else(|| most_recently_edited(&enabled).map(|s| s.temperature))
        .unwrap_or(DEFAULT_TEMPERATURE);

    let candidate_count = overrides
        .candidate_count
        .unwrap_or(DEFAULT_CANDIDATE_COUNT);

    Ok(GenerationRequest {
        instructions,
        input: input.to_string(),
        model,
        temperature,
        max_output_tokens: overrides.max_output_tokens,
        candidate_count,
    })
}

/// The model of the stage most relevant to final invocation: the last
/// enabled stage (in sorted order) that specifies one.
fn resolve_stage_model(enabled: &[&Stage]) -> Option<String> {
    enabled.iter().rev().find_map(|s| s.model.clone())
}

fn most_recently_edited<'a>(enabled: &[&'a Stage]) -> Option<&'a Stage> {
    enabled.iter().max_by_key(|s| s.updated_at).copied()
}
