//! Core types for LLM requests and responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which generation tier a model occupies in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Tier 1: the fast, preferred model.
    Primary,
    /// Tier 2: the cheaper "lite" model tried when the primary fails.
    Secondary,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}

/// Sampling and timeout knobs shared by every tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Output cap, sized for one short sentence.
    pub max_output_tokens: u32,
    /// Hard timeout for a single tier in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_output_tokens: 60,
            timeout_ms: 5000,
        }
    }
}

/// A request to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl LlmRequest {
    /// Build a request for `prompt` with the given settings.
    #[must_use]
    pub fn new(prompt: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
            timeout_ms: settings.timeout_ms,
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// A response from the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    /// The generated text, untrimmed.
    pub text: String,
    /// How many tokens were generated, when the provider reports it.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model was used.
    pub model: String,
}

impl LlmResponse {
    /// The trimmed text, or `None` when it is blank.
    #[must_use]
    pub fn non_blank_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
