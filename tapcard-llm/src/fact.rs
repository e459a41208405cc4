//! Fun-fact generation with tiered fallback.
//!
//! A fact request walks three tiers in order and stops at the first one that
//! produces non-blank text:
//!
//! 1. the primary model,
//! 2. the secondary ("lite") model with the identical request,
//! 3. [`FALLBACK_FACT`].
//!
//! Each model tier is bounded by the request timeout. Failures are logged and
//! kept on the returned [`Fact`]; they never reach the caller as an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::TextGenerator;
use crate::error::LlmError;
use crate::prompt;
use crate::types::{GenerationSettings, LlmRequest, ModelTier};

/// Last-resort fact when both models fail.
pub const FALLBACK_FACT: &str =
    "Google uses AI to improve products like Search, Photos, and Translate with real-time intelligence.";

/// Label reported when [`FALLBACK_FACT`] is served.
pub const FALLBACK_LABEL: &str = "Built-in";

/// Where a fact's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactSource {
    /// A model tier answered.
    Model {
        /// Which tier.
        tier: ModelTier,
        /// Human-readable model name, e.g. "Gemini 2.5 Flash".
        label: String,
    },
    /// Both model tiers failed.
    Fallback,
}

impl FactSource {
    /// Label shown on the card and in `/fact` responses.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Model { label, .. } => label,
            Self::Fallback => FALLBACK_LABEL,
        }
    }

    /// The model tier, if a model produced the text.
    #[must_use]
    pub fn tier(&self) -> Option<ModelTier> {
        match self {
            Self::Model { tier, .. } => Some(*tier),
            Self::Fallback => None,
        }
    }
}

/// One tier that was tried and skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    /// Tier that failed.
    pub tier: ModelTier,
    /// Model identifier of that tier.
    pub model: String,
    /// Why it failed.
    pub error: LlmError,
}

/// A generated fact. `text` is always trimmed and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    /// The fact itself.
    pub text: String,
    /// Which tier produced it.
    pub source: FactSource,
    /// Tiers tried before the one that produced `text`, in order.
    pub failures: Vec<TierFailure>,
}

struct Tier {
    tier: ModelTier,
    label: String,
    generator: Arc<dyn TextGenerator>,
}

/// Produces one short fact per call and never fails.
pub struct FactGenerator {
    primary: Tier,
    secondary: Tier,
    settings: GenerationSettings,
}

impl std::fmt::Debug for FactGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactGenerator")
            .field("primary", &self.primary.generator.model())
            .field("secondary", &self.secondary.generator.model())
            .field("settings", &self.settings)
            .finish()
    }
}

impl FactGenerator {
    /// Chain `primary` and `secondary`. Labels are derived from model names.
    #[must_use]
    pub fn new(
        primary: Arc<dyn TextGenerator>,
        secondary: Arc<dyn TextGenerator>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            primary: Tier {
                tier: ModelTier::Primary,
                label: display_name(primary.model()),
                generator: primary,
            },
            secondary: Tier {
                tier: ModelTier::Secondary,
                label: display_name(secondary.model()),
                generator: secondary,
            },
            settings,
        }
    }

    /// The first-choice generator, for health checks that should exercise
    /// the same client as live traffic.
    #[must_use]
    pub fn primary(&self) -> &Arc<dyn TextGenerator> {
        &self.primary.generator
    }

    /// Settings applied to every tier.
    #[must_use]
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Generate a fact from a freshly randomised prompt.
    pub async fn generate(&self) -> Fact {
        self.generate_from(prompt::fun_fact()).await
    }

    /// Generate a fact for a specific prompt.
    pub async fn generate_from(&self, prompt: impl Into<String>) -> Fact {
        let request = LlmRequest::new(prompt, &self.settings);
        let mut failures = Vec::new();

        for tier in [&self.primary, &self.secondary] {
            match attempt(tier, &request).await {
                Ok(text) => {
                    debug!(tier = %tier.tier, model = tier.generator.model(), "Fact generated");
                    return Fact {
                        text,
                        source: FactSource::Model {
                            tier: tier.tier,
                            label: tier.label.clone(),
                        },
                        failures,
                    };
                }
                Err(error) => {
                    warn!(
                        tier = %tier.tier,
                        model = tier.generator.model(),
                        "Fact tier failed: {error}"
                    );
                    failures.push(TierFailure {
                        tier: tier.tier,
                        model: tier.generator.model().to_string(),
                        error,
                    });
                }
            }
        }

        warn!("All model tiers failed, serving built-in fact");
        Fact {
            text: FALLBACK_FACT.to_string(),
            source: FactSource::Fallback,
            failures,
        }
    }
}

async fn attempt(tier: &Tier, request: &LlmRequest) -> Result<String, LlmError> {
    let limit = Duration::from_millis(request.timeout_ms);
    let response = tokio::time::timeout(limit, tier.generator.generate(request))
        .await
        .map_err(|_| LlmError::Timeout(request.timeout_ms))??;

    response
        .non_blank_text()
        .map(str::to_owned)
        .ok_or(LlmError::EmptyResponse)
}

/// "gemini-2.5-flash-lite" → "Gemini 2.5 Flash Lite".
#[must_use]
pub fn display_name(model: &str) -> String {
    model
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
