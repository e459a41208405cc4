use std::sync::Arc;

use tapcard_core::{AppConfig, TapCounter, config::ProfileConfig, open_store};
use tapcard_llm::{FactGenerator, GeminiClient, GenerationSettings};

use crate::error::StartupError;

/// Shared handles injected into every route.
#[derive(Clone)]
pub struct AppState {
    pub counter: TapCounter,
    pub facts: Arc<FactGenerator>,
    pub profile: Arc<ProfileConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(counter: TapCounter, facts: FactGenerator, profile: ProfileConfig) -> Self {
        Self {
            counter,
            facts: Arc::new(facts),
            profile: Arc::new(profile),
        }
    }

    /// Build the production state: Redis (or in-process) counter and the two
    /// Gemini tiers.
    ///
    /// # Errors
    /// Returns an error if the store URL or the API key is unusable.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let store = open_store(&config.store)?;
        let counter = TapCounter::new(store, config.store.counter_key.clone());

        let (primary, secondary) = gemini_tiers(config)?;
        let facts = FactGenerator::new(
            Arc::new(primary),
            Arc::new(secondary),
            generation_settings(config),
        );

        Ok(Self::new(counter, facts, config.profile.clone()))
    }
}

/// Primary and secondary Gemini clients sharing one HTTP pool.
///
/// # Errors
/// Returns an error if the API key or a model name is blank.
fn gemini_tiers(config: &AppConfig) -> Result<(GeminiClient, GeminiClient), StartupError> {
    let primary = GeminiClient::new(
        config.llm.base_url.clone(),
        config.llm.api_key.clone(),
        config.llm.primary_model.clone(),
    )?;
    let secondary = primary.with_model(config.llm.secondary_model.clone());
    Ok((primary, secondary))
}

fn generation_settings(config: &AppConfig) -> GenerationSettings {
    GenerationSettings {
        temperature: config.llm.temperature,
        max_output_tokens: config.llm.max_output_tokens,
        timeout_ms: config.llm.request_timeout_ms,
    }
}
