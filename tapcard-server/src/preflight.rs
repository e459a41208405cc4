//! Deployment checks: store, generation service, card template, vCard.
//!
//! `serve` runs the free checks at startup and logs them. The `preflight`
//! command runs all of them, including one live model call, prints a line
//! per check and reports overall success.

use std::sync::Arc;

use askama::Template;
use async_trait::async_trait;
use chrono::Utc;
use tapcard_core::config::ProfileConfig;
use tapcard_core::health::{self, CheckOutcome, CheckReport, FileCheck, HealthCheck, StoreCheck};
use tapcard_core::AppConfig;
use tapcard_llm::{
    FALLBACK_FACT, Fact, FactSource, GenerationSettings, LlmRequest, TextGenerator, prompt,
};
use tracing::{info, warn};

use crate::card::DisplayContext;
use crate::error::StartupError;
use crate::state::AppState;

/// Longest fact preview printed on a passing generation check.
const PREVIEW_CHARS: usize = 80;

/// One live call to a model.
pub struct GenerationCheck {
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
}

impl GenerationCheck {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, settings: GenerationSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }
}

#[async_trait]
impl HealthCheck for GenerationCheck {
    fn name(&self) -> &str {
        "generation service"
    }

    fn billable(&self) -> bool {
        true
    }

    async fn check(&self) -> CheckOutcome {
        let request = LlmRequest::new(prompt::PROBE, &self.settings);
        match self.generator.generate(&request).await {
            Ok(response) => match response.non_blank_text() {
                Some(text) => {
                    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
                    CheckOutcome::Pass(format!("{}: {preview}", self.generator.model()))
                }
                None => CheckOutcome::Fail(format!(
                    "{} returned an empty response",
                    self.generator.model()
                )),
            },
            Err(e) => CheckOutcome::Fail(format!("{}: {e}", self.generator.model())),
        }
    }
}

/// Renders the card with sample values.
pub struct TemplateCheck {
    profile: ProfileConfig,
}

impl TemplateCheck {
    #[must_use]
    pub fn new(profile: ProfileConfig) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl HealthCheck for TemplateCheck {
    fn name(&self) -> &str {
        "card template"
    }

    async fn check(&self) -> CheckOutcome {
        let sample = Fact {
            text: FALLBACK_FACT.to_string(),
            source: FactSource::Fallback,
            failures: Vec::new(),
        };
        match DisplayContext::new(0, Utc::now(), &sample, &self.profile).render() {
            Ok(html) if html.contains(FALLBACK_FACT) => {
                CheckOutcome::Pass(format!("card.html rendered ({} bytes)", html.len()))
            }
            Ok(_) => CheckOutcome::Fail("card.html rendered without the fact".into()),
            Err(e) => CheckOutcome::Fail(e.to_string()),
        }
    }
}

/// Every check for `config`, wired to the same collaborators `state` uses.
#[must_use]
pub fn checks(state: &AppState, config: &AppConfig) -> Vec<Arc<dyn HealthCheck>> {
    let vcard = config.server.static_dir.join(&config.profile.vcard_file);

    vec![
        Arc::new(StoreCheck::new(state.counter.store().clone())) as Arc<dyn HealthCheck>,
        Arc::new(GenerationCheck::new(
            state.facts.primary().clone(),
            *state.facts.settings(),
        )),
        Arc::new(TemplateCheck::new(state.profile.as_ref().clone())),
        Arc::new(FileCheck::new("static vCard", vcard)),
    ]
}

/// Run the non-billable checks and log each result.
pub async fn log_startup_checks(checks: Vec<Arc<dyn HealthCheck>>) -> Vec<CheckReport> {
    let free: Vec<_> = checks.into_iter().filter(|c| !c.billable()).collect();
    let reports = health::run_checks(&free).await;
    for report in &reports {
        if report.outcome.is_pass() {
            info!("{report}");
        } else {
            warn!("{report}");
        }
    }
    reports
}

/// The `preflight` command. Returns whether every check passed.
///
/// # Errors
/// Returns an error if the state cannot be built from `config`.
pub async fn run(config: &AppConfig) -> Result<bool, StartupError> {
    let state = AppState::from_config(config)?;
    let checks = checks(&state, config);

    println!("Starting pre-deployment verification...");
    let reports = health::run_checks(&checks).await;
    for report in &reports {
        println!("{report}");
    }

    let passed = health::all_passed(&reports);
    if passed {
        println!("All checks passed; ready to deploy.");
    } else {
        println!("Some checks failed; fix them before deploying.");
    }
    Ok(passed)
}
