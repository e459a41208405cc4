//! Prompt templates for fun-fact generation.
//!
//! Templates use `{name}` placeholders filled by [`render_template`].

use rand::Rng;

/// The fun-fact prompt. `{variation}` nudges the provider away from
/// returning a cached answer.
pub const FUN_FACT: &str = "Provide one concise AI fun fact (≤{max_words} words) \
about how Google uses AI in real products, research, or tools. \
Make it fresh and distinct. Seed reference: {variation}";

/// Prompt used by the pre-deploy check; deterministic on purpose.
pub const PROBE: &str = "Provide a concise AI fun fact about how Google uses AI.";

/// Intended upper bound on fact length. Not enforced on the output.
pub const MAX_WORDS: u32 = 25;

/// Simple template renderer: replaces `{key}` with values.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Render [`FUN_FACT`] with the given variation token.
#[must_use]
pub fn fun_fact_with(variation: u32) -> String {
    render_template(
        FUN_FACT,
        &[
            ("max_words", &MAX_WORDS.to_string()),
            ("variation", &variation.to_string()),
        ],
    )
}

/// Render [`FUN_FACT`] with a fresh random 4-digit variation token.
#[must_use]
pub fn fun_fact() -> String {
    fun_fact_with(rand::thread_rng().gen_range(1000..=9999))
}
