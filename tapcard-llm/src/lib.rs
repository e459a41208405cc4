//! # tapcard-llm: generative language layer for tapcard
//!
//! Everything the card needs from a text-generation service goes through
//! this crate:
//!   - **[`GeminiClient`]** talks to the Gemini `generateContent` endpoint
//!     for one configured model.
//!   - **[`FactGenerator`]** chains two clients and a built-in sentence so a
//!     tap always gets a fact.
//!
//! # Architecture
//!
//! ```text
//! Tier 1: Primary model   (gemini-2.5-flash)       [bounded by timeout]
//! Tier 2: Secondary model (gemini-2.5-flash-lite)  [bounded by timeout]
//! Tier 3: Built-in sentence                         [never fails]
//! ```
//!
//! Tiers run strictly in order. There are no retries inside a tier; the
//! next tier is the retry.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod fact;
pub mod prompt;
pub mod types;

pub use client::{GeminiClient, TextGenerator};
pub use error::LlmError;
pub use fact::{FALLBACK_FACT, Fact, FactGenerator, FactSource, TierFailure};
pub use types::{GenerationSettings, LlmRequest, LlmResponse, ModelTier};
