//! LLM error types.

use thiserror::Error;

/// Errors that can occur while asking a model for text.
///
/// The fact generator never returns these to its caller; they are logged
/// and recorded on the [`Fact`](crate::Fact) so tests can tell tiers apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// The model answered but the text was missing or blank.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// Connection refused, rate limited, or a 5xx from the provider.
    #[error("LLM provider unavailable: {0}")]
    ServiceUnavailable(String),

    /// Request did not finish inside its timeout.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// HTTP request failed for any other reason.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// Response body was not the shape we expected.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// Client is misconfigured (missing key, bad URL).
    #[error("LLM configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            LlmError::ParseError(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
