//! LLM Client: the [`TextGenerator`] seam and its Gemini implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Default public endpoint for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Anything that can turn a prompt into text.
///
/// Implemented by [`GeminiClient`] in production and by fakes in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier this generator talks to.
    fn model(&self) -> &str;

    /// Generate a response. Blank text is returned as-is; callers decide
    /// whether blank counts as a failure.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;
}

/// Client for a single Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for `model`.
    ///
    /// # Errors
    /// Returns `LlmError::Config` if the API key or model name is blank.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is empty".into()));
        }
        if model.trim().is_empty() {
            return Err(LlmError::Config("model name is empty".into()));
        }

        Ok(Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// Another client sharing this one's HTTP pool and key, for a different model.
    #[must_use]
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": request.prompt }] },
            ],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            }
        });

        debug!(model = %self.model, "Calling Gemini generateContent");
        let start = Instant::now();
        let result = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(Duration::from_millis(request.timeout_ms))
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                warn!(model = %self.model, "Gemini request timed out after {}ms", request.timeout_ms);
                return Err(LlmError::Timeout(request.timeout_ms));
            }
            Err(e) => {
                warn!(model = %self.model, "Gemini request failed: {e}");
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let detail = format!("HTTP {status}");
            warn!(model = %self.model, "Gemini returned error: {detail}");
            return Err(
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    LlmError::ServiceUnavailable(detail)
                } else {
                    LlmError::RequestFailed(detail)
                },
            );
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let text = extract_text(&json)?;
        let tokens = json["usageMetadata"]["candidatesTokenCount"]
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);

        Ok(LlmResponse {
            text,
            tokens_generated: tokens,
            latency_ms,
            model: self.model.clone(),
        })
    }
}

/// Concatenate the text parts of the first candidate.
///
/// A body with no candidates at all (e.g. a blocked prompt) yields empty
/// text; a body that is not a `generateContent` response is a parse error.
fn extract_text(json: &Value) -> Result<String, LlmError> {
    let Some(candidates) = json.get("candidates") else {
        if json.get("promptFeedback").is_some() {
            return Ok(String::new());
        }
        return Err(LlmError::ParseError(
            "response has neither candidates nor promptFeedback".into(),
        ));
    };

    let parts = candidates[0]["content"]["parts"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    Ok(parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_is_rejected() {
        let err = GeminiClient::new(DEFAULT_BASE_URL, "  ", "gemini-2.5-flash")
            .expect_err("should fail");
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("http://localhost:9/", "k", "gemini-2.5-flash")
            .expect("valid client");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
        let lite = client.with_model("gemini-2.5-flash-lite");
        assert_eq!(lite.model(), "gemini-2.5-flash-lite");
    }

    #[test]
    fn extracts_joined_parts() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Fact " }, { "text": "A" }] } }]
        });
        assert_eq!(extract_text(&body).expect("text"), "Fact A");
    }

    #[test]
    fn blocked_prompt_is_empty_text() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(extract_text(&body).expect("text"), "");
    }

    #[test]
    fn unrelated_body_is_parse_error() {
        let body = json!({ "hello": "world" });
        assert!(matches!(extract_text(&body), Err(LlmError::ParseError(_))));
    }
}
