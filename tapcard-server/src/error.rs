use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tapcard_core::{ConfigError, StoreError};
use tapcard_llm::LlmError;
use thiserror::Error;
use tracing::error;

/// Route failures. Every variant becomes a 500 with `{error, details, hint}`.
///
/// `details` is a fixed description per cause; the underlying error is only
/// written to the log.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Tap route failed")]
    Tap(#[source] StoreError),

    #[error("Counter store error")]
    Stats(#[source] StoreError),

    #[error("Card rendering failed")]
    Render(#[from] askama::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    details: &'static str,
    hint: &'static str,
}

impl AppError {
    fn details(&self) -> &'static str {
        match self {
            Self::Tap(StoreError::Unavailable(_)) | Self::Stats(StoreError::Unavailable(_)) => {
                "The tap counter store could not be reached."
            }
            Self::Tap(StoreError::Corrupt(_)) | Self::Stats(StoreError::Corrupt(_)) => {
                "The tap counter holds an unexpected value."
            }
            Self::Render(_) => "The card page could not be rendered.",
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            Self::Tap(_) => "Check Redis or Gemini API availability.",
            Self::Stats(_) => "Check Redis availability.",
            Self::Render(_) => "Check the card template.",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Tap(source) | Self::Stats(source) => error!(error = %source, "{self}"),
            Self::Render(source) => error!(error = %source, "{self}"),
        }

        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
            hint: self.hint(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Anything that stops the server or preflight from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Counter store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Generation client setup failed: {0}")]
    Llm(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
