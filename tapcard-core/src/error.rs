//! Error types for the tapcard core library.

use thiserror::Error;

/// Failures of the shared key-value store behind the tap counter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or dropped the connection.
    #[error("Counter store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the operation or held a non-integer under the key.
    #[error("Counter value is corrupt: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if matches!(
            err.kind(),
            redis::ErrorKind::TypeError | redis::ErrorKind::ResponseError
        ) {
            StoreError::Corrupt(err.to_string())
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

/// Problems with startup configuration. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting was not provided by any source.
    #[error("Missing required setting `{key}` (set {env})")]
    Missing {
        /// Dotted config key.
        key: &'static str,
        /// Environment variable that can provide it.
        env: &'static str,
    },

    /// A setting was present but unusable.
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid {
        /// Dotted config key.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The file or environment could not be parsed.
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A TOML string could not be parsed.
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),
}
