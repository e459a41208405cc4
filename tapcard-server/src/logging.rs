//! Structured logging setup.

use tapcard_core::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `config.level`.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    if config.json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}
