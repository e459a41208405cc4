//! Configuration for the tapcard service.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults (every field has one except the two secrets),
//! 2. an optional TOML file (`tapcard.toml` unless told otherwise),
//! 3. `TAPCARD__SECTION__KEY` environment variables,
//! 4. the well-known `GEMINI_API_KEY` and `REDIS_URL` variables.
//!
//! A `.env` file in the working directory is loaded into the environment
//! first. The API key and store URL have no default anywhere; a missing value
//! is a [`ConfigError::Missing`].

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tapcard.toml";
/// Prefix for layered environment overrides.
pub const ENV_PREFIX: &str = "TAPCARD";
/// Environment variable holding the generation API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable holding the store connection URL.
pub const STORE_URL_ENV: &str = "REDIS_URL";

/// URL schemes accepted for `store.url`.
const STORE_SCHEMES: &[&str] = &["redis://", "rediss://", "redis+unix://", "unix://", "memory://"];

/// Top-level tapcard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener and static assets.
    #[serde(default)]
    pub server: ServerConfig,
    /// Text-generation service.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Shared key-value store.
    #[serde(default)]
    pub store: StoreConfig,
    /// Contact details shown on the card.
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse configuration from a TOML string. Does not validate.
    ///
    /// # Errors
    /// Returns `ConfigError::Toml` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load from `.env`, the config file, and the process environment, then
    /// validate. `path` must exist when given; without it `tapcard.toml` is
    /// read if present.
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed, an explicit `path` is
    /// missing, or a required setting is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(dotenv) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", dotenv.display());
        }
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`] but reads variables from `vars` instead of the
    /// process environment when given. Skips `.env`.
    ///
    /// # Errors
    /// Same as [`AppConfig::load`].
    pub fn load_with_env(
        path: Option<&Path>,
        vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        // An explicit path must exist; the implicit default may be absent.
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        let lookup = |name: &str| match &vars {
            Some(vars) => vars.get(name).cloned(),
            None => env::var(name).ok(),
        };
        let api_key = lookup(API_KEY_ENV);
        let store_url = lookup(STORE_URL_ENV);

        let settings = Config::builder()
            .add_source(File::from(path.as_path()).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .set_override_option("llm.api_key", api_key)?
            .set_override_option("store.url", store_url)?
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check required and range-limited settings.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "llm.api_key",
                env: API_KEY_ENV,
            });
        }
        if self.store.url.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "store.url",
                env: STORE_URL_ENV,
            });
        }
        if !STORE_SCHEMES
            .iter()
            .any(|scheme| self.store.url.starts_with(scheme))
        {
            return Err(ConfigError::Invalid {
                key: "store.url",
                reason: format!("expected one of {}", STORE_SCHEMES.join(", ")),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid {
                key: "llm.temperature",
                reason: format!("{} is outside 0.0..=2.0", self.llm.temperature),
            });
        }
        if self.llm.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "llm.request_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        if self.store.counter_key.is_empty() {
            return Err(ConfigError::Invalid {
                key: "store.counter_key",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served under `/static`. Relative paths resolve against the
    /// working directory; the default assumes the workspace root.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// `host:port` as a socket address.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the host is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid {
                key: "server.host",
                reason: format!("{e}"),
            })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Text-generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Generative Language API key. Required.
    #[serde(default)]
    pub api_key: String,
    /// API base URL.
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    /// Tier 1 model.
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    /// Tier 2 model.
    #[serde(default = "default_secondary_model")]
    pub secondary_model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output cap per fact.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Hard timeout for each tier in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_llm_url(),
            primary_model: default_primary_model(),
            secondary_model: default_secondary_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Key-value store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL. `memory://` selects the in-process store. Required.
    #[serde(default)]
    pub url: String,
    /// Key holding the tap counter.
    #[serde(default = "default_counter_key")]
    pub counter_key: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Reconnect attempts before an operation fails.
    #[serde(default = "default_reconnect_retries")]
    pub reconnect_retries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            counter_key: default_counter_key(),
            connection_timeout_ms: default_connection_timeout_ms(),
            reconnect_retries: default_reconnect_retries(),
        }
    }
}

/// Static contact details rendered on the card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Card owner's name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Job title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Contact email.
    #[serde(default = "default_email")]
    pub email: String,
    /// LinkedIn profile URL.
    #[serde(default = "default_linkedin")]
    pub linkedin: String,
    /// GitHub profile URL.
    #[serde(default = "default_github")]
    pub github: String,
    /// vCard file name inside `server.static_dir`.
    #[serde(default = "default_vcard_file")]
    pub vcard_file: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            title: default_title(),
            email: default_email(),
            linkedin: default_linkedin(),
            github: default_github(),
            vcard_file: default_vcard_file(),
        }
    }
}

/// Log output settings. `RUST_LOG` wins over `level` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_static_dir() -> PathBuf { PathBuf::from("tapcard-server/static") }
fn default_llm_url() -> String { "https://generativelanguage.googleapis.com".to_string() }
fn default_primary_model() -> String { "gemini-2.5-flash".to_string() }
fn default_secondary_model() -> String { "gemini-2.5-flash-lite".to_string() }
fn default_temperature() -> f32 { 0.8 }
fn default_max_output_tokens() -> u32 { 60 }
fn default_request_timeout_ms() -> u64 { 5000 }
fn default_counter_key() -> String { "tap_counter".to_string() }
fn default_connection_timeout_ms() -> u64 { 2000 }
fn default_reconnect_retries() -> usize { 1 }
fn default_name() -> String { "Victor Loza".to_string() }
fn default_title() -> String { "Junior Back-End Developer".to_string() }
fn default_email() -> String { "Loza.Victor@outlook.com".to_string() }
fn default_linkedin() -> String { "https://linkedin.com/in/lozavictor".to_string() }
fn default_github() -> String { "https://github.com/lozavictor".to_string() }
fn default_vcard_file() -> String { "victor_loza.vcf".to_string() }
fn default_log_level() -> String { "info".to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = AppConfig::from_toml("").expect("valid");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.primary_model, "gemini-2.5-flash");
        assert_eq!(config.llm.secondary_model, "gemini-2.5-flash-lite");
        assert_eq!(config.llm.max_output_tokens, 60);
        assert_eq!(config.store.counter_key, "tap_counter");
        assert!(config.llm.api_key.is_empty());
    }

    #[test]
    fn defaults_fail_validation_without_secrets() {
        let err = AppConfig::default().validate().expect_err("should fail");
        assert!(matches!(err, ConfigError::Missing { key: "llm.api_key", .. }));
    }

    #[test]
    fn missing_store_url_fails_fast() {
        let err = AppConfig::load_with_env(
            None,
            vars(&[("GEMINI_API_KEY", "k")]),
        )
        .expect_err("should fail");
        assert!(matches!(err, ConfigError::Missing { key: "store.url", env: "REDIS_URL" }));
    }

    #[test]
    fn well_known_variables_fill_secrets() {
        let config = AppConfig::load_with_env(
            None,
            vars(&[("GEMINI_API_KEY", "k"), ("REDIS_URL", "redis://cache:6379")]),
        )
        .expect("valid");
        assert_eq!(config.llm.api_key, "k");
        assert_eq!(config.store.url, "redis://cache:6379");
    }

    #[test]
    fn prefixed_variables_override_sections() {
        let config = AppConfig::load_with_env(
            None,
            vars(&[
                ("GEMINI_API_KEY", "k"),
                ("REDIS_URL", "memory://"),
                ("TAPCARD__SERVER__PORT", "9090"),
                ("TAPCARD__LLM__PRIMARY_MODEL", "gemini-2.0-flash"),
            ]),
        )
        .expect("valid");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.llm.primary_model, "gemini-2.0-flash");
    }

    #[test]
    fn environment_wins_over_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tapcard.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 7000

[llm]
secondary_model = "gemini-2.0-flash-lite"

[store]
url = "redis://file-host:6379"
counter_key = "card_taps"
"#,
        )
        .expect("write");

        let config = AppConfig::load_with_env(
            Some(&path),
            vars(&[
                ("GEMINI_API_KEY", "k"),
                ("REDIS_URL", "redis://env-host:6379"),
                ("TAPCARD__SERVER__PORT", "9090"),
            ]),
        )
        .expect("valid");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.llm.secondary_model, "gemini-2.0-flash-lite");
        assert_eq!(config.store.url, "redis://env-host:6379");
        assert_eq!(config.store.counter_key, "card_taps");
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = AppConfig::load_with_env(
            Some(&dir.path().join("tapcrad.toml")),
            vars(&[("GEMINI_API_KEY", "k"), ("REDIS_URL", "memory://")]),
        )
        .expect_err("should fail");
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn default_static_dir_holds_vcard() {
        let config = AppConfig::default();
        let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let vcard = workspace
            .join(&config.server.static_dir)
            .join(&config.profile.vcard_file);
        assert!(vcard.is_file(), "{} missing", vcard.display());
    }

    #[test]
    fn unknown_store_scheme_is_rejected() {
        let err = AppConfig::load_with_env(
            None,
            vars(&[("GEMINI_API_KEY", "k"), ("REDIS_URL", "http://cache")]),
        )
        .expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid { key: "store.url", .. }));
    }

    #[test]
    fn bind_addr_parses() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_addr().expect("addr").port(), 8000);
        let bad = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(bad.bind_addr().is_err());
    }
}
