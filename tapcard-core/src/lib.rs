//! # tapcard Core Library
//!
//! Shared pieces of the NFC business-card backend:
//!
//! - [`config`]: layered settings (TOML file, `TAPCARD__*` env, `.env`)
//! - [`counter`]: the single shared tap counter and its stores
//! - [`health`]: pre-deploy checks every collaborator can expose
//!
//! Nothing in here talks HTTP; the server crate wires these together.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod counter;
pub mod error;
pub mod health;

pub use config::AppConfig;
pub use counter::{CounterStore, MemoryStore, RedisStore, TapCounter, open_store};
pub use error::{ConfigError, StoreError};
pub use health::{CheckOutcome, CheckReport, HealthCheck};
