//! The shared tap counter.
//!
//! One integer under one key, bumped on every tap. Atomicity belongs to the
//! store: Redis `INCR` in production, a mutex for the in-process store. The
//! application adds no locking of its own.
//!
//! A key that has never been written reads as 0 and the first increment
//! yields 1.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Scheme selecting [`MemoryStore`].
pub const MEMORY_SCHEME: &str = "memory://";

/// A key-value store that can hold integer counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Short backend name for logs and health reports.
    fn backend(&self) -> &'static str;

    /// Atomically add 1 to `key` and return the new value.
    async fn incr(&self, key: &str) -> Result<u64, StoreError>;

    /// Current value of `key`, `None` if it was never set.
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Round-trip to the store.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Open the store named by `config.url`.
///
/// Redis connections are established lazily on first use, so an outage at
/// startup degrades requests instead of preventing the server from booting.
///
/// # Errors
/// Returns `StoreError::Unavailable` if the URL cannot be parsed.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn CounterStore>, StoreError> {
    if config.url.starts_with(MEMORY_SCHEME) {
        info!("Using in-process counter store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(RedisStore::new(config)?))
}

// ---------------------------------------------------------------------------
// TapCounter
// ---------------------------------------------------------------------------

/// The tap counter: a store handle plus the key it lives under.
#[derive(Clone)]
pub struct TapCounter {
    store: Arc<dyn CounterStore>,
    key: String,
}

impl std::fmt::Debug for TapCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapCounter")
            .field("backend", &self.store.backend())
            .field("key", &self.key)
            .finish()
    }
}

impl TapCounter {
    /// Counter stored under `key`.
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Record one tap and return the new total.
    ///
    /// # Errors
    /// Returns the store's error if it cannot be reached.
    pub async fn increment(&self) -> Result<u64, StoreError> {
        let total = self.store.incr(&self.key).await?;
        debug!(key = %self.key, total, "Tap recorded");
        Ok(total)
    }

    /// Current total, 0 before the first tap.
    ///
    /// # Errors
    /// Returns the store's error if it cannot be reached.
    pub async fn read(&self) -> Result<u64, StoreError> {
        Ok(self.store.get(&self.key).await?.unwrap_or(0))
    }

    /// The underlying store, for health checks.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }
}

// ---------------------------------------------------------------------------
// Redis
// ---------------------------------------------------------------------------

/// Redis-backed store using an auto-reconnecting connection manager.
pub struct RedisStore {
    client: redis::Client,
    reconnect_retries: usize,
    connection_timeout: Duration,
    conn: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Prepare a store for `config.url`. Does not connect yet.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the URL is malformed.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self {
            client: redis::Client::open(config.url.as_str())?,
            reconnect_retries: config.reconnect_retries,
            connection_timeout: Duration::from_millis(config.connection_timeout_ms),
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                info!("Connecting to Redis");
                let manager_config = ConnectionManagerConfig::new()
                    .set_number_of_retries(self.reconnect_retries)
                    .set_connection_timeout(self.connection_timeout);
                self.client
                    .get_connection_manager_with_config(manager_config)
                    .await
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        let value: u64 = conn.incr(key, 1_u64).await?;
        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<u64> = conn.get(key).await?;
        Ok(value)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

/// In-process store for local runs and tests. Values die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, u64>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let mut values = self.values.lock();
        let value = values.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.values.lock().get(key).copied())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
