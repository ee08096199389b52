use crate::domain::CacheValue;
use crate::ports::KeyValueStore;
use crate::status::{self, ConnectionStatus};
use shared::{Error, Result, TtlSecs};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Client for the key-value cache.
///
/// The client starts out alive: the driver connects lazily and holds
/// commands until the socket is up. The flag only drops when the startup
/// attempt fails or the adapter publishes a connection failure, and from then
/// on operations fail with [`Error::NotConnected`] until a `Connected` event
/// arrives.
pub struct CacheClient {
    store: Arc<dyn KeyValueStore>,
    status: Arc<ConnectionStatus>,
    attempted: watch::Receiver<bool>,
    watcher: JoinHandle<()>,
}

impl CacheClient {
    pub const STORE: &'static str = "cache";

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let status = Arc::new(ConnectionStatus::new(Self::STORE, true));
        let watcher = status::follow_events(status.clone(), store.events());

        let connecting = store.clone();
        let attempted = status::connect_in_background(status.clone(), async move {
            connecting.connect().await
        });

        Self {
            store,
            status,
            attempted,
            watcher,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }

    /// Wait for the startup connection attempt, then report liveness.
    pub async fn connected(&self) -> bool {
        status::settled(&self.attempted).await;
        self.is_alive()
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.status.ensure_alive()?;
        self.store.get(key).await
    }

    /// Store `value` under `key`; the store evicts it after `ttl_secs` seconds.
    pub async fn set(&self, key: &str, value: impl Into<CacheValue>, ttl_secs: u64) -> Result<()> {
        if ttl_secs == 0 {
            return Err(Error::InvalidExpiry);
        }
        self.status.ensure_alive()?;
        let value = value.into();
        self.store
            .set_ex(key, value.as_str(), TtlSecs(ttl_secs))
            .await
    }

    /// Remove `key`. A missing key is not an error.
    pub async fn del(&self, key: &str) -> Result<()> {
        self.status.ensure_alive()?;
        self.store.delete(key).await?;
        Ok(())
    }
}

impl Drop for CacheClient {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheClient")
            .field("alive", &self.is_alive())
            .finish()
    }
}
