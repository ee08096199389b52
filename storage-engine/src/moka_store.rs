use async_trait::async_trait;
use datastore::{ConnectionEvent, KeyValueStore};
use moka::Expiry;
use moka::future::Cache;
use shared::{Result, TtlSecs};
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Every entry lives for the ttl it was written with
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Moka-based in-process key-value store with per-entry TTL.
/// Stands in for Redis in tests and single-process deployments.
pub struct MokaKeyValueStore {
    cache: Cache<String, Entry>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl MokaKeyValueStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::with_builder(Cache::builder())
    }

    /// Create a store holding at most `max_entries` keys
    pub fn new_bounded(max_entries: u64) -> Self {
        Self::with_builder(Cache::builder().max_capacity(max_entries))
    }

    fn with_builder(
        builder: moka::future::CacheBuilder<String, Entry, Cache<String, Entry>>,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            cache: builder.name("files-manager").expire_after(PerEntryTtl).build(),
            events,
        }
    }
}

impl Default for MokaKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MokaKeyValueStore {
    async fn connect(&self) -> Result<()> {
        // Nothing to dial; the store is reachable as soon as it exists
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Expired entries are never returned, even before eviction
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            ttl: ttl.as_duration(),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.cache.remove(key).await.is_some())
    }

    fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}

impl Debug for MokaKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaKeyValueStore")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastore::CacheClient;
    use std::sync::Arc;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_moka_store_set_and_get() {
        let store = MokaKeyValueStore::new();

        store.set_ex("hello", "world", TtlSecs(10)).await.unwrap();

        let value = store.get("hello").await.unwrap();
        assert_eq!(value.as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_moka_store_get_nonexistent() {
        let store = MokaKeyValueStore::new();

        assert_eq!(store.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_moka_store_delete() {
        let store = MokaKeyValueStore::new();

        store.set_ex("test_key", "test_value", TtlSecs(10)).await.unwrap();

        assert!(store.delete("test_key").await.unwrap());
        assert!(!store.delete("test_key").await.unwrap());
        assert_eq!(store.get("test_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_moka_store_overwrite() {
        let store = MokaKeyValueStore::new();

        store.set_ex("key", "value1", TtlSecs(10)).await.unwrap();
        store.set_ex("key", "value2", TtlSecs(10)).await.unwrap();

        assert_eq!(store.get("key").await.unwrap().as_deref(), Some("value2"));
    }

    #[tokio::test]
    async fn test_moka_store_entry_expires() {
        let store = MokaKeyValueStore::new();

        store.set_ex("short", "lived", TtlSecs(1)).await.unwrap();
        store.set_ex("long", "lived", TtlSecs(60)).await.unwrap();
        assert!(store.get("short").await.unwrap().is_some());

        sleep(Duration::from_millis(1200)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap().as_deref(), Some("lived"));
    }

    #[tokio::test]
    async fn test_moka_store_bounded() {
        let store = MokaKeyValueStore::new_bounded(2);

        store.set_ex("key1", "value1", TtlSecs(60)).await.unwrap();
        store.set_ex("key2", "value2", TtlSecs(60)).await.unwrap();
        store.set_ex("key3", "value3", TtlSecs(60)).await.unwrap();

        store.cache.run_pending_tasks().await;

        assert!(store.cache.entry_count() <= 2, "store should hold at most 2 entries");
    }

    #[tokio::test]
    async fn test_cache_client_over_moka() {
        let client = CacheClient::new(Arc::new(MokaKeyValueStore::new()));
        assert!(client.connected().await);

        client.set("k", "v", 10).await.unwrap();
        assert_eq!(client.get("k").await.unwrap().as_deref(), Some("v"));

        client.set("session", 1_u64, 1).await.unwrap();
        sleep(Duration::from_millis(1200)).await;
        assert_eq!(client.get("session").await.unwrap(), None);

        client.del("k").await.unwrap();
        assert_eq!(client.get("k").await.unwrap(), None);
        client.del("k").await.unwrap();
    }
}
