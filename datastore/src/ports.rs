#![deny(clippy::all)]

use crate::status::ConnectionEvent;
use async_trait::async_trait;
use shared::{Result, TtlSecs};
use tokio::sync::broadcast;

// Ports are the pluggable extension points for the underlying database drivers

/// Port for a document database (e.g., MongoDB)
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Establish the connection and prove the server answers
    async fn connect(&self) -> Result<()>;

    /// Count every document in the named collection
    async fn count_documents(&self, collection: &str) -> Result<u64>;

    /// Reachability transitions observed by the driver after `connect`
    fn events(&self) -> broadcast::Receiver<ConnectionEvent>;
}

/// Port for a key-value store with per-key expiration (e.g., Redis)
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn connect(&self) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set_ex(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()>;
    /// Returns whether a key was removed
    async fn delete(&self, key: &str) -> Result<bool>;
    fn events(&self) -> broadcast::Receiver<ConnectionEvent>;
}
