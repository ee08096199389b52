use async_trait::async_trait;
use dashmap::DashMap;
use datastore::{ConnectionEvent, DocumentStore};
use serde_json::Value;
use shared::Result;
use tokio::sync::broadcast;

/// In-process document store keyed by collection name.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, Vec<Value>>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            collections: DashMap::new(),
            events,
        }
    }

    pub fn insert(&self, collection: &str, document: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn insert_many(&self, collection: &str, documents: impl IntoIterator<Item = Value>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        Ok(self
            .collections
            .get(collection)
            .map(|documents| documents.len() as u64)
            .unwrap_or(0))
    }

    fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}
