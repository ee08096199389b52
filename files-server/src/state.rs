use datastore::{CacheClient, DocumentStoreClient};
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DocumentStoreClient>,
    pub cache: Arc<CacheClient>,
}

impl AppState {
    pub fn new(db: Arc<DocumentStoreClient>, cache: Arc<CacheClient>) -> Self {
        Self { db, cache }
    }
}
