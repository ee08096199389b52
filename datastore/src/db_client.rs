use crate::domain::Collection;
use crate::ports::DocumentStore;
use crate::status::{self, ConnectionStatus};
use shared::Result;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Client for the document database holding users and files.
///
/// Construction starts connecting in the background and returns immediately,
/// so it must happen inside a tokio runtime. Until that attempt succeeds the
/// client reports itself as not alive and every query fails with
/// [`shared::Error::NotConnected`] without touching the driver.
pub struct DocumentStoreClient {
    store: Arc<dyn DocumentStore>,
    status: Arc<ConnectionStatus>,
    attempted: watch::Receiver<bool>,
    watcher: JoinHandle<()>,
}

impl DocumentStoreClient {
    pub const STORE: &'static str = "database";

    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let status = Arc::new(ConnectionStatus::new(Self::STORE, false));
        // Subscribe first so nothing published during the handshake is missed.
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

    pub async fn count_users(&self) -> Result<u64> {
        self.count(Collection::Users).await
    }

    pub async fn count_files(&self) -> Result<u64> {
        self.count(Collection::Files).await
    }

    pub async fn count(&self, collection: Collection) -> Result<u64> {
        self.status.ensure_alive()?;
        let total = self.store.count_documents(collection.name()).await?;
        debug!(%collection, total, "counted documents");
        Ok(total)
    }
}

impl Drop for DocumentStoreClient {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl fmt::Debug for DocumentStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStoreClient")
            .field("alive", &self.is_alive())
            .finish()
    }
}
