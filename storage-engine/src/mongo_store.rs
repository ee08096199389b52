use async_trait::async_trait;
use datastore::{ConnectionEvent, DocumentStore};
use mongodb::bson::{Document, doc};
use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use mongodb::options::ClientOptions;
use mongodb::Client;
use shared::config::DbConfig;
use shared::{Error, Result};
use std::time::Duration;
use tokio::sync::{OnceCell, broadcast};
use tracing::debug;

/// MongoDB-backed document store.
///
/// The driver client is built on first use. Its server monitor heartbeats are
/// republished as [`ConnectionEvent`]s so liveness follows the driver's view
/// of the server.
pub struct MongoDocumentStore {
    config: DbConfig,
    server_selection_timeout: Option<Duration>,
    client: OnceCell<Client>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl MongoDocumentStore {
    pub fn new(config: DbConfig) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            config,
            server_selection_timeout: None,
            client: OnceCell::new(),
            events,
        }
    }

    /// Give up on unreachable servers sooner than the driver default of 30s
    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let uri = self.config.uri();
                let mut options = ClientOptions::parse(&uri)
                    .await
                    .map_err(|e| Error::Connection(format!("invalid uri {uri}: {e}")))?;

                options.app_name = Some("files-manager".to_string());
                if let Some(timeout) = self.server_selection_timeout {
                    options.server_selection_timeout = Some(timeout);
                }

                let events = self.events.clone();
                options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| {
                    if let Some(event) = heartbeat_event(&event) {
                        let _ = events.send(event);
                    }
                }));

                Client::with_options(options).map_err(|e| Error::Connection(e.to_string()))
            })
            .await
    }
}

fn heartbeat_event(event: &SdamEvent) -> Option<ConnectionEvent> {
    match event {
        SdamEvent::ServerHeartbeatSucceeded(_) => Some(ConnectionEvent::Connected),
        SdamEvent::ServerHeartbeatFailed(failed) => {
            Some(ConnectionEvent::Failed(failed.failure.to_string()))
        }
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn connect(&self) -> Result<()> {
        let client = self.client().await?;
        client
            .database(&self.config.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        debug!(uri = %self.config.uri(), "mongodb answered ping");
        Ok(())
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        let client = self.client().await?;
        client
            .database(&self.config.database)
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for MongoDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoDocumentStore")
            .field("uri", &self.config.uri())
            .field("initialized", &self.client.initialized())
            .finish()
    }
}
