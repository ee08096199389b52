use axum::ServiceExt;
use axum::extract::Request;
use datastore::{CacheClient, DocumentStoreClient};
use files_server::{AppState, build_router};
use shared::config::Config;
use std::sync::Arc;
use storage_engine::{MongoDocumentStore, RedisKeyValueStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting files-manager server");

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();

    // Both clients start connecting in the background as soon as they exist
    info!("Connecting to MongoDB at {}", config.db.uri());
    let db = Arc::new(DocumentStoreClient::new(Arc::new(MongoDocumentStore::new(
        config.db.clone(),
    ))));

    info!("Connecting to Redis at {}", config.cache_url);
    let cache = Arc::new(CacheClient::new(Arc::new(RedisKeyValueStore::open(
        &config.cache_url,
        config.cache_heartbeat,
    )?)));

    let app = build_router(AppState::new(db.clone(), cache.clone()));

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("HTTP Server listening on http://{}", config.bind_addr());

    // Report startup connectivity without holding up the listener
    tokio::spawn(async move {
        let (db_up, cache_up) = tokio::join!(db.connected(), cache.connected());
        info!(db = db_up, redis = cache_up, "initial connection attempts finished");
    });

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
