pub mod cache_client;
pub mod db_client;
pub mod domain;
pub mod ports;
pub mod status;

pub use cache_client::CacheClient;
pub use db_client::DocumentStoreClient;
pub use domain::{CacheValue, Collection};
pub use ports::{DocumentStore, KeyValueStore};
pub use status::{ConnectionEvent, ConnectionStatus};

#[cfg(test)]
pub(crate) mod testing;
