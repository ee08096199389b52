// Adapters plugging real drivers and in-process stand-ins into the datastore ports

pub mod memory_documents;
pub mod moka_store;
pub mod mongo_store;
pub mod redis_store;

pub use memory_documents::MemoryDocumentStore;
pub use moka_store::MokaKeyValueStore;
pub use mongo_store::MongoDocumentStore;
pub use redis_store::RedisKeyValueStore;
