use crate::ports::{DocumentStore, KeyValueStore};
use crate::status::ConnectionEvent;
use async_trait::async_trait;
use shared::{Error, Result, TtlSecs};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

/// Poll `check` for up to a second.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

pub struct StubDocumentStore {
    reachable: bool,
    fail_counts: AtomicBool,
    documents: Mutex<HashMap<String, u64>>,
    connect_calls: AtomicUsize,
    count_calls: AtomicUsize,
    events: broadcast::Sender<ConnectionEvent>,
}

impl StubDocumentStore {
    fn new(reachable: bool) -> Self {
        Self {
            reachable,
            fail_counts: AtomicBool::new(false),
            documents: Mutex::new(HashMap::new()),
            connect_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            events: broadcast::channel(16).0,
        }
    }

    pub fn reachable() -> Self {
        Self::new(true)
    }

    pub fn unreachable() -> Self {
        Self::new(false)
    }

    pub fn insert(&self, collection: &str, documents: u64) {
        *self
            .documents
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default() += documents;
    }

    pub fn fail_counts(&self) {
        self.fail_counts.store(true, Ordering::SeqCst);
    }

    pub fn publish(&self, event: ConnectionEvent) {
        self.events.send(event).unwrap();
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for StubDocumentStore {
    async fn connect(&self) -> Result<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            Ok(())
        } else {
            Err(Error::Connection("connect ECONNREFUSED 127.0.0.1:27017".into()))
        }
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(Error::Backend("cursor killed".into()));
        }
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(collection)
            .copied()
            .unwrap_or(0))
    }

    fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}

pub struct StubKeyValueStore {
    reachable: bool,
    entries: Mutex<HashMap<String, (String, TtlSecs)>>,
    op_calls: AtomicUsize,
    events: broadcast::Sender<ConnectionEvent>,
}

impl StubKeyValueStore {
    fn new(reachable: bool) -> Self {
        Self {
            reachable,
            entries: Mutex::new(HashMap::new()),
            op_calls: AtomicUsize::new(0),
            events: broadcast::channel(16).0,
        }
    }

    pub fn reachable() -> Self {
        Self::new(true)
    }

    pub fn unreachable() -> Self {
        Self::new(false)
    }

    pub fn publish(&self, event: ConnectionEvent) {
        self.events.send(event).unwrap();
    }

    pub fn op_calls(&self) -> usize {
        self.op_calls.load(Ordering::SeqCst)
    }

    pub fn ttl_of(&self, key: &str) -> Option<TtlSecs> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl KeyValueStore for StubKeyValueStore {
    async fn connect(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(Error::Connection("connect ECONNREFUSED 127.0.0.1:6379".into()))
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.op_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()> {
        self.op_calls.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.op_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }
}
