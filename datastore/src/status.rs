use shared::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Reachability transition published by a store adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Failed(String),
}

/// Liveness flag shared between a client and its background tasks
#[derive(Debug)]
pub struct ConnectionStatus {
    store: &'static str,
    alive: AtomicBool,
}

impl ConnectionStatus {
    pub fn new(store: &'static str, alive: bool) -> Self {
        Self {
            store,
            alive: AtomicBool::new(alive),
        }
    }

    pub fn store(&self) -> &'static str {
        self.store
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Returns true if this call flipped the flag
    pub fn mark_alive(&self) -> bool {
        !self.alive.swap(true, Ordering::AcqRel)
    }

    /// Returns true if this call flipped the flag
    pub fn mark_down(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    pub fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(Error::NotConnected(self.store))
        }
    }

    /// Fold a connection attempt into the flag, logging failures.
    pub fn record(&self, outcome: &Result<()>) {
        match outcome {
            Ok(()) => {
                self.mark_alive();
                info!(store = self.store, "connected");
            }
            Err(e) => {
                self.mark_down();
                error!(store = self.store, error = %e, "connection failed");
            }
        }
    }

    fn apply(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected => {
                if self.mark_alive() {
                    info!(store = self.store, "connection restored");
                }
            }
            ConnectionEvent::Failed(reason) => {
                if self.mark_down() {
                    error!(store = self.store, %reason, "connection lost");
                }
            }
        }
    }
}

/// Run one connection attempt off the caller's task. The returned receiver
/// flips to `true` once the attempt has been recorded.
pub(crate) fn connect_in_background<F>(
    status: Arc<ConnectionStatus>,
    attempt: F,
) -> watch::Receiver<bool>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let (done_tx, done_rx) = watch::channel(false);
    tokio::spawn(async move {
        let outcome = attempt.await;
        status.record(&outcome);
        let _ = done_tx.send(true);
    });
    done_rx
}

/// Wait for the first connection attempt to be recorded.
pub(crate) async fn settled(done: &watch::Receiver<bool>) {
    let mut done = done.clone();
    // An error means the attempt task died before recording; nothing left to wait for.
    let _ = done.wait_for(|finished| *finished).await;
}

/// Follow an adapter's event stream until the adapter goes away.
pub(crate) fn follow_events(
    status: Arc<ConnectionStatus>,
    mut events: broadcast::Receiver<ConnectionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => status.apply(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(store = status.store, skipped, "missed connection events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
