use async_trait::async_trait;
use datastore::{ConnectionEvent, KeyValueStore};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult};
use shared::{Error, Result, TtlSecs};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{OnceCell, broadcast};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Redis-backed key-value store.
///
/// The connection is opened on first use. If that dial fails, a background
/// task keeps dialing once per heartbeat period until the server answers.
/// Once connected, a heartbeat task PINGs the server and, together with
/// failed commands, publishes reachability transitions as
/// [`ConnectionEvent`]s. Commands themselves are never retried here;
/// reconnecting an established connection is left to the driver's
/// connection manager.
pub struct RedisKeyValueStore {
    inner: Arc<Inner>,
}

struct Inner {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    heartbeat: Duration,
    reachable: AtomicBool,
    redialing: AtomicBool,
    events: broadcast::Sender<ConnectionEvent>,
}

impl RedisKeyValueStore {
    pub fn open(url: &str, heartbeat: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Connection(format!("invalid redis url {url}: {e}")))?;
        let (events, _) = broadcast::channel(32);
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                connection: OnceCell::new(),
                heartbeat,
                reachable: AtomicBool::new(true),
                redialing: AtomicBool::new(false),
                events,
            }),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let inner = &self.inner;
        let connection = inner
            .connection
            .get_or_try_init(|| async {
                match inner.dial().await {
                    Ok(manager) => {
                        Inner::spawn_heartbeat(inner.clone(), manager.clone());
                        Ok(manager)
                    }
                    Err(e) => {
                        let err = inner.observe(e);
                        Inner::spawn_redial(inner.clone());
                        Err(err)
                    }
                }
            })
            .await?;
        Ok(connection.clone())
    }

    fn observe(&self, err: RedisError) -> Error {
        self.inner.observe(err)
    }
}

impl Inner {
    /// Upper bound on one dial; the driver backs off between attempts on its own.
    fn dial_timeout(&self) -> Duration {
        self.heartbeat.max(Duration::from_secs(1))
    }

    async fn dial(&self) -> RedisResult<ConnectionManager> {
        match timeout(self.dial_timeout(), ConnectionManager::new(self.client.clone())).await {
            Ok(result) => result,
            Err(_) => Err(RedisError::from(io::Error::new(
                io::ErrorKind::TimedOut,
                "redis dial timed out",
            ))),
        }
    }

    /// Map a driver error, publishing a failure when it means the server is gone.
    fn observe(&self, err: RedisError) -> Error {
        if is_connection_error(&err) {
            self.mark_unreachable(err.to_string());
            Error::Connection(err.to_string())
        } else {
            Error::Backend(err.to_string())
        }
    }

    fn mark_unreachable(&self, reason: String) {
        if self.reachable.swap(false, Ordering::AcqRel) {
            let _ = self.events.send(ConnectionEvent::Failed(reason));
        }
    }

    fn mark_reachable(&self) {
        if !self.reachable.swap(true, Ordering::AcqRel) {
            let _ = self.events.send(ConnectionEvent::Connected);
        }
    }

    fn spawn_redial(inner: Arc<Inner>) {
        if inner.redialing.swap(true, Ordering::AcqRel) {
            return;
        }

        tokio::spawn(async move {
            // Stop once no client is listening any more
            while inner.events.receiver_count() > 0 && !inner.connection.initialized() {
                tokio::time::sleep(inner.heartbeat).await;
                match inner.dial().await {
                    Ok(manager) => {
                        if inner.connection.set(manager.clone()).is_ok() {
                            Inner::spawn_heartbeat(inner.clone(), manager);
                        }
                        info!("redis reachable again");
                        inner.mark_reachable();
                        break;
                    }
                    Err(e) => debug!(error = %e, "redis still unreachable"),
                }
            }
            inner.redialing.store(false, Ordering::Release);
        });
    }

    fn spawn_heartbeat(inner: Arc<Inner>, mut connection: ConnectionManager) {
        let period = inner.heartbeat;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            while inner.events.receiver_count() > 0 {
                ticker.tick().await;
                let ping = redis::cmd("PING");
                let pong: RedisResult<String> =
                    match timeout(period, ping.query_async(&mut connection)).await {
                        Ok(pong) => pong,
                        Err(_) => Err(RedisError::from(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "redis heartbeat timed out",
                        ))),
                    };
                match pong {
                    Ok(_) => inner.mark_reachable(),
                    Err(e) => {
                        warn!(error = %e, "redis heartbeat failed");
                        inner.mark_unreachable(e.to_string());
                    }
                }
            }
            debug!("redis heartbeat stopped");
        });
    }
}

fn is_connection_error(err: &RedisError) -> bool {
    err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn connect(&self) -> Result<()> {
        self.connection().await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection().await?;
        connection
            .get::<_, Option<String>>(key)
            .await
            .map_err(|e| self.observe(e))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: TtlSecs) -> Result<()> {
        let mut connection = self.connection().await?;
        connection
            .set_ex::<_, _, ()>(key, value, ttl.0)
            .await
            .map_err(|e| self.observe(e))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut connection = self.connection().await?;
        let removed = connection
            .del::<_, usize>(key)
            .await
            .map_err(|e| self.observe(e))?;
        Ok(removed > 0)
    }

    fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }
}

impl std::fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore")
            .field("connected", &self.inner.connection.initialized())
            .field("reachable", &self.inner.reachable.load(Ordering::Relaxed))
            .field("heartbeat", &self.inner.heartbeat)
            .finish()
    }
}
