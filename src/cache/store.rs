use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{MediaKind, MovieId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Category(String),
    Search(String),
    Details(MediaKind, MovieId),
    Season(MovieId, u32),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Category(slug) => write!(f, "row:{}", slug),
            CacheKey::Search(query) => write!(f, "search:{}", query.trim().to_lowercase()),
            CacheKey::Details(kind, id) => write!(f, "details:{}:{}", kind, id),
            CacheKey::Season(id, season) => write!(f, "season:{}:{}", id, season),
        }
    }
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: Duration,
}

struct CacheEntry {
    json: String,
    expires_at: Instant,
}

type Entries = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// In-process cache for catalog responses
///
/// Reads go straight to the shared map; writes are queued to a background
/// task so a response never waits on cache bookkeeping.
#[derive(Clone)]
pub struct Cache {
    entries: Entries,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer to drain queued writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new cache and spawns its writer task
    pub fn new() -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));

        let writer_entries = entries.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(writer_entries, write_rx, shutdown_rx).await;
        });

        (Self { entries, write_tx }, CacheWriterHandle { shutdown_tx })
    }

    /// Applies queued writes until shutdown, then flushes what is left
    async fn cache_writer_task(
        entries: Entries,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    Self::write_entry(&entries, msg).await;
                }
                Some(()) = shutdown_rx.recv() => {
                    let mut flushed = 0;
                    while let Ok(msg) = write_rx.try_recv() {
                        Self::write_entry(&entries, msg).await;
                        flushed += 1;
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
                else => break,
            }
        }
    }

    async fn write_entry(entries: &Entries, msg: CacheWriteMessage) {
        let mut map = entries.write().await;
        let now = Instant::now();
        map.retain(|_, entry| entry.expires_at > now);
        map.insert(
            msg.key,
            CacheEntry {
                json: msg.value,
                expires_at: now + msg.ttl,
            },
        );
    }

    /// Retrieves a live value from the cache by key
    ///
    /// Expired entries read as a miss.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let map = self.entries.read().await;

        match map.get(&key.to_string()) {
            Some(entry) if entry.expires_at > Instant::now() => {
                let data = serde_json::from_str(&entry.json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                tracing::debug!(key = %key, "Cache hit");
                Ok(Some(data))
            }
            _ => Ok(None),
        }
    }

    /// Queues a value for storage without waiting for the write
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if self.write_tx.send(msg).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}
