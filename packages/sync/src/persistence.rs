//! # Local Persistence
//!
//! Write-through cache of the live document.
//!
//! ## Write path
//!
//! ```text
//! session ──enqueue(doc)──▶ mpsc ──▶ writer task ──▶ KeyValueStore
//!                                    │
//!                                    ├─ coalesce queued writes to the newest
//!                                    ├─ drop anything not newer than the last landed write
//!                                    └─ log + count failures, never retry
//! ```
//!
//! Several tabs may write the same key. Their writers share a [`WriteClock`],
//! so "newest" means newest across all of them, not just within one tab.
//!
//! Enqueueing never blocks the editor. The in-memory document is already
//! current when a write is queued; the store only ever lags behind it.
//!
//! ## Read path
//!
//! [`rehydrate`] seeds a session from the store when the stored value is
//! well-formed and belongs to the requested campaign.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use campaign_model::CampaignConfig;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{KeyValueStore, StorageError, SyncError};

/// Storage key for a campaign: `"{prefix}:{id}"`.
pub fn storage_key(prefix: &str, id: Uuid) -> String {
    format!("{}:{}", prefix, id)
}

/// Where a rehydrated document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Stored,
    Initial,
}

#[derive(Debug)]
pub struct Rehydrated {
    pub document: CampaignConfig,
    pub origin: Origin,
}

/// Load the stored document under `key`, falling back to `initial`.
///
/// Unparseable or invalid values are removed. A stored document for a
/// different campaign id is ignored but left in place.
pub fn rehydrate(store: &dyn KeyValueStore, key: &str, initial: CampaignConfig) -> Rehydrated {
    let fallback = |document| Rehydrated {
        document,
        origin: Origin::Initial,
    };

    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "no stored document");
            return fallback(initial);
        }
        Err(err) => {
            tracing::warn!(key, "failed to read stored document: {}", err);
            return fallback(initial);
        }
    };

    let stored = match CampaignConfig::from_json(&raw).and_then(|doc| doc.validate().map(|_| doc)) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(key, "discarding corrupt stored document: {}", err);
            if let Err(err) = store.remove(key) {
                tracing::warn!(key, "failed to remove corrupt document: {}", err);
            }
            return fallback(initial);
        }
    };

    if stored.id != initial.id {
        tracing::warn!(
            key,
            stored = %stored.id,
            expected = %initial.id,
            "stored document belongs to another campaign"
        );
        return fallback(initial);
    }

    tracing::debug!(key, blocks = stored.blocks.len(), "rehydrated stored document");
    Rehydrated {
        document: stored,
        origin: Origin::Stored,
    }
}

/// Counters kept by the writer task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistStats {
    /// Writes that reached the store
    pub written: u64,

    /// Writes superseded before they ran, or older than the last landed one
    pub skipped_stale: u64,

    /// Writes the store rejected
    pub failed: u64,

    pub last_error: Option<String>,
    pub last_written_at: Option<DateTime<Utc>>,

    /// Stamp of the newest document this writer put in the store
    pub landed_stamp: Option<u64>,
}

/// Write order for one storage key, shared by every writer of that key.
///
/// Stamps are handed out when a write is queued, so they follow the order in
/// which tabs produced their documents. A write only reaches the store if its
/// stamp is newer than the last landed one; the check and the store call
/// happen under the same lock.
#[derive(Debug, Default)]
pub struct WriteClock {
    issued: AtomicU64,
    landed: Mutex<u64>,
}

impl WriteClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_stamp(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Stamp of the newest document in the store, `0` before the first write
    pub fn landed(&self) -> u64 {
        *lock(&self.landed)
    }

    fn land(&self, stamp: u64, put: impl FnOnce() -> Result<(), StorageError>) -> Landing {
        let mut landed = lock(&self.landed);
        if stamp <= *landed {
            return Landing::Stale;
        }
        match put() {
            Ok(()) => {
                *landed = stamp;
                Landing::Written
            }
            Err(err) => Landing::Failed(err),
        }
    }
}

/// One [`WriteClock`] per storage key
#[derive(Debug, Default)]
pub struct WriteClocks {
    clocks: Mutex<HashMap<String, Arc<WriteClock>>>,
}

impl WriteClocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the clock for `key`, creating it on first use.
    pub fn clock(&self, key: &str) -> Arc<WriteClock> {
        let mut clocks = lock(&self.clocks);
        if let Some(clock) = clocks.get(key) {
            return Arc::clone(clock);
        }
        let clock = Arc::new(WriteClock::new());
        clocks.insert(key.to_string(), Arc::clone(&clock));
        clock
    }
}

enum Landing {
    Written,
    Stale,
    Failed(StorageError),
}

enum Command {
    Write {
        stamp: u64,
        document: Arc<CampaignConfig>,
    },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Background writer for one storage key
pub struct PersistenceWriter {
    key: String,
    clock: Arc<WriteClock>,
    tx: mpsc::UnboundedSender<Command>,
    stats: Arc<Mutex<PersistStats>>,
    handle: JoinHandle<()>,
}

impl PersistenceWriter {
    /// Spawn a writer with a clock of its own. Must be called inside a tokio
    /// runtime.
    pub fn spawn(store: Arc<dyn KeyValueStore>, key: impl Into<String>, debounce: Duration) -> Self {
        Self::spawn_with_clock(store, key, Arc::new(WriteClock::new()), debounce)
    }

    /// Spawn a writer that orders its writes against every other writer
    /// holding `clock`.
    pub fn spawn_with_clock(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        clock: Arc<WriteClock>,
        debounce: Duration,
    ) -> Self {
        let key = key.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(PersistStats::default()));

        let task = WriterTask {
            store,
            key: key.clone(),
            clock: Arc::clone(&clock),
            debounce,
            stats: Arc::clone(&stats),
        };
        let handle = tokio::spawn(task.run(rx));

        Self {
            key,
            clock,
            tx,
            stats,
            handle,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Queue `document` and return the stamp it was given.
    ///
    /// If a write with a newer stamp has landed by the time this one runs,
    /// this one is dropped.
    pub fn enqueue(&self, document: Arc<CampaignConfig>) -> u64 {
        let stamp = self.clock.next_stamp();
        if self.tx.send(Command::Write { stamp, document }).is_err() {
            tracing::warn!(key = %self.key, stamp, "persistence writer stopped, dropping write");
        }
        stamp
    }

    /// Wait until every write queued before this call has been handled.
    pub async fn flush(&self) -> Result<(), SyncError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack))
            .map_err(|_| SyncError::WriterClosed)?;
        done.await.map_err(|_| SyncError::WriterClosed)
    }

    /// Flush, stop the task and return the final counters.
    pub async fn shutdown(self) -> Result<PersistStats, SyncError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(ack))
            .map_err(|_| SyncError::WriterClosed)?;
        done.await.map_err(|_| SyncError::WriterClosed)?;

        if let Err(err) = self.handle.await {
            tracing::warn!(key = %self.key, "persistence writer task ended abnormally: {}", err);
        }
        Ok(lock(&self.stats).clone())
    }

    pub fn stats(&self) -> PersistStats {
        lock(&self.stats).clone()
    }
}

struct WriterTask {
    store: Arc<dyn KeyValueStore>,
    key: String,
    clock: Arc<WriteClock>,
    debounce: Duration,
    stats: Arc<Mutex<PersistStats>>,
}

impl WriterTask {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            let (stamp, document) = match command {
                Command::Write { stamp, document } => (stamp, document),
                Command::Flush(ack) => {
                    let _ = ack.send(());
                    continue;
                }
                Command::Shutdown(ack) => {
                    let _ = ack.send(());
                    break;
                }
            };

            if !self.debounce.is_zero() {
                tokio::time::sleep(self.debounce).await;
            }

            // Everything queued behind this write is handled in one pass
            let mut newest = (stamp, document);
            let mut acks = Vec::new();
            let mut stop = None;
            while let Ok(command) = rx.try_recv() {
                match command {
                    Command::Write { stamp, document } => {
                        self.count_stale();
                        if stamp > newest.0 {
                            newest = (stamp, document);
                        }
                    }
                    Command::Flush(ack) => acks.push(ack),
                    Command::Shutdown(ack) => {
                        stop = Some(ack);
                        break;
                    }
                }
            }

            let (stamp, document) = newest;
            self.write(stamp, document).await;

            for ack in acks {
                let _ = ack.send(());
            }
            if let Some(ack) = stop {
                let _ = ack.send(());
                break;
            }
        }

        tracing::debug!(key = %self.key, "persistence writer stopped");
    }

    async fn write(&self, stamp: u64, document: Arc<CampaignConfig>) {
        let json = match document.to_json() {
            Ok(json) => json,
            Err(err) => {
                self.count_failure(stamp, err.to_string());
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let key = self.key.clone();
        let landing = tokio::task::spawn_blocking(move || clock.land(stamp, || store.set(&key, &json)))
            .await
            .unwrap_or_else(|err| Landing::Failed(StorageError::Backend(err.to_string())));

        match landing {
            Landing::Written => {
                let mut stats = lock(&self.stats);
                stats.written += 1;
                stats.landed_stamp = Some(stamp);
                stats.last_written_at = Some(Utc::now());
                tracing::trace!(key = %self.key, stamp, "document persisted");
            }
            Landing::Stale => {
                tracing::debug!(key = %self.key, stamp, "discarding stale write");
                self.count_stale();
            }
            Landing::Failed(err) => self.count_failure(stamp, err.to_string()),
        }
    }

    fn count_stale(&self) {
        lock(&self.stats).skipped_stale += 1;
    }

    fn count_failure(&self, stamp: u64, error: String) {
        tracing::warn!(key = %self.key, stamp, "failed to persist document: {}", error);
        let mut stats = lock(&self.stats);
        stats.failed += 1;
        stats.last_error = Some(error);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
