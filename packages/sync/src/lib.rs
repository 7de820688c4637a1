//! # Campaign Sync
//!
//! Keeps an editor session's document in a local key-value store and in step
//! with other tabs editing the same campaign.
//!
//! ```text
//!   tab A: SyncedSession ──publish──▶ BroadcastHub("campaign:{id}") ──▶ tab B: poll_remote()
//!                │                                                         (last write wins)
//!                └──enqueue──▶ PersistenceWriter ──▶ KeyValueStore["{prefix}:{id}"]
//! ```
//!
//! Local storage is a convenience cache. Failing to write it is logged and
//! counted, but never rolls back the live document or clears the unsaved
//! flag; the remote save collaborator stays the source of truth.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use campaign_sync::{EngineConfig, SyncContext, SyncedSession};
//!
//! let context = SyncContext::in_memory(EngineConfig::default());
//! let mut tab = SyncedSession::create(initial, registry, &context);
//!
//! tab.apply(mutation);
//! tab.poll_remote();
//! tab.dispose().await?;
//! ```

mod channel;
mod config;
mod error;
pub mod persistence;
mod storage;
mod synced;

pub use channel::{BroadcastHub, Envelope, TabChannel, TabId};
pub use config::{EngineConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_STORAGE_KEY_PREFIX};
pub use error::{StorageError, SyncError};
pub use persistence::{
    rehydrate, storage_key, Origin, PersistStats, PersistenceWriter, Rehydrated, WriteClock,
    WriteClocks,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use synced::{SyncContext, SyncedSession};
