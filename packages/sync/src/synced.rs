//! # Synced Session
//!
//! An [`EditorSession`] wired to local persistence and to the campaign's
//! broadcast channel.
//!
//! ## Lifecycle
//!
//! 1. `create`: rehydrate from the store, build the editor session, join the
//!    channel, spawn the writer
//! 2. every accepted `apply`/`undo`/`redo`: queue a write, publish to siblings
//! 3. `poll_remote`/`next_remote`: adopt the newest sibling document
//! 4. `dispose`: flush pending writes and stop the writer
//!
//! Adopted sibling documents are neither re-published nor re-persisted; the
//! sibling that produced them already did both.

use std::sync::Arc;

use campaign_editor::{
    ApplyOutcome, BlockRegistry, CampaignConfig, EditorSession, Mutation, SaveTicket,
    TransientState,
};

use crate::persistence::{
    rehydrate, storage_key, Origin, PersistStats, PersistenceWriter, WriteClocks,
};
use crate::{BroadcastHub, EngineConfig, KeyValueStore, MemoryStore, SyncError, TabChannel, TabId};

/// Shared collaborators for every session of an application
#[derive(Clone)]
pub struct SyncContext {
    pub config: EngineConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub hub: Arc<BroadcastHub>,

    /// Write order per storage key, shared by every tab writing it
    pub clocks: Arc<WriteClocks>,
}

impl SyncContext {
    pub fn new(config: EngineConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.channel_capacity));
        Self {
            config,
            store,
            hub,
            clocks: Arc::new(WriteClocks::new()),
        }
    }

    /// Context backed by a fresh [`MemoryStore`]
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }
}

pub struct SyncedSession {
    session: EditorSession,
    channel: TabChannel,
    writer: PersistenceWriter,
    origin: Origin,
}

impl SyncedSession {
    /// Open `initial` for editing. Must be called inside a tokio runtime.
    pub fn create(
        initial: CampaignConfig,
        registry: Arc<BlockRegistry>,
        context: &SyncContext,
    ) -> Self {
        let key = storage_key(&context.config.storage_key_prefix, initial.id);
        let rehydrated = rehydrate(context.store.as_ref(), &key, initial);
        let document = rehydrated.document;

        let channel = context.hub.join(document.id);
        let clock = context.clocks.clock(&key);
        let writer = PersistenceWriter::spawn_with_clock(
            Arc::clone(&context.store),
            key,
            clock,
            context.config.write_debounce(),
        );
        tracing::info!(
            campaign = %document.id,
            tab = %channel.id(),
            origin = ?rehydrated.origin,
            "opened campaign"
        );

        Self {
            session: EditorSession::new(document, registry, context.config.session_options()),
            channel,
            writer,
            origin: rehydrated.origin,
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn document(&self) -> Arc<CampaignConfig> {
        self.session.document()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.session.has_unsaved_changes()
    }

    pub fn is_saving(&self) -> bool {
        self.session.is_saving()
    }

    /// Whether the starting document came from local storage
    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn tab_id(&self) -> TabId {
        self.channel.id()
    }

    pub fn storage_key(&self) -> &str {
        self.writer.key()
    }

    pub fn transient(&self) -> &TransientState {
        self.session.transient()
    }

    pub fn transient_mut(&mut self) -> &mut TransientState {
        self.session.transient_mut()
    }

    pub fn apply(&mut self, mutation: Mutation) -> ApplyOutcome {
        let outcome = self.session.apply(mutation);
        if outcome.is_applied() {
            self.propagate();
        }
        outcome
    }

    pub fn undo(&mut self) -> Option<Arc<CampaignConfig>> {
        let document = self.session.undo()?;
        self.propagate();
        Some(document)
    }

    pub fn redo(&mut self) -> Option<Arc<CampaignConfig>> {
        let document = self.session.redo()?;
        self.propagate();
        Some(document)
    }

    pub fn begin_batch(&mut self, label: impl Into<String>) {
        self.session.begin_batch(label);
    }

    pub fn end_batch(&mut self) {
        self.session.end_batch();
    }

    pub fn begin_save(&mut self) -> SaveTicket {
        self.session.begin_save()
    }

    pub fn complete_save(&mut self, ticket: &SaveTicket) -> bool {
        self.session.complete_save(ticket)
    }

    pub fn fail_save(&mut self, ticket: &SaveTicket) {
        self.session.fail_save(ticket)
    }

    /// Adopt the newest pending sibling document. Returns whether the live
    /// document changed.
    pub fn poll_remote(&mut self) -> bool {
        match self.channel.try_latest() {
            Some(document) => self.session.adopt_remote(Arc::new(document)),
            None => false,
        }
    }

    /// Wait for a sibling document and adopt it. Returns `false` if the
    /// channel closed or the document was ignored.
    pub async fn next_remote(&mut self) -> bool {
        match self.channel.recv().await {
            Some(document) => self.session.adopt_remote(Arc::new(document)),
            None => false,
        }
    }

    pub fn persist_stats(&self) -> PersistStats {
        self.writer.stats()
    }

    /// Wait until every queued write has been handled.
    pub async fn flush(&self) -> Result<(), SyncError> {
        self.writer.flush().await
    }

    /// Flush pending writes, leave the channel and stop the writer.
    pub async fn dispose(self) -> Result<PersistStats, SyncError> {
        let Self {
            session,
            channel,
            writer,
            ..
        } = self;
        drop(channel);
        let stats = writer.shutdown().await?;
        tracing::info!(
            campaign = %session.document().id,
            written = stats.written,
            failed = stats.failed,
            "closed campaign"
        );
        Ok(stats)
    }

    fn propagate(&mut self) {
        let document = self.session.document();
        self.writer.enqueue(Arc::clone(&document));
        if let Err(err) = self.channel.publish(&document) {
            tracing::warn!(tab = %self.channel.id(), "failed to broadcast document: {}", err);
        }
    }
}
