//! # Edit Session
//!
//! Owns one campaign while it is being edited: the live document, its
//! history, the transient UI state and the save bookkeeping.
//!
//! A session is an ordinary value created by whoever hosts the editor view
//! and dropped with it. There is no process-wide store.
//!
//! Every accepted change goes through [`EditorSession::apply`],
//! [`EditorSession::undo`] or [`EditorSession::redo`]. Each of these bumps
//! [`EditorSession::revision`] and sets the unsaved-changes flag, which only
//! [`EditorSession::complete_save`] clears.

use std::sync::Arc;

use campaign_model::{Block, BlockRegistry, CampaignConfig, Props};
use serde_json::Value;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::mutations::Direction;
use crate::{BlockFactory, FactoryError, History, Mutation, TransientState};

/// Editor-level settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Maximum undo levels (0 = unlimited)
    pub history_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// What happened to a requested mutation
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The document changed
    Applied,

    /// Nothing to do (unknown id, boundary move, same value)
    Unchanged,

    /// The block factory refused; document unchanged
    Rejected(FactoryError),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

/// Hand-off to the save collaborator
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub document: Arc<CampaignConfig>,
    revision: u64,
}

impl SaveTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug)]
struct Batch {
    label: String,
    recorded: bool,
}

pub struct EditorSession {
    factory: BlockFactory,
    document: Arc<CampaignConfig>,
    history: History,
    transient: TransientState,

    /// Increments on every accepted change
    revision: u64,
    has_unsaved_changes: bool,
    is_saving: bool,
    batch: Option<Batch>,
}

impl EditorSession {
    pub fn new(
        initial: impl Into<Arc<CampaignConfig>>,
        registry: Arc<BlockRegistry>,
        options: SessionOptions,
    ) -> Self {
        Self {
            factory: BlockFactory::new(registry),
            document: initial.into(),
            history: History::with_max_levels(options.history_limit),
            transient: TransientState::default(),
            revision: 0,
            has_unsaved_changes: false,
            is_saving: false,
            batch: None,
        }
    }

    /// Read-only snapshot of the live document
    pub fn document(&self) -> Arc<CampaignConfig> {
        Arc::clone(&self.document)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        self.factory.registry()
    }

    pub fn factory(&self) -> &BlockFactory {
        &self.factory
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn transient(&self) -> &TransientState {
        &self.transient
    }

    pub fn transient_mut(&mut self) -> &mut TransientState {
        &mut self.transient
    }

    /// The selected block, if the selection still resolves
    pub fn selected_block(&self) -> Option<&Arc<Block>> {
        let id = self.transient.selected_block_id.as_deref()?;
        self.document.block(id)
    }

    /// Apply a mutation, recording the replaced document for undo.
    pub fn apply(&mut self, mutation: Mutation) -> ApplyOutcome {
        let next = match mutation.apply(&self.document, &self.factory) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(op = %mutation.label(), "mutation rejected: {}", err);
                return ApplyOutcome::Rejected(err);
            }
        };

        if Arc::ptr_eq(&next, &self.document) {
            tracing::debug!(op = %mutation.label(), "mutation was a no-op");
            return ApplyOutcome::Unchanged;
        }

        self.record(mutation.label());
        self.commit(next);
        tracing::debug!(op = %mutation.label(), revision = self.revision, "mutation applied");
        ApplyOutcome::Applied
    }

    pub fn add_block(&mut self, block_type: &str, overrides: Option<Props>) -> ApplyOutcome {
        self.apply(Mutation::AddBlock {
            block_type: block_type.to_string(),
            overrides,
        })
    }

    pub fn insert_block(
        &mut self,
        block_type: &str,
        index: usize,
        overrides: Option<Props>,
    ) -> ApplyOutcome {
        self.apply(Mutation::InsertBlock {
            block_type: block_type.to_string(),
            index,
            overrides,
        })
    }

    pub fn delete_block(&mut self, block_id: &str) -> ApplyOutcome {
        self.apply(Mutation::DeleteBlock {
            block_id: block_id.to_string(),
        })
    }

    pub fn move_block(&mut self, active_id: &str, over_id: &str) -> ApplyOutcome {
        self.apply(Mutation::MoveBlock {
            active_id: active_id.to_string(),
            over_id: over_id.to_string(),
        })
    }

    pub fn move_block_by_step(&mut self, block_id: &str, direction: Direction) -> ApplyOutcome {
        self.apply(Mutation::MoveBlockByStep {
            block_id: block_id.to_string(),
            direction,
        })
    }

    pub fn duplicate_block(&mut self, block_id: &str) -> ApplyOutcome {
        self.apply(Mutation::DuplicateBlock {
            block_id: block_id.to_string(),
        })
    }

    pub fn update_block_prop(&mut self, block_id: &str, key: &str, value: Value) -> ApplyOutcome {
        self.apply(Mutation::UpdateBlockProp {
            block_id: block_id.to_string(),
            key: key.to_string(),
            value,
        })
    }

    pub fn update_block_style(&mut self, block_id: &str, key: &str, value: &str) -> ApplyOutcome {
        self.apply(Mutation::UpdateBlockStyle {
            block_id: block_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    pub fn update_global_style(&mut self, path: &str, value: Value) -> ApplyOutcome {
        self.apply(Mutation::UpdateGlobalStyle {
            path: path.to_string(),
            value,
        })
    }

    pub fn rename_campaign(&mut self, name: &str) -> ApplyOutcome {
        self.apply(Mutation::RenameCampaign {
            name: name.to_string(),
        })
    }

    /// Revert the last change. Returns the adopted document, or `None` when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> Option<Arc<CampaignConfig>> {
        self.end_batch();
        let previous = self.history.undo(&self.document)?;
        self.commit(Arc::clone(&previous));
        tracing::debug!(revision = self.revision, "undo");
        Some(previous)
    }

    /// Reapply the last undone change. Returns the adopted document, or
    /// `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<Arc<CampaignConfig>> {
        self.end_batch();
        let next = self.history.redo(&self.document)?;
        self.commit(Arc::clone(&next));
        tracing::debug!(revision = self.revision, "redo");
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Start a batch: every mutation until [`end_batch`](Self::end_batch)
    /// is undone as one step (e.g. the intermediate moves of a drag).
    pub fn begin_batch(&mut self, label: impl Into<String>) {
        self.batch = Some(Batch {
            label: label.into(),
            recorded: false,
        });
    }

    pub fn end_batch(&mut self) {
        self.batch = None;
    }

    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    /// Replace the document with another campaign. History, selection and
    /// save state start over.
    pub fn load_document(&mut self, document: impl Into<Arc<CampaignConfig>>) {
        self.document = document.into();
        self.history.clear();
        self.batch = None;
        self.transient.clear_selection();
        self.has_unsaved_changes = false;
        self.is_saving = false;
        self.revision += 1;
        tracing::debug!(campaign = %self.document.id, "document loaded");
    }

    /// Adopt a document written by a sibling tab (last write wins).
    ///
    /// History is left alone and the unsaved flag is raised. Documents for a
    /// different campaign, or equal to the live one, are ignored. Returns
    /// whether the live document was replaced.
    pub fn adopt_remote(&mut self, document: Arc<CampaignConfig>) -> bool {
        if document.id != self.document.id {
            tracing::warn!(
                expected = %self.document.id,
                received = %document.id,
                "ignoring remote document for another campaign"
            );
            return false;
        }
        if *document == *self.document {
            return false;
        }

        self.document = document;
        self.revision += 1;
        self.has_unsaved_changes = true;

        if self.transient.selected_block_id.is_some() && self.selected_block().is_none() {
            self.transient.clear_selection();
        }
        tracing::debug!(revision = self.revision, "adopted remote document");
        true
    }

    /// Snapshot the document for the save collaborator.
    pub fn begin_save(&mut self) -> SaveTicket {
        self.is_saving = true;
        SaveTicket {
            document: self.document(),
            revision: self.revision,
        }
    }

    /// The remote store accepted `ticket`. Clears the unsaved flag unless
    /// the document changed after the ticket was issued. Returns whether
    /// the session is now clean.
    pub fn complete_save(&mut self, ticket: &SaveTicket) -> bool {
        self.is_saving = false;
        if ticket.revision == self.revision {
            self.has_unsaved_changes = false;
        }
        !self.has_unsaved_changes
    }

    /// The remote save failed; the unsaved flag stays as it is.
    pub fn fail_save(&mut self, ticket: &SaveTicket) {
        self.is_saving = false;
        tracing::warn!(revision = ticket.revision, "remote save failed");
    }

    fn record(&mut self, label: String) {
        match &mut self.batch {
            Some(batch) if batch.recorded => {}
            Some(batch) => {
                batch.recorded = true;
                let label = batch.label.clone();
                self.history.record_snapshot(Arc::clone(&self.document), Some(label));
            }
            None => {
                self.history.record_snapshot(Arc::clone(&self.document), Some(label));
            }
        }
    }

    fn commit(&mut self, next: Arc<CampaignConfig>) {
        self.document = next;
        self.revision += 1;
        self.has_unsaved_changes = true;
    }
}
