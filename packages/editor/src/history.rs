//! # Undo/Redo History
//!
//! Linear history of full document snapshots.
//!
//! ## Design
//!
//! - Before a change becomes current, the document it replaces is recorded
//!   onto `past`
//! - Undo pops `past` and pushes the live document onto the front of `future`
//! - Redo shifts the front of `future` and pushes the live document onto `past`
//! - Recording clears `future`: there is no branching history
//! - Snapshots are `Arc`s, and documents share untouched blocks, so a step
//!   costs one block list plus whatever the change allocated
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new();
//!
//! history.record_snapshot(Arc::clone(&doc), Some("Edit title".into()));
//! doc = next;
//!
//! if let Some(previous) = history.undo(&doc) {
//!     doc = previous;
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use campaign_model::CampaignConfig;

/// Default cap on undo levels
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A document captured for history, with the label of the change that
/// followed it
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Arc<CampaignConfig>,
    pub label: Option<String>,
}

#[derive(Debug)]
pub struct History {
    /// Older documents (most recent at the back, oldest trimmed from the front)
    past: VecDeque<Snapshot>,

    /// Undone documents (next redo first)
    future: VecDeque<Snapshot>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// Create a history with the default cap
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_HISTORY_LIMIT)
    }

    /// Create a history keeping at most `max_levels` undo steps (0 = unlimited)
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            max_levels,
        }
    }

    /// Record the document that is about to be replaced.
    pub fn record_snapshot(&mut self, document: Arc<CampaignConfig>, label: Option<String>) {
        self.past.push_back(Snapshot { document, label });

        if self.max_levels > 0 {
            while self.past.len() > self.max_levels {
                self.past.pop_front();
            }
        }

        self.future.clear();
    }

    /// Step back. Returns the document to adopt, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self, current: &Arc<CampaignConfig>) -> Option<Arc<CampaignConfig>> {
        let previous = self.past.pop_back()?;
        self.future.push_front(Snapshot {
            document: Arc::clone(current),
            label: previous.label.clone(),
        });
        Some(previous.document)
    }

    /// Step forward. Returns the document to adopt, or `None` when there is
    /// nothing to redo.
    pub fn redo(&mut self, current: &Arc<CampaignConfig>) -> Option<Arc<CampaignConfig>> {
        let next = self.future.pop_front()?;
        self.past.push_back(Snapshot {
            document: Arc::clone(current),
            label: next.label.clone(),
        });
        Some(next.document)
    }

    /// Drop all history (e.g. when switching to another campaign)
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Label of the change the next undo reverts
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().and_then(|s| s.label.as_deref())
    }

    /// Label of the change the next redo reapplies
    pub fn redo_label(&self) -> Option<&str> {
        self.future.front().and_then(|s| s.label.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Arc<CampaignConfig> {
        Arc::new(CampaignConfig::new(name))
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_depth(), 0);
        assert_eq!(history.redo_depth(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.max_levels(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_undo_on_empty_returns_none() {
        let mut history = History::new();
        let current = doc("a");
        assert!(history.undo(&current).is_none());
        assert!(history.redo(&current).is_none());
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_record_undo_redo() {
        let mut history = History::new();
        let v0 = doc("v0");
        let v1 = doc("v1");

        history.record_snapshot(Arc::clone(&v0), Some("Rename".into()));
        assert_eq!(history.undo_label(), Some("Rename"));

        let undone = history.undo(&v1).unwrap();
        assert!(Arc::ptr_eq(&undone, &v0));
        assert_eq!(history.redo_depth(), 1);
        assert_eq!(history.redo_label(), Some("Rename"));

        let redone = history.redo(&undone).unwrap();
        assert!(Arc::ptr_eq(&redone, &v1));
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_future_is_ordered_front_first() {
        let mut history = History::new();
        let (v0, v1, v2) = (doc("v0"), doc("v1"), doc("v2"));

        history.record_snapshot(Arc::clone(&v0), None);
        history.record_snapshot(Arc::clone(&v1), None);

        let back1 = history.undo(&v2).unwrap();
        let back0 = history.undo(&back1).unwrap();
        assert!(Arc::ptr_eq(&back0, &v0));

        let fwd1 = history.redo(&back0).unwrap();
        assert!(Arc::ptr_eq(&fwd1, &v1));
        let fwd2 = history.redo(&fwd1).unwrap();
        assert!(Arc::ptr_eq(&fwd2, &v2));
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = History::new();
        let (v0, v1) = (doc("v0"), doc("v1"));

        history.record_snapshot(Arc::clone(&v0), None);
        let undone = history.undo(&v1).unwrap();
        assert!(history.can_redo());

        history.record_snapshot(undone, None);
        assert!(!history.can_redo());
        assert!(history.redo(&doc("v2")).is_none());
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut history = History::with_max_levels(2);
        let docs: Vec<_> = (0..3).map(|i| doc(&format!("v{}", i))).collect();

        for d in &docs {
            history.record_snapshot(Arc::clone(d), None);
        }

        assert_eq!(history.undo_depth(), 2);
        let newest = history.undo(&doc("v3")).unwrap();
        assert!(Arc::ptr_eq(&newest, &docs[2]));
    }

    #[test]
    fn test_capped_history_keeps_newest_in_order() {
        let mut history = History::with_max_levels(3);
        let docs: Vec<_> = (0..10).map(|i| doc(&format!("v{}", i))).collect();

        for (i, d) in docs.iter().enumerate() {
            history.record_snapshot(Arc::clone(d), Some(format!("step {}", i)));
            assert!(history.undo_depth() <= 3);
        }
        assert_eq!(history.undo_label(), Some("step 9"));

        let mut current = doc("live");
        let mut walked = Vec::new();
        while let Some(previous) = history.undo(&current) {
            walked.push(previous.name.clone());
            current = previous;
        }
        assert_eq!(walked, vec!["v9", "v8", "v7"]);
        assert_eq!(history.redo_depth(), 3);
        assert_eq!(history.redo_label(), Some("step 7"));
    }

    #[test]
    fn test_unlimited_levels() {
        let mut history = History::with_max_levels(0);
        for i in 0..250 {
            history.record_snapshot(doc(&format!("v{}", i)), None);
        }
        assert_eq!(history.undo_depth(), 250);
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.record_snapshot(doc("v0"), None);
        let _ = history.undo(&doc("v1"));
        history.record_snapshot(doc("v2"), None);

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
