//! # Campaign Editor
//!
//! Editing engine for campaign documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: CampaignConfig + block registry      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorSession                       │
//! │  - Factory builds blocks from the registry  │
//! │  - Pure mutations over Arc'd documents      │
//! │  - Snapshot history (undo/redo, batches)    │
//! │  - Selection and preview state              │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync: local persistence + cross-tab fanout  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Documents are values**: every change yields a new `Arc<CampaignConfig>`
//! 2. **No-ops are identity**: a change that changes nothing returns the same `Arc`
//! 3. **History is snapshots**: undo restores the exact earlier value
//! 4. **UI state is transient**: selection never enters history or storage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use campaign_editor::{EditorSession, SessionOptions};
//!
//! let mut session = EditorSession::new(doc, registry, SessionOptions::default());
//!
//! session.add_block("Hero1", None);
//! let id = session.document().blocks[0].id.clone();
//! session.update_block_prop(&id, "title", json!("Summer sale"));
//!
//! session.undo();
//! ```

mod errors;
mod factory;
mod history;
pub mod mutations;
mod session;
mod transient;

pub use errors::FactoryError;
pub use factory::BlockFactory;
pub use history::{History, Snapshot, DEFAULT_HISTORY_LIMIT};
pub use mutations::{Direction, Mutation};
pub use session::{ApplyOutcome, EditorSession, SaveTicket, SessionOptions};
pub use transient::{DevicePreview, TransientState};

// Re-export the document model for convenience
pub use campaign_model::{Block, BlockRegistry, CampaignConfig, Props, Styles, Theme};
