//! # Document Mutations
//!
//! Pure operations over campaign documents.
//!
//! ## Design Principles
//!
//! 1. **Immutable**: every operation returns a new `Arc<CampaignConfig>`
//! 2. **Shared**: untouched blocks keep their `Arc`; edits allocate only the
//!    block they change
//! 3. **Total**: an id that does not resolve makes the operation a no-op that
//!    returns the *same* `Arc` (check with `Arc::ptr_eq`)
//!
//! ## Mutation Semantics
//!
//! ### MoveBlock
//! - Array move: the active block is removed and re-inserted at the index the
//!   target block occupied. Not a swap.
//!
//! ### MoveBlockByStep
//! - One position up or down, clamped at both ends (no wraparound)
//!
//! ### DuplicateBlock
//! - Factory-created copy seeded with the original's props, styles copied
//!   verbatim, placed directly after the original
//!
//! ### UpdateGlobalStyle
//! - Whole-path assignment into the theme; the theme is cloned, the rest of
//!   the document is shared

use std::fmt;
use std::sync::Arc;

use campaign_model::{Block, CampaignConfig, Props};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BlockFactory, FactoryError};

/// Direction for single-step moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Editor operations, as dispatched from UI gestures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Append a new block built from the registry
    AddBlock {
        block_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overrides: Option<Props>,
    },

    /// Insert a new block at `index` (clamped to the end)
    InsertBlock {
        block_type: String,
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overrides: Option<Props>,
    },

    DeleteBlock {
        block_id: String,
    },

    /// Drag-and-drop: move `active_id` to where `over_id` is
    MoveBlock {
        active_id: String,
        over_id: String,
    },

    MoveBlockByStep {
        block_id: String,
        direction: Direction,
    },

    DuplicateBlock {
        block_id: String,
    },

    UpdateBlockProp {
        block_id: String,
        key: String,
        value: Value,
    },

    UpdateBlockStyle {
        block_id: String,
        key: String,
        value: String,
    },

    /// Assign at a dot path inside the theme (`globalColors.primary`)
    UpdateGlobalStyle {
        path: String,
        value: Value,
    },

    RenameCampaign {
        name: String,
    },
}

impl Mutation {
    /// Apply to `doc`. Only block creation can fail; everything else
    /// degrades to returning `doc` itself.
    pub fn apply(
        &self,
        doc: &Arc<CampaignConfig>,
        factory: &BlockFactory,
    ) -> Result<Arc<CampaignConfig>, FactoryError> {
        let next = match self {
            Mutation::AddBlock { block_type, overrides } => {
                add_block(doc, factory, block_type, overrides.as_ref())?
            }
            Mutation::InsertBlock { block_type, index, overrides } => {
                insert_block(doc, factory, block_type, *index, overrides.as_ref())?
            }
            Mutation::DeleteBlock { block_id } => delete_block(doc, block_id),
            Mutation::MoveBlock { active_id, over_id } => move_block(doc, active_id, over_id),
            Mutation::MoveBlockByStep { block_id, direction } => {
                move_block_by_step(doc, block_id, *direction)
            }
            Mutation::DuplicateBlock { block_id } => duplicate_block(doc, factory, block_id)?,
            Mutation::UpdateBlockProp { block_id, key, value } => {
                update_block_prop(doc, block_id, key, value.clone())
            }
            Mutation::UpdateBlockStyle { block_id, key, value } => {
                update_block_style(doc, block_id, key, value)
            }
            Mutation::UpdateGlobalStyle { path, value } => {
                update_global_style(doc, path, value.clone())
            }
            Mutation::RenameCampaign { name } => rename_campaign(doc, name),
        };
        Ok(next)
    }

    /// Short description used for history entries and logs
    pub fn label(&self) -> String {
        match self {
            Mutation::AddBlock { block_type, .. } | Mutation::InsertBlock { block_type, .. } => {
                format!("Add {}", block_type)
            }
            Mutation::DeleteBlock { .. } => "Delete block".to_string(),
            Mutation::MoveBlock { .. } => "Move block".to_string(),
            Mutation::MoveBlockByStep { direction, .. } => format!("Move block {}", direction),
            Mutation::DuplicateBlock { .. } => "Duplicate block".to_string(),
            Mutation::UpdateBlockProp { key, .. } => format!("Edit {}", key),
            Mutation::UpdateBlockStyle { key, .. } => format!("Style {}", key),
            Mutation::UpdateGlobalStyle { path, .. } => format!("Theme {}", path),
            Mutation::RenameCampaign { .. } => "Rename campaign".to_string(),
        }
    }

    /// Block the mutation targets, if it targets an existing one
    pub fn target_block(&self) -> Option<&str> {
        match self {
            Mutation::DeleteBlock { block_id }
            | Mutation::MoveBlockByStep { block_id, .. }
            | Mutation::DuplicateBlock { block_id }
            | Mutation::UpdateBlockProp { block_id, .. }
            | Mutation::UpdateBlockStyle { block_id, .. } => Some(block_id.as_str()),
            Mutation::MoveBlock { active_id, .. } => Some(active_id.as_str()),
            _ => None,
        }
    }
}

/// Append a factory-built block.
pub fn add_block(
    doc: &Arc<CampaignConfig>,
    factory: &BlockFactory,
    block_type: &str,
    overrides: Option<&Props>,
) -> Result<Arc<CampaignConfig>, FactoryError> {
    insert_block(doc, factory, block_type, doc.blocks.len(), overrides)
}

/// Insert a factory-built block at `index`, clamped to the end of the list.
pub fn insert_block(
    doc: &Arc<CampaignConfig>,
    factory: &BlockFactory,
    block_type: &str,
    index: usize,
    overrides: Option<&Props>,
) -> Result<Arc<CampaignConfig>, FactoryError> {
    let block = factory.create_block(block_type, overrides)?;
    let mut next = (**doc).clone();
    let index = index.min(next.blocks.len());
    next.blocks.insert(index, Arc::new(block));
    Ok(Arc::new(next))
}

/// Remove a block. Selection is the caller's concern.
pub fn delete_block(doc: &Arc<CampaignConfig>, block_id: &str) -> Arc<CampaignConfig> {
    let Some(index) = doc.index_of(block_id) else {
        return Arc::clone(doc);
    };

    let mut next = (**doc).clone();
    next.blocks.remove(index);
    Arc::new(next)
}

/// Move `active_id` to the position currently held by `over_id`.
pub fn move_block(doc: &Arc<CampaignConfig>, active_id: &str, over_id: &str) -> Arc<CampaignConfig> {
    let (Some(from), Some(to)) = (doc.index_of(active_id), doc.index_of(over_id)) else {
        return Arc::clone(doc);
    };
    if from == to {
        return Arc::clone(doc);
    }

    let mut next = (**doc).clone();
    let block = next.blocks.remove(from);
    next.blocks.insert(to, block);
    Arc::new(next)
}

/// Move a block one position, clamped at the ends of the list.
pub fn move_block_by_step(
    doc: &Arc<CampaignConfig>,
    block_id: &str,
    direction: Direction,
) -> Arc<CampaignConfig> {
    let Some(index) = doc.index_of(block_id) else {
        return Arc::clone(doc);
    };

    let target = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < doc.blocks.len() => index + 1,
        _ => return Arc::clone(doc),
    };

    let mut next = (**doc).clone();
    next.blocks.swap(index, target);
    Arc::new(next)
}

/// Copy a block (fresh id, same props and styles) right after the original.
pub fn duplicate_block(
    doc: &Arc<CampaignConfig>,
    factory: &BlockFactory,
    block_id: &str,
) -> Result<Arc<CampaignConfig>, FactoryError> {
    let Some(index) = doc.index_of(block_id) else {
        return Ok(Arc::clone(doc));
    };

    let original = &doc.blocks[index];
    let mut copy = factory.create_block(&original.block_type, Some(&original.props))?;
    copy.styles = original.styles.clone();

    let mut next = (**doc).clone();
    next.blocks.insert(index + 1, Arc::new(copy));
    Ok(Arc::new(next))
}

/// Replace one prop of one block. Setting a prop to its current value is a no-op.
pub fn update_block_prop(
    doc: &Arc<CampaignConfig>,
    block_id: &str,
    key: &str,
    value: Value,
) -> Arc<CampaignConfig> {
    replace_block(doc, block_id, |block| {
        if block.props.get(key) == Some(&value) {
            return false;
        }
        block.props.insert(key.to_string(), value);
        true
    })
}

/// Replace one style of one block. Setting a style to its current value is a no-op.
pub fn update_block_style(
    doc: &Arc<CampaignConfig>,
    block_id: &str,
    key: &str,
    value: &str,
) -> Arc<CampaignConfig> {
    replace_block(doc, block_id, |block| {
        if block.style(key) == Some(value) {
            return false;
        }
        block.styles.insert(key.to_string(), value.to_string());
        true
    })
}

/// Assign `value` at the dot `path` of the theme.
///
/// Malformed paths and assignments that break the theme's shape are logged
/// and ignored.
pub fn update_global_style(doc: &Arc<CampaignConfig>, path: &str, value: Value) -> Arc<CampaignConfig> {
    let theme = match doc.theme.with_value_at(path, value) {
        Ok(theme) => theme,
        Err(err) => {
            tracing::warn!(path, "ignoring theme update: {}", err);
            return Arc::clone(doc);
        }
    };
    if theme == *doc.theme {
        return Arc::clone(doc);
    }

    let mut next = (**doc).clone();
    next.theme = Arc::new(theme);
    Arc::new(next)
}

pub fn rename_campaign(doc: &Arc<CampaignConfig>, name: &str) -> Arc<CampaignConfig> {
    if doc.name == name {
        return Arc::clone(doc);
    }

    let mut next = (**doc).clone();
    next.name = name.to_string();
    Arc::new(next)
}

/// Clone-edit-replace one block. `edit` returns whether it changed anything.
fn replace_block(
    doc: &Arc<CampaignConfig>,
    block_id: &str,
    edit: impl FnOnce(&mut Block) -> bool,
) -> Arc<CampaignConfig> {
    let Some(index) = doc.index_of(block_id) else {
        return Arc::clone(doc);
    };

    let mut block = (*doc.blocks[index]).clone();
    if !edit(&mut block) {
        return Arc::clone(doc);
    }

    let mut next = (**doc).clone();
    next.blocks[index] = Arc::new(block);
    Arc::new(next)
}
