//! # Campaign Document
//!
//! A campaign is a theme plus an ordered list of blocks. Block order is
//! render order and block ids are unique within a document.
//!
//! Documents are immutable values once built: edits produce a new
//! `CampaignConfig` that reuses the `Arc`s of everything it did not touch.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{theme_path, ModelError};

/// Block properties (arbitrary JSON values keyed by field name)
pub type Props = Map<String, Value>;

/// Block styles (CSS-like string values keyed by property name)
pub type Styles = BTreeMap<String, String>;

/// One visual unit of a campaign page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,

    /// Registry type name (e.g. `Hero1`)
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub styles: Styles,
}

impl Block {
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn style(&self, key: &str) -> Option<&str> {
        self.styles.get(key).map(String::as_str)
    }
}

/// Global look of a campaign.
///
/// Keys beyond `globalFont`/`globalColors` are kept in `extra` so that
/// path assignment can introduce new nested settings without a schema bump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default)]
    pub global_font: String,

    #[serde(default)]
    pub global_colors: BTreeMap<String, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Theme {
    fn default() -> Self {
        let global_colors = [
            ("primary", "#4f46e5"),
            ("secondary", "#0ea5e9"),
            ("background", "#ffffff"),
            ("text", "#111827"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            global_font: "Inter".to_string(),
            global_colors,
            extra: Map::new(),
        }
    }
}

impl Theme {
    /// Return a copy of this theme with `value` assigned at the dot `path`.
    ///
    /// The theme is round-tripped through JSON, so the result must still
    /// deserialize as a `Theme` (e.g. `globalFont` must stay a string).
    pub fn with_value_at(&self, path: &str, value: Value) -> Result<Theme, ModelError> {
        let mut raw = serde_json::to_value(self)?;
        if !theme_path::set_at_path(&mut raw, path, value) {
            return Err(ModelError::InvalidPath(path.to_string()));
        }
        serde_json::from_value(raw).map_err(|e| ModelError::ThemeShape(e.to_string()))
    }

    /// Read the value at a dot `path`.
    pub fn value_at(&self, path: &str) -> Option<Value> {
        let raw = serde_json::to_value(self).ok()?;
        theme_path::get_at_path(&raw, path).cloned()
    }
}

/// A complete campaign document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignConfig {
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub theme: Arc<Theme>,

    #[serde(default)]
    pub blocks: Vec<Arc<Block>>,
}

impl CampaignConfig {
    /// Empty campaign with a fresh id and the default theme
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            theme: Arc::new(Theme::default()),
            blocks: Vec::new(),
        }
    }

    pub fn block(&self, id: &str) -> Option<&Arc<Block>> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Block ids in render order
    pub fn block_ids(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.id.as_str()).collect()
    }

    /// Structural check applied to documents coming from untrusted storage.
    ///
    /// Unknown block types are accepted; only id integrity is enforced.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::with_capacity(self.blocks.len());
        for (index, block) in self.blocks.iter().enumerate() {
            if block.id.is_empty() {
                return Err(ModelError::EmptyBlockId(index));
            }
            if !seen.insert(block.id.as_str()) {
                return Err(ModelError::DuplicateBlockId(block.id.clone()));
            }
        }
        Ok(())
    }

    pub fn from_json(source: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }
}
