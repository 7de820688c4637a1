//! # Block-Type Registry
//!
//! Declarative manifest of the block types an editor can create.
//!
//! Each [`BlockDefinition`] lists the editable props and styles of a type,
//! with a `defaultValue` per field. The registry is versioned and static for
//! the lifetime of a session.
//!
//! Lookups go through [`BlockRegistry::capability`], which returns a tagged
//! value instead of failing: persisted documents may carry types that a newer
//! registry dropped, and those must still load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ModelError, Props, Styles};

const BUILTIN_MANIFEST: &str = include_str!("../registry/blocks.json");

/// Editor widget used for a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Textarea,
    RichText,
    Color,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Select {
        options: Vec<String>,
    },
    Image,
    Url,
    Toggle,
    List,
}

/// One editable prop or style of a block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub key: String,

    #[serde(default)]
    pub label: String,

    #[serde(flatten)]
    pub kind: FieldKind,

    #[serde(default)]
    pub default_value: Value,
}

/// Manifest entry for one block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub props: Vec<FieldDefinition>,

    #[serde(default)]
    pub styles: Vec<FieldDefinition>,
}

impl BlockDefinition {
    /// Default props, one entry per registered prop field
    pub fn default_props(&self) -> Props {
        self.props
            .iter()
            .map(|field| (field.key.clone(), field.default_value.clone()))
            .collect()
    }

    /// Default styles, one entry per registered style field.
    ///
    /// String defaults are taken verbatim; any other JSON default is stored
    /// as its JSON text (`16` → `"16"`).
    pub fn default_styles(&self) -> Styles {
        self.styles
            .iter()
            .map(|field| (field.key.clone(), style_string(&field.default_value)))
            .collect()
    }

    pub fn prop_field(&self, key: &str) -> Option<&FieldDefinition> {
        self.props.iter().find(|f| f.key == key)
    }

    pub fn style_field(&self, key: &str) -> Option<&FieldDefinition> {
        self.styles.iter().find(|f| f.key == key)
    }
}

fn style_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Serialized registry manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryManifest {
    pub version: u32,
    pub blocks: Vec<BlockDefinition>,
}

/// What the editor can do with a block of a given type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockCapability<'a> {
    /// Registered type: editable fields are known
    Known(&'a BlockDefinition),

    /// Type missing from the registry: display as-is, no field editors
    Unknown(&'a str),
}

impl<'a> BlockCapability<'a> {
    pub fn is_known(&self) -> bool {
        matches!(self, BlockCapability::Known(_))
    }

    pub fn definition(self) -> Option<&'a BlockDefinition> {
        match self {
            BlockCapability::Known(def) => Some(def),
            BlockCapability::Unknown(_) => None,
        }
    }

    /// Label shown in layer lists and inspectors
    pub fn label(self) -> &'a str {
        match self {
            BlockCapability::Known(def) if !def.label.is_empty() => &def.label,
            BlockCapability::Known(def) => &def.block_type,
            BlockCapability::Unknown(_) => "Unknown block",
        }
    }
}

/// Lookup table from block type name to definition
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    version: u32,
    definitions: Vec<BlockDefinition>,
    index: HashMap<String, usize>,
}

impl BlockRegistry {
    pub fn from_manifest(manifest: RegistryManifest) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(manifest.blocks.len());
        for (position, def) in manifest.blocks.iter().enumerate() {
            if index.insert(def.block_type.clone(), position).is_some() {
                return Err(ModelError::DuplicateBlockType(def.block_type.clone()));
            }
        }

        Ok(Self {
            version: manifest.version,
            definitions: manifest.blocks,
            index,
        })
    }

    pub fn from_json(source: &str) -> Result<Self, ModelError> {
        let manifest: RegistryManifest = serde_json::from_str(source)?;
        Self::from_manifest(manifest)
    }

    /// Registry bundled with the crate (`registry/blocks.json`)
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_MANIFEST).unwrap_or_else(|err| {
            tracing::error!("bundled block manifest is invalid: {}", err);
            Self::default()
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn definition(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.index.get(block_type).map(|&i| &self.definitions[i])
    }

    pub fn capability<'a>(&'a self, block_type: &'a str) -> BlockCapability<'a> {
        match self.definition(block_type) {
            Some(def) => BlockCapability::Known(def),
            None => BlockCapability::Unknown(block_type),
        }
    }

    /// Definitions in manifest order (palette order)
    pub fn definitions(&self) -> &[BlockDefinition] {
        &self.definitions
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for def in &self.definitions {
            if !categories.contains(&def.category.as_str()) {
                categories.push(&def.category);
            }
        }
        categories
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
