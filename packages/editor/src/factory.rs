//! # Block Factory
//!
//! Instantiates blocks from the registry.
//!
//! - Props start from the registry defaults; caller overrides win.
//! - Styles always start from the registry defaults. Duplication copies
//!   styles itself after creation.
//! - Every block gets a fresh id from the factory's generator.

use std::sync::Arc;

use campaign_model::{Block, BlockIdGenerator, BlockRegistry, CampaignConfig, Props};

use crate::FactoryError;

/// Block types of the placeholder document, in page order
const BOILERPLATE_TYPES: &[&str] = &["Hero1", "Features1", "Cta1", "Footer1"];

#[derive(Debug)]
pub struct BlockFactory {
    registry: Arc<BlockRegistry>,
    ids: BlockIdGenerator,
}

impl BlockFactory {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self {
            registry,
            ids: BlockIdGenerator::new(),
        }
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// Create a block of `block_type`, merging `overrides` over the default props.
    pub fn create_block(
        &self,
        block_type: &str,
        overrides: Option<&Props>,
    ) -> Result<Block, FactoryError> {
        let def = self.registry.definition(block_type).ok_or_else(|| {
            tracing::warn!(block_type, "refusing to create block of unknown type");
            FactoryError::UnknownBlockType(block_type.to_string())
        })?;

        let mut props = def.default_props();
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                props.insert(key.clone(), value.clone());
            }
        }

        Ok(Block {
            id: self.ids.next_id(block_type),
            block_type: block_type.to_string(),
            props,
            styles: def.default_styles(),
        })
    }

    /// Placeholder document handed out when no stored campaign exists.
    ///
    /// Types missing from the registry are skipped.
    pub fn boilerplate(&self, name: impl Into<String>) -> CampaignConfig {
        let mut doc = CampaignConfig::new(name);
        doc.blocks = BOILERPLATE_TYPES
            .iter()
            .filter_map(|t| self.create_block(t, None).ok())
            .map(Arc::new)
            .collect();
        doc
    }
}
