//! # Campaign Model
//!
//! Data contract for campaign documents and the block-type registry.
//!
//! ## Shape
//!
//! ```text
//! CampaignConfig
//!  ├─ id, name
//!  ├─ theme: Theme { globalFont, globalColors, ..nested keys }
//!  └─ blocks: [Block { id, type, props, styles }]   (render order)
//! ```
//!
//! Blocks and the theme are held behind `Arc` so that an edit to one block
//! produces a new document that shares every other block with its
//! predecessor. Consumers detect "nothing changed" with `Arc::ptr_eq`.
//!
//! The [`BlockRegistry`] is the declarative manifest that maps a block type
//! name to its editable fields and their defaults. Documents may reference
//! types the registry no longer knows; those resolve to
//! [`BlockCapability::Unknown`] instead of failing.

mod document;
mod error;
mod ids;
mod registry;
pub mod theme_path;

pub use document::{Block, CampaignConfig, Props, Styles, Theme};
pub use error::ModelError;
pub use ids::BlockIdGenerator;
pub use registry::{
    BlockCapability, BlockDefinition, BlockRegistry, FieldDefinition, FieldKind,
    RegistryManifest,
};
