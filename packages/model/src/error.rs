//! Error types for the document model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(String),

    #[error("Block at index {0} has an empty id")]
    EmptyBlockId(usize),

    #[error("Duplicate block type in registry: {0}")]
    DuplicateBlockType(String),

    #[error("Invalid theme path: {0:?}")]
    InvalidPath(String),

    #[error("Theme no longer matches its schema: {0}")]
    ThemeShape(String),
}
