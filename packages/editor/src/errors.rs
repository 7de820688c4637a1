//! Error types for the editor

use thiserror::Error;

/// Raised by the block factory. Never fatal: the mutation that needed the
/// block leaves the document unchanged and the caller decides whether to
/// tell the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactoryError {
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),
}
