//! Error types for persistence and replication

use campaign_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Persistence writer is no longer running")]
    WriterClosed,
}
