//! Engine configuration.

use std::time::Duration;

use campaign_editor::{SessionOptions, DEFAULT_HISTORY_LIMIT};
use serde::{Deserialize, Serialize};

use crate::SyncError;

/// Default prefix for local storage keys.
pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "campaign-builder";

/// Default number of messages a broadcast channel buffers per tab.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Settings shared by every session of one embedding application.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum undo levels per session (0 = unlimited).
    pub history_limit: usize,

    /// Prefix of the local storage key, joined to the document id with `:`.
    pub storage_key_prefix: String,

    /// Delay before a queued write is flushed. Writes arriving in the window
    /// are coalesced into the newest one.
    pub write_debounce_ms: u64,

    /// Broadcast buffer per channel. Tabs that fall further behind skip to
    /// the newest messages.
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            storage_key_prefix: DEFAULT_STORAGE_KEY_PREFIX.to_string(),
            write_debounce_ms: 0,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(source: &str) -> Result<Self, SyncError> {
        let config: Self = serde_json::from_str(source)?;
        Ok(config.normalized())
    }

    /// Options for the editor session.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            history_limit: self.history_limit,
        }
    }

    #[must_use]
    pub fn write_debounce(&self) -> Duration {
        Duration::from_millis(self.write_debounce_ms)
    }

    /// Broadcast channels cannot be created with zero capacity.
    fn normalized(mut self) -> Self {
        if self.channel_capacity == 0 {
            tracing::warn!("channelCapacity of 0 is not usable, using {}", DEFAULT_CHANNEL_CAPACITY);
            self.channel_capacity = DEFAULT_CHANNEL_CAPACITY;
        }
        if self.storage_key_prefix.is_empty() {
            self.storage_key_prefix = DEFAULT_STORAGE_KEY_PREFIX.to_string();
        }
        self
    }
}
