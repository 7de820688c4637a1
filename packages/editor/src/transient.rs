//! Selection and other UI state that rides alongside the document.
//!
//! None of this is part of a snapshot: it is not undoable, not persisted and
//! not broadcast to other tabs. Last write wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Preview viewport the canvas is rendered at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreview {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DevicePreview {
    /// Nominal viewport width in CSS pixels
    pub const fn viewport_width(&self) -> u32 {
        match self {
            Self::Desktop => 1280,
            Self::Tablet => 768,
            Self::Mobile => 375,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for DevicePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DevicePreview {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            other => Err(format!("unknown device preview: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransientState {
    pub selected_block_id: Option<String>,
    pub device_preview: DevicePreview,
    pub active_tool: Option<String>,
}

impl TransientState {
    pub fn select(&mut self, block_id: impl Into<String>) {
        self.selected_block_id = Some(block_id.into());
    }

    pub fn clear_selection(&mut self) {
        self.selected_block_id = None;
    }

    pub fn is_selected(&self, block_id: &str) -> bool {
        self.selected_block_id.as_deref() == Some(block_id)
    }

    pub fn set_device_preview(&mut self, mode: DevicePreview) {
        self.device_preview = mode;
    }

    pub fn set_active_tool(&mut self, tool: Option<String>) {
        self.active_tool = tool;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = TransientState::default();
        assert_eq!(state.selected_block_id, None);
        assert_eq!(state.device_preview, DevicePreview::Desktop);
        assert_eq!(state.active_tool, None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut state = TransientState::default();
        state.select("a");
        state.select("b");
        assert!(state.is_selected("b"));
        assert!(!state.is_selected("a"));

        state.clear_selection();
        assert_eq!(state.selected_block_id, None);
    }

    #[test]
    fn test_device_preview_parse() {
        assert_eq!("Tablet".parse::<DevicePreview>(), Ok(DevicePreview::Tablet));
        assert!("watch".parse::<DevicePreview>().is_err());
        assert_eq!(DevicePreview::Mobile.to_string(), "mobile");
        assert_eq!(DevicePreview::Mobile.viewport_width(), 375);
    }
}
