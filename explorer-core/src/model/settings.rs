//! ``src/model/settings.rs``
//! ============================================================================
//! # ExplorerSettings: persisted plugin settings
//!
//! The JSON keys are fixed (`sortOrder`, `collapsedFolders`, ...) so that a
//! settings file written by any earlier version loads unchanged. Keys this
//! version does not know about are kept in [`ExplorerSettings::extra`] and
//! written back untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which outline the active item gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineMode {
    /// Outline follows the focused row.
    #[default]
    Focused,
    /// Outline follows the file open in the editor.
    Viewed,
}

/// What the platform modifier (Ctrl / Cmd) does on click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierAction {
    #[default]
    OpenNewTab,
    SelectMultiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorerSettings {
    /// Explicit rank per path. Absent paths sort after every ranked one.
    pub sort_order: BTreeMap<String, i64>,

    /// Folder path -> `true` when collapsed.
    pub collapsed_folders: BTreeMap<String, bool>,

    pub hide_file_extensions: bool,
    pub show_icons: bool,
    pub show_base_badge: bool,
    pub outline_mode: OutlineMode,
    pub outline_color: String,
    pub use_custom_outline_color: bool,
    pub modifier_action: ModifierAction,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            sort_order: BTreeMap::new(),
            collapsed_folders: BTreeMap::new(),
            hide_file_extensions: false,
            show_icons: true,
            show_base_badge: false,
            outline_mode: OutlineMode::Focused,
            outline_color: String::new(),
            use_custom_outline_color: true,
            modifier_action: ModifierAction::OpenNewTab,
            extra: Map::new(),
        }
    }
}

impl ExplorerSettings {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let settings = ExplorerSettings::from_json("{}").unwrap();
        assert_eq!(settings, ExplorerSettings::default());
        assert!(settings.show_icons);
        assert!(settings.use_custom_outline_color);
        assert_eq!(settings.modifier_action, ModifierAction::OpenNewTab);
    }

    #[test]
    fn test_wire_keys_are_exact() {
        let text = r#"{
            "sortOrder": {"Notes": 0, "a.md": 1},
            "collapsedFolders": {"Notes": true},
            "hideFileExtensions": true,
            "outlineMode": "viewed",
            "modifierAction": "selectMultiple"
        }"#;
        let settings = ExplorerSettings::from_json(text).unwrap();
        assert_eq!(settings.sort_order.get("a.md"), Some(&1));
        assert_eq!(settings.collapsed_folders.get("Notes"), Some(&true));
        assert!(settings.hide_file_extensions);
        assert_eq!(settings.outline_mode, OutlineMode::Viewed);
        assert_eq!(settings.modifier_action, ModifierAction::SelectMultiple);

        let json: Value = serde_json::from_str(&settings.to_json().unwrap()).unwrap();
        assert!(json.get("sortOrder").is_some());
        assert!(json.get("useCustomOutlineColor").is_some());
        assert!(json.get("sort_order").is_none());
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let text = r#"{"showIcons": false, "futureOption": {"nested": [1, 2]}}"#;
        let settings = ExplorerSettings::from_json(text).unwrap();
        assert!(!settings.show_icons);

        let back: Value = serde_json::from_str(&settings.to_json().unwrap()).unwrap();
        assert_eq!(back["futureOption"]["nested"][1], 2);
    }
}
