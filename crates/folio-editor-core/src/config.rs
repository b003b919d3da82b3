//! Editor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::history::SnapshotHistory;
use crate::tracker::ToolbarMetrics;
use crate::types::ThemeMode;

/// Tunables for an editor instance. Every field has a default, so a
/// partial configuration deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EditorConfig {
    pub theme: ThemeMode,
    pub toolbar_width: f64,
    pub toolbar_height: f64,
    pub edge_margin: f64,
    pub selection_gap: f64,
    pub history_capacity: usize,
    pub history_debounce_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let metrics = ToolbarMetrics::default();
        Self {
            theme: ThemeMode::Light,
            toolbar_width: metrics.width,
            toolbar_height: metrics.height,
            edge_margin: metrics.edge_margin,
            selection_gap: metrics.gap,
            history_capacity: 50,
            history_debounce_ms: 1000,
        }
    }
}

impl EditorConfig {
    pub fn toolbar_metrics(&self) -> ToolbarMetrics {
        ToolbarMetrics {
            width: self.toolbar_width,
            height: self.toolbar_height,
            edge_margin: self.edge_margin,
            gap: self.selection_gap,
        }
    }

    pub fn history(&self) -> SnapshotHistory {
        SnapshotHistory::new(
            self.history_capacity,
            Duration::from_millis(self.history_debounce_ms),
        )
    }
}
