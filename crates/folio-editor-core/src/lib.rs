//! folio-editor-core: rich-text formatting for folio notes, without a browser.
//!
//! This crate provides:
//! - `Surface` - an arena content tree with global char offsets
//! - `EditorDocument` trait and `PlainEditor` over injected selection/theme
//! - Format Engine (bold, italic, headings, clear formatting, typing)
//! - Highlight Engine, Format State Inspector, Structural Sanitizer
//! - Selection Tracker for the floating toolbar
//! - Actions, keybindings, snapshot history and document statistics

pub mod actions;
pub mod config;
pub mod document;
pub mod dom;
pub mod error;
pub mod execute;
pub mod format;
pub mod highlight;
pub mod history;
pub mod html;
pub mod inspect;
pub mod palette;
pub mod platform;
pub mod range;
pub mod sanitize;
pub mod stats;
pub mod style;
pub mod tracker;
pub mod types;

pub use actions::{EditorAction, Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers};
pub use config::EditorConfig;
pub use document::{EditorDocument, PlainEditor};
pub use dom::{Element, NodeId, NodeMap, Surface};
pub use error::{EditorError, Result};
pub use execute::{execute_action, handle_keydown};
pub use format::{apply_heading, apply_inline_format, clear_formatting, insert_text};
pub use highlight::apply_highlight;
pub use history::{Snapshot, SnapshotHistory, UndoManager};
pub use inspect::{FormatState, active_highlight_color, format_state, is_format_active};
pub use palette::HighlightColor;
pub use platform::{LocalSelection, SelectionSource, SharedSelection, ThemeProvider};
pub use sanitize::{SanitizeReport, sanitize};
pub use smol_str::SmolStr;
pub use stats::DocumentStats;
pub use tracker::{Placement, SelectionTracker, ToolbarAnchor, ToolbarMetrics, TrackerState};
pub use types::{Affinity, Boundary, FormatKind, HeadingLevel, Rect, Selection, ThemeMode, Viewport};
