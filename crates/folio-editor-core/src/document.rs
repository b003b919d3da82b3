//! Core editor document trait and implementations.
//!
//! Defines the `EditorDocument` trait the engines are written against,
//! and `PlainEditor`, a field-based implementation with injected selection
//! and theme capabilities, snapshot history and a selection tracker.

use web_time::Instant;

use crate::config::EditorConfig;
use crate::dom::{Surface, ZERO_WIDTH_ANCHOR};
use crate::history::{Snapshot, SnapshotHistory, UndoManager};
use crate::html;
use crate::platform::{LocalSelection, SelectionSource, ThemeProvider};
use crate::range::TextRange;
use crate::stats::DocumentStats;
use crate::tracker::{SelectionTracker, TrackerState};
use crate::types::{Affinity, Boundary, Selection, ThemeMode, Viewport};

/// Core trait for editor documents.
///
/// The formatting engines only see this interface: the surface they
/// mutate, the live selection they re-read on every operation, and the
/// theme signal. Reactive hosts can implement it over their own state.
pub trait EditorDocument {
    // === Required: Surface access ===

    fn surface(&self) -> &Surface;

    fn surface_mut(&mut self) -> &mut Surface;

    // === Required: Selection and theme ===

    /// Read the live selection.
    fn selection(&self) -> Option<Selection>;

    /// Move the live selection.
    fn set_selection(&mut self, selection: Option<Selection>);

    /// Current colour scheme.
    fn theme(&self) -> ThemeMode;

    // === Provided: History hooks ===

    /// Called after every successful mutation.
    fn content_changed(&mut self) {}

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool {
        false
    }

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool {
        false
    }

    // === Provided: Convenience accessors ===

    /// Serialized HTML of the surface.
    fn html(&self) -> String {
        html::serialize(self.surface())
    }

    /// Selected text with zero-width anchors removed.
    fn selected_text(&self) -> Option<String> {
        let selection = self.selection()?;
        let range = TextRange::resolve(self.surface(), &selection).ok()?;
        let text: String = self
            .surface()
            .text_content(self.surface().root())
            .chars()
            .skip(range.start_offset)
            .take(range.end_offset - range.start_offset)
            .filter(|c| *c != ZERO_WIDTH_ANCHOR)
            .collect();
        Some(text)
    }

    /// Select the global char range `[start, end)`.
    fn select_offsets(&mut self, start: usize, end: usize) {
        let range = TextRange::from_offsets(self.surface(), start, end);
        self.set_selection(Some(range.to_selection()));
    }

    /// Select the `occurrence`-th (0-based) match of `needle` in the surface
    /// text. Returns false if there is no such match.
    fn select_text(&mut self, needle: &str, occurrence: usize) -> bool {
        if needle.is_empty() {
            return false;
        }
        let text = self.surface().text_content(self.surface().root());
        let Some((byte, _)) = text.match_indices(needle).nth(occurrence) else {
            return false;
        };
        let start = text[..byte].chars().count();
        let end = start + needle.chars().count();
        self.select_offsets(start, end);
        true
    }

    /// Collapse the selection to the end of the surface.
    fn caret_to_end(&mut self) {
        let caret = end_caret(self.surface());
        self.set_selection(Some(Selection::caret(caret)));
    }
}

/// Boundary after the last character of the surface.
pub fn end_caret(surface: &Surface) -> Boundary {
    surface.boundary_at(usize::MAX, Affinity::Before)
}

/// Field-based editor over injected capabilities.
pub struct PlainEditor<S: SelectionSource = LocalSelection, T: ThemeProvider = ThemeMode> {
    surface: Surface,
    selection: S,
    theme: T,
    title: String,
    history: SnapshotHistory,
    tracker: SelectionTracker,
    config: EditorConfig,
}

impl PlainEditor<LocalSelection, ThemeMode> {
    /// Editor with default configuration, owning its selection.
    pub fn from_html(content: &str) -> Self {
        let config = EditorConfig::default();
        let theme = config.theme;
        let mut editor = Self::new(LocalSelection::default(), theme, config);
        editor.load("", content);
        editor
    }
}

impl<S: SelectionSource, T: ThemeProvider> PlainEditor<S, T> {
    pub fn new(selection: S, theme: T, config: EditorConfig) -> Self {
        Self {
            surface: Surface::new(),
            selection,
            theme,
            title: String::new(),
            history: config.history(),
            tracker: SelectionTracker::new(config.toolbar_metrics()),
            config,
        }
    }

    /// Open a note: replace the content and start a fresh history.
    pub fn load(&mut self, title: &str, content: &str) {
        self.surface = html::parse(content);
        self.title = title.to_string();
        self.history.reset(self.snapshot());
        self.tracker.clear();
        self.selection.write(None);
    }

    /// Replace the content, keeping history.
    pub fn set_content(&mut self, content: &str) {
        self.surface = html::parse(content);
        self.selection.write(None);
        self.record();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.record();
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    /// Host notification: the live selection changed.
    pub fn on_selection_change(
        &mut self,
        selection: Option<Selection>,
        viewport: Viewport,
    ) -> &TrackerState {
        self.selection.write(selection);
        self.tracker.update(&self.surface, selection, viewport)
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::of(&self.surface)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.title.clone(), html::serialize(&self.surface))
    }

    fn record(&mut self) {
        let snapshot = self.snapshot();
        self.history.record(snapshot, Instant::now());
    }

    fn restore_current(&mut self) {
        if let Some(current) = self.history.current().cloned() {
            self.surface = html::parse(&current.content);
            self.title = current.title;
            self.caret_to_end();
        }
    }
}

impl<S: SelectionSource, T: ThemeProvider> EditorDocument for PlainEditor<S, T> {
    fn surface(&self) -> &Surface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    fn selection(&self) -> Option<Selection> {
        self.selection.read()
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection.write(selection);
    }

    fn theme(&self) -> ThemeMode {
        self.theme.theme()
    }

    fn content_changed(&mut self) {
        if let Some(map) = self.surface.compact_if_sparse() {
            let remapped = self.selection.read().and_then(|sel| {
                let anchor = Boundary::new(map.get(sel.anchor.node)?, sel.anchor.offset);
                let focus = Boundary::new(map.get(sel.focus.node)?, sel.focus.offset);
                Some(Selection::new(anchor, focus).with_rect(sel.rect))
            });
            self.selection.write(remapped);
            self.tracker.clear();
        }
        self.record();
    }

    fn undo(&mut self) -> bool {
        if !self.history.undo() {
            return false;
        }
        self.restore_current();
        true
    }

    fn redo(&mut self) -> bool {
        if !self.history.redo() {
            return false;
        }
        self.restore_current();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SharedSelection;

    #[test]
    fn test_select_text_by_occurrence() {
        let mut editor = PlainEditor::from_html("<p>one two one</p>");
        assert!(editor.select_text("one", 1));
        assert_eq!(editor.selected_text().as_deref(), Some("one"));
        let range = TextRange::resolve(editor.surface(), &editor.selection().unwrap()).unwrap();
        assert_eq!((range.start_offset, range.end_offset), (8, 11));
        assert!(!editor.select_text("one", 2));
        assert!(!editor.select_text("", 0));
    }

    #[test]
    fn test_undo_restores_content() {
        let mut editor = PlainEditor::from_html("<p>first</p>");
        editor.set_content("<p>second</p>");
        assert_eq!(editor.html(), "<p>second</p>");
        assert!(editor.undo());
        assert_eq!(editor.html(), "<p>first</p>");
        assert!(editor.selection().is_some());
        assert!(editor.redo());
        assert_eq!(editor.html(), "<p>second</p>");
        assert!(!editor.redo());
    }

    #[test]
    fn test_host_shares_selection() {
        let host = SharedSelection::new();
        let theme = || ThemeMode::Dark;
        let mut editor = PlainEditor::new(host.clone(), theme, EditorConfig::default());
        editor.load("Note", "<p>hello</p>");
        assert_eq!(editor.theme(), ThemeMode::Dark);

        editor.select_text("ell", 0);
        let live = host.read().unwrap();
        assert_eq!(editor.surface().offset_of(live.anchor).unwrap(), 1);
    }

    #[test]
    fn test_repeated_edits_keep_arena_bounded() {
        let mut editor = PlainEditor::from_html("<p>word</p>");
        editor.select_text("word", 0);
        for _ in 0..200 {
            assert!(crate::format::apply_inline_format(
                &mut editor,
                crate::types::FormatKind::Bold
            ));
        }
        assert_eq!(editor.html(), "<p>word</p>");
        assert!(editor.surface().arena_len() < 160);
        assert_eq!(editor.selected_text().as_deref(), Some("word"));
    }

    #[test]
    fn test_selection_change_drives_tracker() {
        let mut editor = PlainEditor::from_html("<p>hello world</p>");
        editor.select_text("world", 0);
        let selection = editor
            .selection()
            .map(|s| s.with_rect(crate::types::Rect::new(200.0, 300.0, 40.0, 16.0)));
        let state = editor.on_selection_change(selection, Viewport::new(1200.0, 900.0));
        assert!(state.is_active());
        assert!(!editor.on_selection_change(None, Viewport::new(1200.0, 900.0)).is_active());
    }
}
