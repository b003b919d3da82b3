//! Action execution for editor documents.
//!
//! This module provides the `execute_action` function that applies
//! `EditorAction` operations to any type implementing `EditorDocument`.
//! The logic is generic and platform-agnostic.

use crate::actions::{EditorAction, KeyCombo, KeybindingConfig, KeydownResult};
use crate::document::EditorDocument;
use crate::format::{apply_heading, apply_inline_format, clear_formatting, insert_text};
use crate::highlight::apply_highlight;
use crate::types::FormatKind;

/// Execute an editor action on a document.
///
/// This is the central dispatch point for all editor operations.
/// Returns true if the action was handled and the document was modified.
pub fn execute_action<D: EditorDocument + ?Sized>(doc: &mut D, action: &EditorAction) -> bool {
    match action {
        EditorAction::ToggleBold => apply_inline_format(doc, FormatKind::Bold),
        EditorAction::ToggleItalic => apply_inline_format(doc, FormatKind::Italic),
        EditorAction::Heading(level) => apply_heading(doc, *level),
        EditorAction::Highlight(color) => apply_highlight(doc, *color),
        EditorAction::ClearFormatting => clear_formatting(doc),
        EditorAction::InsertText(text) => insert_text(doc, text),
        EditorAction::Undo => doc.undo(),
        EditorAction::Redo => doc.redo(),
        EditorAction::Save => {
            // Persistence is handled by the host.
            false
        }
    }
}

/// Handle a keydown event using the keybinding configuration.
///
/// This handles keyboard shortcuts only. Text input is delivered through
/// `EditorAction::InsertText`; navigation is passed through to the host.
pub fn handle_keydown<D: EditorDocument + ?Sized>(
    doc: &mut D,
    config: &KeybindingConfig,
    combo: &KeyCombo,
) -> KeydownResult {
    if let Some(action) = config.lookup(combo) {
        if action == EditorAction::Save {
            // Let the host's own save handler see the event.
            return KeydownResult::NotHandled;
        }
        let changed = execute_action(doc, &action);
        tracing::trace!(target: "folio::format", %action, changed, "keybinding");
        return KeydownResult::Handled;
    }

    if combo.key.is_navigation() || combo.key.is_modifier() {
        return KeydownResult::PassThrough;
    }

    KeydownResult::NotHandled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Key, Modifiers};
    use crate::document::PlainEditor;
    use crate::palette::HighlightColor;
    use crate::types::HeadingLevel;

    #[test]
    fn test_dispatch_formats() {
        let mut ed = PlainEditor::from_html("<p>word</p>");
        ed.select_text("word", 0);
        assert!(execute_action(&mut ed, &EditorAction::ToggleItalic));
        assert_eq!(ed.html(), "<p><i>word</i></p>");
        assert!(execute_action(&mut ed, &EditorAction::ClearFormatting));
        assert_eq!(ed.html(), "<p>word</p>");
    }

    #[test]
    fn test_save_is_left_to_host() {
        let mut ed = PlainEditor::from_html("<p>word</p>");
        assert!(!execute_action(&mut ed, &EditorAction::Save));
        let config = KeybindingConfig::default();
        let ctrl_s = KeyCombo::primary(Key::character("s"), false);
        assert_eq!(handle_keydown(&mut ed, &config, &ctrl_s), KeydownResult::NotHandled);
    }

    #[test]
    fn test_keydown_runs_binding() {
        let mut ed = PlainEditor::from_html("<p>title</p>");
        ed.select_text("title", 0);
        let config = KeybindingConfig::default_for_platform(true);
        let combo = KeyCombo::with_modifiers(
            Key::character("1"),
            Modifiers {
                meta: true,
                alt: true,
                ..Modifiers::NONE
            },
        );
        assert_eq!(handle_keydown(&mut ed, &config, &combo), KeydownResult::Handled);
        assert!(crate::inspect::format_state(&ed).heading.is_none());
        assert!(ed.html().starts_with("<h1 "));
    }

    #[test]
    fn test_keydown_passes_navigation() {
        let mut ed = PlainEditor::from_html("<p>x</p>");
        let config = KeybindingConfig::default();
        assert_eq!(
            handle_keydown(&mut ed, &config, &KeyCombo::new(Key::ArrowLeft)),
            KeydownResult::PassThrough
        );
        assert_eq!(
            handle_keydown(&mut ed, &config, &KeyCombo::new(Key::character("q"))),
            KeydownResult::NotHandled
        );
    }

    #[test]
    fn test_undo_through_actions() {
        let mut ed = PlainEditor::from_html("<p>word</p>");
        ed.select_text("word", 0);
        assert!(execute_action(&mut ed, &EditorAction::Highlight(HighlightColor::Green)));
        assert!(execute_action(&mut ed, &EditorAction::Undo));
        assert_eq!(ed.html(), "<p>word</p>");
        assert!(execute_action(&mut ed, &EditorAction::Redo));
        assert!(ed.html().contains("#d1fae5"));
    }

    #[test]
    fn test_typing_action() {
        let mut ed = PlainEditor::from_html("<p>ab</p>");
        ed.caret_to_end();
        assert!(execute_action(&mut ed, &EditorAction::InsertText("c".into())));
        assert!(execute_action(&mut ed, &EditorAction::Heading(HeadingLevel::H2)));
        assert!(ed.html().contains(">abc</h2>"));
    }
}
