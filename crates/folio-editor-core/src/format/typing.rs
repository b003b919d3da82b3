use crate::document::EditorDocument;
use crate::dom::{Element, Surface, ZERO_WIDTH_ANCHOR, char_to_byte};
use crate::error::{EditorError, Result};
use crate::format::live_range;
use crate::format::marker;
use crate::range::{TextRange, block_at, isolate_text};
use crate::types::{Affinity, Boundary, Selection};

/// Type `text` at the live selection, replacing any selected content.
///
/// A caret held by a marker types into the marker, which then becomes
/// ordinary content carrying the marker's style.
pub fn insert_text<D: EditorDocument + ?Sized>(doc: &mut D, text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let Some(range) = live_range(doc) else {
        return false;
    };
    let snapshot = doc.surface().clone();
    match type_into(doc.surface_mut(), range, text) {
        Ok(caret) => {
            doc.set_selection(Some(Selection::caret(caret)));
            tracing::trace!(target: "folio::format", chars = text.chars().count(), "inserted text");
            doc.content_changed();
            true
        }
        Err(e) => {
            tracing::warn!(target: "folio::format", error = %e, "typing failed, tree restored");
            *doc.surface_mut() = snapshot;
            false
        }
    }
}

fn type_into(surface: &mut Surface, range: TextRange, text: &str) -> Result<Boundary> {
    let mut offset = range.start_offset;
    let caret = if range.is_collapsed() {
        range.start
    } else {
        delete_range(surface, &range)?
    };

    let block = block_at(surface, caret);
    let placeholder = block.is_some_and(|b| {
        surface.is_blank(b)
            && surface
                .descendants(b)
                .iter()
                .any(|n| surface.tag(*n) == Some("br"))
    });

    let held = marker::holding_marker(surface, caret);
    match (held, surface.text(caret.node)) {
        (Some(held), Some(current)) => {
            offset -= current
                .chars()
                .take(caret.offset)
                .filter(|c| *c == ZERO_WIDTH_ANCHOR)
                .count();
            splice(surface, caret, text)?;
            marker::absorb(surface, held)?;
        }
        (None, Some(_)) => splice(surface, caret, text)?,
        _ => insert_node(surface, caret, text)?,
    }

    if placeholder {
        if let Some(block) = block {
            for node in surface.descendants(block) {
                if surface.tag(node) == Some("br") {
                    surface.detach(node);
                }
            }
        }
    }

    surface.normalize(surface.root());
    Ok(surface.boundary_at(offset + text.chars().count(), Affinity::Before))
}

fn splice(surface: &mut Surface, at: Boundary, text: &str) -> Result<()> {
    let current = surface.text(at.node).ok_or(EditorError::WrongKind {
        node: at.node,
        expected: "a text node",
    })?;
    let split = char_to_byte(current, at.offset);
    let updated = format!("{}{}{}", &current[..split], text, &current[split..]);
    surface.set_text(at.node, updated)
}

fn insert_node(surface: &mut Surface, at: Boundary, text: &str) -> Result<()> {
    let (parent, index) = surface.element_position(at)?;
    let node = surface.create_text(text);
    if parent == surface.root() {
        let para = surface.create_element(Element::new("p"));
        surface.append_child(para, node)?;
        surface.insert_child(parent, index, para)
    } else {
        surface.insert_child(parent, index, node)
    }
}

/// Remove the selected text. Blocks emptied along the way are dropped and
/// what is left of the last block joins the first. Returns the element
/// position where the text started.
fn delete_range(surface: &mut Surface, range: &TextRange) -> Result<Boundary> {
    let texts = isolate_text(surface, range.start_offset, range.end_offset)?;
    let Some(&first) = texts.first() else {
        return Ok(range.start);
    };
    let parent = surface.parent(first).ok_or(EditorError::Detached(first))?;
    let index = surface
        .index_in_parent(first)
        .ok_or(EditorError::Detached(first))?;

    let mut blocks = Vec::new();
    for text in texts {
        if let Some(block) = surface.block_of(text) {
            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }
        surface.detach(text);
    }

    if let (Some(&head), Some(&tail)) = (blocks.first(), blocks.last()) {
        if head != tail {
            for block in &blocks[1..blocks.len() - 1] {
                if surface.is_blank(*block) {
                    surface.detach(*block);
                }
            }
            let nested = surface.is_ancestor(head, tail) || surface.is_ancestor(tail, head);
            if !nested {
                surface.move_children(tail, head)?;
                surface.detach(tail);
            }
        }
    }
    Ok(Boundary::new(parent, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainEditor;
    use crate::inspect;

    fn anchor_caret(ed: &mut PlainEditor) {
        let anchor = ed
            .surface()
            .text_segments()
            .into_iter()
            .find(|(id, _, _)| ed.surface().text(*id) == Some("\u{200B}"))
            .map(|(id, _, _)| id)
            .unwrap();
        ed.set_selection(Some(Selection::caret(Boundary::new(anchor, 1))));
    }

    #[test]
    fn test_types_at_caret() {
        let mut ed = PlainEditor::from_html("<p>hello</p>");
        ed.caret_to_end();
        assert!(insert_text(&mut ed, " world"));
        assert_eq!(ed.html(), "<p>hello world</p>");
        let caret = ed.selection().unwrap();
        assert_eq!(ed.surface().offset_of(caret.focus).unwrap(), 11);
    }

    #[test]
    fn test_replaces_selection() {
        let mut ed = PlainEditor::from_html("<p>one two three</p>");
        ed.select_text("two", 0);
        assert!(insert_text(&mut ed, "2"));
        assert_eq!(ed.html(), "<p>one 2 three</p>");
    }

    #[test]
    fn test_replacing_across_blocks_joins_them() {
        let mut ed = PlainEditor::from_html("<p>abc</p><p>def</p>");
        ed.select_offsets(2, 4);
        assert!(insert_text(&mut ed, "X"));
        assert_eq!(ed.html(), "<p>abXef</p>");
    }

    #[test]
    fn test_pending_marker_carries_style() {
        let mut ed = PlainEditor::from_html(
            r#"<p>ab<span data-format-marker="pending" style="background-color: #fef3c7; color: #111827">&#8203;</span>cd</p>"#,
        );
        anchor_caret(&mut ed);
        assert!(insert_text(&mut ed, "X"));
        assert!(insert_text(&mut ed, "Y"));
        assert_eq!(
            ed.html(),
            r#"<p>ab<span style="background-color: #fef3c7; color: #111827">XY</span>cd</p>"#
        );
        assert!(!ed.surface().text_content(ed.surface().root()).contains('\u{200B}'));
        assert_eq!(
            inspect::active_highlight_color(&ed),
            Some(crate::palette::HighlightColor::Yellow)
        );
    }

    #[test]
    fn test_stale_marker_swept_elsewhere() {
        let mut ed = PlainEditor::from_html(
            r#"<p>ab<span data-format-marker="break">&#8203;</span>cd</p>"#,
        );
        ed.caret_to_end();
        assert!(insert_text(&mut ed, "!"));
        assert_eq!(ed.html(), "<p>abcd!</p>");
        assert_eq!(ed.surface().text_segments().len(), 1);
    }

    #[test]
    fn test_typing_into_empty_surface() {
        let mut ed = PlainEditor::from_html("");
        ed.caret_to_end();
        assert!(insert_text(&mut ed, "hi"));
        assert_eq!(ed.html(), "<p>hi</p>");
    }

    #[test]
    fn test_empty_input_is_noop() {
        let mut ed = PlainEditor::from_html("<p>x</p>");
        ed.caret_to_end();
        assert!(!insert_text(&mut ed, ""));
    }
}
