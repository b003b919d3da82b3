use crate::document::EditorDocument;
use crate::dom::{Element, NodeId, Surface};
use crate::error::{EditorError, Result};
use crate::format::live_range;
use crate::format::marker::{self, MarkerKind};
use crate::range::{TextRange, block_at, inline_ancestor, isolate_text, peel, wrap_stray_inline};
use crate::style::InlineStyle;
use crate::types::{Affinity, Boundary, Selection};

/// Reset the selection to plain paragraph text.
///
/// A range loses every inline wrapper (marks, colours, highlights, links)
/// and its blocks become bare paragraphs. At a collapsed caret the block is
/// converted and a format break is placed at the caret, so the next typed
/// character starts outside whatever the caret was sitting in.
pub fn clear_formatting<D: EditorDocument + ?Sized>(doc: &mut D) -> bool {
    let Some(range) = live_range(doc) else {
        return false;
    };
    let collapsed = range.is_collapsed();
    let snapshot = doc.surface().clone();
    let result = if collapsed {
        break_at_caret(doc.surface_mut(), range)
    } else {
        clear_range(doc.surface_mut(), range)
    };
    match result {
        Ok(selection) => {
            doc.set_selection(Some(selection));
            tracing::debug!(target: "folio::format", collapsed, "cleared formatting");
            doc.content_changed();
            true
        }
        Err(e) => {
            tracing::warn!(target: "folio::format", error = %e, "clear formatting failed, tree restored");
            *doc.surface_mut() = snapshot;
            false
        }
    }
}

fn clear_range(surface: &mut Surface, range: TextRange) -> Result<Selection> {
    wrap_stray_inline(surface)?;
    let texts = isolate_text(surface, range.start_offset, range.end_offset)?;

    let mut blocks: Vec<NodeId> = Vec::new();
    for text in &texts {
        while let Some(owner) = inline_ancestor(surface, *text, |_| true) {
            let copy = peel(surface, owner, *text)?;
            surface.unwrap(copy)?;
        }
        if let Some(block) = surface.block_of(*text) {
            if !blocks.contains(&block) {
                blocks.push(block);
            }
        }
    }
    for block in blocks {
        to_paragraph(surface, block)?;
    }
    surface.normalize(surface.root());

    Ok(TextRange::from_offsets(surface, range.start_offset, range.end_offset).to_selection())
}

fn break_at_caret(surface: &mut Surface, range: TextRange) -> Result<Selection> {
    let mut caret = if wrap_stray_inline(surface)? {
        surface.boundary_at(range.start_offset, Affinity::Before)
    } else {
        range.start
    };

    // A marker already holding the caret gives way to the new break.
    if let Some(held) = marker::holding_marker(surface, caret) {
        let parent = surface.parent(held).ok_or(EditorError::Detached(held))?;
        let index = surface.index_in_parent(held).ok_or(EditorError::Detached(held))?;
        surface.detach(held);
        caret = Boundary::new(parent, index);
    }

    let block = block_at(surface, caret)
        .ok_or_else(|| EditorError::InvalidRange(format!("no block around {}", caret.node)))?;
    if let Some(para) = to_paragraph(surface, block)? {
        if caret.node == block {
            caret.node = para;
        }
    }

    let (node, index) = surface.element_position(caret)?;
    let root = surface.root();
    let outer = std::iter::once(node)
        .chain(surface.ancestors(node))
        .take_while(|n| *n != root && surface.element(*n).is_some_and(|el| !el.is_block()))
        .last();
    let (parent, index) = match outer {
        Some(outer) => {
            surface.split_at(outer, Boundary::new(node, index))?;
            let parent = surface.parent(outer).ok_or(EditorError::Detached(outer))?;
            let at = surface.index_in_parent(outer).ok_or(EditorError::Detached(outer))?;
            (parent, at + 1)
        }
        None => (node, index),
    };

    let caret = marker::insert_marker(surface, parent, index, MarkerKind::Break, InlineStyle::new())?;
    surface.normalize(parent);
    Ok(Selection::caret(caret))
}

/// Replace a heading, paragraph or leaf div with a bare `<p>`. Returns the
/// new paragraph, or `None` if the block was left as it is.
fn to_paragraph(surface: &mut Surface, block: NodeId) -> Result<Option<NodeId>> {
    let convertible = surface
        .element(block)
        .is_some_and(|el| el.is_heading() || el.tag == "p" || el.tag == "div");
    let has_blocks = surface
        .children(block)
        .iter()
        .any(|c| surface.element(*c).is_some_and(Element::is_block));
    if !convertible || has_blocks {
        return Ok(None);
    }
    if surface.element(block).is_some_and(|el| el.tag == "p" && el.is_bare()) {
        return Ok(Some(block));
    }
    let para = surface.create_element(Element::new("p"));
    surface.move_children(block, para)?;
    surface.replace(block, para)?;
    Ok(Some(para))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainEditor;
    use crate::dom::ZERO_WIDTH_ANCHOR;
    use crate::format::insert_text;
    use crate::inspect;
    use crate::types::FormatKind;

    #[test]
    fn test_clears_marks_and_heading() {
        let mut ed = PlainEditor::from_html(
            r#"<h2><b>Big</b> <span style="background-color: #fef3c7; color: #111827">deal</span></h2>"#,
        );
        ed.select_text("Big deal", 0);
        assert!(clear_formatting(&mut ed));
        assert_eq!(ed.html(), "<p>Big deal</p>");
        assert_eq!(ed.selected_text().as_deref(), Some("Big deal"));
        let state = inspect::format_state(&ed);
        assert!(!state.bold);
        assert!(state.heading.is_none());
        assert!(state.highlight.is_none());
    }

    #[test]
    fn test_partial_range_splits_wrapper() {
        let mut ed = PlainEditor::from_html("<p><b>bold text</b></p>");
        ed.select_text("text", 0);
        assert!(clear_formatting(&mut ed));
        assert_eq!(ed.html(), "<p><b>bold </b>text</p>");
    }

    #[test]
    fn test_links_are_removed() {
        let mut ed = PlainEditor::from_html(r#"<p>see <a href="https://example.com">here</a></p>"#);
        ed.select_text("here", 0);
        assert!(clear_formatting(&mut ed));
        assert_eq!(ed.html(), "<p>see here</p>");
    }

    #[test]
    fn test_collapsed_inserts_format_break() {
        let mut ed = PlainEditor::from_html("<h1><i>slanted words</i></h1>");
        ed.select_offsets(8, 8);
        assert!(clear_formatting(&mut ed));

        // The block is a paragraph and the marker stays out of the export.
        assert_eq!(ed.html(), "<p><i>slanted </i><i>words</i></p>");
        let text = ed.surface().text_content(ed.surface().root());
        assert_eq!(text.chars().filter(|c| *c == ZERO_WIDTH_ANCHOR).count(), 1);
        assert!(!inspect::is_format_active(&ed, FormatKind::Italic));

        assert!(insert_text(&mut ed, "X"));
        assert_eq!(ed.html(), "<p><i>slanted </i>X<i>words</i></p>");
    }

    #[test]
    fn test_collapsed_in_empty_paragraph() {
        let mut ed = PlainEditor::from_html("<p><br></p>");
        let para = ed.surface().children(ed.surface().root())[0];
        ed.set_selection(Some(Selection::caret(Boundary::new(para, 0))));
        assert!(clear_formatting(&mut ed));
        assert_eq!(ed.html(), "<p><br></p>");
        assert!(insert_text(&mut ed, "a"));
        assert_eq!(ed.html(), "<p>a</p>");
    }

    #[test]
    fn test_no_selection_is_noop() {
        let mut ed = PlainEditor::from_html("<p><b>x</b></p>");
        assert!(!clear_formatting(&mut ed));
        assert_eq!(ed.html(), "<p><b>x</b></p>");
    }
}
