use crate::document::EditorDocument;
use crate::dom::{Element, NodeId, Surface};
use crate::error::{EditorError, Result};
use crate::format::live_range;
use crate::inspect;
use crate::range::{TextRange, block_at, isolate_text, wrap_stray_inline};
use crate::sanitize::sanitize;
use crate::style::InlineStyle;
use crate::types::{Boundary, FormatKind, HeadingLevel, Selection};

/// Heading element with its level's presentation.
pub fn heading_element(level: HeadingLevel) -> Element {
    let style = InlineStyle::new()
        .with("font-size", level.font_size())
        .with("font-weight", "bold")
        .with("line-height", "1.2")
        .with("margin", "1em 0 0.5em 0")
        .with("display", "block");
    Element::new(level.tag()).with_style(style)
}

/// Turn the blocks under the selection into one heading of `level`, or
/// back into a paragraph when that level is already active there.
///
/// The caret ends up right after the new block: at the start of the
/// following content, or in a fresh empty paragraph when nothing follows.
/// If the structural rewrite fails, the selected text is re-wrapped in a
/// plain heading instead. If that fails too, the tree is left untouched.
pub fn apply_heading<D: EditorDocument + ?Sized>(doc: &mut D, level: HeadingLevel) -> bool {
    let kind = FormatKind::Heading(level);
    let Some(range) = live_range(doc) else {
        return false;
    };
    let revert = inspect::format_active_in(doc.surface(), &range, kind);
    let snapshot = doc.surface().clone();

    let caret = match convert_blocks(doc.surface_mut(), range, level, revert) {
        Ok(caret) => caret,
        Err(e) => {
            tracing::warn!(target: "folio::format", %kind, error = %e, "heading rewrite failed, falling back");
            *doc.surface_mut() = snapshot.clone();
            match rewrap_text(doc.surface_mut(), &range, level, revert) {
                Ok(caret) => caret,
                Err(e) => {
                    tracing::warn!(target: "folio::format", %kind, error = %e, "heading fallback failed, abandoned");
                    *doc.surface_mut() = snapshot;
                    return false;
                }
            }
        }
    };

    sanitize(doc.surface_mut());
    let caret = if doc.surface().contains(caret.node) {
        caret
    } else {
        crate::document::end_caret(doc.surface())
    };
    doc.set_selection(Some(Selection::caret(caret)));
    tracing::debug!(target: "folio::format", %kind, revert, "applied heading");
    doc.content_changed();
    true
}

fn convert_blocks(
    surface: &mut Surface,
    range: TextRange,
    level: HeadingLevel,
    revert: bool,
) -> Result<Boundary> {
    let range = if wrap_stray_inline(surface)? {
        TextRange::from_offsets(surface, range.start_offset, range.end_offset)
    } else {
        range
    };

    let first = block_at(surface, range.start).ok_or_else(|| no_block(range.start))?;
    let last = block_at(surface, range.end).ok_or_else(|| no_block(range.end))?;

    let (start, end) = if range.is_collapsed() {
        (
            Boundary::new(first, 0),
            Boundary::new(first, surface.children(first).len()),
        )
    } else {
        (range.start, range.end)
    };
    let last = if range.is_collapsed() { first } else { last };

    let (top_start, top_end) = top_blocks(surface, first, last)?;

    // Split at the end first so the start boundary stays valid.
    let after = surface.split_at(top_end, end)?;
    let selected_first = surface.split_at(top_start, start)?;
    let before = top_start;

    let mut selected = vec![selected_first];
    if selected_first != top_end && top_start != top_end {
        let parent = surface.parent(selected_first).ok_or(EditorError::Detached(selected_first))?;
        let from = surface
            .index_in_parent(selected_first)
            .ok_or(EditorError::Detached(selected_first))?;
        let to = surface
            .index_in_parent(top_end)
            .ok_or(EditorError::Detached(top_end))?;
        if to < from {
            return Err(EditorError::InvalidRange("selection ends before it starts".into()));
        }
        selected = surface.children(parent)[from..=to].to_vec();
    }

    let element = if revert {
        Element::new("p")
    } else {
        heading_element(level)
    };
    let block = surface.create_element(element);
    surface.insert_before(selected[0], block)?;
    for node in &selected {
        flatten_into(surface, *node, block)?;
        surface.detach(*node);
    }
    trim_trailing_breaks(surface, block);

    if surface.is_blank(before) {
        surface.detach(before);
    }

    let parent = surface.parent(block).ok_or(EditorError::Detached(block))?;
    let caret = if surface.is_blank(after) {
        surface.detach(after);
        if revert {
            None
        } else {
            let cont = surface.create_element(Element::new("p"));
            let br = surface.create_element(Element::new("br"));
            surface.append_child(cont, br)?;
            surface.insert_after(block, cont)?;
            Some(Boundary::new(cont, 0))
        }
    } else if revert {
        None
    } else {
        Some(Boundary::new(after, 0))
    };

    surface.normalize(parent);
    Ok(caret.unwrap_or_else(|| Boundary::new(block, surface.children(block).len())))
}

fn no_block(at: Boundary) -> EditorError {
    EditorError::InvalidRange(format!("no block around {}", at.node))
}

/// The children of the blocks' common container that hold `first` and
/// `last`. If one block contains the other, the outer one is used.
fn top_blocks(surface: &Surface, first: NodeId, last: NodeId) -> Result<(NodeId, NodeId)> {
    if first == last || surface.is_ancestor(first, last) {
        return Ok((first, first));
    }
    if surface.is_ancestor(last, first) {
        return Ok((last, last));
    }
    let common = surface
        .common_ancestor(first, last)
        .ok_or_else(|| EditorError::InvalidRange("blocks share no ancestor".into()))?;
    let below = |node: NodeId| {
        std::iter::once(node)
            .chain(surface.ancestors(node))
            .find(|n| surface.parent(*n) == Some(common))
            .ok_or(EditorError::NotInside {
                node,
                ancestor: common,
            })
    };
    Ok((below(first)?, below(last)?))
}

/// Move the inline content of `node` into `target`, dissolving any block
/// structure (including old headings) on the way.
fn flatten_into(surface: &mut Surface, node: NodeId, target: NodeId) -> Result<()> {
    let is_block = surface.element(node).is_some_and(Element::is_block);
    if !is_block {
        return surface.append_child(target, node);
    }
    for child in surface.children(node).to_vec() {
        flatten_into(surface, child, target)?;
    }
    Ok(())
}

fn trim_trailing_breaks(surface: &mut Surface, block: NodeId) {
    while let Some(&last) = surface.children(block).last() {
        if surface.tag(last) != Some("br") {
            break;
        }
        surface.detach(last);
    }
}

/// Fallback: pull the selected text out and insert it as a plain heading
/// (or paragraph) after the block where the selection started.
fn rewrap_text(
    surface: &mut Surface,
    range: &TextRange,
    level: HeadingLevel,
    revert: bool,
) -> Result<Boundary> {
    let (start, end) = if range.is_collapsed() {
        let block = block_at(surface, range.start).ok_or_else(|| no_block(range.start))?;
        let start = surface.offset_of(Boundary::new(block, 0))?;
        (start, start + surface.text_len(block))
    } else {
        (range.start_offset, range.end_offset)
    };

    let texts = isolate_text(surface, start, end)?;
    let first = *texts
        .first()
        .ok_or_else(|| EditorError::InvalidRange("no text selected".into()))?;
    let anchor = block_at(surface, Boundary::new(first, 0)).unwrap_or(first);
    let content: String = texts.iter().filter_map(|t| surface.text(*t)).collect();

    let element = if revert {
        Element::new("p")
    } else {
        Element::new(level.tag())
    };
    let block = surface.create_element(element);
    let text = surface.create_text(&content);
    surface.append_child(block, text)?;
    surface.insert_after(anchor, block)?;
    for t in texts {
        surface.detach(t);
    }

    let parent = surface.parent(block).ok_or(EditorError::Detached(block))?;
    if surface.is_blank(anchor) && anchor != block {
        surface.detach(anchor);
    }
    let index = surface.index_in_parent(block).ok_or(EditorError::Detached(block))?;
    Ok(Boundary::new(parent, index + 1))
}
