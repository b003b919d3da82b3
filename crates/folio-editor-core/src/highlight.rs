//! Highlight Engine: background colours from the theme's palette.
//!
//! Applying a colour replaces whatever background the selection had, so at
//! most one highlight is ever active on a piece of text. Applying the
//! colour that is already active removes it, and the text falls back to
//! the page's own foreground.

use crate::document::EditorDocument;
use crate::dom::{Element, MARKER_ATTR, NodeId, Surface};
use crate::error::{EditorError, Result};
use crate::format::live_range;
use crate::format::marker::{self, MarkerKind};
use crate::inspect::{self, element_highlight, has_background};
use crate::palette::{HighlightColor, highlight_foreground};
use crate::range::{TextRange, demote_or_unwrap, inline_ancestor, isolate_text, peel, unwrap_if_bare_span};
use crate::style::InlineStyle;
use crate::types::{Affinity, Boundary, Selection, ThemeMode};

/// Inline style of a highlight span under `theme`.
pub fn highlight_style(color: HighlightColor, theme: ThemeMode) -> InlineStyle {
    InlineStyle::new()
        .with("background-color", color.hex(theme))
        .with("color", highlight_foreground(theme))
}

/// Toggle `color` on the live selection.
///
/// A collapsed caret gets a pending marker that styles the next typed
/// text, or a format break when the caret sits inside that colour already.
pub fn apply_highlight<D: EditorDocument + ?Sized>(doc: &mut D, color: HighlightColor) -> bool {
    let Some(range) = live_range(doc) else {
        return false;
    };
    let theme = doc.theme();
    let remove = inspect::highlight_in(doc.surface(), &range) == Some(color);
    let snapshot = doc.surface().clone();

    let result = if range.is_collapsed() {
        highlight_caret(doc.surface_mut(), range, color, theme, remove)
    } else {
        highlight_range(doc.surface_mut(), range, color, theme, remove)
    };
    match result {
        Ok(selection) => {
            doc.set_selection(Some(selection));
            tracing::debug!(target: "folio::highlight", %color, %theme, remove, "applied highlight");
            doc.content_changed();
            true
        }
        Err(e) => {
            tracing::warn!(target: "folio::highlight", %color, error = %e, "highlight failed, tree restored");
            *doc.surface_mut() = snapshot;
            false
        }
    }
}

fn highlight_range(
    surface: &mut Surface,
    range: TextRange,
    color: HighlightColor,
    theme: ThemeMode,
    remove: bool,
) -> Result<Selection> {
    let texts = isolate_text(surface, range.start_offset, range.end_offset)?;
    for text in &texts {
        lower_block_backgrounds(surface, *text)?;
    }
    for text in texts {
        if surface.visible_text(text).is_empty() {
            continue;
        }
        strip_background(surface, text)?;
        if !remove {
            surface.wrap(text, Element::new("span").with_style(highlight_style(color, theme)))?;
        }
    }
    surface.normalize(surface.root());
    Ok(TextRange::from_offsets(surface, range.start_offset, range.end_offset).to_selection())
}

/// Move the backgrounds of blocks around `node` (itself included) onto
/// spans over their inline content, outermost block first, so the inline
/// peeling can split and remove them. Returns whether anything moved.
fn lower_block_backgrounds(surface: &mut Surface, node: NodeId) -> Result<bool> {
    let root = surface.root();
    let mut blocks: Vec<NodeId> = std::iter::once(node)
        .chain(surface.ancestors(node))
        .take_while(|n| *n != root)
        .filter(|n| surface.element(*n).is_some_and(Element::is_block))
        .collect();
    blocks.reverse();

    let mut lowered = false;
    for block in blocks {
        if surface.element(block).is_some_and(has_background) {
            lower_background(surface, block)?;
            lowered = true;
        }
    }
    Ok(lowered)
}

fn lower_background(surface: &mut Surface, block: NodeId) -> Result<()> {
    let Some(el) = surface.element_mut(block) else {
        return Ok(());
    };
    let paired = element_highlight(el).is_some();
    let mut paint = InlineStyle::new();
    for (name, value) in el.style.iter() {
        let carried = name == "background-color"
            || name == "background"
            || (paired && name == "color");
        if carried {
            paint.set(name, value);
        }
    }
    for (name, _) in paint.iter() {
        el.style.remove(name);
    }
    tracing::trace!(target: "folio::highlight", %block, paint = %paint.to_css(), "lowered block background");

    let mut run: Option<NodeId> = None;
    for child in surface.children(block).to_vec() {
        let nested = surface.element(child).is_some_and(Element::is_block);
        if !nested {
            match run {
                Some(span) => surface.append_child(span, child)?,
                None => {
                    let span = Element::new("span").with_style(paint.clone());
                    run = Some(surface.wrap(child, span)?);
                }
            }
            continue;
        }
        run = None;
        if surface.element(child).is_some_and(|inner| !has_background(inner)) {
            if let Some(inner) = surface.element_mut(child) {
                for (name, value) in paint.iter() {
                    inner.style.set(name, value);
                }
            }
            lower_background(surface, child)?;
        }
    }
    Ok(())
}

/// Lift `text` out of every inline ancestor painting a background. The
/// peeled copies lose the background, and the paired foreground when the
/// background was one of ours.
fn strip_background(surface: &mut Surface, text: NodeId) -> Result<()> {
    while let Some(owner) = inline_ancestor(surface, text, has_background) {
        let copy = peel(surface, owner, text)?;
        let is_mark = match surface.element_mut(copy) {
            Some(el) => {
                if element_highlight(el).is_some() {
                    el.style.remove("color");
                }
                el.style.remove("background-color");
                el.style.remove("background");
                el.tag == "mark"
            }
            None => false,
        };
        if is_mark {
            demote_or_unwrap(surface, copy)?;
        } else {
            unwrap_if_bare_span(surface, copy)?;
        }
    }
    Ok(())
}

fn highlight_caret(
    surface: &mut Surface,
    range: TextRange,
    color: HighlightColor,
    theme: ThemeMode,
    remove: bool,
) -> Result<Selection> {
    let mut at = range.start;

    if let Some(held) = marker::holding_marker(surface, at) {
        if !remove {
            if let Some(el) = surface.element_mut(held) {
                el.style = highlight_style(color, theme);
                el.set_attr(MARKER_ATTR, MarkerKind::Pending.as_str());
            }
            tracing::trace!(target: "folio::highlight", %color, "restyled caret marker");
            return Ok(Selection::caret(at));
        }
        let own = surface
            .element(held)
            .and_then(element_highlight)
            .is_some_and(|c| c == color);
        let parent = surface.parent(held).ok_or(EditorError::Detached(held))?;
        let index = surface.index_in_parent(held).ok_or(EditorError::Detached(held))?;
        surface.detach(held);
        if own {
            let offset = surface.offset_of(Boundary::new(parent, index))?;
            surface.normalize(surface.root());
            return Ok(Selection::caret(surface.boundary_at(offset, Affinity::Before)));
        }
        at = Boundary::new(parent, index);
    }

    let at = lower_at_caret(surface, at)?;
    let (node, index) = surface.element_position(at)?;
    let (parent, index) = match outermost_at(surface, node, has_background) {
        Some(outer) => {
            surface.split_at(outer, Boundary::new(node, index))?;
            let parent = surface.parent(outer).ok_or(EditorError::Detached(outer))?;
            let at = surface.index_in_parent(outer).ok_or(EditorError::Detached(outer))?;
            (parent, at + 1)
        }
        None => (node, index),
    };

    let (kind, style) = if remove {
        (MarkerKind::Break, InlineStyle::new())
    } else {
        (MarkerKind::Pending, highlight_style(color, theme))
    };
    let caret = marker::insert_marker(surface, parent, index, kind, style)?;
    surface.normalize(parent);
    Ok(Selection::caret(caret))
}

/// Lower block backgrounds around a caret, keeping the caret next to the
/// same child when it sat between an element's children.
fn lower_at_caret(surface: &mut Surface, at: Boundary) -> Result<Boundary> {
    let neighbour = if surface.is_text(at.node) {
        None
    } else {
        let kids = surface.children(at.node);
        kids.get(at.offset).map(|n| (*n, 0)).or_else(|| {
            at.offset
                .checked_sub(1)
                .and_then(|i| kids.get(i))
                .map(|n| (*n, 1))
        })
    };
    if !lower_block_backgrounds(surface, at.node)? {
        return Ok(at);
    }
    match neighbour {
        Some((node, shift)) => {
            let parent = surface.parent(node).ok_or(EditorError::Detached(node))?;
            let index = surface.index_in_parent(node).ok_or(EditorError::Detached(node))?;
            Ok(Boundary::new(parent, index + shift))
        }
        None => Ok(at),
    }
}

/// Outermost inline element accepted by `pred` among `node` and its
/// ancestors, stopping at the first block.
fn outermost_at(surface: &Surface, node: NodeId, pred: fn(&Element) -> bool) -> Option<NodeId> {
    let root = surface.root();
    std::iter::once(node)
        .chain(surface.ancestors(node))
        .take_while(|n| *n != root && surface.element(*n).is_some_and(|el| !el.is_block()))
        .filter(|n| surface.element(*n).is_some_and(pred))
        .last()
}
