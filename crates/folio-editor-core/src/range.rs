//! Ordered ranges over the surface and the helpers the engines share.
//!
//! A [`Selection`] keeps anchor and focus as the user made them. Engines
//! work on a [`TextRange`]: the two boundaries in document order plus their
//! global char offsets, which survive the splitting and merging that
//! formatting does to the tree.

use crate::dom::{Element, NodeId, Surface};
use crate::error::{EditorError, Result};
use crate::types::{Affinity, Boundary, Selection};

/// A selection resolved against the tree, start before end.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: Boundary,
    pub end: Boundary,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl TextRange {
    /// Order a selection's boundaries. Fails if either is detached from
    /// this surface or out of bounds.
    pub fn resolve(surface: &Surface, selection: &Selection) -> Result<Self> {
        let anchor = surface.offset_of(selection.anchor)?;
        let focus = surface.offset_of(selection.focus)?;
        let range = if focus < anchor {
            Self {
                start: selection.focus,
                end: selection.anchor,
                start_offset: focus,
                end_offset: anchor,
            }
        } else {
            Self {
                start: selection.anchor,
                end: selection.focus,
                start_offset: anchor,
                end_offset: focus,
            }
        };
        Ok(range)
    }

    /// Rebuild boundaries from offsets after the tree changed under them.
    pub fn from_offsets(surface: &Surface, start_offset: usize, end_offset: usize) -> Self {
        if start_offset == end_offset {
            let caret = surface.boundary_at(start_offset, Affinity::Before);
            return Self {
                start: caret,
                end: caret,
                start_offset,
                end_offset,
            };
        }
        Self {
            start: surface.boundary_at(start_offset, Affinity::After),
            end: surface.boundary_at(end_offset, Affinity::Before),
            start_offset,
            end_offset,
        }
    }

    /// No characters selected.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end || self.start_offset == self.end_offset
    }

    pub fn to_selection(&self) -> Selection {
        Selection::new(self.start, self.end)
    }
}

/// Split text nodes so that `[start, end)` is covered by whole text nodes,
/// and return those nodes in document order.
pub fn isolate_text(surface: &mut Surface, start: usize, end: usize) -> Result<Vec<NodeId>> {
    let mut out = Vec::new();
    if start >= end {
        return Ok(out);
    }
    for (id, seg_start, len) in surface.text_segments() {
        let seg_end = seg_start + len;
        if seg_end <= start || seg_start >= end {
            continue;
        }
        if end < seg_end {
            surface.split_text(id, end - seg_start)?;
        }
        let node = if start > seg_start {
            surface.split_text(id, start - seg_start)?
        } else {
            id
        };
        out.push(node);
    }
    Ok(out)
}

/// Text nodes overlapping `[start, end)`, without touching the tree.
pub fn intersected_text(surface: &Surface, start: usize, end: usize) -> Vec<NodeId> {
    surface
        .text_segments()
        .into_iter()
        .filter(|(_, seg_start, len)| *seg_start < end && seg_start + len > start)
        .map(|(id, _, _)| id)
        .collect()
}

/// Elements below the root that contain any text overlapping the range,
/// in document order.
pub fn intersected_elements(surface: &Surface, start: usize, end: usize) -> Vec<NodeId> {
    let texts = intersected_text(surface, start, end);
    surface
        .descendants(surface.root())
        .into_iter()
        .filter(|n| surface.element(*n).is_some())
        .filter(|n| texts.iter().any(|t| surface.is_ancestor(*n, *t)))
        .collect()
}

/// Innermost ancestor of `node` (excluding `node`) accepted by `pred`,
/// searching below the node's block only.
pub fn inline_ancestor(
    surface: &Surface,
    node: NodeId,
    mut pred: impl FnMut(&Element) -> bool,
) -> Option<NodeId> {
    let root = surface.root();
    surface
        .ancestors(node)
        .take_while(|a| *a != root && surface.element(*a).is_some_and(|el| !el.is_block()))
        .find(|a| surface.element(*a).is_some_and(&mut pred))
}

/// Outermost inline ancestor accepted by `pred`, below the node's block.
pub fn outermost_inline_ancestor(
    surface: &Surface,
    node: NodeId,
    mut pred: impl FnMut(&Element) -> bool,
) -> Option<NodeId> {
    let root = surface.root();
    surface
        .ancestors(node)
        .take_while(|a| *a != root && surface.element(*a).is_some_and(|el| !el.is_block()))
        .filter(|a| surface.element(*a).is_some_and(&mut pred))
        .last()
}

/// Split `ancestor` around `node` so that `node` ends up alone inside a
/// copy of it. The copy is returned; the parts before and after keep their
/// content and may be left empty for normalization to drop.
pub fn peel(surface: &mut Surface, ancestor: NodeId, node: NodeId) -> Result<NodeId> {
    if !surface.is_ancestor(ancestor, node) {
        return Err(EditorError::NotInside { node, ancestor });
    }
    let parent = surface.parent(node).ok_or(EditorError::Detached(node))?;
    let index = surface
        .index_in_parent(node)
        .ok_or(EditorError::Detached(node))?;
    surface.split_at(ancestor, Boundary::new(parent, index + 1))?;

    let parent = surface.parent(node).ok_or(EditorError::Detached(node))?;
    let index = surface
        .index_in_parent(node)
        .ok_or(EditorError::Detached(node))?;
    surface.split_at(ancestor, Boundary::new(parent, index))
}

/// Strip the tag semantics from an element: it becomes a span with the
/// same attributes and style, or disappears if nothing is left.
pub fn demote_or_unwrap(surface: &mut Surface, id: NodeId) -> Result<()> {
    let bare = match surface.element_mut(id) {
        Some(el) => {
            el.tag = "span".into();
            el.is_bare()
        }
        None => {
            return Err(EditorError::WrongKind {
                node: id,
                expected: "an element",
            });
        }
    };
    if bare {
        surface.unwrap(id)?;
    }
    Ok(())
}

/// Unwrap a span once it carries nothing.
pub fn unwrap_if_bare_span(surface: &mut Surface, id: NodeId) -> Result<()> {
    if surface
        .element(id)
        .is_some_and(|el| el.tag == "span" && el.is_bare())
    {
        surface.unwrap(id)?;
    }
    Ok(())
}

/// Group runs of inline content sitting directly under the root into
/// paragraphs. Returns true if anything was wrapped.
pub fn wrap_stray_inline(surface: &mut Surface) -> Result<bool> {
    let root = surface.root();
    let mut changed = false;
    let mut current: Option<NodeId> = None;
    for child in surface.children(root).to_vec() {
        let is_block = surface.element(child).is_some_and(Element::is_block);
        if is_block {
            current = None;
            continue;
        }
        let para = match current {
            Some(p) => p,
            None => {
                let p = surface.create_element(Element::new("p"));
                surface.insert_before(child, p)?;
                current = Some(p);
                p
            }
        };
        surface.append_child(para, child)?;
        changed = true;
    }
    Ok(changed)
}

/// Block containing a boundary. For positions directly under the root the
/// block child next to the position is used.
pub fn block_at(surface: &Surface, at: Boundary) -> Option<NodeId> {
    let root = surface.root();
    if at.node != root {
        return surface.block_of(at.node);
    }
    let kids = surface.children(root);
    [at.offset, at.offset.wrapping_sub(1)]
        .into_iter()
        .filter_map(|i| kids.get(i).copied())
        .find(|n| surface.element(*n).is_some_and(Element::is_block))
}
