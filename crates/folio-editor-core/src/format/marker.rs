//! Caret markers.
//!
//! A marker is a span tagged with [`MARKER_ATTR`] holding one zero-width
//! anchor, with the caret placed after it. It gives a collapsed caret a
//! formatting context of its own: a neutral one after clearing formatting
//! (`break`), or a highlight waiting for text (`pending`). Typing absorbs
//! it; moving away leaves it stale, and stale markers are swept before the
//! next mutation.

use crate::dom::{Element, MARKER_ATTR, NodeId, Surface, ZERO_WIDTH_ANCHOR};
use crate::error::Result;
use crate::range::{TextRange, unwrap_if_bare_span};
use crate::style::InlineStyle;
use crate::types::Boundary;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Neutral context after clearing formatting at a caret.
    Break,
    /// Highlight applied at a caret, waiting for text.
    Pending,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Break => "break",
            Self::Pending => "pending",
        }
    }
}

/// Marker element holding the caret at `at`, if any.
pub fn holding_marker(surface: &Surface, at: Boundary) -> Option<NodeId> {
    std::iter::once(at.node)
        .chain(surface.ancestors(at.node))
        .find(|n| surface.element(*n).is_some_and(|el| el.marker().is_some()))
}

/// Insert a marker at an element position. Returns the caret inside it.
pub fn insert_marker(
    surface: &mut Surface,
    parent: NodeId,
    index: usize,
    kind: MarkerKind,
    style: InlineStyle,
) -> Result<Boundary> {
    let marker = surface.create_element(
        Element::new("span")
            .with_attr(MARKER_ATTR, kind.as_str())
            .with_style(style),
    );
    let anchor = surface.create_text(&ZERO_WIDTH_ANCHOR.to_string());
    surface.append_child(marker, anchor)?;
    surface.insert_child(parent, index, marker)?;
    tracing::trace!(target: "folio::format", kind = kind.as_str(), "inserted caret marker");
    Ok(Boundary::new(anchor, 1))
}

/// Turn a marker into ordinary content: drop its anchors and its tag
/// attribute. Returns false if it was left with nothing and removed.
pub fn absorb(surface: &mut Surface, marker: NodeId) -> Result<bool> {
    for node in surface.descendants(marker) {
        if let Some(text) = surface.text(node) {
            if text.contains(ZERO_WIDTH_ANCHOR) {
                let stripped: String = text.chars().filter(|c| *c != ZERO_WIDTH_ANCHOR).collect();
                surface.set_text(node, stripped)?;
            }
        }
    }
    if let Some(el) = surface.element_mut(marker) {
        el.remove_attr(MARKER_ATTR);
    }
    if surface.is_blank(marker) {
        surface.detach(marker);
        return Ok(false);
    }
    unwrap_if_bare_span(surface, marker)?;
    Ok(true)
}

/// Absorb every marker except the one holding a collapsed caret, and
/// return the range with offsets shifted past the removed anchors.
pub fn sweep_stale(surface: &mut Surface, range: TextRange) -> Result<TextRange> {
    let keep = if range.is_collapsed() {
        holding_marker(surface, range.start)
    } else {
        None
    };
    let stale: Vec<NodeId> = surface
        .descendants(surface.root())
        .into_iter()
        .filter(|n| Some(*n) != keep)
        .filter(|n| surface.element(*n).is_some_and(|el| el.marker().is_some()))
        .collect();
    if stale.is_empty() {
        return Ok(range);
    }

    let mut before_start = 0;
    let mut before_end = 0;
    // Back to front, so positions of earlier markers are unaffected.
    for marker in stale.into_iter().rev() {
        if !surface.contains(marker) {
            continue;
        }
        for node in surface.descendants(marker) {
            let Some(text) = surface.text(node) else {
                continue;
            };
            let base = surface.offset_of(Boundary::new(node, 0))?;
            for (i, c) in text.chars().enumerate() {
                if c == ZERO_WIDTH_ANCHOR {
                    before_start += usize::from(base + i < range.start_offset);
                    before_end += usize::from(base + i < range.end_offset);
                }
            }
        }
        absorb(surface, marker)?;
    }
    surface.normalize(surface.root());

    let start = range.start_offset - before_start;
    let end = range.end_offset - before_end;
    tracing::trace!(target: "folio::format", start, end, "swept stale markers");
    Ok(TextRange::from_offsets(surface, start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;
    use crate::types::Affinity;

    #[test]
    fn test_absorb_keeps_styled_content() {
        let mut surface = html::parse(
            r#"<p><span data-format-marker="pending" style="background-color: #fef3c7">&#8203;x</span></p>"#,
        );
        let marker = surface.descendants(surface.root())[1];
        assert!(absorb(&mut surface, marker).unwrap());
        assert_eq!(
            html::serialize(&surface),
            r#"<p><span style="background-color: #fef3c7">x</span></p>"#
        );
    }

    #[test]
    fn test_sweep_shifts_offsets() {
        let mut surface = html::parse(
            r#"<p>ab<span data-format-marker="break">&#8203;</span>cd</p>"#,
        );
        // "cd" spans offsets 3..5 while the anchor is present.
        let range = TextRange::from_offsets(&surface, 3, 5);
        let swept = sweep_stale(&mut surface, range).unwrap();
        assert_eq!((swept.start_offset, swept.end_offset), (2, 4));
        assert_eq!(html::serialize(&surface), "<p>abcd</p>");
        assert_eq!(surface.text_segments().len(), 1);
    }

    #[test]
    fn test_sweep_keeps_marker_holding_caret() {
        let mut surface = html::parse(
            r#"<p>ab<span data-format-marker="break">&#8203;</span>cd</p>"#,
        );
        let caret = surface.boundary_at(3, Affinity::Before);
        let range = TextRange {
            start: caret,
            end: caret,
            start_offset: 3,
            end_offset: 3,
        };
        let swept = sweep_stale(&mut surface, range).unwrap();
        assert_eq!(swept, range);
        assert!(holding_marker(&surface, caret).is_some());
    }
}
