//! Format State Inspector: read-only queries over the live selection.
//!
//! Effective formatting is resolved the way a style engine would for the
//! properties we care about: the nearest element that decides a property
//! wins, and tags like `<b>` or `<h1>` decide it when no inline style does.
//! Every query degrades to `false` / `None` instead of failing.

use crate::document::EditorDocument;
use crate::dom::{Element, NodeId, Surface};
use crate::palette::HighlightColor;
use crate::range::{TextRange, intersected_elements, intersected_text};
use crate::style::{style_is_italic, weight_is_bold};
use crate::types::{Boundary, FormatKind, HeadingLevel};

/// Snapshot of everything the toolbar shows as active.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub heading: Option<HeadingLevel>,
    pub highlight: Option<HighlightColor>,
}

/// Whether `kind` is active on the live selection.
pub fn is_format_active<D: EditorDocument + ?Sized>(doc: &D, kind: FormatKind) -> bool {
    let Some(range) = current_range(doc) else {
        return false;
    };
    let active = format_active_in(doc.surface(), &range, kind);
    tracing::trace!(target: "folio::inspect", %kind, active, "format query");
    active
}

/// Highlight colour active on the live selection, from either theme table.
pub fn active_highlight_color<D: EditorDocument + ?Sized>(doc: &D) -> Option<HighlightColor> {
    let range = current_range(doc)?;
    let color = highlight_in(doc.surface(), &range);
    tracing::trace!(target: "folio::inspect", color = ?color, "highlight query");
    color
}

/// All toolbar state in one pass over the selection.
pub fn format_state<D: EditorDocument + ?Sized>(doc: &D) -> FormatState {
    let Some(range) = current_range(doc) else {
        return FormatState::default();
    };
    let surface = doc.surface();
    let heading = [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3]
        .into_iter()
        .find(|level| format_active_in(surface, &range, FormatKind::Heading(*level)));
    FormatState {
        bold: format_active_in(surface, &range, FormatKind::Bold),
        italic: format_active_in(surface, &range, FormatKind::Italic),
        heading,
        highlight: highlight_in(surface, &range),
    }
}

fn current_range<D: EditorDocument + ?Sized>(doc: &D) -> Option<TextRange> {
    let selection = doc.selection()?;
    match TextRange::resolve(doc.surface(), &selection) {
        Ok(range) => Some(range),
        Err(e) => {
            tracing::trace!(target: "folio::inspect", error = %e, "selection not inside surface");
            None
        }
    }
}

/// Range-level query used by the engines to decide toggle direction.
pub fn format_active_in(surface: &Surface, range: &TextRange, kind: FormatKind) -> bool {
    match kind {
        FormatKind::Bold | FormatKind::Italic => {
            let nodes = styled_nodes(surface, range);
            !nodes.is_empty() && nodes.iter().all(|n| effective(surface, *n, kind))
        }
        FormatKind::Heading(level) => {
            heading_chain(surface, range).any(|level_here| level_here == level.number())
        }
        FormatKind::Paragraph => heading_chain(surface, range).next().is_none(),
    }
}

/// Nodes whose computed style answers an inline query: the visible text
/// under a range, or the node at the caret.
fn styled_nodes(surface: &Surface, range: &TextRange) -> Vec<NodeId> {
    if !range.is_collapsed() {
        let texts: Vec<NodeId> = intersected_text(surface, range.start_offset, range.end_offset)
            .into_iter()
            .filter(|t| !surface.visible_text(*t).is_empty())
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    vec![caret_node(surface, range.start)]
}

fn caret_node(surface: &Surface, at: Boundary) -> NodeId {
    if surface.is_text(at.node) || at.offset == 0 {
        return at.node;
    }
    surface
        .children(at.node)
        .get(at.offset - 1)
        .copied()
        .unwrap_or(at.node)
}

/// Heading levels on the common ancestor chain, innermost first, root
/// excluded.
fn heading_chain<'a>(surface: &'a Surface, range: &TextRange) -> impl Iterator<Item = u8> + 'a {
    let root = surface.root();
    let common = surface
        .common_ancestor(range.start.node, range.end.node)
        .unwrap_or(root);
    std::iter::once(common)
        .chain(surface.ancestors(common))
        .take_while(move |n| *n != root)
        .filter_map(move |n| surface.element(n).and_then(Element::heading_level))
}

pub fn highlight_in(surface: &Surface, range: &TextRange) -> Option<HighlightColor> {
    let root = surface.root();
    let from_start = std::iter::once(range.start.node)
        .chain(surface.ancestors(range.start.node))
        .take_while(|n| *n != root)
        .filter_map(|n| surface.element(n))
        .find_map(element_highlight);
    from_start.or_else(|| {
        intersected_elements(surface, range.start_offset, range.end_offset)
            .into_iter()
            .filter_map(|n| surface.element(n))
            .find_map(element_highlight)
    })
}

/// Highlight colour declared by an element's own background.
pub fn element_highlight(el: &Element) -> Option<HighlightColor> {
    ["background-color", "background"]
        .into_iter()
        .filter_map(|prop| el.style.get(prop))
        .find_map(|value| {
            HighlightColor::from_css(value)
                .or_else(|| value.split_whitespace().find_map(HighlightColor::from_css))
        })
}

/// Whether an element paints a background of its own.
pub fn has_background(el: &Element) -> bool {
    el.tag == "mark"
        || ["background-color", "background"]
            .into_iter()
            .filter_map(|prop| el.style.get(prop))
            .any(|v| {
                let v = v.trim();
                !v.is_empty() && !v.eq_ignore_ascii_case("transparent") && !v.eq_ignore_ascii_case("none")
            })
}

/// What an element alone says about boldness.
pub fn element_weight(el: &Element) -> Option<bool> {
    if let Some(weight) = el.style.get("font-weight").and_then(weight_is_bold) {
        return Some(weight);
    }
    match el.tag.as_str() {
        "b" | "strong" | "th" => Some(true),
        _ if el.is_heading() => Some(true),
        _ => None,
    }
}

/// What an element alone says about slant.
pub fn element_slant(el: &Element) -> Option<bool> {
    if let Some(slant) = el.style.get("font-style").and_then(style_is_italic) {
        return Some(slant);
    }
    match el.tag.as_str() {
        "i" | "em" | "cite" | "var" => Some(true),
        _ => None,
    }
}

fn effective(surface: &Surface, node: NodeId, kind: FormatKind) -> bool {
    match kind {
        FormatKind::Bold => effective_bold(surface, node),
        FormatKind::Italic => effective_italic(surface, node),
        _ => false,
    }
}

/// Computed boldness at a node (nearest deciding element wins).
pub fn effective_bold(surface: &Surface, node: NodeId) -> bool {
    resolve(surface, node, element_weight)
}

pub fn effective_italic(surface: &Surface, node: NodeId) -> bool {
    resolve(surface, node, element_slant)
}

fn resolve(surface: &Surface, node: NodeId, decide: fn(&Element) -> Option<bool>) -> bool {
    std::iter::once(node)
        .chain(surface.ancestors(node))
        .filter_map(|n| surface.element(n))
        .find_map(decide)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;
    use crate::types::Affinity;

    fn range(surface: &Surface, start: usize, end: usize) -> TextRange {
        TextRange::from_offsets(surface, start, end)
    }

    #[test]
    fn test_bold_requires_every_node() {
        let surface = html::parse("<p><b>bold</b> plain</p>");
        assert!(format_active_in(&surface, &range(&surface, 0, 4), FormatKind::Bold));
        assert!(!format_active_in(&surface, &range(&surface, 0, 6), FormatKind::Bold));
    }

    #[test]
    fn test_nearest_decision_wins() {
        let surface = html::parse(
            r#"<p><b>a<span style="font-weight: normal">b</span></b><span style="font-style: italic">c</span></p>"#,
        );
        let b = surface.boundary_at(1, Affinity::After).node;
        assert!(!effective_bold(&surface, b));
        assert!(format_active_in(&surface, &range(&surface, 2, 3), FormatKind::Italic));
    }

    #[test]
    fn test_heading_levels_are_exact() {
        let surface = html::parse("<h2>Title</h2><p>body</p>");
        let title = range(&surface, 1, 3);
        assert!(format_active_in(&surface, &title, FormatKind::Heading(HeadingLevel::H2)));
        assert!(!format_active_in(&surface, &title, FormatKind::Heading(HeadingLevel::H1)));
        assert!(!format_active_in(&surface, &title, FormatKind::Paragraph));
        // Headings render bold without any inline mark.
        assert!(format_active_in(&surface, &title, FormatKind::Bold));

        let spanning = range(&surface, 2, 7);
        assert!(!format_active_in(&surface, &spanning, FormatKind::Heading(HeadingLevel::H2)));
    }

    #[test]
    fn test_highlight_from_either_table() {
        let surface = html::parse(
            r#"<p>a <span style="background-color: #854d0e">dark</span> <mark style="background: rgb(254, 243, 199)">light</mark></p>"#,
        );
        assert_eq!(
            highlight_in(&surface, &range(&surface, 3, 5)),
            Some(HighlightColor::Yellow)
        );
        assert_eq!(
            highlight_in(&surface, &range(&surface, 8, 10)),
            Some(HighlightColor::Yellow)
        );
        assert_eq!(highlight_in(&surface, &range(&surface, 0, 1)), None);
    }

    #[test]
    fn test_highlight_found_by_walking_the_range() {
        let surface = html::parse(r#"<p>plain <span style="background-color: #dbeafe">blue</span></p>"#);
        // Start point sits in unhighlighted text.
        assert_eq!(
            highlight_in(&surface, &range(&surface, 2, 8)),
            Some(HighlightColor::Blue)
        );
    }

    #[test]
    fn test_caret_at_element_position() {
        let surface = html::parse("<h1>x</h1><p><br></p>");
        let p = surface.children(surface.root())[1];
        let caret = TextRange {
            start: Boundary::new(p, 0),
            end: Boundary::new(p, 0),
            start_offset: 1,
            end_offset: 1,
        };
        assert!(!format_active_in(&surface, &caret, FormatKind::Heading(HeadingLevel::H1)));
        assert!(format_active_in(&surface, &caret, FormatKind::Paragraph));
        assert!(!format_active_in(&surface, &caret, FormatKind::Bold));
    }
}
