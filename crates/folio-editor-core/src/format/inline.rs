use crate::document::EditorDocument;
use crate::dom::{Element, NodeId, Surface};
use crate::error::Result;
use crate::format::live_range;
use crate::inspect::{self, element_slant, element_weight};
use crate::range::{TextRange, demote_or_unwrap, inline_ancestor, isolate_text, peel, unwrap_if_bare_span};
use crate::style::InlineStyle;
use crate::types::FormatKind;

/// Toggle bold or italic on the selected range.
///
/// If every selected character already renders with the mark it is
/// removed, otherwise it is added where missing. A collapsed selection is
/// left alone.
pub fn apply_inline_format<D: EditorDocument + ?Sized>(doc: &mut D, kind: FormatKind) -> bool {
    let Some(mark) = Mark::for_kind(kind) else {
        tracing::trace!(target: "folio::format", %kind, "not an inline format");
        return false;
    };
    let Some(range) = live_range(doc) else {
        return false;
    };
    if range.is_collapsed() {
        tracing::trace!(target: "folio::format", %kind, "collapsed selection, nothing to format");
        return false;
    }

    let remove = inspect::format_active_in(doc.surface(), &range, kind);
    let snapshot = doc.surface().clone();
    match toggle(doc.surface_mut(), &range, mark, remove) {
        Ok(()) => {
            let restored = TextRange::from_offsets(doc.surface(), range.start_offset, range.end_offset);
            doc.set_selection(Some(restored.to_selection()));
            tracing::debug!(target: "folio::format", %kind, remove, "toggled inline format");
            doc.content_changed();
            true
        }
        Err(e) => {
            tracing::warn!(target: "folio::format", %kind, error = %e, "inline format failed, tree restored");
            *doc.surface_mut() = snapshot;
            false
        }
    }
}

/// An inline mark and how it shows up in the tree.
#[derive(Clone, Copy)]
struct Mark {
    tag: &'static str,
    property: &'static str,
    decide: fn(&Element) -> Option<bool>,
}

impl Mark {
    fn for_kind(kind: FormatKind) -> Option<Self> {
        match kind {
            FormatKind::Bold => Some(Self {
                tag: "b",
                property: "font-weight",
                decide: element_weight,
            }),
            FormatKind::Italic => Some(Self {
                tag: "i",
                property: "font-style",
                decide: element_slant,
            }),
            _ => None,
        }
    }

    fn renders(self, surface: &Surface, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(surface.ancestors(node))
            .filter_map(|n| surface.element(n))
            .find_map(self.decide)
            .unwrap_or(false)
    }
}

fn toggle(surface: &mut Surface, range: &TextRange, mark: Mark, remove: bool) -> Result<()> {
    for text in isolate_text(surface, range.start_offset, range.end_offset)? {
        if remove {
            strip_mark(surface, text, mark)?;
        } else if !mark.renders(surface, text) {
            surface.wrap(text, Element::new(mark.tag))?;
        }
    }
    surface.normalize(surface.root());
    Ok(())
}

/// Lift `text` out of every inline element that applies the mark. If the
/// block itself still applies it (a heading is bold), override locally.
fn strip_mark(surface: &mut Surface, text: NodeId, mark: Mark) -> Result<()> {
    while let Some(owner) = inline_ancestor(surface, text, |el| (mark.decide)(el) == Some(true)) {
        let copy = peel(surface, owner, text)?;
        let is_tag = surface
            .element_mut(copy)
            .map(|el| {
                el.style.remove(mark.property);
                el.tag != "span"
            })
            .unwrap_or(false);
        if is_tag {
            demote_or_unwrap(surface, copy)?;
        } else {
            unwrap_if_bare_span(surface, copy)?;
        }
    }
    if mark.renders(surface, text) {
        let normal = InlineStyle::new().with(mark.property, "normal");
        surface.wrap(text, Element::new("span").with_style(normal))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PlainEditor;
    use crate::html;

    fn editor(content: &str, select: &str) -> PlainEditor {
        let mut editor = PlainEditor::from_html(content);
        assert!(editor.select_text(select, 0));
        editor
    }

    #[test]
    fn test_bold_wraps_selection() {
        let mut ed = editor("<p>make this bold</p>", "this");
        assert!(apply_inline_format(&mut ed, FormatKind::Bold));
        insta::assert_snapshot!(ed.html(), @"<p>make <b>this</b> bold</p>");
        assert!(inspect::is_format_active(&ed, FormatKind::Bold));
    }

    #[test]
    fn test_bold_toggles_off() {
        let mut ed = editor("<p>make <b>this</b> bold</p>", "this");
        assert!(apply_inline_format(&mut ed, FormatKind::Bold));
        assert_eq!(ed.html(), "<p>make this bold</p>");
        assert!(!inspect::is_format_active(&ed, FormatKind::Bold));
    }

    #[test]
    fn test_partial_unbold_splits_wrapper() {
        let mut ed = editor("<p><strong>all of it</strong></p>", "of");
        assert!(apply_inline_format(&mut ed, FormatKind::Bold));
        assert_eq!(ed.html(), "<p><strong>all </strong>of<strong> it</strong></p>");
    }

    #[test]
    fn test_mixed_selection_becomes_bold() {
        let mut ed = editor("<p>half <b>bold</b></p>", "half bold");
        assert!(apply_inline_format(&mut ed, FormatKind::Bold));
        assert_eq!(ed.html(), "<p><b>half bold</b></p>");
    }

    #[test]
    fn test_styled_span_keeps_other_declarations() {
        let mut ed = editor(
            r#"<p><span style="font-style: italic; color: red">word</span></p>"#,
            "word",
        );
        assert!(apply_inline_format(&mut ed, FormatKind::Italic));
        assert_eq!(ed.html(), r#"<p><span style="color: red">word</span></p>"#);
    }

    #[test]
    fn test_unbold_inside_heading_overrides() {
        let mut ed = editor("<h2>Title</h2>", "Title");
        assert!(inspect::is_format_active(&ed, FormatKind::Bold));
        assert!(apply_inline_format(&mut ed, FormatKind::Bold));
        assert_eq!(ed.html(), r#"<h2><span style="font-weight: normal">Title</span></h2>"#);
        assert!(!inspect::is_format_active(&ed, FormatKind::Bold));

        assert!(apply_inline_format(&mut ed, FormatKind::Bold));
        assert!(inspect::is_format_active(&ed, FormatKind::Bold));
    }

    #[test]
    fn test_collapsed_is_noop() {
        let mut ed = PlainEditor::from_html("<p>text</p>");
        ed.select_offsets(2, 2);
        assert!(!apply_inline_format(&mut ed, FormatKind::Italic));
        assert_eq!(ed.html(), "<p>text</p>");
    }

    #[test]
    fn test_selection_survives_normalization() {
        let mut ed = editor("<p><i>ab</i>cd</p>", "cd");
        assert!(apply_inline_format(&mut ed, FormatKind::Italic));
        assert_eq!(ed.html(), "<p><i>abcd</i></p>");
        assert_eq!(ed.selected_text().as_deref(), Some("cd"));
        let doc = html::parse(&ed.html());
        assert_eq!(doc.text_segments().len(), 1);
    }
}
