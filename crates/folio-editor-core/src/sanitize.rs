//! Structural Sanitizer.
//!
//! Runs after every heading-producing mutation and enforces two rules over
//! the surface: a heading never contains another heading, and a heading
//! always has text. Running it on a clean tree changes nothing.

use std::fmt;

use crate::dom::{Element, NodeId, Surface};

/// What a sanitizer pass changed.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct SanitizeReport {
    /// Nested headings replaced by their text.
    pub flattened: usize,
    /// Headings removed for having no text.
    pub removed: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self.flattened == 0 && self.removed == 0
    }
}

impl fmt::Display for SanitizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flattened {} nested heading(s), removed {} empty heading(s)",
            self.flattened, self.removed
        )
    }
}

/// Enforce the heading invariants in place.
pub fn sanitize(surface: &mut Surface) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    let mut touched: Vec<NodeId> = Vec::new();

    // Pre-order, so an outer nested heading is flattened before we look at
    // anything inside it.
    for id in surface.descendants(surface.root()) {
        if !surface.contains(id) || !is_heading(surface, id) {
            continue;
        }
        if surface.ancestors(id).any(|a| is_heading(surface, a)) {
            let text = surface.text_content(id);
            let replacement = surface.create_text(&text);
            if let Some(parent) = surface.parent(id) {
                touched.push(parent);
            }
            if surface.replace(id, replacement).is_ok() {
                report.flattened += 1;
            }
        }
    }

    for id in surface.descendants(surface.root()) {
        if is_heading(surface, id) && surface.visible_text(id).trim().is_empty() {
            if let Some(parent) = surface.parent(id) {
                touched.push(parent);
            }
            surface.detach(id);
            report.removed += 1;
        }
    }

    for parent in touched {
        merge_text(surface, parent);
    }

    if !report.is_clean() {
        tracing::debug!(
            target: "folio::sanitize",
            flattened = report.flattened,
            removed = report.removed,
            "sanitized surface"
        );
    }
    report
}

/// Headings that break an invariant: nested in another heading, or empty.
pub fn violations(surface: &Surface) -> Vec<NodeId> {
    surface
        .descendants(surface.root())
        .into_iter()
        .filter(|id| is_heading(surface, *id))
        .filter(|id| {
            surface.ancestors(*id).any(|a| is_heading(surface, a))
                || surface.visible_text(*id).trim().is_empty()
        })
        .collect()
}

fn is_heading(surface: &Surface, id: NodeId) -> bool {
    surface.element(id).is_some_and(Element::is_heading)
}

fn merge_text(surface: &mut Surface, parent: NodeId) {
    let kids = surface.children(parent).to_vec();
    let mut prev: Option<NodeId> = None;
    for kid in kids {
        match (prev, surface.text(kid).map(str::to_owned)) {
            (Some(p), Some(text)) => {
                let merged = format!("{}{}", surface.text(p).unwrap_or_default(), text);
                let _ = surface.set_text(p, merged);
                surface.detach(kid);
            }
            (_, Some(_)) => prev = Some(kid),
            (_, None) => prev = None,
        }
    }
}
