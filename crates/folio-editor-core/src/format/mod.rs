//! Format Engine: inline marks, headings, clearing, and typing.
//!
//! Every operation re-reads the live selection, works on the tree in
//! place, and leaves the selection on a valid boundary. Operations return
//! whether they changed anything; failures are logged and recovered here,
//! never surfaced to the caller.

mod clear;
mod heading;
mod inline;
pub mod marker;
mod typing;

pub use clear::clear_formatting;
pub use heading::{apply_heading, heading_element};
pub use inline::apply_inline_format;
pub use typing::insert_text;

use crate::document::EditorDocument;
use crate::range::TextRange;

/// Resolve the live selection and sweep stale markers out of the way.
///
/// `None` means there is nothing to operate on.
pub(crate) fn live_range<D: EditorDocument + ?Sized>(doc: &mut D) -> Option<TextRange> {
    let selection = doc.selection()?;
    let range = match TextRange::resolve(doc.surface(), &selection) {
        Ok(range) => range,
        Err(e) => {
            tracing::trace!(target: "folio::format", error = %e, "selection not inside surface");
            return None;
        }
    };
    let snapshot = doc.surface().clone();
    match marker::sweep_stale(doc.surface_mut(), range) {
        Ok(swept) => {
            if swept != range {
                doc.set_selection(Some(swept.to_selection()));
            }
            Some(swept)
        }
        Err(e) => {
            tracing::warn!(target: "folio::format", error = %e, "failed to sweep caret markers");
            *doc.surface_mut() = snapshot;
            Some(range)
        }
    }
}
