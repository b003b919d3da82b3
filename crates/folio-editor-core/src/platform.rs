//! Capabilities the host injects into the editor.
//!
//! The engines never reach into ambient globals for the colour scheme or
//! the live selection. A browser host implements these over `document.body`
//! and `window.getSelection()`, tests use the plain implementations below.

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::{Selection, ThemeMode};

/// Read-only accessor for the current colour scheme.
///
/// Read fresh on every operation; there is no change notification.
pub trait ThemeProvider {
    fn theme(&self) -> ThemeMode;
}

impl ThemeProvider for ThemeMode {
    fn theme(&self) -> ThemeMode {
        *self
    }
}

impl<F: Fn() -> ThemeMode> ThemeProvider for F {
    fn theme(&self) -> ThemeMode {
        self()
    }
}

/// Synchronous access to the live selection.
pub trait SelectionSource {
    /// Current selection, or `None` when nothing is selected.
    fn read(&self) -> Option<Selection>;

    /// Move the live selection (after a mutation).
    fn write(&mut self, selection: Option<Selection>);
}

/// Selection held by value, for single-owner hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct LocalSelection(Option<Selection>);

impl LocalSelection {
    pub fn new(selection: Option<Selection>) -> Self {
        Self(selection)
    }
}

impl SelectionSource for LocalSelection {
    fn read(&self) -> Option<Selection> {
        self.0
    }

    fn write(&mut self, selection: Option<Selection>) {
        self.0 = selection;
    }
}

/// Selection shared between the host and the editor.
///
/// Clones refer to the same slot, so the host can report selection changes
/// while the editor owns another handle.
#[derive(Debug, Clone, Default)]
pub struct SharedSelection(Rc<RefCell<Option<Selection>>>);

impl SharedSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host-side update, e.g. from a `selectionchange` event.
    pub fn set(&self, selection: Option<Selection>) {
        *self.0.borrow_mut() = selection;
    }
}

impl SelectionSource for SharedSelection {
    fn read(&self) -> Option<Selection> {
        *self.0.borrow()
    }

    fn write(&mut self, selection: Option<Selection>) {
        self.set(selection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Boundary;

    #[test]
    fn test_theme_from_closure() {
        let provider = || ThemeMode::Dark;
        assert_eq!(provider.theme(), ThemeMode::Dark);
        assert_eq!(ThemeMode::Light.theme(), ThemeMode::Light);
    }

    #[test]
    fn test_shared_selection_is_shared() {
        let host = SharedSelection::new();
        let mut editor = host.clone();
        assert!(editor.read().is_none());

        let surface = crate::dom::Surface::new();
        let caret = Selection::caret(Boundary::new(surface.root(), 0));
        host.set(Some(caret));
        assert_eq!(editor.read(), Some(caret));

        editor.write(None);
        assert!(host.read().is_none());
    }
}
