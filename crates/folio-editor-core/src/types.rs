//! Core editor types: boundaries, selection snapshots, geometry, format kinds.
//!
//! These types are host-agnostic; a browser host converts its DOM selection
//! into a [`Selection`] and a native host builds one from its own model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::error::EditorError;

/// Which side of a seam a position prefers.
///
/// When a global text offset falls between two text nodes, `Before` sticks
/// to the end of the earlier node and `After` to the start of the later one.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    #[default]
    Before,
    After,
}

/// A point in the tree: a char offset in a text node, or a child index in
/// an element.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Axis-aligned rectangle in viewport coordinates.
#[derive(Clone, Debug, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Zero width or height.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

/// Snapshot of the live text selection.
///
/// The anchor is where the selection started, the focus is where it ends
/// now. They may be in any order; operations order them against the tree.
/// Snapshots are re-read for every operation and never kept across one.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Selection {
    pub anchor: Boundary,
    pub focus: Boundary,
    /// Bounding rectangle reported by the host, if it measured one.
    pub rect: Rect,
}

impl Selection {
    pub fn new(anchor: Boundary, focus: Boundary) -> Self {
        Self {
            anchor,
            focus,
            rect: Rect::default(),
        }
    }

    /// Caret at a single boundary.
    pub fn caret(at: Boundary) -> Self {
        Self::new(at, at)
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Colour scheme, owned by the settings store.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl FromStr for ThemeMode {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(EditorError::UnknownName {
                kind: "theme",
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}

/// Heading levels offered by the toolbar.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn from_number(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
        }
    }

    /// Relative font size: level 1 largest.
    pub fn font_size(self) -> &'static str {
        match self {
            Self::H1 => "2em",
            Self::H2 => "1.5em",
            Self::H3 => "1.25em",
        }
    }
}

/// Closed set of formats the engine applies and reports.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Bold,
    Italic,
    Heading(HeadingLevel),
    Paragraph,
}

impl FormatKind {
    pub fn is_inline(self) -> bool {
        matches!(self, Self::Bold | Self::Italic)
    }
}

impl FromStr for FormatKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bold" => Ok(Self::Bold),
            "italic" => Ok(Self::Italic),
            "h1" | "heading-1" => Ok(Self::Heading(HeadingLevel::H1)),
            "h2" | "heading-2" => Ok(Self::Heading(HeadingLevel::H2)),
            "h3" | "heading-3" => Ok(Self::Heading(HeadingLevel::H3)),
            "p" | "paragraph" => Ok(Self::Paragraph),
            other => Err(EditorError::UnknownName {
                kind: "format",
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bold => f.write_str("bold"),
            Self::Italic => f.write_str("italic"),
            Self::Heading(level) => f.write_str(level.tag()),
            Self::Paragraph => f.write_str("paragraph"),
        }
    }
}

/// Size of the visible area the toolbar must fit in.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kind_names() {
        assert_eq!("h2".parse::<FormatKind>().unwrap(), FormatKind::Heading(HeadingLevel::H2));
        assert_eq!("Bold".parse::<FormatKind>().unwrap(), FormatKind::Bold);
        assert!("h4".parse::<FormatKind>().is_err());
        assert_eq!(FormatKind::Heading(HeadingLevel::H3).to_string(), "h3");
    }

    #[test]
    fn test_theme_names() {
        assert_eq!("DARK".parse::<ThemeMode>().unwrap(), ThemeMode::Dark);
        assert!("sepia".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_rect_emptiness() {
        assert!(Rect::new(10.0, 10.0, 0.0, 12.0).is_empty());
        assert!(!Rect::new(10.0, 10.0, 5.0, 12.0).is_empty());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_finite());
        assert_eq!(Rect::new(1.0, 2.0, 3.0, 4.0).bottom(), 6.0);
    }
}
