//! Status-bar figures for a note.

use serde::Serialize;

use crate::dom::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DocumentStats {
    pub words: usize,
    pub characters: usize,
}

impl DocumentStats {
    /// Count the visible text of a surface. Blocks are concatenated with no
    /// separator, as `textContent` does, and zero-width anchors are not
    /// characters.
    pub fn of(surface: &Surface) -> Self {
        Self::of_text(&surface.visible_text(surface.root()))
    }

    pub fn of_text(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html;

    #[test]
    fn test_counts_visible_text() {
        let surface = html::parse("<h1>Two words</h1><p> and\u{200B} three  more</p>");
        let stats = DocumentStats::of(&surface);
        assert_eq!(stats.words, 5);
        assert_eq!(stats.characters, "Two words and three  more".chars().count());
    }

    #[test]
    fn test_empty() {
        assert_eq!(DocumentStats::of(&html::parse("<p><br></p>")), DocumentStats::default());
    }
}
