//! Editor actions and keybindings.
//!
//! Platform-agnostic definitions for editor operations. The `EditorAction`
//! enum represents semantic editing operations, decoupled from how they
//! are triggered (toolbar button, keyboard shortcut, command line).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

use crate::error::EditorError;
use crate::palette::HighlightColor;
use crate::types::HeadingLevel;

/// All possible editor actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    // === Formatting ===
    /// Toggle bold on the selection.
    ToggleBold,

    /// Toggle italic on the selection.
    ToggleItalic,

    /// Convert the selected blocks to a heading, or back to a paragraph.
    Heading(HeadingLevel),

    /// Toggle a highlight colour.
    Highlight(HighlightColor),

    /// Reset to plain paragraph text.
    ClearFormatting,

    // === Text Insertion ===
    /// Type text at the selection, replacing selected content.
    InsertText(SmolStr),

    // === History ===
    /// Undo the last change.
    Undo,

    /// Redo the last undone change.
    Redo,

    // === Persistence ===
    /// Save the note. Handled by the host, never by the core.
    Save,
}

impl FromStr for EditorAction {
    type Err = EditorError;

    /// Parse the command-line spelling: `bold`, `italic`, `h1`..`h3`,
    /// `clear`, `highlight:<colour>`, `undo`, `redo`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let action = match name.as_str() {
            "bold" => Self::ToggleBold,
            "italic" => Self::ToggleItalic,
            "clear" => Self::ClearFormatting,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "h1" => Self::Heading(HeadingLevel::H1),
            "h2" => Self::Heading(HeadingLevel::H2),
            "h3" => Self::Heading(HeadingLevel::H3),
            _ => match name.strip_prefix("highlight:") {
                Some(color) => Self::Highlight(color.parse()?),
                None => {
                    return Err(EditorError::UnknownName {
                        kind: "action",
                        name,
                    });
                }
            },
        };
        Ok(action)
    }
}

impl fmt::Display for EditorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToggleBold => f.write_str("bold"),
            Self::ToggleItalic => f.write_str("italic"),
            Self::Heading(level) => write!(f, "h{}", level.number()),
            Self::Highlight(color) => write!(f, "highlight:{}", color),
            Self::ClearFormatting => f.write_str("clear"),
            Self::InsertText(text) => write!(f, "insert {:?}", text),
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
            Self::Save => f.write_str("save"),
        }
    }
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }

    /// Character keys compare case-insensitively (Shift+Z reports "Z").
    fn folded(&self) -> Self {
        match self {
            Self::Character(s) => Self::Character(SmolStr::new(s.to_lowercase())),
            other => other.clone(),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Get the primary modifier + Shift for the platform.
    pub fn primary_shift(is_mac: bool) -> Self {
        Self {
            shift: true,
            ..Self::primary(is_mac)
        }
    }

    /// Get the primary modifier + Alt for the platform.
    pub fn primary_alt(is_mac: bool) -> Self {
        Self {
            alt: true,
            ..Self::primary(is_mac)
        }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }

    pub fn primary_shift(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary_shift(is_mac),
        }
    }

    pub fn primary_alt(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary_alt(is_mac),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

/// Keyboard shortcuts mapped to actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, EditorAction>,
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self::default_for_platform(false)
    }
}

impl KeybindingConfig {
    /// An empty configuration.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// The note editor's shortcuts for the given platform.
    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut config = Self::empty();
        let ch = |c: &str| Key::character(c);

        config.bind(KeyCombo::primary(ch("b"), is_mac), EditorAction::ToggleBold);
        config.bind(KeyCombo::primary(ch("i"), is_mac), EditorAction::ToggleItalic);
        config.bind(KeyCombo::primary(ch("u"), is_mac), EditorAction::ClearFormatting);
        config.bind(KeyCombo::primary(ch("\\"), is_mac), EditorAction::ClearFormatting);

        for (digit, color) in ["1", "2", "3", "4", "5", "6"]
            .into_iter()
            .zip(HighlightColor::ALL)
        {
            config.bind(KeyCombo::primary(ch(digit), is_mac), EditorAction::Highlight(color));
        }
        for (digit, level) in [
            ("1", HeadingLevel::H1),
            ("2", HeadingLevel::H2),
            ("3", HeadingLevel::H3),
        ] {
            config.bind(KeyCombo::primary_alt(ch(digit), is_mac), EditorAction::Heading(level));
        }

        config.bind(KeyCombo::primary(ch("s"), is_mac), EditorAction::Save);
        config.bind(KeyCombo::primary(ch("z"), is_mac), EditorAction::Undo);
        config.bind(KeyCombo::primary_shift(ch("z"), is_mac), EditorAction::Redo);
        config.bind(KeyCombo::primary(ch("y"), is_mac), EditorAction::Redo);
        config
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, combo: KeyCombo, action: EditorAction) {
        self.bindings.insert(
            KeyCombo {
                key: combo.key.folded(),
                ..combo
            },
            action,
        );
    }

    /// Action bound to a key combination, if any.
    pub fn lookup(&self, combo: &KeyCombo) -> Option<EditorAction> {
        let folded = KeyCombo {
            key: combo.key.folded(),
            modifiers: combo.modifiers,
        };
        self.bindings.get(&folded).cloned()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
