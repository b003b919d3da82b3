//! Highlight palette and theme colours.
//!
//! Each highlight colour has one light-theme and one dark-theme background.
//! Detection compares against both tables, since a note may carry
//! highlights authored under the other theme.

use std::fmt;
use std::str::FromStr;

use crate::error::EditorError;
use crate::types::ThemeMode;

/// The six highlight colours offered by the toolbar.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub enum HighlightColor {
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
    Orange,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 6] = [
        Self::Yellow,
        Self::Blue,
        Self::Green,
        Self::Pink,
        Self::Purple,
        Self::Orange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Orange => "orange",
        }
    }

    /// Background hex for the given theme.
    pub fn hex(self, theme: ThemeMode) -> &'static str {
        match theme {
            ThemeMode::Light => self.light_hex(),
            ThemeMode::Dark => self.dark_hex(),
        }
    }

    pub fn light_hex(self) -> &'static str {
        match self {
            Self::Yellow => "#fef3c7",
            Self::Blue => "#dbeafe",
            Self::Green => "#d1fae5",
            Self::Pink => "#fce7f3",
            Self::Purple => "#ede9fe",
            Self::Orange => "#fed7aa",
        }
    }

    pub fn dark_hex(self) -> &'static str {
        match self {
            Self::Yellow => "#854d0e",
            Self::Blue => "#1e40af",
            Self::Green => "#166534",
            Self::Pink => "#9d174d",
            Self::Purple => "#5b21b6",
            Self::Orange => "#9a3412",
        }
    }

    /// Match a CSS colour value against both theme tables.
    pub fn from_css(value: &str) -> Option<Self> {
        let rgb = Rgb::parse(value)?;
        Self::ALL.into_iter().find(|color| {
            Rgb::parse(color.light_hex()) == Some(rgb) || Rgb::parse(color.dark_hex()) == Some(rgb)
        })
    }
}

impl FromStr for HighlightColor {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or(EditorError::UnknownName {
                kind: "highlight colour",
                name,
            })
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text colour laid over any highlight: dark ink on the pastel light
/// backgrounds, white on the saturated dark ones.
pub fn highlight_foreground(theme: ThemeMode) -> &'static str {
    match theme {
        ThemeMode::Light => "#111827",
        ThemeMode::Dark => "#ffffff",
    }
}

/// An opaque sRGB triple parsed from CSS.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` and opaque `rgba(...)`.
    /// Transparent and named colours yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        let inner = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = inner
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            return None;
        }
        if let Some(alpha) = parts.get(3) {
            let alpha: f32 = alpha.parse().ok()?;
            if alpha <= 0.0 {
                return None;
            }
        }
        let channel = |s: &str| s.parse::<u8>().ok();
        Some(Self(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        let digit = |i: usize, width: usize| u8::from_str_radix(hex.get(i..i + width)?, 16).ok();
        match hex.len() {
            3 => Some(Self(
                digit(0, 1)? * 17,
                digit(1, 1)? * 17,
                digit(2, 1)? * 17,
            )),
            6 | 8 => Some(Self(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_parsing() {
        assert_eq!(Rgb::parse("#FEF3C7"), Some(Rgb(254, 243, 199)));
        assert_eq!(Rgb::parse("#fff"), Some(Rgb(255, 255, 255)));
        assert_eq!(Rgb::parse("rgb(254, 243, 199)"), Some(Rgb(254, 243, 199)));
        assert_eq!(Rgb::parse("rgba(0, 0, 0, 0)"), None);
        assert_eq!(Rgb::parse("transparent"), None);
    }

    #[test]
    fn test_detection_covers_both_tables() {
        for color in HighlightColor::ALL {
            assert_eq!(HighlightColor::from_css(color.light_hex()), Some(color));
            assert_eq!(HighlightColor::from_css(color.dark_hex()), Some(color));
        }
        // Browsers report computed colours in rgb() form.
        assert_eq!(
            HighlightColor::from_css("rgb(219, 234, 254)"),
            Some(HighlightColor::Blue)
        );
        assert_eq!(HighlightColor::from_css("#123456"), None);
    }

    #[test]
    fn test_tables_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for color in HighlightColor::ALL {
            assert!(seen.insert(Rgb::parse(color.light_hex())));
            assert!(seen.insert(Rgb::parse(color.dark_hex())));
        }
    }

    #[test]
    fn test_color_names() {
        assert_eq!("Purple".parse::<HighlightColor>().unwrap(), HighlightColor::Purple);
        assert!("teal".parse::<HighlightColor>().is_err());
    }
}
