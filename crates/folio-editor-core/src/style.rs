//! Inline style declarations (`style="a: b; c: d"`).
//!
//! Formatting state lives in the tree itself, mostly as inline style
//! declarations on wrapper spans, so this is a small ordered property map
//! rather than a CSS engine. Property names are stored lower-case.

use smol_str::SmolStr;

/// Ordered list of `property: value` declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<(SmolStr, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the contents of a `style` attribute.
    ///
    /// Malformed declarations (no colon, empty name) are skipped. A trailing
    /// `!important` is dropped since nothing here does cascade resolution.
    pub fn parse(source: &str) -> Self {
        let mut style = Self::new();
        for decl in source.split(';') {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            style.set(name, value);
        }
        style
    }

    /// Builder-style setter.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property, replacing any previous value in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = SmolStr::new(name.to_ascii_lowercase());
        let value = value.into();
        match self.decls.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.decls.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Remove a property. Returns true if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.decls.len();
        self.decls.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.decls.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Serialize back to attribute form.
    pub fn to_css(&self) -> String {
        self.decls
            .iter()
            .map(|(n, v)| format!("{}: {}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Classify a `font-weight` value. `None` for values that don't decide.
pub fn weight_is_bold(value: &str) -> Option<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "bold" | "bolder" => Some(true),
        "normal" | "lighter" => Some(false),
        "inherit" | "initial" | "unset" | "" => None,
        other => other.parse::<u16>().ok().map(|w| w >= 600),
    }
}

/// Classify a `font-style` value. `None` for values that don't decide.
pub fn style_is_italic(value: &str) -> Option<bool> {
    let value = value.trim().to_ascii_lowercase();
    if value.starts_with("italic") || value.starts_with("oblique") {
        Some(true)
    } else if value == "normal" {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let style = InlineStyle::parse("Font-Weight: bold;color:#fff ; ;bogus");
        assert_eq!(style.get("font-weight"), Some("bold"));
        assert_eq!(style.get("COLOR"), Some("#fff"));
        assert_eq!(style.to_css(), "font-weight: bold; color: #fff");
    }

    #[test]
    fn test_important_is_dropped() {
        let style = InlineStyle::parse("background: transparent !important");
        assert_eq!(style.get("background"), Some("transparent"));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut style = InlineStyle::new().with("a", "1").with("b", "2");
        style.set("A", "3");
        assert_eq!(style.to_css(), "a: 3; b: 2");
        assert!(style.remove("a"));
        assert!(!style.remove("a"));
        assert_eq!(style.to_css(), "b: 2");
    }

    #[test]
    fn test_weight_classification() {
        assert_eq!(weight_is_bold("bold"), Some(true));
        assert_eq!(weight_is_bold("700"), Some(true));
        assert_eq!(weight_is_bold("400"), Some(false));
        assert_eq!(weight_is_bold("normal"), Some(false));
        assert_eq!(weight_is_bold("inherit"), None);
        assert_eq!(style_is_italic("oblique 10deg"), Some(true));
        assert_eq!(style_is_italic("normal"), Some(false));
    }
}
