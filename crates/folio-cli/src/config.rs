//! KDL configuration for the `folio` binary.

use std::path::{Path, PathBuf};

use folio_editor_core::{EditorConfig, ThemeMode};
use kdl::{KdlDocument, KdlNode, KdlValue};
use miette::{IntoDiagnostic, Result, WrapErr, miette};

/// `<config_dir>/folio/config.kdl`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("folio").join("config.kdl"))
}

/// Load configuration from `explicit`, or from the default location.
///
/// A missing default file yields the defaults. A path given on the command
/// line must exist.
pub fn load(explicit: Option<&Path>) -> Result<EditorConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("no config file, using defaults");
                return Ok(EditorConfig::default());
            }
        },
    };

    let source = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("couldn't read config file {}", path.display()))?;
    let config = parse(&source).wrap_err_with(|| format!("invalid config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
}

/// Parse a KDL config document. Absent nodes keep their defaults.
pub fn parse(source: &str) -> Result<EditorConfig> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| miette!("{e}"))?;
    let mut config = EditorConfig::default();

    for node in doc.nodes() {
        let name = node.name().value();
        match name {
            "theme" => {
                let theme = string_arg(node)?;
                config.theme = theme.parse::<ThemeMode>().into_diagnostic()?;
            }
            "toolbar-width" => config.toolbar_width = number_arg(node)?,
            "toolbar-height" => config.toolbar_height = number_arg(node)?,
            "edge-margin" => config.edge_margin = number_arg(node)?,
            "selection-gap" => config.selection_gap = number_arg(node)?,
            "history-capacity" => config.history_capacity = count_arg(node)?,
            "history-debounce-ms" => config.history_debounce_ms = count_arg(node)? as u64,
            other => tracing::warn!(node = other, "ignoring unknown config node"),
        }
    }
    Ok(config)
}

fn first_value<'a>(node: &'a KdlNode) -> Result<&'a KdlValue> {
    node.entries()
        .first()
        .map(|entry| entry.value())
        .ok_or_else(|| miette!("`{}` needs a value", node.name().value()))
}

fn string_arg(node: &KdlNode) -> Result<&str> {
    first_value(node)?
        .as_string()
        .ok_or_else(|| miette!("`{}` expects a string", node.name().value()))
}

fn number_arg(node: &KdlNode) -> Result<f64> {
    let value = first_value(node)?;
    let number = value
        .as_f64()
        .or_else(|| value.as_i64().map(|n| n as f64))
        .ok_or_else(|| miette!("`{}` expects a number", node.name().value()))?;
    if !number.is_finite() || number < 0.0 {
        return Err(miette!("`{}` must be a non-negative number", node.name().value()));
    }
    Ok(number)
}

fn count_arg(node: &KdlNode) -> Result<usize> {
    first_value(node)?
        .as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| miette!("`{}` expects a non-negative integer", node.name().value()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(parse("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_reads_every_node() {
        let config = parse(
            r#"
            theme "dark"
            toolbar-width 400
            toolbar-height 44.5
            edge-margin 8
            selection-gap 12
            history-capacity 20
            history-debounce-ms 250
            "#,
        )
        .unwrap();
        assert_eq!(config.theme, ThemeMode::Dark);
        assert_eq!(config.toolbar_width, 400.0);
        assert_eq!(config.toolbar_height, 44.5);
        assert_eq!(config.edge_margin, 8.0);
        assert_eq!(config.selection_gap, 12.0);
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.history_debounce_ms, 250);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = parse("history-capacity 5").unwrap();
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.theme, ThemeMode::Light);
        assert_eq!(config.toolbar_width, EditorConfig::default().toolbar_width);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse(r#"theme "sepia""#).is_err());
        assert!(parse(r#"toolbar-width "wide""#).is_err());
        assert!(parse("history-capacity -3").is_err());
        assert!(parse("edge-margin").is_err());
        assert!(parse("theme {").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let missing = std::env::temp_dir().join("folio-no-such-config.kdl");
        assert!(load(Some(&missing)).is_err());
    }
}
