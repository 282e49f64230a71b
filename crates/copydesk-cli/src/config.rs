//! Editor configuration from KDL.
//!
//! ```kdl
//! history-capacity 50
//! capture-delay-ms 500
//! ```

use std::path::{Path, PathBuf};

use copydesk_editor_core::EditorConfig;
use kdl::KdlDocument;
use miette::{Diagnostic, IntoDiagnostic, Result, WrapErr};

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("`{key}` expects a non-negative integer")]
    #[diagnostic(code(copydesk::config::value), help("for example: `{key} 500`"))]
    InvalidValue { key: String },

    #[error("unknown configuration key `{0}`")]
    #[diagnostic(
        code(copydesk::config::key),
        help("known keys are `history-capacity` and `capture-delay-ms`")
    )]
    UnknownKey(String),
}

/// `<config_dir>/copydesk/editor.kdl`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("copydesk").join("editor.kdl"))
}

/// Load configuration from `path`, or from the default location when it
/// exists. Without either, the built-in defaults apply.
pub fn load(path: Option<&Path>) -> Result<EditorConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(EditorConfig::default()),
        },
    };
    tracing::debug!(path = %path.display(), "loading editor config");
    let source = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not read {}", path.display()))?;
    parse(&source)
}

pub fn parse(source: &str) -> Result<EditorConfig> {
    let doc: KdlDocument = source.parse()?;
    let mut config = EditorConfig::default();

    for node in doc.nodes() {
        let key = node.name().value();
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
        };
        let value = node
            .entries()
            .first()
            .and_then(|entry| entry.value().as_integer())
            .ok_or_else(invalid)?;
        match key {
            "history-capacity" => {
                config.history_capacity = usize::try_from(value).map_err(|_| invalid())?;
            }
            "capture-delay-ms" => {
                config.capture_delay_ms = u64::try_from(value).map_err(|_| invalid())?;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string()).into()),
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config = parse("history-capacity 20\ncapture-delay-ms 250\n").unwrap();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.capture_delay_ms, 250);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = parse("capture-delay-ms 0").unwrap();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.capture_delay_ms, 0);
        assert_eq!(parse("").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = parse("history-capacity -1").unwrap_err();
        assert_eq!(err.to_string(), "`history-capacity` expects a non-negative integer");

        let err = parse(r#"capture-delay-ms "soon""#).unwrap_err();
        assert_eq!(err.to_string(), "`capture-delay-ms` expects a non-negative integer");

        let err = parse("undo-depth 3").unwrap_err();
        assert_eq!(err.to_string(), "unknown configuration key `undo-depth`");
    }

    #[test]
    fn test_syntax_error_is_reported() {
        assert!(parse("history-capacity {").is_err());
    }
}
