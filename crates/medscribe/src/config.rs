//! Pipeline configuration file (`medscribe.toml`).
//!
//! Every key is optional; an empty file means the built-in lexicon, the
//! built-in rule bank and SOAP notes.
//!
//! ```toml
//! lexicon = "config/clinical.toml"
//! rules = "config/red_flags.toml"
//! default_format = "ed-note"
//! ```
//!
//! Relative paths in a file loaded with [`ScribeConfig::from_file`] are
//! resolved against the directory containing that file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use medscribe_contracts::{
    error::{MedscribeError, MedscribeResult},
    note::NoteFormat,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScribeConfig {
    /// Vocabulary TOML replacing the built-in lexicon.
    #[serde(default)]
    pub lexicon: Option<PathBuf>,
    /// Rule bank TOML replacing the built-in red-flag rules.
    #[serde(default)]
    pub rules: Option<PathBuf>,
    /// Format used when the caller does not name one.
    #[serde(default)]
    pub default_format: Option<NoteFormat>,
}

impl ScribeConfig {
    pub fn from_toml_str(s: &str) -> MedscribeResult<Self> {
        toml::from_str(s).map_err(|e| MedscribeError::ConfigError {
            reason: format!("failed to parse pipeline config TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> MedscribeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MedscribeError::ConfigError {
            reason: format!("failed to read pipeline config '{}': {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&contents)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            lexicon: config.lexicon.map(|p| base.join(p)),
            rules: config.rules.map(|p| base.join(p)),
            ..config
        })
    }

    pub fn format(&self) -> NoteFormat {
        self.default_format.unwrap_or(NoteFormat::Soap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ScribeConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScribeConfig::default());
        assert_eq!(config.format(), NoteFormat::Soap);
    }

    #[test]
    fn test_all_keys_parsed() {
        let config = ScribeConfig::from_toml_str(
            r#"
            lexicon = "lex.toml"
            rules = "rules.toml"
            default_format = "ed-note"
            "#,
        )
        .unwrap();
        assert_eq!(config.lexicon, Some(PathBuf::from("lex.toml")));
        assert_eq!(config.rules, Some(PathBuf::from("rules.toml")));
        assert_eq!(config.format(), NoteFormat::EdNote);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ScribeConfig::from_toml_str("lexicn = \"lex.toml\"").unwrap_err();
        assert!(matches!(err, MedscribeError::ConfigError { .. }));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = ScribeConfig::from_toml_str("default_format = \"haiku\"").unwrap_err();
        assert!(matches!(err, MedscribeError::ConfigError { .. }));
    }

    #[test]
    fn test_relative_paths_resolved_against_file() {
        let dir = std::env::temp_dir().join(format!("medscribe-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("medscribe.toml");
        std::fs::write(&path, "rules = \"red_flags.toml\"\n").unwrap();

        let config = ScribeConfig::from_file(&path).unwrap();
        assert_eq!(config.rules, Some(dir.join("red_flags.toml")));
        assert_eq!(config.lexicon, None);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ScribeConfig::from_file(Path::new("/nonexistent/medscribe.toml")).unwrap_err();
        assert!(matches!(err, MedscribeError::ConfigError { .. }));
    }
}
