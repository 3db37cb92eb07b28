//! Validator settings loaded from TOML.
//!
//! ```toml
//! [validation]
//! unknown_fields = "warn"
//! max_issues = 50
//! parallel = false
//! ```
//!
//! Every key is optional; an empty file yields the defaults.

use std::path::Path;

use dossier_schema::{DossierError, DossierResult, ParseOptions, UnknownFields};
use serde::{Deserialize, Serialize};

/// Top-level layout of a settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub validation: ValidatorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorSettings {
    /// How fields outside a node's variant are treated while parsing.
    pub unknown_fields: UnknownFields,
    /// Cap on reported issues. 0 means unlimited.
    pub max_issues: usize,
    /// Check pages on the rayon pool.
    pub parallel: bool,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFields::Deny,
            max_issues: 0,
            parallel: true,
        }
    }
}

impl ValidatorSettings {
    /// Parse settings from a TOML string.
    ///
    /// Returns `DossierError::Config` if the TOML is malformed or names
    /// unknown keys.
    pub fn from_toml_str(s: &str) -> DossierResult<Self> {
        let file: SettingsFile = toml::from_str(s).map_err(|e| DossierError::Config {
            reason: format!("failed to parse settings TOML: {e}"),
        })?;
        Ok(file.validation)
    }

    /// Read the file at `path` and parse it as TOML settings.
    pub fn from_file(path: &Path) -> DossierResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DossierError::Config {
            reason: format!("failed to read settings file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            unknown_fields: self.unknown_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_use_defaults() {
        let settings = ValidatorSettings::from_toml_str("").unwrap();
        assert_eq!(settings, ValidatorSettings::default());
        assert_eq!(settings.unknown_fields, UnknownFields::Deny);
        assert!(settings.parallel);
    }

    #[test]
    fn settings_override_individual_keys() {
        let settings = ValidatorSettings::from_toml_str(
            r#"
            [validation]
            unknown_fields = "warn"
            max_issues = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.unknown_fields, UnknownFields::Warn);
        assert_eq!(settings.max_issues, 5);
        assert!(settings.parallel);
        assert_eq!(settings.parse_options().unknown_fields, UnknownFields::Warn);
    }

    #[test]
    fn malformed_settings_are_config_errors() {
        let err = ValidatorSettings::from_toml_str("[validation]\nunknown_fields = \"ignore\"").unwrap_err();
        assert!(matches!(err, DossierError::Config { .. }));

        let err = ValidatorSettings::from_toml_str("[validation]\nstrict = true").unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }

    #[test]
    fn missing_settings_file_is_a_config_error() {
        let err = ValidatorSettings::from_file(Path::new("/nonexistent/dossier.toml")).unwrap_err();
        assert!(matches!(err, DossierError::Config { reason } if reason.contains("dossier.toml")));
    }
}
