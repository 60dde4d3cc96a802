//! Editor configuration.
//!
//! # Responsibility
//! - Carry tunables the host may override at mount time.
//!
//! # Invariants
//! - A validated config has non-zero lookbehind and content cap.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::input_rule::DEFAULT_LOOKBEHIND;

/// Initial content larger than this falls back to the empty document.
pub const DEFAULT_MAX_INITIAL_CONTENT_BYTES: usize = 1024 * 1024;

/// Per-editor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether typed text is checked against input rules.
    pub input_rules_enabled: bool,
    /// Characters before the cursor visible to input rule patterns.
    pub input_rule_lookbehind: usize,
    /// Upper bound for the initial HTML content, in bytes.
    pub max_initial_content_bytes: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            input_rules_enabled: true,
            input_rule_lookbehind: DEFAULT_LOOKBEHIND,
            max_initial_content_bytes: DEFAULT_MAX_INITIAL_CONTENT_BYTES,
        }
    }
}

/// Config validation or decoding failure.
#[derive(Debug)]
pub enum ConfigError {
    /// JSON could not be decoded.
    Decode(serde_json::Error),
    /// Field holds a value outside its accepted range.
    InvalidValue {
        field: &'static str,
        message: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "invalid editor config: {err}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid editor config field `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl EditorConfig {
    /// Decodes a config from JSON; missing fields keep their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_rule_lookbehind == 0 {
            return Err(ConfigError::InvalidValue {
                field: "input_rule_lookbehind",
                message: "must be greater than zero",
            });
        }
        if self.max_initial_content_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_initial_content_bytes",
                message: "must be greater than zero",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EditorConfig};

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            EditorConfig::from_json_str(r#"{"input_rules_enabled": false}"#).expect("valid config");
        assert!(!config.input_rules_enabled);
        assert_eq!(
            config.input_rule_lookbehind,
            EditorConfig::default().input_rule_lookbehind
        );
    }

    #[test]
    fn zero_lookbehind_is_rejected() {
        let err = EditorConfig::from_json_str(r#"{"input_rule_lookbehind": 0}"#)
            .expect_err("zero lookbehind");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "input_rule_lookbehind",
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(
            EditorConfig::from_json_str("{"),
            Err(ConfigError::Decode(_))
        ));
    }
}
