//! Codec configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for decoding and session handling.
///
/// All fields have defaults, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Deepest encapsulation nesting accepted on parse.
    pub max_encapsulation_depth: u8,
    /// How long a partial session may stay incomplete, in milliseconds.
    pub reassembly_timeout_ms: u64,
    /// How long to wait for the response to a request, in milliseconds.
    pub response_timeout_ms: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            max_encapsulation_depth: 6,
            reassembly_timeout_ms: 1_000,
            response_timeout_ms: 10_000,
        }
    }
}

impl CodecConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_encapsulation_depth == 0 {
            return Err(ConfigError::invalid("max_encapsulation_depth must be at least 1"));
        }
        if self.reassembly_timeout_ms == 0 || self.response_timeout_ms == 0 {
            return Err(ConfigError::invalid("timeouts must be non-zero"));
        }
        Ok(())
    }

    /// Partial session timeout.
    pub fn reassembly_timeout(&self) -> Duration {
        Duration::from_millis(self.reassembly_timeout_ms)
    }

    /// Response timeout.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(CodecConfig::from_yaml_str("{}").unwrap(), CodecConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let config = CodecConfig::from_yaml_str("reassembly_timeout_ms: 250\n").unwrap();
        assert_eq!(config.reassembly_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_encapsulation_depth, 6);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CodecConfig::from_yaml_str("max_encapsulation_depth: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CodecConfig::from_yaml_str("response_timeout_ms: nope\n"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
