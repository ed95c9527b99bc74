//! Static device configuration files.
//!
//! A device file describes configuration parameters the way the
//! manufacturer documents them. When a parameter is defined here, the file
//! wins: metadata the device reports for that parameter is ignored.
//!
//! ```yaml
//! label: ZW100 MultiSensor 6
//! manufacturer_id: 0x0086
//! param_information:
//!   - parameter: 4
//!     label: Motion sensitivity
//!     value_size: 1
//!     min_value: 0
//!     max_value: 5
//!     default_value: 5
//!   - parameter: 101
//!     value_bit_mask: 0xF0
//!     label: Group 1 report flags
//!     value_size: 4
//!     min_value: 0
//!     max_value: 15
//!     default_value: 0
//!     format: unsigned_integer
//! ```

use crate::error::ConfigError;
use crate::frame::CcId;
use crate::numeric::{value_range, ValueFormat};
use crate::values::{ValueId, ValueMetadata};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// One named option of an enumerated parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamOption {
    /// Display label.
    pub label: String,
    /// Wire value.
    pub value: i64,
}

/// Metadata for one configuration parameter, or one bit-masked part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInformation {
    /// Parameter number.
    pub parameter: u16,
    /// Bits of the parameter this entry covers; absent for whole parameters.
    #[serde(default)]
    pub value_bit_mask: Option<u32>,
    /// Display label.
    pub label: String,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit of the value.
    #[serde(default)]
    pub unit: Option<String>,
    /// Width of the whole parameter in bytes.
    pub value_size: u8,
    /// Smallest allowed value.
    pub min_value: i64,
    /// Largest allowed value.
    pub max_value: i64,
    /// Factory default.
    pub default_value: i64,
    /// Value format.
    #[serde(default)]
    pub format: ValueFormat,
    /// The parameter cannot be written.
    #[serde(default)]
    pub read_only: bool,
    /// The parameter cannot be read back.
    #[serde(default)]
    pub write_only: bool,
    /// Values outside `options` may be entered.
    #[serde(default)]
    pub allow_manual_entry: Option<bool>,
    /// Named values.
    #[serde(default)]
    pub options: Vec<ParamOption>,
}

impl ParamInformation {
    /// Value id this entry describes.
    pub fn value_id(&self) -> ValueId {
        let id = ValueId::new(CcId::CONFIGURATION, u32::from(self.parameter));
        match self.value_bit_mask {
            Some(mask) => id.with_key(mask),
            None => id,
        }
    }

    /// Value metadata for this entry.
    pub fn to_metadata(&self) -> ValueMetadata {
        let mut meta = ValueMetadata::number()
            .with_label(self.label.clone())
            .with_range(self.min_value, self.max_value)
            .with_encoding(self.value_size, self.format);
        meta.description = self.description.clone();
        meta.unit = self.unit.clone();
        meta.default = Some(self.default_value);
        meta.readable = !self.write_only;
        meta.writeable = !self.read_only;
        meta.states = self
            .options
            .iter()
            .map(|opt| (opt.value, opt.label.clone()))
            .collect::<BTreeMap<_, _>>();
        meta.allow_manual_entry = Some(self.allow_manual_entry.unwrap_or(self.options.is_empty()));
        meta.from_config = true;
        meta
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let context = || format!("parameter {}", self.parameter);

        if !matches!(self.value_size, 1 | 2 | 4) {
            return Err(ConfigError::invalid(format!(
                "{}: value_size must be 1, 2 or 4, got {}",
                context(),
                self.value_size
            )));
        }
        if self.min_value > self.max_value {
            return Err(ConfigError::invalid(format!(
                "{}: min_value {} > max_value {}",
                context(),
                self.min_value,
                self.max_value
            )));
        }
        if self.value_bit_mask.is_none() {
            let (lo, hi) = value_range(self.value_size, self.format);
            if self.min_value < lo || self.max_value > hi {
                return Err(ConfigError::invalid(format!(
                    "{}: range {}..={} does not fit {} byte(s) as {}",
                    context(),
                    self.min_value,
                    self.max_value,
                    self.value_size,
                    self.format
                )));
            }
        }
        if self.value_bit_mask == Some(0) {
            return Err(ConfigError::invalid(format!("{}: value_bit_mask is empty", context())));
        }
        if self.read_only && self.write_only {
            return Err(ConfigError::invalid(format!(
                "{}: cannot be both read_only and write_only",
                context()
            )));
        }
        Ok(())
    }
}

/// A device configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device label.
    pub label: Option<String>,
    /// Manufacturer id.
    pub manufacturer_id: Option<u16>,
    /// Product type.
    pub product_type: Option<u16>,
    /// Product id.
    pub product_id: Option<u16>,
    /// Parameter definitions.
    pub param_information: Vec<ParamInformation>,
}

impl DeviceConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: DeviceConfig = serde_yaml::from_str(yaml)?;
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

    /// Check every entry and the relationships between them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let mut whole = HashSet::new();
        let mut partial = HashSet::new();

        for info in &self.param_information {
            info.validate()?;
            if !seen.insert((info.parameter, info.value_bit_mask)) {
                return Err(ConfigError::invalid(format!(
                    "parameter {} is defined twice",
                    info.parameter
                )));
            }
            match info.value_bit_mask {
                Some(_) => partial.insert(info.parameter),
                None => whole.insert(info.parameter),
            };
        }

        if let Some(param) = whole.intersection(&partial).next() {
            return Err(ConfigError::invalid(format!(
                "parameter {} is defined both whole and bit-masked",
                param
            )));
        }
        Ok(())
    }

    /// Whether the file defines `parameter` in any form.
    pub fn has_param(&self, parameter: u16) -> bool {
        self.param_information.iter().any(|p| p.parameter == parameter)
    }

    /// The whole-parameter entry for `parameter`.
    pub fn param(&self, parameter: u16) -> Option<&ParamInformation> {
        self.param_information
            .iter()
            .find(|p| p.parameter == parameter && p.value_bit_mask.is_none())
    }

    /// The bit-masked entries for `parameter`, ordered by mask.
    pub fn partial_params(&self, parameter: u16) -> Vec<&ParamInformation> {
        let mut parts: Vec<_> = self
            .param_information
            .iter()
            .filter(|p| p.parameter == parameter && p.value_bit_mask.is_some())
            .collect();
        parts.sort_by_key(|p| p.value_bit_mask);
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
label: Test dimmer
manufacturer_id: 0x0086
param_information:
  - parameter: 4
    label: Motion sensitivity
    value_size: 1
    min_value: 0
    max_value: 5
    default_value: 5
    options:
      - label: "Off"
        value: 0
      - label: Max
        value: 5
  - parameter: 101
    value_bit_mask: 0x0F
    label: Low nibble
    value_size: 1
    min_value: 0
    max_value: 15
    default_value: 3
    format: unsigned_integer
  - parameter: 101
    value_bit_mask: 0xF0
    label: High nibble
    value_size: 1
    min_value: 0
    max_value: 15
    default_value: 0
    format: unsigned_integer
"#;

    #[test]
    fn test_load_and_lookup() {
        let config = DeviceConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.manufacturer_id, Some(0x0086));
        assert!(config.has_param(4));
        assert!(config.has_param(101));
        assert!(!config.has_param(5));
        assert!(config.param(101).is_none());

        let parts = config.partial_params(101);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].value_bit_mask, Some(0x0F));
        assert_eq!(parts[1].value_id(), ValueId::new(CcId::CONFIGURATION, 101u32).with_key(0xF0u32));
    }

    #[test]
    fn test_metadata_from_entry() {
        let config = DeviceConfig::from_yaml_str(YAML).unwrap();
        let meta = config.param(4).unwrap().to_metadata();
        assert!(meta.from_config);
        assert_eq!(meta.label.as_deref(), Some("Motion sensitivity"));
        assert_eq!(meta.states.get(&5).map(String::as_str), Some("Max"));
        assert_eq!(meta.allow_manual_entry, Some(false));
        assert_eq!(meta.default, Some(5));
    }

    #[test]
    fn test_rejects_bad_entries() {
        let bad_size = YAML.replace(
            "value_size: 1\n    min_value: 0\n    max_value: 5",
            "value_size: 3\n    min_value: 0\n    max_value: 5",
        );
        assert!(matches!(DeviceConfig::from_yaml_str(&bad_size), Err(ConfigError::Invalid(_))));

        let out_of_range = YAML.replace("max_value: 5\n", "max_value: 500\n");
        assert!(matches!(DeviceConfig::from_yaml_str(&out_of_range), Err(ConfigError::Invalid(_))));

        let mixed = format!(
            "{}  - parameter: 101\n    label: Whole\n    value_size: 1\n    min_value: 0\n    max_value: 1\n    default_value: 0\n",
            YAML
        );
        assert!(matches!(DeviceConfig::from_yaml_str(&mixed), Err(ConfigError::Invalid(_))));
    }
}
