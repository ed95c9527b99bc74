//! Value metadata.

use crate::numeric::ValueFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What kind of value a [`ValueMetadata`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Integer.
    #[default]
    Number,
    /// Boolean.
    Boolean,
    /// Text.
    String,
    /// Transition duration.
    Duration,
    /// Raw bytes.
    Buffer,
    /// Anything; used for internal bookkeeping values.
    Any,
}

/// Describes a stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueMetadata {
    /// Value type.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// The value can be read from the device.
    pub readable: bool,
    /// The value can be written to the device.
    pub writeable: bool,
    /// Short human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit of the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Smallest allowed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    /// Largest allowed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
    /// Names of enumerated states.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub states: BTreeMap<i64, String>,
    /// Width of the value on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_size: Option<u8>,
    /// Format of the value on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    /// Values outside `states` may be entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_manual_entry: Option<bool>,
    /// Defined by a device configuration file rather than the device.
    pub from_config: bool,
}

impl ValueMetadata {
    fn of(value_type: ValueType) -> Self {
        Self {
            value_type,
            readable: true,
            writeable: true,
            ..Default::default()
        }
    }

    /// Readable and writeable number.
    pub fn number() -> Self {
        Self::of(ValueType::Number)
    }

    /// Read-only number.
    pub fn read_only_number() -> Self {
        Self::number().read_only()
    }

    /// Read-only duration.
    pub fn read_only_duration() -> Self {
        Self::of(ValueType::Duration).read_only()
    }

    /// Readable and writeable duration.
    pub fn duration() -> Self {
        Self::of(ValueType::Duration)
    }

    /// Readable and writeable boolean.
    pub fn boolean() -> Self {
        Self::of(ValueType::Boolean)
    }

    /// Value used for internal bookkeeping only.
    pub fn internal() -> Self {
        Self {
            value_type: ValueType::Any,
            readable: false,
            writeable: false,
            ..Default::default()
        }
    }

    /// Level in percent steps, 0 to 99.
    pub fn level() -> Self {
        Self::number().with_range(0, 99)
    }

    /// Clear the writeable flag.
    pub fn read_only(mut self) -> Self {
        self.writeable = false;
        self
    }

    /// Clear the readable flag.
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the allowed range.
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Set the wire width and format.
    pub fn with_encoding(mut self, value_size: u8, format: ValueFormat) -> Self {
        self.value_size = Some(value_size);
        self.format = Some(format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let meta = ValueMetadata::level().with_label("Level (5)").read_only();
        assert_eq!(meta.value_type, ValueType::Number);
        assert!(meta.readable);
        assert!(!meta.writeable);
        assert_eq!(meta.min, Some(0));
        assert_eq!(meta.max, Some(99));
        assert_eq!(meta.label.as_deref(), Some("Level (5)"));
        assert!(!meta.from_config);
    }

    #[test]
    fn test_yaml_defaults() {
        let meta: ValueMetadata = serde_yaml::from_str("type: number\nmin: 1\nmax: 10\n").unwrap();
        assert_eq!(meta.min, Some(1));
        assert!(meta.states.is_empty());
        assert!(!meta.readable);
    }
}
