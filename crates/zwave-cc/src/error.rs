//! Error types for zwave-cc.

use crate::frame::CcId;
use crate::numeric::ValueFormat;
use thiserror::Error;
use zwave_s2::ExtensionError;

/// Errors raised while turning received bytes into a [`Command`](crate::Command).
///
/// Every variant is scoped to the frame being decoded; a decode error never
/// affects other frames or other peers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame is too short to hold the CC header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Command payload is shorter than the fields it must carry.
    #[error("{cc} command 0x{command:02X} payload too short: expected at least {expected} bytes, got {actual}")]
    PayloadTooShort {
        /// Command class of the frame.
        cc: CcId,
        /// Command id of the frame.
        command: u8,
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// No inbound codec is registered for this (CC, command) pair.
    #[error("unrecognized frame: {cc} command 0x{command:02X}")]
    UnrecognizedFrame {
        /// Command class of the frame.
        cc: CcId,
        /// Command id of the frame.
        command: u8,
    },

    /// A field holds a value the command does not allow.
    #[error("invalid {field} in {cc} command 0x{command:02X}: {reason}")]
    InvalidField {
        /// Command class of the frame.
        cc: CcId,
        /// Command id of the frame.
        command: u8,
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Encapsulation nesting exceeds the configured depth.
    #[error("encapsulation nested deeper than {max} levels")]
    NestingTooDeep {
        /// Configured maximum depth.
        max: u8,
    },

    /// The Security 2 extension chain could not be read.
    #[error("security extension error: {0}")]
    Extension(#[from] ExtensionError),

    /// An unknown extension marked critical was received.
    #[error("command discarded: unknown critical security extension kind {kind}")]
    DiscardedByExtension {
        /// The unknown kind bits.
        kind: u8,
    },

    /// Fragments of a partial session could not be merged.
    #[error("cannot merge partial session: {0}")]
    Merge(String),
}

impl DecodeError {
    /// Create a payload-too-short error.
    pub fn too_short(cc: CcId, command: u8, expected: usize, actual: usize) -> Self {
        DecodeError::PayloadTooShort {
            cc,
            command,
            expected,
            actual,
        }
    }

    /// Create an invalid-field error.
    pub fn invalid(cc: CcId, command: u8, field: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::InvalidField {
            cc,
            command,
            field,
            reason: reason.into(),
        }
    }

    /// Short label used in metrics.
    pub fn reason_label(&self) -> &'static str {
        match self {
            DecodeError::FrameTooShort { .. } => "frame_too_short",
            DecodeError::PayloadTooShort { .. } => "payload_too_short",
            DecodeError::UnrecognizedFrame { .. } => "unrecognized",
            DecodeError::InvalidField { .. } => "invalid_field",
            DecodeError::NestingTooDeep { .. } => "nesting_too_deep",
            DecodeError::Extension(_) => "extension",
            DecodeError::DiscardedByExtension { .. } => "discarded_by_extension",
            DecodeError::Merge(_) => "merge",
        }
    }
}

/// Errors raised while building or serializing a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A numeric value does not fit its declared width and format.
    #[error("value {value} does not fit {size} byte(s) as {format}")]
    ValueOutOfRange {
        /// The rejected value.
        value: i64,
        /// Declared width in bytes.
        size: u8,
        /// Declared format.
        format: ValueFormat,
    },

    /// A numeric width the field does not allow.
    #[error("invalid value size {0}")]
    InvalidSize(u8),

    /// A command field outside its allowed range.
    #[error("{field} out of range: {value} (allowed {min}..={max})")]
    FieldOutOfRange {
        /// Field name.
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Smallest allowed value.
        min: i64,
        /// Largest allowed value.
        max: i64,
    },

    /// An encapsulated payload or list is too large for its length field.
    #[error("{field} too large: {size} (max {max})")]
    TooLarge {
        /// Field name.
        field: &'static str,
        /// Actual size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// The command cannot be built from the given input.
    #[error("invalid command: {0}")]
    Invalid(String),
}

impl EncodeError {
    /// Check `value` against an inclusive range.
    pub fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), Self> {
        if value < min || value > max {
            return Err(EncodeError::FieldOutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Check that a length fits a one-byte length field.
    pub fn check_len(field: &'static str, size: usize, max: usize) -> Result<(), Self> {
        if size > max {
            return Err(EncodeError::TooLarge { field, size, max });
        }
        Ok(())
    }
}

/// Errors raised while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The YAML could not be parsed.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration parsed but is inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid-configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DecodeError::too_short(CcId::CONFIGURATION, 0x06, 3, 1);
        let text = err.to_string();
        assert!(text.contains("Configuration"));
        assert!(text.contains("0x06"));
        assert!(text.contains("expected at least 3"));

        let err = EncodeError::ValueOutOfRange {
            value: 300,
            size: 1,
            format: ValueFormat::UnsignedInteger,
        };
        assert!(err.to_string().contains("300"));
    }

    #[test]
    fn test_check_range() {
        assert!(EncodeError::check_range("level", 99, 0, 99).is_ok());
        assert_eq!(
            EncodeError::check_range("level", 100, 0, 99),
            Err(EncodeError::FieldOutOfRange {
                field: "level",
                value: 100,
                min: 0,
                max: 99,
            })
        );
    }

    #[test]
    fn test_reason_labels_are_distinct() {
        let a = DecodeError::UnrecognizedFrame {
            cc: CcId::BASIC,
            command: 1,
        };
        let b = DecodeError::DiscardedByExtension { kind: 0x11 };
        assert_ne!(a.reason_label(), b.reason_label());
    }
}
