//! Error types for the extension codec.

use thiserror::Error;

/// Errors that make an extension chain unreadable.
///
/// These fail the whole containing frame. Extensions that are readable but
/// unacceptable are not errors; see [`crate::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// The chain ended in the middle of an extension.
    #[error("extension truncated at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        /// Offset of the extension's length byte.
        offset: usize,
        /// Bytes the extension claims to occupy.
        needed: usize,
        /// Bytes remaining in the buffer.
        available: usize,
    },

    /// The length byte is smaller than the extension header.
    #[error("invalid extension length {length} at offset {offset}")]
    InvalidLength {
        /// Offset of the extension's length byte.
        offset: usize,
        /// The declared length.
        length: u8,
    },

    /// The extension does not fit its one-byte length field.
    #[error("extension of {length} bytes exceeds the 255-byte limit")]
    TooLong {
        /// Wire length the extension would need.
        length: usize,
    },
}

impl ExtensionError {
    /// Create a truncation error.
    pub fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        ExtensionError::Truncated {
            offset,
            needed,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtensionError::truncated(4, 18, 7);
        assert!(err.to_string().contains("offset 4"));
        assert!(err.to_string().contains("need 18"));
    }
}
