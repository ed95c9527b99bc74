//! Extension types and the single-extension wire codec.
//!
//! ## Extension Format
//!
//! | Field   | Size (bytes) | Description                                              |
//! |---------|--------------|----------------------------------------------------------|
//! | length  | 1            | Total extension length, including these two header bytes |
//! | flags   | 1            | bit7 more-to-follow, bit6 critical, bits0-5 kind         |
//! | payload | length - 2   | Kind-specific data                                       |

use crate::ExtensionError;
use rand::RngCore;

/// Size of the length + flags header.
pub const EXTENSION_HEADER_SIZE: usize = 2;

/// Flags bit: another extension follows this one.
pub const FLAG_MORE_TO_FOLLOW: u8 = 0x80;

/// Flags bit: the receiver must understand this extension.
pub const FLAG_CRITICAL: u8 = 0x40;

/// Mask for the kind bits of the flags byte.
pub const KIND_MASK: u8 = 0x3F;

/// Size of a sender/receiver entropy input.
pub const ENTROPY_SIZE: usize = 16;

/// Size of the multicast inner state.
pub const MPAN_STATE_SIZE: usize = 16;

/// Extension kind, from the low six bits of the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    /// Singlecast pre-agreed nonce (sender entropy input).
    Span,
    /// Multicast pre-agreed nonce (group inner state).
    Mpan,
    /// Multicast group id.
    Mgrp,
    /// Multicast out of sync; carries no payload.
    Mos,
    /// A kind this codec does not know.
    Unknown(u8),
}

impl ExtensionKind {
    /// Decode the kind bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & KIND_MASK {
            0x01 => ExtensionKind::Span,
            0x02 => ExtensionKind::Mpan,
            0x03 => ExtensionKind::Mgrp,
            0x04 => ExtensionKind::Mos,
            other => ExtensionKind::Unknown(other),
        }
    }

    /// Encode the kind bits.
    pub fn to_bits(self) -> u8 {
        match self {
            ExtensionKind::Span => 0x01,
            ExtensionKind::Mpan => 0x02,
            ExtensionKind::Mgrp => 0x03,
            ExtensionKind::Mos => 0x04,
            ExtensionKind::Unknown(bits) => bits & KIND_MASK,
        }
    }

    /// The fixed wire length of a known kind.
    pub fn fixed_length(self) -> Option<usize> {
        match self {
            ExtensionKind::Span => Some(EXTENSION_HEADER_SIZE + ENTROPY_SIZE),
            ExtensionKind::Mpan => Some(EXTENSION_HEADER_SIZE + 1 + MPAN_STATE_SIZE),
            ExtensionKind::Mgrp => Some(EXTENSION_HEADER_SIZE + 1),
            ExtensionKind::Mos => Some(EXTENSION_HEADER_SIZE),
            ExtensionKind::Unknown(_) => None,
        }
    }

    /// Whether the kind is sent with the critical bit set.
    pub fn is_critical(self) -> bool {
        !matches!(self, ExtensionKind::Mos | ExtensionKind::Unknown(_))
    }

    /// Whether the kind is only valid inside the encrypted section.
    pub fn requires_encryption(self) -> bool {
        matches!(self, ExtensionKind::Mpan)
    }

    /// Label used in logs and metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            ExtensionKind::Span => "span",
            ExtensionKind::Mpan => "mpan",
            ExtensionKind::Mgrp => "mgrp",
            ExtensionKind::Mos => "mos",
            ExtensionKind::Unknown(_) => "unknown",
        }
    }
}

/// An extension exactly as read off the wire, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtension {
    /// Extension kind.
    pub kind: ExtensionKind,
    /// Critical flag.
    pub critical: bool,
    /// More-to-follow flag.
    pub more_to_follow: bool,
    /// Payload bytes after the header.
    pub payload: Vec<u8>,
}

impl RawExtension {
    /// Decode one extension starting at `offset`.
    ///
    /// Returns the extension and the number of bytes it occupies.
    pub fn decode_at(data: &[u8], offset: usize) -> Result<(RawExtension, usize), ExtensionError> {
        let available = data.len().saturating_sub(offset);
        if available < EXTENSION_HEADER_SIZE {
            return Err(ExtensionError::truncated(offset, EXTENSION_HEADER_SIZE, available));
        }

        let length = data[offset];
        if (length as usize) < EXTENSION_HEADER_SIZE {
            return Err(ExtensionError::InvalidLength { offset, length });
        }
        let length = length as usize;
        if length > available {
            return Err(ExtensionError::truncated(offset, length, available));
        }

        let flags = data[offset + 1];
        let raw = RawExtension {
            kind: ExtensionKind::from_bits(flags),
            critical: flags & FLAG_CRITICAL != 0,
            more_to_follow: flags & FLAG_MORE_TO_FOLLOW != 0,
            payload: data[offset + EXTENSION_HEADER_SIZE..offset + length].to_vec(),
        };

        Ok((raw, length))
    }

    /// Total wire length of this extension.
    pub fn wire_length(&self) -> usize {
        EXTENSION_HEADER_SIZE + self.payload.len()
    }

    /// Append the wire form to `buf`.
    ///
    /// Fails when the extension does not fit its one-byte length field.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), ExtensionError> {
        if self.wire_length() > usize::from(u8::MAX) {
            return Err(ExtensionError::TooLong {
                length: self.wire_length(),
            });
        }
        self.write(buf);
        Ok(())
    }

    /// Append the wire form of an extension known to fit.
    pub(crate) fn write(&self, buf: &mut Vec<u8>) {
        let mut flags = self.kind.to_bits();
        if self.more_to_follow {
            flags |= FLAG_MORE_TO_FOLLOW;
        }
        if self.critical {
            flags |= FLAG_CRITICAL;
        }
        buf.push(self.wire_length() as u8);
        buf.push(flags);
        buf.extend_from_slice(&self.payload);
    }
}

/// An interpreted Security 2 extension.
#[derive(Clone, PartialEq, Eq)]
pub enum Security2Extension {
    /// Sender entropy input for the singlecast nonce.
    Span {
        /// 16-byte sender entropy.
        sender_entropy: [u8; ENTROPY_SIZE],
    },
    /// Multicast group inner state. Key material.
    Mpan {
        /// Multicast group id.
        group_id: u8,
        /// 16-byte inner state.
        inner_state: [u8; MPAN_STATE_SIZE],
    },
    /// Multicast group id the frame follows up on.
    Mgrp {
        /// Multicast group id.
        group_id: u8,
    },
    /// Multicast out of sync.
    Mos,
}

impl Security2Extension {
    /// Create a session entropy extension with fresh random entropy.
    pub fn random_span() -> Self {
        let mut sender_entropy = [0u8; ENTROPY_SIZE];
        rand::thread_rng().fill_bytes(&mut sender_entropy);
        Security2Extension::Span { sender_entropy }
    }

    /// The extension kind.
    pub fn kind(&self) -> ExtensionKind {
        match self {
            Security2Extension::Span { .. } => ExtensionKind::Span,
            Security2Extension::Mpan { .. } => ExtensionKind::Mpan,
            Security2Extension::Mgrp { .. } => ExtensionKind::Mgrp,
            Security2Extension::Mos => ExtensionKind::Mos,
        }
    }

    /// Interpret a raw extension of a known kind.
    ///
    /// Returns `None` for unknown kinds and for known kinds whose length does
    /// not match the fixed length of that kind.
    pub fn interpret(raw: &RawExtension) -> Option<Self> {
        if raw.kind.fixed_length() != Some(raw.wire_length()) {
            return None;
        }

        let payload = raw.payload.as_slice();
        match raw.kind {
            ExtensionKind::Span => {
                let mut sender_entropy = [0u8; ENTROPY_SIZE];
                sender_entropy.copy_from_slice(payload);
                Some(Security2Extension::Span { sender_entropy })
            }
            ExtensionKind::Mpan => {
                let mut inner_state = [0u8; MPAN_STATE_SIZE];
                inner_state.copy_from_slice(&payload[1..]);
                Some(Security2Extension::Mpan {
                    group_id: payload[0],
                    inner_state,
                })
            }
            ExtensionKind::Mgrp => Some(Security2Extension::Mgrp {
                group_id: payload[0],
            }),
            ExtensionKind::Mos => Some(Security2Extension::Mos),
            ExtensionKind::Unknown(_) => None,
        }
    }

    /// Convert to the raw wire representation.
    pub fn to_raw(&self, more_to_follow: bool) -> RawExtension {
        let payload = match self {
            Security2Extension::Span { sender_entropy } => sender_entropy.to_vec(),
            Security2Extension::Mpan {
                group_id,
                inner_state,
            } => {
                let mut payload = Vec::with_capacity(1 + MPAN_STATE_SIZE);
                payload.push(*group_id);
                payload.extend_from_slice(inner_state);
                payload
            }
            Security2Extension::Mgrp { group_id } => vec![*group_id],
            Security2Extension::Mos => Vec::new(),
        };

        RawExtension {
            kind: self.kind(),
            critical: self.kind().is_critical(),
            more_to_follow,
            payload,
        }
    }
}

// Inner state is key material and never goes to logs.
impl std::fmt::Debug for Security2Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Security2Extension::Span { sender_entropy } => f
                .debug_struct("Span")
                .field("sender_entropy", &hex::encode(sender_entropy))
                .finish(),
            Security2Extension::Mpan { group_id, .. } => f
                .debug_struct("Mpan")
                .field("group_id", group_id)
                .field("inner_state", &"<redacted>")
                .finish(),
            Security2Extension::Mgrp { group_id } => {
                f.debug_struct("Mgrp").field("group_id", group_id).finish()
            }
            Security2Extension::Mos => f.write_str("Mos"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_span() {
        let mut data = vec![18, 0x41];
        data.extend_from_slice(&[0xAB; 16]);

        let (raw, len) = RawExtension::decode_at(&data, 0).unwrap();
        assert_eq!(len, 18);
        assert_eq!(raw.kind, ExtensionKind::Span);
        assert!(raw.critical);
        assert!(!raw.more_to_follow);

        let ext = Security2Extension::interpret(&raw).unwrap();
        assert_eq!(
            ext,
            Security2Extension::Span {
                sender_entropy: [0xAB; 16]
            }
        );
    }

    #[test]
    fn test_flags_byte_layout() {
        let raw = Security2Extension::Mgrp { group_id: 9 }.to_raw(true);
        let mut buf = Vec::new();
        raw.encode_into(&mut buf).unwrap();
        assert_eq!(buf, vec![3, 0x80 | 0x40 | 0x03, 9]);

        let raw = Security2Extension::Mos.to_raw(false);
        let mut buf = Vec::new();
        raw.encode_into(&mut buf).unwrap();
        assert_eq!(buf, vec![2, 0x04]);
    }

    #[test]
    fn test_oversized_raw_extension_rejected() {
        let mut raw = Security2Extension::Mos.to_raw(false);
        raw.payload = vec![0; 253];
        let mut buf = Vec::new();
        raw.encode_into(&mut buf).unwrap();
        assert_eq!(buf[0], 255);

        raw.payload.push(0);
        let mut buf = Vec::new();
        assert_eq!(
            raw.encode_into(&mut buf),
            Err(ExtensionError::TooLong { length: 256 })
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_wrong_length_is_not_interpreted() {
        // MGRP with two payload bytes instead of one
        let data = [4, 0x43, 1, 2];
        let (raw, _) = RawExtension::decode_at(&data, 0).unwrap();
        assert_eq!(raw.kind, ExtensionKind::Mgrp);
        assert!(Security2Extension::interpret(&raw).is_none());
    }

    #[test]
    fn test_length_below_header_rejected() {
        let data = [1, 0x04];
        assert_eq!(
            RawExtension::decode_at(&data, 0),
            Err(ExtensionError::InvalidLength { offset: 0, length: 1 })
        );
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let data = [18, 0x41, 0, 0, 0];
        assert!(matches!(
            RawExtension::decode_at(&data, 0),
            Err(ExtensionError::Truncated { needed: 18, available: 5, .. })
        ));
    }

    #[test]
    fn test_mpan_debug_redacts_state() {
        let ext = Security2Extension::Mpan {
            group_id: 2,
            inner_state: [0x55; 16],
        };
        let rendered = format!("{:?}", ext);
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains("55"));
    }

    #[test]
    fn test_random_span_differs() {
        assert_ne!(Security2Extension::random_span(), Security2Extension::random_span());
    }
}
