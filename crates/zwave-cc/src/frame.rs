//! Wire frame header and peer addressing.
//!
//! ## Frame Format
//!
//! | Field   | Size (bytes) | Description                                   |
//! |---------|--------------|-----------------------------------------------|
//! | cc id   | 1 or 2       | Command class; ids from 0xF1 on take 2 bytes  |
//! | command | 1            | Command id within the command class           |
//! | payload | variable     | Command-specific fields                       |

use crate::constants::EXTENDED_CC_MARKER;
use crate::error::DecodeError;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A command class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CcId(pub u16);

impl CcId {
    /// Basic.
    pub const BASIC: CcId = CcId(0x20);
    /// Scene Actuator Configuration.
    pub const SCENE_ACTUATOR_CONF: CcId = CcId(0x2C);
    /// Color Switch.
    pub const COLOR_SWITCH: CcId = CcId(0x33);
    /// Multi Channel.
    pub const MULTI_CHANNEL: CcId = CcId(0x60);
    /// Supervision.
    pub const SUPERVISION: CcId = CcId(0x6C);
    /// Configuration.
    pub const CONFIGURATION: CcId = CcId(0x70);
    /// Multi Command.
    pub const MULTI_COMMAND: CcId = CcId(0x8F);
    /// Security 2.
    pub const SECURITY_2: CcId = CcId(0x9F);

    /// Whether this id takes two bytes on the wire.
    pub fn is_extended(self) -> bool {
        self.0 > 0xFF
    }

    /// Human-readable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            CcId::BASIC => "Basic",
            CcId::SCENE_ACTUATOR_CONF => "Scene Actuator Configuration",
            CcId::COLOR_SWITCH => "Color Switch",
            CcId::MULTI_CHANNEL => "Multi Channel",
            CcId::SUPERVISION => "Supervision",
            CcId::CONFIGURATION => "Configuration",
            CcId::MULTI_COMMAND => "Multi Command",
            CcId::SECURITY_2 => "Security 2",
            _ => "Unknown",
        }
    }

    /// Append the wire form of the id.
    pub fn put(self, buf: &mut impl BufMut) {
        if self.is_extended() {
            buf.put_u16(self.0);
        } else {
            buf.put_u8(self.0 as u8);
        }
    }
}

impl fmt::Display for CcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extended() {
            write!(f, "{} (0x{:04X})", self.name(), self.0)
        } else {
            write!(f, "{} (0x{:02X})", self.name(), self.0)
        }
    }
}

/// The node (and endpoint) a frame came from or goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerAddress {
    /// Node id.
    pub node_id: u16,
    /// Endpoint; 0 is the root device.
    pub endpoint: u8,
}

impl PeerAddress {
    /// Address the root device of a node.
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id,
            endpoint: 0,
        }
    }

    /// Same node, different endpoint.
    pub fn with_endpoint(self, endpoint: u8) -> Self {
        Self { endpoint, ..self }
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.endpoint == 0 {
            write!(f, "node {}", self.node_id)
        } else {
            write!(f, "node {}.{}", self.node_id, self.endpoint)
        }
    }
}

/// A received frame with its header split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    cc_id: CcId,
    command: u8,
    payload: Bytes,
    peer: PeerAddress,
}

impl Frame {
    /// Create a frame from its parts.
    pub fn new(cc_id: CcId, command: u8, payload: impl Into<Bytes>, peer: PeerAddress) -> Self {
        Self {
            cc_id,
            command,
            payload: payload.into(),
            peer,
        }
    }

    /// Split the CC header off raw frame bytes.
    pub fn parse(data: &[u8], peer: PeerAddress) -> Result<Self, DecodeError> {
        let header_len = match data.first() {
            Some(&first) if first >= EXTENDED_CC_MARKER => 3,
            _ => 2,
        };
        if data.len() < header_len {
            return Err(DecodeError::FrameTooShort {
                expected: header_len,
                actual: data.len(),
            });
        }

        let cc_id = if header_len == 3 {
            CcId(u16::from_be_bytes([data[0], data[1]]))
        } else {
            CcId(data[0] as u16)
        };

        Ok(Self {
            cc_id,
            command: data[header_len - 1],
            payload: Bytes::copy_from_slice(&data[header_len..]),
            peer,
        })
    }

    /// Encode header and payload.
    pub fn encode(&self) -> Vec<u8> {
        encode_frame(self.cc_id, self.command, &self.payload)
    }

    /// Command class id.
    pub fn cc_id(&self) -> CcId {
        self.cc_id
    }

    /// Command id.
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Payload after the header.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Sender or recipient.
    pub fn peer(&self) -> PeerAddress {
        self.peer
    }
}

/// Encode a CC header followed by `payload`.
pub fn encode_frame(cc_id: CcId, command: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(3 + payload.len());
    cc_id.put(&mut buf);
    buf.put_u8(command);
    buf.put_slice(payload);
    buf.to_vec()
}
