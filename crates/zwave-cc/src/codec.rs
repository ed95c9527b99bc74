//! The per-command codec contract.
//!
//! A command type implements [`CcCommand`] for its identity and then one or
//! both of the direction traits. Commands a controller only ever sends
//! (gets, sets) implement [`SerializeCommand`] alone; commands it receives
//! implement [`ParseCommand`] as well. A type without `ParseCommand` cannot
//! be registered as inbound, so receiving it surfaces as an unrecognized
//! frame.

use crate::command::Command;
use crate::config::CodecConfig;
use crate::error::{DecodeError, EncodeError};
use crate::frame::{CcId, PeerAddress};
use crate::registry::CodecRegistry;
use std::collections::HashMap;

/// Negotiated command class versions of one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcVersions {
    default: u8,
    versions: HashMap<CcId, u8>,
}

impl Default for CcVersions {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CcVersions {
    /// Assume `default` for every command class not set explicitly.
    pub fn new(default: u8) -> Self {
        Self {
            default,
            versions: HashMap::new(),
        }
    }

    /// Set the version of one command class.
    pub fn with(mut self, cc: CcId, version: u8) -> Self {
        self.versions.insert(cc, version);
        self
    }

    /// Set the version of one command class in place.
    pub fn set(&mut self, cc: CcId, version: u8) {
        self.versions.insert(cc, version);
    }

    /// Version of `cc`.
    pub fn get(&self, cc: CcId) -> u8 {
        self.versions.get(&cc).copied().unwrap_or(self.default)
    }
}

/// Everything a parser may consult besides the payload.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Registry used for encapsulated frames.
    pub registry: &'a CodecRegistry,
    /// Versions negotiated with the sender.
    pub versions: &'a CcVersions,
    /// Sender of the frame.
    pub peer: PeerAddress,
    /// Whether the transport decrypted the frame.
    pub decrypted: bool,
    /// Nesting depth of the frame being parsed; 0 for the outermost.
    pub depth: u8,
    /// Deepest nesting accepted.
    pub max_depth: u8,
}

impl<'a> ParseContext<'a> {
    /// Context for an outermost frame from `peer`.
    pub fn new(registry: &'a CodecRegistry, versions: &'a CcVersions, peer: PeerAddress) -> Self {
        Self {
            registry,
            versions,
            peer,
            decrypted: false,
            depth: 0,
            max_depth: CodecConfig::default().max_encapsulation_depth,
        }
    }

    /// Apply the limits from `config`.
    pub fn with_config(mut self, config: &CodecConfig) -> Self {
        self.max_depth = config.max_encapsulation_depth;
        self
    }

    /// Set the was-decrypted flag.
    pub fn with_decrypted(mut self, decrypted: bool) -> Self {
        self.decrypted = decrypted;
        self
    }

    /// Negotiated version of `cc`.
    pub fn version(&self, cc: CcId) -> u8 {
        self.versions.get(cc)
    }

    /// Decode a frame embedded in the payload being parsed.
    ///
    /// `peer` is the address the inner frame is attributed to; encapsulations
    /// that address endpoints pass the source endpoint here.
    pub fn decode_encapsulated(&self, data: &[u8], peer: PeerAddress) -> Result<Command, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::NestingTooDeep { max: self.max_depth });
        }
        let inner = ParseContext {
            peer,
            depth: self.depth + 1,
            ..*self
        };
        self.registry.decode_bytes(data, &inner)
    }
}

/// Everything a serializer may consult besides the command.
#[derive(Debug, Clone, Copy)]
pub struct SerializeContext<'a> {
    /// Versions negotiated with the recipient.
    pub versions: &'a CcVersions,
}

impl<'a> SerializeContext<'a> {
    /// Context for a recipient with `versions`.
    pub fn new(versions: &'a CcVersions) -> Self {
        Self { versions }
    }

    /// Negotiated version of `cc`.
    pub fn version(&self, cc: CcId) -> u8 {
        self.versions.get(cc)
    }
}

/// Identity of a concrete command.
pub trait CcCommand {
    /// Command class id.
    const CC_ID: CcId;
    /// Command id.
    const COMMAND: u8;
    /// Name for logs.
    const NAME: &'static str;

    /// Fail with a scoped error when `payload` is shorter than `expected`.
    fn require_len(payload: &[u8], expected: usize) -> Result<(), DecodeError> {
        if payload.len() < expected {
            return Err(DecodeError::too_short(
                Self::CC_ID,
                Self::COMMAND,
                expected,
                payload.len(),
            ));
        }
        Ok(())
    }

    /// Scoped invalid-field error.
    fn invalid(field: &'static str, reason: impl Into<String>) -> DecodeError {
        DecodeError::invalid(Self::CC_ID, Self::COMMAND, field, reason)
    }
}

/// A command that can be received.
pub trait ParseCommand: CcCommand + Sized {
    /// Parse the payload after the CC header.
    fn parse(payload: &[u8], ctx: &ParseContext<'_>) -> Result<Self, DecodeError>;
}

/// A command that can be sent.
pub trait SerializeCommand: CcCommand {
    /// Serialize the payload after the CC header.
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError>;
}
