//! The codec registry: a static table from (CC id, command id) to codec.
//!
//! The table is built once at startup and only read afterwards.
//!
//! ```rust
//! use zwave_cc::cc::scene_actuator_conf::{SceneActuatorConfGet, SceneActuatorConfReport};
//! use zwave_cc::{CcVersions, CodecRegistry, Command, ParseContext, PeerAddress};
//!
//! let registry = CodecRegistry::builder()
//!     .inbound::<SceneActuatorConfReport>()
//!     .outbound::<SceneActuatorConfGet>()
//!     .build();
//!
//! let versions = CcVersions::default();
//! let ctx = ParseContext::new(&registry, &versions, PeerAddress::new(5));
//! let cmd = registry.decode_bytes(&[0x2C, 0x03, 5, 99, 0x03], &ctx).unwrap();
//! assert!(matches!(cmd, Command::SceneActuatorConfReport(_)));
//!
//! // Gets are never received
//! assert!(registry.decode_bytes(&[0x2C, 0x02, 5], &ctx).is_err());
//! ```

use crate::cc;
use crate::codec::{ParseCommand, ParseContext, SerializeCommand};
use crate::command::Command;
use crate::error::DecodeError;
use crate::frame::{CcId, Frame};
use std::collections::HashMap;
use tracing::{debug, trace};
use zwave_metrics::{metric_defs, metrics, MetricLabels};

/// Parses a payload into a [`Command`].
pub type ParseFn = fn(&[u8], &ParseContext<'_>) -> Result<Command, DecodeError>;

/// What the registry knows about one (CC id, command id) pair.
#[derive(Clone, Copy)]
pub struct CodecEntry {
    /// Command name.
    pub name: &'static str,
    /// Parser, for commands that can be received.
    pub parse: Option<ParseFn>,
    /// Whether the command can be sent.
    pub outbound: bool,
}

impl std::fmt::Debug for CodecEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecEntry")
            .field("name", &self.name)
            .field("inbound", &self.parse.is_some())
            .field("outbound", &self.outbound)
            .finish()
    }
}

fn parse_as<T: ParseCommand + Into<Command>>(
    payload: &[u8],
    ctx: &ParseContext<'_>,
) -> Result<Command, DecodeError> {
    T::parse(payload, ctx).map(Into::into)
}

/// Builder for [`CodecRegistry`].
#[derive(Debug, Default)]
pub struct CodecRegistryBuilder {
    entries: HashMap<(CcId, u8), CodecEntry>,
}

impl CodecRegistryBuilder {
    fn entry<T: SerializeCommand>(&mut self) -> &mut CodecEntry {
        self.entries.entry((T::CC_ID, T::COMMAND)).or_insert(CodecEntry {
            name: T::NAME,
            parse: None,
            outbound: false,
        })
    }

    /// Register a command that can be received.
    pub fn inbound<T>(mut self) -> Self
    where
        T: ParseCommand + SerializeCommand + Into<Command>,
    {
        self.entry::<T>().parse = Some(parse_as::<T> as ParseFn);
        self
    }

    /// Register a command that can be sent.
    pub fn outbound<T: SerializeCommand>(mut self) -> Self {
        self.entry::<T>().outbound = true;
        self
    }

    /// Register a command that travels both ways.
    pub fn bidirectional<T>(self) -> Self
    where
        T: ParseCommand + SerializeCommand + Into<Command>,
    {
        self.inbound::<T>().outbound::<T>()
    }

    /// Finish the table.
    pub fn build(self) -> CodecRegistry {
        CodecRegistry {
            entries: self.entries,
        }
    }
}

/// Lookup table from (CC id, command id) to codec.
pub struct CodecRegistry {
    entries: HashMap<(CcId, u8), CodecEntry>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CodecRegistry {
    /// Start an empty table.
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// Table with every command class implemented in this crate.
    pub fn standard() -> Self {
        cc::register_all(Self::builder()).build()
    }

    /// Entry for a (CC id, command id) pair.
    pub fn entry(&self, cc_id: CcId, command: u8) -> Option<&CodecEntry> {
        self.entries.get(&(cc_id, command))
    }

    /// Whether frames of this pair can be received.
    pub fn is_inbound(&self, cc_id: CcId, command: u8) -> bool {
        self.entry(cc_id, command).is_some_and(|e| e.parse.is_some())
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split the header off `data` and decode the frame.
    pub fn decode_bytes(&self, data: &[u8], ctx: &ParseContext<'_>) -> Result<Command, DecodeError> {
        let frame = Frame::parse(data, ctx.peer)?;
        self.decode(&frame, ctx)
    }

    /// Decode a frame with the registered parser.
    pub fn decode(&self, frame: &Frame, ctx: &ParseContext<'_>) -> Result<Command, DecodeError> {
        let cc_id = frame.cc_id();
        let command = frame.command();
        let labels = MetricLabels::new(ctx.peer.node_id, cc_id.name()).with_endpoint(ctx.peer.endpoint);

        let parse = match self.entry(cc_id, command).and_then(|e| e.parse) {
            Some(parse) => parse,
            None => {
                debug!("Unrecognized frame from {}: {} command 0x{:02X}", ctx.peer, cc_id, command);
                metrics::counter!(metric_defs::CC_UNRECOGNIZED_FRAMES.name, &labels.to_labels())
                    .increment(1);
                return Err(DecodeError::UnrecognizedFrame { cc: cc_id, command });
            }
        };

        match parse(frame.payload(), ctx) {
            Ok(cmd) => {
                trace!("Decoded {} from {} (depth {})", cmd.name(), ctx.peer, ctx.depth);
                let labels = labels.with(&[("command", cmd.name().to_string())]);
                metrics::counter!(metric_defs::CC_FRAMES_DECODED.name, &labels).increment(1);
                Ok(cmd)
            }
            Err(e) => {
                debug!(
                    "Failed to decode {} command 0x{:02X} from {}: {} (payload {})",
                    cc_id,
                    command,
                    ctx.peer,
                    e,
                    hex::encode(frame.payload())
                );
                let labels = labels.with(&[("reason", e.reason_label().to_string())]);
                metrics::counter!(metric_defs::CC_DECODE_FAILURES.name, &labels).increment(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::basic::{BasicGet, BasicReport};
    use crate::codec::CcVersions;
    use crate::frame::PeerAddress;

    #[test]
    fn test_direction_split() {
        let registry = CodecRegistry::builder()
            .outbound::<BasicGet>()
            .bidirectional::<BasicReport>()
            .build();
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_inbound(CcId::BASIC, 0x02));
        assert!(registry.is_inbound(CcId::BASIC, 0x03));
        assert!(registry.entry(CcId::BASIC, 0x02).unwrap().outbound);
    }

    #[test]
    fn test_outbound_only_frame_is_unrecognized() {
        let registry = CodecRegistry::standard();
        let versions = CcVersions::default();
        let ctx = ParseContext::new(&registry, &versions, PeerAddress::new(3));
        assert_eq!(
            registry.decode_bytes(&[0x20, 0x02], &ctx),
            Err(DecodeError::UnrecognizedFrame {
                cc: CcId::BASIC,
                command: 0x02
            })
        );
    }

    #[test]
    fn test_unknown_cc_is_unrecognized() {
        let registry = CodecRegistry::standard();
        let versions = CcVersions::default();
        let ctx = ParseContext::new(&registry, &versions, PeerAddress::new(3));
        assert!(matches!(
            registry.decode_bytes(&[0xF1, 0x00, 0x01], &ctx),
            Err(DecodeError::UnrecognizedFrame { cc: CcId(0xF100), .. })
        ));
    }

    #[test]
    fn test_standard_registry_decodes_report() {
        let registry = CodecRegistry::standard();
        let versions = CcVersions::default();
        let ctx = ParseContext::new(&registry, &versions, PeerAddress::new(3));
        let cmd = registry.decode_bytes(&[0x20, 0x03, 0x32], &ctx).unwrap();
        assert_eq!(cmd.name(), "BasicReport");
    }
}
