//! Multi Channel command class (0x60), command encapsulation only.
//!
//! The encapsulation addresses a command to or from an endpoint of a node.
//! Received commands are attributed to the source endpoint, so their values
//! are persisted under it.

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::command::Command;
use crate::constants::MULTI_CHANNEL_CMD_ENCAP;
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::LogFields;
use crate::persist::{Persist, PersistContext};
use std::fmt;

const ENDPOINT_MASK: u8 = 0x7F;
const FLAG_BIT_ADDRESS: u8 = 0x80;

/// Destination of an encapsulated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointDestination {
    /// One endpoint, 0 to 127.
    Endpoint(u8),
    /// Endpoints 1 to 7 as a bit mask.
    BitMask(u8),
}

impl EndpointDestination {
    fn to_byte(self) -> u8 {
        match self {
            EndpointDestination::Endpoint(ep) => ep & ENDPOINT_MASK,
            EndpointDestination::BitMask(mask) => FLAG_BIT_ADDRESS | (mask & ENDPOINT_MASK),
        }
    }

    /// Whether a command from `endpoint` may come from this destination.
    pub fn includes(self, endpoint: u8) -> bool {
        match self {
            EndpointDestination::Endpoint(ep) => ep == endpoint,
            EndpointDestination::BitMask(mask) => {
                (1..=7).contains(&endpoint) && mask & (1 << (endpoint - 1)) != 0
            }
        }
    }

    fn from_byte(byte: u8) -> Self {
        if byte & FLAG_BIT_ADDRESS != 0 {
            EndpointDestination::BitMask(byte & ENDPOINT_MASK)
        } else {
            EndpointDestination::Endpoint(byte & ENDPOINT_MASK)
        }
    }
}

impl fmt::Display for EndpointDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointDestination::Endpoint(ep) => write!(f, "{}", ep),
            EndpointDestination::BitMask(mask) => write!(f, "mask 0b{:07b}", mask),
        }
    }
}

/// A command addressed to or from an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiChannelEncapsulation {
    /// Endpoint of the sender.
    pub source_endpoint: u8,
    /// Endpoint(s) of the receiver.
    pub destination: EndpointDestination,
    /// The addressed command.
    pub encapsulated: Box<Command>,
}

impl MultiChannelEncapsulation {
    /// Address `command` from the root device to `endpoint`.
    pub fn to_endpoint(endpoint: u8, command: Command) -> Result<Self, EncodeError> {
        EncodeError::check_range("destination endpoint", i64::from(endpoint), 0, i64::from(ENDPOINT_MASK))?;
        Ok(Self {
            source_endpoint: 0,
            destination: EndpointDestination::Endpoint(endpoint),
            encapsulated: Box::new(command),
        })
    }

    /// Address `command` from `endpoint` to the root device.
    pub fn from_endpoint(endpoint: u8, command: Command) -> Result<Self, EncodeError> {
        EncodeError::check_range("source endpoint", i64::from(endpoint), 0, i64::from(ENDPOINT_MASK))?;
        Ok(Self {
            source_endpoint: endpoint,
            destination: EndpointDestination::Endpoint(0),
            encapsulated: Box::new(command),
        })
    }
}

impl CcCommand for MultiChannelEncapsulation {
    const CC_ID: CcId = CcId::MULTI_CHANNEL;
    const COMMAND: u8 = MULTI_CHANNEL_CMD_ENCAP;
    const NAME: &'static str = "MultiChannelEncapsulation";
}

impl ParseCommand for MultiChannelEncapsulation {
    fn parse(payload: &[u8], ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 4)?;
        let source_endpoint = payload[0] & ENDPOINT_MASK;
        let peer = ctx.peer.with_endpoint(source_endpoint);
        let encapsulated = ctx.decode_encapsulated(&payload[2..], peer)?;
        Ok(Self {
            source_endpoint,
            destination: EndpointDestination::from_byte(payload[1]),
            encapsulated: Box::new(encapsulated),
        })
    }
}

impl SerializeCommand for MultiChannelEncapsulation {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let mut payload = vec![self.source_endpoint & ENDPOINT_MASK, self.destination.to_byte()];
        payload.extend(self.encapsulated.encode(ctx)?);
        Ok(payload)
    }
}

impl LogFields for MultiChannelEncapsulation {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("source", self.source_endpoint.to_string()),
            ("destination", self.destination.to_string()),
        ]
    }
}

impl Persist for MultiChannelEncapsulation {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        let encapsulated = &mut self.encapsulated;
        ctx.in_endpoint(self.source_endpoint, |ctx| encapsulated.persist(ctx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::basic::{BasicReport, CURRENT_VALUE};
    use crate::frame::PeerAddress;
    use crate::test_util::{parse, serialize};
    use crate::values::{MemoryValueStore, Value, ValueStore};

    #[test]
    fn test_parse_from_endpoint() {
        let encap: MultiChannelEncapsulation = parse(&[0x02, 0x00, 0x20, 0x03, 0x10], 1).unwrap();
        assert_eq!(encap.source_endpoint, 2);
        assert_eq!(encap.destination, EndpointDestination::Endpoint(0));
        assert!(matches!(*encap.encapsulated, Command::BasicReport(_)));
        assert_eq!(serialize(&encap, 1), vec![0x02, 0x00, 0x20, 0x03, 0x10]);
    }

    #[test]
    fn test_bit_address_destination() {
        let byte = EndpointDestination::BitMask(0b101).to_byte();
        assert_eq!(byte, 0x85);
        assert_eq!(EndpointDestination::from_byte(byte), EndpointDestination::BitMask(0b101));

        let mask = EndpointDestination::BitMask(0b101);
        assert!(mask.includes(1));
        assert!(!mask.includes(2));
        assert!(mask.includes(3));
        assert!(!mask.includes(0));
        assert!(EndpointDestination::Endpoint(0).includes(0));
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            parse::<MultiChannelEncapsulation>(&[0x02, 0x00, 0x20], 1),
            Err(DecodeError::PayloadTooShort { expected: 4, .. })
        ));
    }

    #[test]
    fn test_persist_under_source_endpoint() {
        let mut store = MemoryValueStore::new();
        let report = BasicReport {
            current_value: 40,
            target_value: None,
            duration: None,
        };
        let mut encap = MultiChannelEncapsulation::from_endpoint(3, report.into()).unwrap();
        encap.persist(&mut PersistContext::new(&mut store, PeerAddress::new(2)));

        assert_eq!(
            store.value(&CURRENT_VALUE.id(()).at_endpoint(3)),
            Some(Value::Number(40))
        );
        assert_eq!(store.value(&CURRENT_VALUE.id(())), None);
    }
}
