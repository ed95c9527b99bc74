//! Command Class codec and session layer
//!
//! Every device capability of the mesh protocol is a Command Class (CC): a
//! family of binary commands with its own versions. This crate turns CC
//! frames into typed [`Command`]s and back, and provides the session pieces
//! that sit directly on top of the codec:
//!
//! - **Codec contract**: per-command [`ParseCommand`] / [`SerializeCommand`]
//!   implementations, dispatched through a static [`CodecRegistry`]
//! - **Encapsulation**: commands that carry other commands (Supervision,
//!   Multi Channel, Multi Command, Security 2), see [`encapsulation`]
//! - **Reassembly**: reports split over several frames, see [`Reassembler`]
//! - **Response matching**: pairing received reports with outstanding
//!   requests, see [`ResponseMatcher`]
//! - **Persistence**: writing parsed values into a [`ValueStore`]
//!
//! # Example
//!
//! ```rust
//! use zwave_cc::{
//!     CcVersions, CodecRegistry, Command, MemoryValueStore, ParseContext, PeerAddress,
//!     PersistContext, Value, ValueStore,
//! };
//! use zwave_cc::cc::scene_actuator_conf::LEVEL;
//!
//! let registry = CodecRegistry::standard();
//! let versions = CcVersions::default();
//! let peer = PeerAddress::new(5);
//! let ctx = ParseContext::new(&registry, &versions, peer);
//!
//! let mut cmd = registry.decode_bytes(&[0x2C, 0x03, 5, 99, 0x03], &ctx)?;
//! assert!(matches!(cmd, Command::SceneActuatorConfReport(_)));
//!
//! let mut store = MemoryValueStore::new();
//! cmd.persist_values(&mut PersistContext::new(&mut store, peer));
//! assert_eq!(store.value(&LEVEL.id(5)), Some(Value::Number(99)));
//! # Ok::<(), zwave_cc::DecodeError>(())
//! ```

pub mod cc;
mod codec;
mod command;
mod config;
pub mod constants;
mod device_config;
pub mod encapsulation;
mod error;
mod frame;
mod log;
pub mod matcher;
mod numeric;
mod persist;
pub mod reassembly;
mod registry;
pub mod values;

#[cfg(test)]
mod test_util;

pub use codec::*;
pub use command::*;
pub use config::*;
pub use device_config::*;
pub use encapsulation::Encapsulation;
pub use error::*;
pub use frame::*;
pub use log::{LogEntry, LogFields};
pub use matcher::{ExpectedResponse, MatchOutcome, ResponseMatcher};
pub use numeric::*;
pub use persist::*;
pub use reassembly::{Reassembler, Reassembly};
pub use registry::*;
pub use values::*;
