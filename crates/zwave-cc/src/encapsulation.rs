//! Walking and building encapsulation stacks.
//!
//! Supervision Get, Multi Channel and Security 2 encapsulation each own one
//! child; Multi Command owns a list. The single-child chain is what
//! [`Command::innermost`] follows; a Multi Command batch ends the walk.
//!
//! ```rust
//! use zwave_cc::cc::basic::BasicSet;
//! use zwave_cc::Command;
//!
//! let cmd = Command::from(BasicSet::new(99).unwrap())
//!     .supervise(1)
//!     .unwrap()
//!     .addressed_to(2)
//!     .unwrap()
//!     .secure(5);
//!
//! let names: Vec<_> = cmd.encapsulation_chain().iter().map(|c| c.name()).collect();
//! assert_eq!(
//!     names,
//!     ["Security2MessageEncapsulation", "MultiChannelEncapsulation", "SupervisionGet", "BasicSet"]
//! );
//! assert!(matches!(cmd.innermost(), Command::BasicSet(_)));
//! ```

use crate::cc::multi_channel::{EndpointDestination, MultiChannelEncapsulation};
use crate::cc::multi_command::MultiCommandEncapsulation;
use crate::cc::security2::{Security2MessageEncapsulation, Security2Payload};
use crate::cc::supervision::SupervisionGet;
use crate::command::Command;
use crate::error::EncodeError;
use crate::frame::PeerAddress;

/// How a command relates to the commands it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encapsulation<'a> {
    /// Carries exactly one command.
    Encapsulates(&'a Command),
    /// Carries an ordered list of commands.
    EncapsulatesMany(&'a [Command]),
    /// Carries nothing.
    Leaf,
}

impl Command {
    /// Classify the command.
    pub fn encapsulation(&self) -> Encapsulation<'_> {
        match self {
            Command::SupervisionGet(get) => Encapsulation::Encapsulates(&get.encapsulated),
            Command::MultiChannelEncapsulation(encap) => Encapsulation::Encapsulates(&encap.encapsulated),
            Command::Security2MessageEncapsulation(encap) => match &encap.payload {
                Security2Payload::Plaintext(Some(child)) => Encapsulation::Encapsulates(child),
                _ => Encapsulation::Leaf,
            },
            Command::MultiCommandEncapsulation(batch) => Encapsulation::EncapsulatesMany(&batch.encapsulated),
            _ => Encapsulation::Leaf,
        }
    }

    /// Follow the single-child chain to its end.
    pub fn innermost(&self) -> &Command {
        let mut current = self;
        while let Encapsulation::Encapsulates(child) = current.encapsulation() {
            current = child;
        }
        current
    }

    /// The single-child chain from this command to the innermost, outermost first.
    pub fn encapsulation_chain(&self) -> Vec<&Command> {
        let mut chain = vec![self];
        let mut current = self;
        while let Encapsulation::Encapsulates(child) = current.encapsulation() {
            chain.push(child);
            current = child;
        }
        chain
    }

    /// The address a command received from `peer` is attributed to: the
    /// source endpoint of the innermost Multi Channel layer, or `peer`.
    pub fn attributed_to(&self, peer: PeerAddress) -> PeerAddress {
        self.encapsulation_chain()
            .into_iter()
            .filter_map(|cmd| match cmd {
                Command::MultiChannelEncapsulation(encap) => Some(encap.source_endpoint),
                _ => None,
            })
            .last()
            .map_or(peer, |endpoint| peer.with_endpoint(endpoint))
    }

    /// The endpoints a command sent to `peer` is addressed to: the
    /// destination of the innermost Multi Channel layer, or the endpoint of
    /// `peer`.
    pub fn destination(&self, peer: PeerAddress) -> EndpointDestination {
        self.encapsulation_chain()
            .into_iter()
            .filter_map(|cmd| match cmd {
                Command::MultiChannelEncapsulation(encap) => Some(encap.destination),
                _ => None,
            })
            .last()
            .unwrap_or(EndpointDestination::Endpoint(peer.endpoint))
    }

    /// Take the innermost command of the single-child chain.
    pub fn into_innermost(self) -> Command {
        unwrap(self, PeerAddress::new(0)).1
    }

    /// Wrap in a Supervision Get with `session_id`.
    pub fn supervise(self, session_id: u8) -> Result<Command, EncodeError> {
        SupervisionGet::new(session_id, self).map(Command::from)
    }

    /// Wrap in a Multi Channel encapsulation addressed to `endpoint`.
    pub fn addressed_to(self, endpoint: u8) -> Result<Command, EncodeError> {
        MultiChannelEncapsulation::to_endpoint(endpoint, self).map(Command::from)
    }

    /// Wrap in a Security 2 message encapsulation.
    pub fn secure(self, sequence_number: u8) -> Command {
        Security2MessageEncapsulation::new(sequence_number, self).into()
    }

    /// Batch commands into one Multi Command encapsulation.
    pub fn batch(commands: Vec<Command>) -> Result<Command, EncodeError> {
        MultiCommandEncapsulation::new(commands).map(Command::from)
    }
}

/// Strip the single-child chain of a received command.
///
/// Returns the innermost command and the address it is attributed to: the
/// source endpoint of the innermost Multi Channel layer, or `peer` otherwise.
pub fn unwrap(command: Command, peer: PeerAddress) -> (PeerAddress, Command) {
    let mut peer = peer;
    let mut current = command;
    loop {
        current = match current {
            Command::SupervisionGet(get) => *get.encapsulated,
            Command::MultiChannelEncapsulation(encap) => {
                peer = peer.with_endpoint(encap.source_endpoint);
                *encap.encapsulated
            }
            Command::Security2MessageEncapsulation(Security2MessageEncapsulation {
                payload: Security2Payload::Plaintext(Some(child)),
                ..
            }) => *child,
            other => return (peer, other),
        };
    }
}
