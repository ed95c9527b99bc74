//! Helpers shared by unit tests.

use crate::codec::{CcVersions, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::error::DecodeError;
use crate::frame::PeerAddress;
use crate::registry::CodecRegistry;

/// Node id used as the peer in unit tests.
pub const TEST_NODE: u16 = 2;

/// Parse `payload` as `T` from a peer at `version` of every CC.
pub fn parse<T: ParseCommand>(payload: &[u8], version: u8) -> Result<T, DecodeError> {
    parse_with(payload, version, false)
}

/// Like [`parse`] with the was-decrypted flag.
pub fn parse_with<T: ParseCommand>(
    payload: &[u8],
    version: u8,
    decrypted: bool,
) -> Result<T, DecodeError> {
    let registry = CodecRegistry::standard();
    let versions = CcVersions::new(version);
    let ctx = ParseContext::new(&registry, &versions, PeerAddress::new(TEST_NODE))
        .with_decrypted(decrypted);
    T::parse(payload, &ctx)
}

/// Serialize `cmd` for a peer at `version` of every CC.
pub fn serialize<T: SerializeCommand>(cmd: &T, version: u8) -> Vec<u8> {
    let versions = CcVersions::new(version);
    cmd.serialize(&SerializeContext::new(&versions)).unwrap()
}
