//! Extension chain traversal.
//!
//! A chain is a run of length-prefixed extensions. Reading continues while
//! the extension just read has its more-to-follow bit set and bytes remain.
//! Running out of bytes exactly at an extension boundary ends the chain; an
//! extension cut off in the middle is an error.

use crate::{ExtensionError, RawExtension, Security2Extension};

/// Decode an extension chain from the start of `data`.
///
/// Returns the raw extensions in wire order and the number of bytes consumed.
/// Bytes after the last extension belong to the caller.
pub fn decode_chain(data: &[u8]) -> Result<(Vec<RawExtension>, usize), ExtensionError> {
    let mut extensions = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let (raw, length) = RawExtension::decode_at(data, offset)?;
        offset += length;
        let more = raw.more_to_follow;
        extensions.push(raw);
        if !more {
            break;
        }
    }

    Ok((extensions, offset))
}

/// Encode extensions as a chain, setting more-to-follow on all but the last.
pub fn encode_chain(extensions: &[Security2Extension]) -> Vec<u8> {
    let mut buf = Vec::new();
    let last = extensions.len().saturating_sub(1);
    for (i, ext) in extensions.iter().enumerate() {
        // Interpreted extensions have fixed lengths well under the limit
        ext.to_raw(i < last).write(&mut buf);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtensionKind;

    #[test]
    fn test_chain_stops_at_last_extension() {
        let mut data = encode_chain(&[
            Security2Extension::Mgrp { group_id: 4 },
            Security2Extension::Mos,
        ]);
        // Trailing bytes are not part of the chain
        data.extend_from_slice(&[0x20, 0x01, 0xFF]);

        let (raws, consumed) = decode_chain(&data).unwrap();
        assert_eq!(raws.len(), 2);
        assert_eq!(consumed, 5);
        assert!(raws[0].more_to_follow);
        assert!(!raws[1].more_to_follow);
        assert_eq!(raws[1].kind, ExtensionKind::Mos);
    }

    #[test]
    fn test_exhaustion_is_implicit_end() {
        // MOS claims more-to-follow but the buffer ends
        let data = [2, 0x84];
        let (raws, consumed) = decode_chain(&data).unwrap();
        assert_eq!(raws.len(), 1);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_truncated_follow_up_is_error() {
        // MOS claims more-to-follow and the next extension is cut short
        let data = [2, 0x84, 18, 0x41, 0x00];
        assert!(matches!(
            decode_chain(&data),
            Err(ExtensionError::Truncated { offset: 2, .. })
        ));
    }

    #[test]
    fn test_empty_chain() {
        let (raws, consumed) = decode_chain(&[]).unwrap();
        assert!(raws.is_empty());
        assert_eq!(consumed, 0);
    }
}
