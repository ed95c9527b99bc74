//! Security 2 message encapsulation with extension chains.

use zwave_cc::cc::security2::{Security2MessageEncapsulation, Security2Payload};
use zwave_cc::{CcVersions, CodecRegistry, Command, DecodeError, ParseContext, PeerAddress};
use zwave_s2::Security2Extension;

fn decode(data: &[u8], decrypted: bool) -> Result<Command, DecodeError> {
    let registry = CodecRegistry::standard();
    let versions = CcVersions::default();
    let ctx = ParseContext::new(&registry, &versions, PeerAddress::new(3)).with_decrypted(decrypted);
    registry.decode_bytes(data, &ctx)
}

fn encapsulation(cmd: Command) -> Security2MessageEncapsulation {
    match cmd {
        Command::Security2MessageEncapsulation(encap) => encap,
        other => panic!("unexpected {}", other.name()),
    }
}

fn mpan() -> Vec<u8> {
    let mut ext = vec![19, 0x40 | 0x02, 0x01];
    ext.extend_from_slice(&[0x77; 16]);
    ext
}

// Basic Report, level 0x10
const INNER: [u8; 3] = [0x20, 0x03, 0x10];

#[test]
fn mpan_in_unencrypted_section_is_dropped() {
    let mut frame = vec![0x9F, 0x03, 0x01, 0x01];
    frame.extend(mpan());
    frame.extend_from_slice(&INNER);

    let encap = encapsulation(decode(&frame, true).unwrap());
    assert!(encap.extensions.is_empty());
    assert!(matches!(encap.command(), Some(Command::BasicReport(_))));
}

#[test]
fn mpan_in_encrypted_section_is_kept() {
    let mut frame = vec![0x9F, 0x03, 0x01, 0x02];
    frame.extend(mpan());
    frame.extend_from_slice(&INNER);

    let encap = encapsulation(decode(&frame, true).unwrap());
    assert_eq!(
        encap.encrypted_extensions,
        vec![Security2Extension::Mpan {
            group_id: 1,
            inner_state: [0x77; 16],
        }]
    );
    assert!(matches!(encap.command(), Some(Command::BasicReport(_))));
}

#[test]
fn unknown_critical_extension_discards_command() {
    let mut frame = vec![0x9F, 0x03, 0x01, 0x01];
    frame.extend_from_slice(&[3, 0x40 | 0x2A, 0x00]);
    frame.extend_from_slice(&INNER);

    assert_eq!(
        decode(&frame, true),
        Err(DecodeError::DiscardedByExtension { kind: 0x2A })
    );
}

#[test]
fn unknown_non_critical_extension_is_skipped() {
    let mut frame = vec![0x9F, 0x03, 0x01, 0x01];
    frame.extend_from_slice(&[3, 0x80 | 0x2A, 0x00]);
    frame.extend_from_slice(&[3, 0x40 | 0x03, 0x09]);
    frame.extend_from_slice(&INNER);

    let encap = encapsulation(decode(&frame, true).unwrap());
    assert_eq!(encap.extensions, vec![Security2Extension::Mgrp { group_id: 9 }]);
}

#[test]
fn ciphertext_is_kept_opaque() {
    let mut frame = vec![0x9F, 0x03, 0x01, 0x03];
    frame.extend_from_slice(&[2, 0x04]);
    frame.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    let encap = encapsulation(decode(&frame, false).unwrap());
    assert_eq!(encap.extensions, vec![Security2Extension::Mos]);
    assert_eq!(
        encap.payload,
        Security2Payload::Ciphertext {
            data: vec![0xDE, 0xAD, 0xBE, 0xEF],
            has_encrypted_extensions: true,
        }
    );

    let versions = CcVersions::default();
    let reencoded = Command::from(encap)
        .encode(&zwave_cc::SerializeContext::new(&versions))
        .unwrap();
    assert_eq!(reencoded, frame);
}
