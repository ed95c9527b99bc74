//! Partial reports collected from wire frames and merged.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use zwave_cc::cc::configuration::{ConfigurationBulkReport, ConfigurationNameReport, PARAM};
use zwave_cc::reassembly::SessionState;
use zwave_cc::{
    CcVersions, CodecConfig, CodecRegistry, Command, MemoryValueStore, ParseContext, PeerAddress,
    PersistContext, Reassembler, Reassembly, ValueStore,
};

fn decode(peer: PeerAddress, data: &[u8]) -> Command {
    let registry = CodecRegistry::standard();
    let versions = CcVersions::new(4);
    let ctx = ParseContext::new(&registry, &versions, peer);
    registry.decode_bytes(data, &ctx).unwrap()
}

fn name_frame(parameter: u16, reports_to_follow: u8, text: &str) -> Vec<u8> {
    let mut data = vec![0x70, 0x0B];
    data.extend_from_slice(&parameter.to_be_bytes());
    data.push(reports_to_follow);
    data.extend_from_slice(text.as_bytes());
    data
}

#[test]
fn name_fragments_concatenate_in_order() {
    let peer = PeerAddress::new(8);
    let mut reassembler = Reassembler::new();

    let mut merged = None;
    for (counter, text) in [(2, "Motion "), (1, "sensor "), (0, "sensitivity")] {
        match reassembler.push(peer, decode(peer, &name_frame(4, counter, text))).unwrap() {
            Reassembly::Collecting { fragments, .. } => assert_eq!(fragments, usize::from(3 - counter)),
            Reassembly::Complete(cmd) => merged = Some(cmd),
            Reassembly::NotPartial(cmd) => panic!("{} is partial", cmd.name()),
        }
    }

    assert_eq!(
        merged,
        Some(Command::ConfigurationNameReport(ConfigurationNameReport {
            parameter: 4,
            reports_to_follow: 0,
            name: "Motion sensor sensitivity".into(),
        }))
    );
    assert_eq!(reassembler.pending(), 0);

    let mut store = MemoryValueStore::new();
    let mut merged = merged.unwrap();
    merged.persist_values(&mut PersistContext::new(&mut store, peer));
    assert_eq!(
        store.metadata(&PARAM.id((4, None))).and_then(|m| m.label),
        Some("Motion sensor sensitivity".to_string())
    );
}

#[test]
fn bulk_fragments_accumulate_values() {
    let peer = PeerAddress::new(8);
    let mut reassembler = Reassembler::new();
    let frames: [&[u8]; 3] = [
        &[0x70, 0x09, 0x00, 0x01, 2, 2, 0x01, 10, 11],
        &[0x70, 0x09, 0x00, 0x03, 1, 1, 0x01, 12],
        &[0x70, 0x09, 0x00, 0x04, 1, 0, 0x01, 13],
    ];

    let mut results: Vec<_> = frames
        .iter()
        .map(|f| reassembler.push(peer, decode(peer, f)).unwrap())
        .collect();

    let Some(Reassembly::Complete(Command::ConfigurationBulkReport(report))) = results.pop() else {
        panic!("last fragment should complete the session");
    };
    assert!(results.iter().all(|r| matches!(r, Reassembly::Collecting { .. })));

    let expected: BTreeMap<u16, i64> = [(1, 10), (2, 11), (3, 12), (4, 13)].into_iter().collect();
    assert_eq!(
        report,
        ConfigurationBulkReport {
            parameter_offset: 1,
            reports_to_follow: 0,
            default_values: false,
            handshake: false,
            value_size: 1,
            values: expected,
        }
    );
}

#[test]
fn timed_out_session_persists_nothing() {
    let peer = PeerAddress::new(8);
    let config = CodecConfig::default();
    let mut reassembler = Reassembler::new();
    let start = Instant::now();

    let mut key = None;
    for counter in [2, 1] {
        let cmd = decode(peer, &name_frame(7, counter, "part"));
        if let Reassembly::Collecting { key: k, .. } = reassembler.push_at(peer, cmd, start).unwrap() {
            key = Some(k);
        }
    }
    let key = key.unwrap();
    assert_eq!(reassembler.state(&key), SessionState::Collecting(2));

    let later = start + config.reassembly_timeout() + Duration::from_millis(1);
    assert_eq!(reassembler.abandon_expired(later, config.reassembly_timeout()), 1);
    assert_eq!(reassembler.state(&key), SessionState::Empty);

    // A late final fragment starts a fresh session of one
    let late = decode(peer, &name_frame(7, 0, "tail"));
    let Reassembly::Complete(mut cmd) = reassembler.push(peer, late).unwrap() else {
        panic!("a lone final fragment completes immediately");
    };
    let mut store = MemoryValueStore::new();
    cmd.persist_values(&mut PersistContext::new(&mut store, peer));
    assert_eq!(
        store.metadata(&PARAM.id((7, None))).and_then(|m| m.label),
        Some("tail".to_string())
    );
}

#[test]
fn sessions_are_scoped_per_endpoint() {
    let mut reassembler = Reassembler::new();
    let root = PeerAddress::new(8);
    let endpoint = root.with_endpoint(1);

    reassembler.push(root, decode(root, &name_frame(1, 1, "A"))).unwrap();
    reassembler.push(endpoint, decode(endpoint, &name_frame(1, 1, "B"))).unwrap();
    assert_eq!(reassembler.pending(), 2);

    let done = reassembler.push(endpoint, decode(endpoint, &name_frame(1, 0, "b"))).unwrap();
    assert!(matches!(
        done,
        Reassembly::Complete(Command::ConfigurationNameReport(ConfigurationNameReport { ref name, .. })) if name == "Bb"
    ));
    assert_eq!(reassembler.pending(), 1);
}
