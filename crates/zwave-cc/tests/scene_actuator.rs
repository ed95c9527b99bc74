//! Scene Actuator Configuration end to end: wire bytes to stored values.

use zwave_cc::cc::scene_actuator_conf::{SceneActuatorConfReport, DIMMING_DURATION, LEVEL};
use zwave_cc::{
    CcVersions, CodecRegistry, Command, Duration, MemoryValueStore, ParseContext, PeerAddress,
    PersistContext, Value, ValueStore,
};

fn decode(data: &[u8]) -> Command {
    let registry = CodecRegistry::standard();
    let versions = CcVersions::default();
    let ctx = ParseContext::new(&registry, &versions, PeerAddress::new(5));
    registry.decode_bytes(data, &ctx).unwrap()
}

#[test]
fn report_parses_and_persists() {
    let mut cmd = decode(&[0x2C, 0x03, 5, 99, 0x03]);
    assert_eq!(
        cmd,
        Command::SceneActuatorConfReport(SceneActuatorConfReport {
            scene_id: 5,
            level: 99,
            dimming_duration: Duration::Seconds(3),
        })
    );

    let mut store = MemoryValueStore::new();
    let written = cmd.persist_values(&mut PersistContext::new(&mut store, PeerAddress::new(5)));
    assert_eq!(written, 2);
    assert_eq!(store.value(&LEVEL.id(5)), Some(Value::Number(99)));
    assert_eq!(
        store.value(&DIMMING_DURATION.id(5)),
        Some(Value::Duration(Duration::Seconds(3)))
    );
    assert!(LEVEL.is(&LEVEL.id(5)));
}

#[test]
fn scene_zero_persists_nothing() {
    let mut cmd = decode(&[0x2C, 0x03, 0, 0, 0]);
    let mut store = MemoryValueStore::new();
    let written = cmd.persist_values(&mut PersistContext::new(&mut store, PeerAddress::new(5)));
    assert_eq!(written, 0);
    assert!(store.is_empty());
}

#[test]
fn persisting_twice_is_idempotent() {
    let mut store = MemoryValueStore::new();
    let mut cmd = decode(&[0x2C, 0x03, 9, 40, 0x81]);

    cmd.persist_values(&mut PersistContext::new(&mut store, PeerAddress::new(5)));
    let first = store.clone();
    cmd.persist_values(&mut PersistContext::new(&mut store, PeerAddress::new(5)));
    assert_eq!(store, first);
}
