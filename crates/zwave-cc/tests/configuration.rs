//! Configuration values against a device configuration file.

use zwave_cc::cc::configuration::{ConfigurationSet, PARAM};
use zwave_cc::{
    CcVersions, CodecRegistry, Command, DeviceConfig, EncodeError, MemoryValueStore, ParseContext,
    PeerAddress, PersistContext, SerializeContext, Value, ValueFormat, ValueStore,
};

const DEVICE: &str = r#"
label: Test dimmer
manufacturer_id: 0x0086
param_information:
  - parameter: 3
    label: Ramp rate
    value_size: 1
    min_value: 0
    max_value: 255
    default_value: 20
    format: unsigned_integer
  - parameter: 5
    label: LED mode
    value_size: 1
    min_value: 0
    max_value: 2
    default_value: 0
    format: enumerated
    options:
      - label: "Off"
        value: 0
      - label: "On"
        value: 1
      - label: Follow load
        value: 2
  - parameter: 40
    value_bit_mask: 0xFF00
    label: Report group
    value_size: 2
    min_value: 0
    max_value: 255
    default_value: 1
    format: unsigned_integer
  - parameter: 40
    value_bit_mask: 0x00FF
    label: Report threshold
    value_size: 2
    min_value: -128
    max_value: 127
    default_value: 0
"#;

fn peer() -> PeerAddress {
    PeerAddress::new(14)
}

fn decode(data: &[u8]) -> Command {
    let registry = CodecRegistry::standard();
    let versions = CcVersions::new(4);
    let ctx = ParseContext::new(&registry, &versions, peer());
    registry.decode_bytes(data, &ctx).unwrap()
}

fn persist(store: &mut MemoryValueStore, config: &DeviceConfig, data: &[u8]) -> Command {
    let mut cmd = decode(data);
    cmd.persist_values(&mut PersistContext::new(store, peer()).with_device_config(config));
    cmd
}

#[test]
fn unsigned_parameter_is_reinterpreted() {
    let config = DeviceConfig::from_yaml_str(DEVICE).unwrap();
    let mut store = MemoryValueStore::new();

    let cmd = persist(&mut store, &config, &[0x70, 0x06, 3, 0x01, 0xC8]);
    assert_eq!(store.value(&PARAM.id((3, None))), Some(Value::Number(200)));
    match cmd {
        Command::ConfigurationReport(report) => assert_eq!(report.value, 200),
        other => panic!("unexpected {}", other.name()),
    }
}

#[test]
fn device_reported_name_does_not_override_config() {
    let config = DeviceConfig::from_yaml_str(DEVICE).unwrap();
    let mut store = MemoryValueStore::new();

    persist(&mut store, &config, &[0x70, 0x06, 5, 0x01, 0x01]);
    let mut name = vec![0x70, 0x0B, 0x00, 0x05, 0x00];
    name.extend_from_slice(b"Indicator");
    persist(&mut store, &config, &name);

    let meta = store.metadata(&PARAM.id((5, None))).unwrap();
    assert_eq!(meta.label.as_deref(), Some("LED mode"));
    assert_eq!(meta.states.get(&2).map(String::as_str), Some("Follow load"));
    assert!(meta.from_config);

    // Parameters the file does not define take the reported name
    let mut name = vec![0x70, 0x0B, 0x00, 0x09, 0x00];
    name.extend_from_slice(b"Indicator");
    persist(&mut store, &config, &name);
    assert_eq!(
        store.metadata(&PARAM.id((9, None))).and_then(|m| m.label),
        Some("Indicator".to_string())
    );
}

#[test]
fn partial_parameter_splits_on_persist() {
    let config = DeviceConfig::from_yaml_str(DEVICE).unwrap();
    let mut store = MemoryValueStore::new();

    // 0x05FE: group 5, threshold -2
    persist(&mut store, &config, &[0x70, 0x06, 40, 0x02, 0x05, 0xFE]);
    assert_eq!(store.value(&PARAM.id((40, Some(0xFF00)))), Some(Value::Number(5)));
    assert_eq!(store.value(&PARAM.id((40, Some(0x00FF)))), Some(Value::Number(-2)));
    assert_eq!(store.value(&PARAM.id((40, None))), None);
}

#[test]
fn partial_set_keeps_other_parts() {
    let config = DeviceConfig::from_yaml_str(DEVICE).unwrap();
    let mut store = MemoryValueStore::new();
    persist(&mut store, &config, &[0x70, 0x06, 40, 0x02, 0x05, 0xFE]);

    let set = ConfigurationSet::for_partial_param(&store, &config, 0, 40, 0x00FF, 3).unwrap();
    assert_eq!(set.value, 0x0503);

    let versions = CcVersions::new(4);
    let wire = Command::from(set)
        .encode(&SerializeContext::new(&versions))
        .unwrap();
    assert_eq!(wire, vec![0x70, 0x04, 40, 0x02, 0x05, 0x03]);

    // Nothing stored yet: other parts fall back to their defaults
    let empty = MemoryValueStore::new();
    let set = ConfigurationSet::for_partial_param(&empty, &config, 0, 40, 0xFF00, 7).unwrap();
    assert_eq!(set.value, 0x0700);
}

#[test]
fn out_of_range_values_are_rejected() {
    let config = DeviceConfig::from_yaml_str(DEVICE).unwrap();
    let store = MemoryValueStore::new();

    assert!(matches!(
        ConfigurationSet::for_partial_param(&store, &config, 0, 40, 0x00FF, 200),
        Err(EncodeError::FieldOutOfRange { .. })
    ));
    assert!(matches!(
        ConfigurationSet::new(3, 256, 1, ValueFormat::UnsignedInteger),
        Err(EncodeError::ValueOutOfRange { .. })
    ));
}
