//! Configuration command class (0x70).
//!
//! Parameters are numbered integers of 1, 2 or 4 bytes. The wire carries no
//! format in plain reports, so values are decoded as signed and corrected
//! during persistence once the real format is known, either from the
//! device configuration file or from previously stored metadata.
//!
//! A device configuration file may split one parameter into bit-masked
//! parts. Reports for such a parameter persist one value per part, and
//! setting one part needs the other parts' stored values
//! ([`compose_partial_value`]).
//!
//! Names, descriptions and bulk values may span several report frames; see
//! [`crate::reassembly`].

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::command::Command;
use crate::constants::{
    CONFIGURATION_BULK_GET, CONFIGURATION_BULK_REPORT, CONFIGURATION_DEFAULT_RESET,
    CONFIGURATION_GET, CONFIGURATION_INFO_GET, CONFIGURATION_INFO_REPORT,
    CONFIGURATION_NAME_GET, CONFIGURATION_NAME_REPORT, CONFIGURATION_PROPERTIES_GET,
    CONFIGURATION_PROPERTIES_REPORT, CONFIGURATION_REPORT, CONFIGURATION_SET,
};
use crate::device_config::DeviceConfig;
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::{opt, LogFields};
use crate::numeric::{
    decode_value, encode_raw, encode_value, extract_partial, insert_partial, reinterpret,
    ValueFormat,
};
use crate::persist::{Persist, PersistContext};
use crate::reassembly::{PartialKey, PartialReport};
use crate::values::{ValueDescriptor, ValueId, ValueKind, ValueMetadata, ValueStore};
use std::collections::BTreeMap;
use tracing::trace;

/// Default flag of the set and bulk report flags byte.
const FLAG_DEFAULT: u8 = 0x80;

/// Handshake flag of the bulk report flags byte.
const FLAG_HANDSHAKE: u8 = 0x40;

/// Mask of the size field.
const SIZE_MASK: u8 = 0x07;

/// Properties report flag: changing the parameter alters device capabilities (v4).
const FLAG_ALTERS_CAPABILITIES: u8 = 0x80;

/// Properties report flag: the parameter is read-only (v4).
const FLAG_READ_ONLY: u8 = 0x40;

/// Properties report option: advanced parameter (v4).
const OPTION_ADVANCED: u8 = 0x01;

/// Properties report option: not included in bulk commands (v4).
const OPTION_NO_BULK_SUPPORT: u8 = 0x02;

/// Check a configuration value width.
pub fn check_size(size: u8) -> Result<(), EncodeError> {
    match size {
        1 | 2 | 4 => Ok(()),
        _ => Err(EncodeError::InvalidSize(size)),
    }
}

fn parse_size<T: CcCommand>(flags: u8) -> Result<u8, DecodeError> {
    let size = flags & SIZE_MASK;
    match size {
        1 | 2 | 4 => Ok(size),
        _ => Err(T::invalid("value size", format!("{} is not 1, 2 or 4", size))),
    }
}

fn read_u16(payload: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([payload[offset], payload[offset + 1]])
}

// ============================================================================
// Values
// ============================================================================

fn param(params: (u16, Option<u32>)) -> ValueDescriptor {
    let (parameter, mask) = params;
    let mut id = ValueId::new(CcId::CONFIGURATION, u32::from(parameter));
    if let Some(mask) = mask {
        id = id.with_key(mask);
    }
    ValueDescriptor::new(id, ValueMetadata::number().with_label(format!("Param {}", parameter)))
}

/// A parameter value, or one bit-masked part of it.
pub static PARAM: ValueKind<(u16, Option<u32>)> = ValueKind {
    name: "param",
    build: param,
    matches: |id| id.command_class == CcId::CONFIGURATION && id.property.as_number().is_some(),
};

/// Write a reported parameter value, correcting its format and splitting
/// bit-masked parameters. Returns the corrected whole value.
fn persist_param_value(ctx: &mut PersistContext<'_>, parameter: u16, value_size: u8, value: i64) -> i64 {
    let config = ctx.device_config();

    let parts = config.map(|c| c.partial_params(parameter)).unwrap_or_default();
    if !parts.is_empty() {
        let full = reinterpret(value, value_size, ValueFormat::UnsignedInteger);
        for part in parts {
            let Some(mask) = part.value_bit_mask else {
                continue;
            };
            let sub = extract_partial(full, mask, part.format.is_signed());
            ctx.set(ValueDescriptor::new(part.value_id(), part.to_metadata()), sub);
        }
        return full;
    }

    let whole = config.and_then(|c| c.param(parameter));
    let id = PARAM.id((parameter, None));
    let format = match whole {
        Some(info) => info.format,
        None => ctx
            .metadata(&id)
            .and_then(|m| m.format)
            .unwrap_or(ValueFormat::SignedInteger),
    };
    let corrected = reinterpret(value, value_size, format);

    let descriptor = match whole {
        Some(info) => ValueDescriptor::new(info.value_id(), info.to_metadata()),
        None => {
            let mut descriptor = PARAM.descriptor((parameter, None));
            descriptor.metadata.value_size = Some(value_size);
            descriptor
        }
    };
    ctx.set(descriptor, corrected);
    corrected
}

/// Update device-reported metadata of a parameter, unless a device
/// configuration file defines it.
fn update_param_metadata(
    ctx: &mut PersistContext<'_>,
    parameter: u16,
    what: &str,
    update: impl FnOnce(&mut ValueMetadata),
) {
    if ctx.device_config().is_some_and(|c| c.has_param(parameter)) {
        trace!(
            "{}: parameter {} is defined by the device config, ignoring reported {}",
            ctx.peer(),
            parameter,
            what
        );
        return;
    }

    let id = PARAM.id((parameter, None));
    let mut metadata = ctx
        .metadata(&id)
        .unwrap_or_else(|| PARAM.descriptor((parameter, None)).metadata);
    if metadata.from_config {
        trace!("{}: parameter {} metadata came from a config file, ignoring reported {}", ctx.peer(), parameter, what);
        return;
    }
    update(&mut metadata);
    ctx.set_metadata(id, metadata);
}

/// Compose the whole value of a bit-masked parameter with the part selected
/// by `mask` replaced by `sub_value`. The other parts come from `store`, or
/// from their defaults when nothing is stored.
pub fn compose_partial_value(
    store: &dyn ValueStore,
    config: &DeviceConfig,
    endpoint: u8,
    parameter: u16,
    mask: u32,
    sub_value: i64,
) -> Result<i64, EncodeError> {
    let parts = config.partial_params(parameter);
    let target = parts
        .iter()
        .find(|p| p.value_bit_mask == Some(mask))
        .ok_or_else(|| {
            EncodeError::Invalid(format!("parameter {} has no part with mask 0x{:X}", parameter, mask))
        })?;
    EncodeError::check_range("partial value", sub_value, target.min_value, target.max_value)?;

    let mut full = 0;
    for part in &parts {
        let Some(part_mask) = part.value_bit_mask else {
            continue;
        };
        let sub = if part_mask == mask {
            sub_value
        } else {
            store
                .value(&part.value_id().at_endpoint(endpoint))
                .and_then(|v| v.as_i64())
                .unwrap_or(part.default_value)
        };
        full = insert_partial(full, part_mask, sub, part.format.is_signed())?;
    }
    Ok(full)
}

// ============================================================================
// Set
// ============================================================================

/// Set one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSet {
    /// Parameter number.
    pub parameter: u8,
    /// Reset the parameter to its default instead of setting `value`.
    pub reset_to_default: bool,
    /// Width of the value.
    pub value_size: u8,
    /// Format the value is checked against.
    pub value_format: ValueFormat,
    /// New value.
    pub value: i64,
}

impl ConfigurationSet {
    /// Set `parameter` to `value`, checking it fits the width and format.
    pub fn new(parameter: u8, value: i64, value_size: u8, value_format: ValueFormat) -> Result<Self, EncodeError> {
        check_size(value_size)?;
        encode_value(value, value_size, value_format)?;
        Ok(Self {
            parameter,
            reset_to_default: false,
            value_size,
            value_format,
            value,
        })
    }

    /// Reset `parameter` to its default.
    pub fn reset_to_default(parameter: u8) -> Self {
        Self {
            parameter,
            reset_to_default: true,
            value_size: 1,
            value_format: ValueFormat::SignedInteger,
            value: 0,
        }
    }

    /// Set one bit-masked part of `parameter`, keeping the stored values of
    /// the other parts.
    pub fn for_partial_param(
        store: &dyn ValueStore,
        config: &DeviceConfig,
        endpoint: u8,
        parameter: u8,
        mask: u32,
        sub_value: i64,
    ) -> Result<Self, EncodeError> {
        let parameter_number = u16::from(parameter);
        let full = compose_partial_value(store, config, endpoint, parameter_number, mask, sub_value)?;
        let value_size = config
            .partial_params(parameter_number)
            .first()
            .map(|p| p.value_size)
            .ok_or_else(|| EncodeError::Invalid(format!("parameter {} is not bit-masked", parameter)))?;
        Self::new(parameter, full, value_size, ValueFormat::UnsignedInteger)
    }
}

impl CcCommand for ConfigurationSet {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_SET;
    const NAME: &'static str = "ConfigurationSet";
}

impl SerializeCommand for ConfigurationSet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        check_size(self.value_size)?;
        let mut payload = vec![self.parameter, self.value_size];
        if self.reset_to_default {
            payload[1] |= FLAG_DEFAULT;
            payload.resize(2 + self.value_size as usize, 0);
        } else {
            payload.extend(encode_value(self.value, self.value_size, self.value_format)?);
        }
        Ok(payload)
    }
}

impl LogFields for ConfigurationSet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        let value = if self.reset_to_default {
            "default".to_string()
        } else {
            self.value.to_string()
        };
        vec![
            ("parameter #", self.parameter.to_string()),
            ("value size", self.value_size.to_string()),
            ("value", value),
        ]
    }
}

impl Persist for ConfigurationSet {}

// ============================================================================
// Get / Report
// ============================================================================

/// Request one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationGet {
    /// Parameter number.
    pub parameter: u8,
    /// Accept a report for a different parameter.
    ///
    /// Devices answer a get for a parameter they lack with the first
    /// parameter they have; set this when probing for that.
    pub allow_unexpected_response: bool,
}

impl ConfigurationGet {
    /// Request `parameter`.
    pub fn new(parameter: u8) -> Self {
        Self {
            parameter,
            allow_unexpected_response: false,
        }
    }

    /// Accept a report for any parameter.
    pub fn allowing_unexpected_response(mut self) -> Self {
        self.allow_unexpected_response = true;
        self
    }
}

impl CcCommand for ConfigurationGet {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_GET;
    const NAME: &'static str = "ConfigurationGet";
}

impl SerializeCommand for ConfigurationGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![self.parameter])
    }
}

impl LogFields for ConfigurationGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("parameter #", self.parameter.to_string())]
    }
}

impl Persist for ConfigurationGet {}

/// Value of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationReport {
    /// Parameter number.
    pub parameter: u8,
    /// Width of the value.
    pub value_size: u8,
    /// Value; signed until corrected during persistence.
    pub value: i64,
}

impl CcCommand for ConfigurationReport {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_REPORT;
    const NAME: &'static str = "ConfigurationReport";
}

impl ParseCommand for ConfigurationReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 3)?;
        let value_size = parse_size::<Self>(payload[1])?;
        Self::require_len(payload, 2 + value_size as usize)?;
        Ok(Self {
            parameter: payload[0],
            value_size,
            value: decode_value(&payload[2..2 + value_size as usize], ValueFormat::SignedInteger),
        })
    }
}

impl SerializeCommand for ConfigurationReport {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        check_size(self.value_size)?;
        let mut payload = vec![self.parameter, self.value_size];
        payload.extend(encode_raw(self.value, self.value_size)?);
        Ok(payload)
    }
}

impl LogFields for ConfigurationReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("parameter #", self.parameter.to_string()),
            ("value size", self.value_size.to_string()),
            ("value", self.value.to_string()),
        ]
    }
}

impl Persist for ConfigurationReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        self.value = persist_param_value(ctx, u16::from(self.parameter), self.value_size, self.value);
    }
}

// ============================================================================
// Bulk Get / Report
// ============================================================================

/// Request a run of consecutive parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationBulkGet {
    /// First parameter.
    pub parameter_offset: u16,
    /// Number of parameters.
    pub count: u8,
}

impl ConfigurationBulkGet {
    /// Request `count` parameters starting at `parameter_offset`.
    pub fn new(parameter_offset: u16, count: u8) -> Result<Self, EncodeError> {
        EncodeError::check_range("parameter count", i64::from(count), 1, 255)?;
        EncodeError::check_range(
            "last parameter",
            i64::from(parameter_offset) + i64::from(count) - 1,
            0,
            i64::from(u16::MAX),
        )?;
        Ok(Self {
            parameter_offset,
            count,
        })
    }
}

impl CcCommand for ConfigurationBulkGet {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_BULK_GET;
    const NAME: &'static str = "ConfigurationBulkGet";
}

impl SerializeCommand for ConfigurationBulkGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let mut payload = self.parameter_offset.to_be_bytes().to_vec();
        payload.push(self.count);
        Ok(payload)
    }
}

impl LogFields for ConfigurationBulkGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("parameter offset", self.parameter_offset.to_string()),
            ("count", self.count.to_string()),
        ]
    }
}

impl Persist for ConfigurationBulkGet {}

/// Values of a run of consecutive parameters; may span several frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationBulkReport {
    /// First parameter of this frame.
    pub parameter_offset: u16,
    /// Frames still to come.
    pub reports_to_follow: u8,
    /// The values are the defaults.
    pub default_values: bool,
    /// The report answers a bulk set with handshake.
    pub handshake: bool,
    /// Width of every value.
    pub value_size: u8,
    /// Values by parameter number.
    pub values: BTreeMap<u16, i64>,
}

impl CcCommand for ConfigurationBulkReport {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_BULK_REPORT;
    const NAME: &'static str = "ConfigurationBulkReport";
}

impl ParseCommand for ConfigurationBulkReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 5)?;
        let parameter_offset = read_u16(payload, 0);
        let count = payload[2];
        let reports_to_follow = payload[3];
        let flags = payload[4];
        let value_size = parse_size::<Self>(flags)?;
        Self::require_len(payload, 5 + count as usize * value_size as usize)?;

        if u32::from(parameter_offset) + u32::from(count) > 0x1_0000 {
            return Err(Self::invalid(
                "parameter count",
                format!("{} parameters from {} overflow the parameter range", count, parameter_offset),
            ));
        }

        let values = payload[5..]
            .chunks_exact(value_size as usize)
            .take(count as usize)
            .enumerate()
            .map(|(i, bytes)| {
                (
                    parameter_offset + i as u16,
                    decode_value(bytes, ValueFormat::SignedInteger),
                )
            })
            .collect();

        Ok(Self {
            parameter_offset,
            reports_to_follow,
            default_values: flags & FLAG_DEFAULT != 0,
            handshake: flags & FLAG_HANDSHAKE != 0,
            value_size,
            values,
        })
    }
}

impl SerializeCommand for ConfigurationBulkReport {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        check_size(self.value_size)?;
        EncodeError::check_len("bulk values", self.values.len(), u8::MAX as usize)?;
        let contiguous = self
            .values
            .keys()
            .zip(u32::from(self.parameter_offset)..)
            .all(|(parameter, expected)| u32::from(*parameter) == expected);
        if !contiguous {
            return Err(EncodeError::Invalid(format!(
                "bulk values must be consecutive parameters from {}",
                self.parameter_offset
            )));
        }

        let mut payload = self.parameter_offset.to_be_bytes().to_vec();
        payload.push(self.values.len() as u8);
        payload.push(self.reports_to_follow);
        let mut flags = self.value_size;
        if self.default_values {
            flags |= FLAG_DEFAULT;
        }
        if self.handshake {
            flags |= FLAG_HANDSHAKE;
        }
        payload.push(flags);
        for value in self.values.values() {
            payload.extend(encode_raw(*value, self.value_size)?);
        }
        Ok(payload)
    }
}

impl PartialReport for ConfigurationBulkReport {
    fn partial_key(&self) -> PartialKey {
        PartialKey::PerFrameType
    }

    fn reports_to_follow(&self) -> u8 {
        self.reports_to_follow
    }

    fn merge(fragments: Vec<Self>) -> Result<Self, DecodeError> {
        let mut fragments = fragments.into_iter();
        let mut merged = fragments
            .next()
            .ok_or_else(|| DecodeError::Merge("no fragments".into()))?;
        for fragment in fragments {
            if fragment.value_size != merged.value_size {
                return Err(DecodeError::Merge(format!(
                    "fragment value size {} differs from {}",
                    fragment.value_size, merged.value_size
                )));
            }
            merged.values.extend(fragment.values);
            merged.default_values = fragment.default_values;
            merged.handshake = fragment.handshake;
        }
        merged.reports_to_follow = 0;
        Ok(merged)
    }
}

impl LogFields for ConfigurationBulkReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        let values: Vec<String> = self.values.iter().map(|(p, v)| format!("#{}: {}", p, v)).collect();
        vec![
            ("parameter offset", self.parameter_offset.to_string()),
            ("reports to follow", self.reports_to_follow.to_string()),
            ("default values", self.default_values.to_string()),
            ("values", values.join(", ")),
        ]
    }
}

impl Persist for ConfigurationBulkReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        let value_size = self.value_size;
        for (parameter, value) in self.values.iter_mut() {
            *value = persist_param_value(ctx, *parameter, value_size, *value);
        }
    }
}

// ============================================================================
// Name / Info
// ============================================================================

fn parse_text_report<T: CcCommand>(payload: &[u8]) -> Result<(u16, u8, String), DecodeError> {
    T::require_len(payload, 3)?;
    let text = String::from_utf8_lossy(&payload[3..]).into_owned();
    Ok((read_u16(payload, 0), payload[2], text))
}

fn serialize_text_report(parameter: u16, reports_to_follow: u8, text: &str) -> Vec<u8> {
    let mut payload = parameter.to_be_bytes().to_vec();
    payload.push(reports_to_follow);
    payload.extend_from_slice(text.as_bytes());
    payload
}

fn merge_text(fragments: Vec<(u16, String)>) -> Result<(u16, String), DecodeError> {
    let parameter = fragments
        .first()
        .map(|(p, _)| *p)
        .ok_or_else(|| DecodeError::Merge("no fragments".into()))?;
    if fragments.iter().any(|(p, _)| *p != parameter) {
        return Err(DecodeError::Merge("fragments for different parameters".into()));
    }
    Ok((parameter, fragments.into_iter().map(|(_, text)| text).collect()))
}

/// Request the name of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationNameGet {
    /// Parameter number.
    pub parameter: u16,
}

impl CcCommand for ConfigurationNameGet {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_NAME_GET;
    const NAME: &'static str = "ConfigurationNameGet";
}

impl SerializeCommand for ConfigurationNameGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(self.parameter.to_be_bytes().to_vec())
    }
}

impl LogFields for ConfigurationNameGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("parameter #", self.parameter.to_string())]
    }
}

impl Persist for ConfigurationNameGet {}

/// Name of a parameter; may span several frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationNameReport {
    /// Parameter number.
    pub parameter: u16,
    /// Frames still to come.
    pub reports_to_follow: u8,
    /// Name, or the part of it in this frame.
    pub name: String,
}

impl CcCommand for ConfigurationNameReport {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_NAME_REPORT;
    const NAME: &'static str = "ConfigurationNameReport";
}

impl ParseCommand for ConfigurationNameReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        let (parameter, reports_to_follow, name) = parse_text_report::<Self>(payload)?;
        Ok(Self {
            parameter,
            reports_to_follow,
            name,
        })
    }
}

impl SerializeCommand for ConfigurationNameReport {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(serialize_text_report(self.parameter, self.reports_to_follow, &self.name))
    }
}

impl PartialReport for ConfigurationNameReport {
    fn partial_key(&self) -> PartialKey {
        PartialKey::Parameter(self.parameter)
    }

    fn reports_to_follow(&self) -> u8 {
        self.reports_to_follow
    }

    fn merge(fragments: Vec<Self>) -> Result<Self, DecodeError> {
        let (parameter, name) = merge_text(fragments.into_iter().map(|f| (f.parameter, f.name)).collect())?;
        Ok(Self {
            parameter,
            reports_to_follow: 0,
            name,
        })
    }
}

impl LogFields for ConfigurationNameReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("parameter #", self.parameter.to_string()),
            ("name", self.name.clone()),
            ("reports to follow", self.reports_to_follow.to_string()),
        ]
    }
}

impl Persist for ConfigurationNameReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        let name = self.name.clone();
        update_param_metadata(ctx, self.parameter, "name", |meta| meta.label = Some(name));
    }
}

/// Request the description of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationInfoGet {
    /// Parameter number.
    pub parameter: u16,
}

impl CcCommand for ConfigurationInfoGet {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_INFO_GET;
    const NAME: &'static str = "ConfigurationInfoGet";
}

impl SerializeCommand for ConfigurationInfoGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(self.parameter.to_be_bytes().to_vec())
    }
}

impl LogFields for ConfigurationInfoGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("parameter #", self.parameter.to_string())]
    }
}

impl Persist for ConfigurationInfoGet {}

/// Description of a parameter; may span several frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationInfoReport {
    /// Parameter number.
    pub parameter: u16,
    /// Frames still to come.
    pub reports_to_follow: u8,
    /// Description, or the part of it in this frame.
    pub info: String,
}

impl CcCommand for ConfigurationInfoReport {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_INFO_REPORT;
    const NAME: &'static str = "ConfigurationInfoReport";
}

impl ParseCommand for ConfigurationInfoReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        let (parameter, reports_to_follow, info) = parse_text_report::<Self>(payload)?;
        Ok(Self {
            parameter,
            reports_to_follow,
            info,
        })
    }
}

impl SerializeCommand for ConfigurationInfoReport {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(serialize_text_report(self.parameter, self.reports_to_follow, &self.info))
    }
}

impl PartialReport for ConfigurationInfoReport {
    fn partial_key(&self) -> PartialKey {
        PartialKey::Parameter(self.parameter)
    }

    fn reports_to_follow(&self) -> u8 {
        self.reports_to_follow
    }

    fn merge(fragments: Vec<Self>) -> Result<Self, DecodeError> {
        let (parameter, info) = merge_text(fragments.into_iter().map(|f| (f.parameter, f.info)).collect())?;
        Ok(Self {
            parameter,
            reports_to_follow: 0,
            info,
        })
    }
}

impl LogFields for ConfigurationInfoReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("parameter #", self.parameter.to_string()),
            ("info", self.info.clone()),
            ("reports to follow", self.reports_to_follow.to_string()),
        ]
    }
}

impl Persist for ConfigurationInfoReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        let info = self.info.clone();
        update_param_metadata(ctx, self.parameter, "description", |meta| {
            meta.description = Some(info)
        });
    }
}

// ============================================================================
// Properties
// ============================================================================

/// Request the properties of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationPropertiesGet {
    /// Parameter number.
    pub parameter: u16,
}

impl CcCommand for ConfigurationPropertiesGet {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_PROPERTIES_GET;
    const NAME: &'static str = "ConfigurationPropertiesGet";
}

impl SerializeCommand for ConfigurationPropertiesGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(self.parameter.to_be_bytes().to_vec())
    }
}

impl LogFields for ConfigurationPropertiesGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("parameter #", self.parameter.to_string())]
    }
}

impl Persist for ConfigurationPropertiesGet {}

/// Properties of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationPropertiesReport {
    /// Parameter number.
    pub parameter: u16,
    /// Value format.
    pub value_format: ValueFormat,
    /// Value width; 0 when the parameter does not exist.
    pub value_size: u8,
    /// Smallest allowed value.
    pub min_value: Option<i64>,
    /// Largest allowed value.
    pub max_value: Option<i64>,
    /// Default value.
    pub default_value: Option<i64>,
    /// Next existing parameter, 0 if none.
    pub next_parameter: u16,
    /// Changing the parameter alters device capabilities (v4).
    pub alters_capabilities: Option<bool>,
    /// The parameter is read-only (v4).
    pub is_read_only: Option<bool>,
    /// Advanced parameter (v4).
    pub is_advanced: Option<bool>,
    /// Not included in bulk commands (v4).
    pub no_bulk_support: Option<bool>,
}

impl CcCommand for ConfigurationPropertiesReport {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_PROPERTIES_REPORT;
    const NAME: &'static str = "ConfigurationPropertiesReport";
}

impl ParseCommand for ConfigurationPropertiesReport {
    fn parse(payload: &[u8], ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 3)?;
        let parameter = read_u16(payload, 0);
        let flags = payload[2];
        let value_format = ValueFormat::from_bits((flags >> 3) & 0x07)
            .ok_or_else(|| Self::invalid("value format", format!("unknown format {}", (flags >> 3) & 0x07)))?;
        let value_size = flags & SIZE_MASK;

        let (min_value, max_value, default_value, offset) = if value_size == 0 {
            (None, None, None, 3)
        } else {
            let size = parse_size::<Self>(flags)? as usize;
            Self::require_len(payload, 3 + 3 * size + 2)?;
            let field = |i: usize| decode_value(&payload[3 + i * size..3 + (i + 1) * size], value_format);
            (Some(field(0)), Some(field(1)), Some(field(2)), 3 + 3 * size)
        };
        Self::require_len(payload, offset + 2)?;
        let next_parameter = read_u16(payload, offset);

        let v4 = ctx.version(CcId::CONFIGURATION) >= 4;
        let (alters_capabilities, is_read_only) = if v4 {
            (
                Some(flags & FLAG_ALTERS_CAPABILITIES != 0),
                Some(flags & FLAG_READ_ONLY != 0),
            )
        } else {
            (None, None)
        };
        let (is_advanced, no_bulk_support) = match payload.get(offset + 2) {
            Some(options) if v4 => (
                Some(options & OPTION_ADVANCED != 0),
                Some(options & OPTION_NO_BULK_SUPPORT != 0),
            ),
            _ => (None, None),
        };

        Ok(Self {
            parameter,
            value_format,
            value_size,
            min_value,
            max_value,
            default_value,
            next_parameter,
            alters_capabilities,
            is_read_only,
            is_advanced,
            no_bulk_support,
        })
    }
}

impl SerializeCommand for ConfigurationPropertiesReport {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let v4 = ctx.version(CcId::CONFIGURATION) >= 4;
        let mut flags = (self.value_format.to_bits() << 3) | (self.value_size & SIZE_MASK);
        if v4 && self.alters_capabilities == Some(true) {
            flags |= FLAG_ALTERS_CAPABILITIES;
        }
        if v4 && self.is_read_only == Some(true) {
            flags |= FLAG_READ_ONLY;
        }

        let mut payload = self.parameter.to_be_bytes().to_vec();
        payload.push(flags);
        if self.value_size != 0 {
            check_size(self.value_size)?;
            for value in [self.min_value, self.max_value, self.default_value] {
                payload.extend(encode_value(value.unwrap_or(0), self.value_size, self.value_format)?);
            }
        }
        payload.extend_from_slice(&self.next_parameter.to_be_bytes());

        if v4 && (self.is_advanced.is_some() || self.no_bulk_support.is_some()) {
            let mut options = 0;
            if self.is_advanced == Some(true) {
                options |= OPTION_ADVANCED;
            }
            if self.no_bulk_support == Some(true) {
                options |= OPTION_NO_BULK_SUPPORT;
            }
            payload.push(options);
        }
        Ok(payload)
    }
}

impl LogFields for ConfigurationPropertiesReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("parameter #", self.parameter.to_string()),
            ("value size", self.value_size.to_string()),
            ("value format", self.value_format.to_string()),
            ("min value", opt(&self.min_value)),
            ("max value", opt(&self.max_value)),
            ("default value", opt(&self.default_value)),
            ("next parameter", self.next_parameter.to_string()),
            ("read-only", opt(&self.is_read_only)),
            ("advanced", opt(&self.is_advanced)),
        ]
    }
}

impl Persist for ConfigurationPropertiesReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        if self.value_size == 0 {
            trace!("{}: parameter {} does not exist", ctx.peer(), self.parameter);
            return;
        }
        let report = self.clone();
        update_param_metadata(ctx, self.parameter, "properties", move |meta| {
            meta.min = report.min_value;
            meta.max = report.max_value;
            meta.default = report.default_value;
            meta.value_size = Some(report.value_size);
            meta.format = Some(report.value_format);
            meta.writeable = !report.is_read_only.unwrap_or(false);
            meta.allow_manual_entry = Some(report.value_format != ValueFormat::Enumerated);
        });
    }
}

// ============================================================================
// Default Reset
// ============================================================================

/// Reset every parameter to its default (v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigurationDefaultReset;

impl CcCommand for ConfigurationDefaultReset {
    const CC_ID: CcId = CcId::CONFIGURATION;
    const COMMAND: u8 = CONFIGURATION_DEFAULT_RESET;
    const NAME: &'static str = "ConfigurationDefaultReset";
}

impl SerializeCommand for ConfigurationDefaultReset {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(Vec::new())
    }
}

impl LogFields for ConfigurationDefaultReset {}

impl Persist for ConfigurationDefaultReset {}

// ============================================================================
// Response matching
// ============================================================================

/// The report answers the request: same parameter, or any parameter when
/// the get opted in with `allow_unexpected_response`.
pub fn response_matches_request(sent: &Command, received: &Command) -> bool {
    match (sent, received) {
        (Command::ConfigurationGet(get), Command::ConfigurationReport(report)) => {
            get.allow_unexpected_response || get.parameter == report.parameter
        }
        (Command::ConfigurationBulkGet(get), Command::ConfigurationBulkReport(report)) => {
            get.parameter_offset == report.parameter_offset
        }
        (Command::ConfigurationNameGet(get), Command::ConfigurationNameReport(report)) => {
            get.parameter == report.parameter
        }
        (Command::ConfigurationInfoGet(get), Command::ConfigurationInfoReport(report)) => {
            get.parameter == report.parameter
        }
        (Command::ConfigurationPropertiesGet(get), Command::ConfigurationPropertiesReport(report)) => {
            get.parameter == report.parameter
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CcVersions;
    use crate::frame::PeerAddress;
    use crate::test_util::{parse, serialize};
    use crate::values::{MemoryValueStore, Value};

    #[test]
    fn test_report_sizes() {
        let report: ConfigurationReport = parse(&[7, 0x02, 0xFF, 0xFE], 1).unwrap();
        assert_eq!(report.value_size, 2);
        assert_eq!(report.value, -2);
        assert_eq!(serialize(&report, 1), vec![7, 0x02, 0xFF, 0xFE]);

        assert!(matches!(
            parse::<ConfigurationReport>(&[7, 0x03, 0, 0, 0], 1),
            Err(DecodeError::InvalidField { field: "value size", .. })
        ));
        assert!(matches!(
            parse::<ConfigurationReport>(&[7, 0x04, 0, 0], 1),
            Err(DecodeError::PayloadTooShort { expected: 6, .. })
        ));
    }

    #[test]
    fn test_set_checks_range() {
        assert!(ConfigurationSet::new(1, 200, 1, ValueFormat::UnsignedInteger).is_ok());
        assert_eq!(
            ConfigurationSet::new(1, 200, 1, ValueFormat::SignedInteger),
            Err(EncodeError::ValueOutOfRange {
                value: 200,
                size: 1,
                format: ValueFormat::SignedInteger
            })
        );
        assert_eq!(
            ConfigurationSet::new(1, 0, 3, ValueFormat::SignedInteger),
            Err(EncodeError::InvalidSize(3))
        );

        let set = ConfigurationSet::new(9, -1, 2, ValueFormat::SignedInteger).unwrap();
        assert_eq!(serialize(&set, 1), vec![9, 0x02, 0xFF, 0xFF]);
        assert_eq!(serialize(&ConfigurationSet::reset_to_default(9), 1), vec![9, 0x81, 0x00]);
    }

    #[test]
    fn test_reinterpreted_on_persist() {
        let mut store = MemoryValueStore::new();
        let id = PARAM.id((3, None));
        store.set_metadata(
            id.clone(),
            ValueMetadata::number().with_encoding(1, ValueFormat::UnsignedInteger),
        );

        let mut report: ConfigurationReport = parse(&[3, 0x01, 0xC8], 1).unwrap();
        assert_eq!(report.value, -56);
        report.persist(&mut PersistContext::new(&mut store, PeerAddress::new(2)));
        assert_eq!(report.value, 200);
        assert_eq!(store.value(&id), Some(Value::Number(200)));
    }

    #[test]
    fn test_bulk_report_parse() {
        let report: ConfigurationBulkReport =
            parse(&[0x00, 0x10, 3, 1, 0x02, 0x00, 0x01, 0xFF, 0xFF, 0x01, 0x00], 2).unwrap();
        assert_eq!(report.parameter_offset, 16);
        assert_eq!(report.reports_to_follow, 1);
        assert_eq!(report.value_size, 2);
        assert_eq!(
            report.values,
            [(16, 1), (17, -1), (18, 256)].into_iter().collect::<BTreeMap<_, _>>()
        );
        assert_eq!(
            serialize(&report, 2),
            vec![0x00, 0x10, 3, 1, 0x02, 0x00, 0x01, 0xFF, 0xFF, 0x01, 0x00]
        );
    }

    #[test]
    fn test_bulk_report_truncated() {
        assert!(matches!(
            parse::<ConfigurationBulkReport>(&[0x00, 0x10, 3, 0, 0x01, 1, 2], 2),
            Err(DecodeError::PayloadTooShort { expected: 8, actual: 7, .. })
        ));
    }

    #[test]
    fn test_bulk_merge_rejects_mixed_sizes() {
        let first: ConfigurationBulkReport = parse(&[0x00, 0x01, 1, 1, 0x01, 0x05], 2).unwrap();
        let second: ConfigurationBulkReport = parse(&[0x00, 0x02, 1, 0, 0x02, 0xFF, 0xFF], 2).unwrap();
        assert!(matches!(
            ConfigurationBulkReport::merge(vec![first.clone(), second]),
            Err(DecodeError::Merge(_))
        ));

        let same: ConfigurationBulkReport = parse(&[0x00, 0x02, 1, 0, 0x01, 0xFF], 2).unwrap();
        let merged = ConfigurationBulkReport::merge(vec![first, same]).unwrap();
        assert_eq!(merged.values, [(1, 5), (2, -1)].into_iter().collect::<BTreeMap<_, _>>());
    }

    #[test]
    fn test_bulk_serialize_requires_consecutive_parameters() {
        let mut report: ConfigurationBulkReport = parse(&[0x00, 0x10, 2, 0, 0x01, 1, 2], 2).unwrap();
        report.values.insert(20, 3);
        let versions = CcVersions::new(2);
        assert!(matches!(
            report.serialize(&SerializeContext::new(&versions)),
            Err(EncodeError::Invalid(_))
        ));

        report.values.remove(&20);
        report.parameter_offset = 15;
        assert!(report.serialize(&SerializeContext::new(&versions)).is_err());
    }

    #[test]
    fn test_text_report_merge() {
        let parts = vec![
            ConfigurationInfoReport {
                parameter: 4,
                reports_to_follow: 1,
                info: "Sets the ".into(),
            },
            ConfigurationInfoReport {
                parameter: 4,
                reports_to_follow: 0,
                info: "sensitivity".into(),
            },
        ];
        let merged = ConfigurationInfoReport::merge(parts).unwrap();
        assert_eq!(merged.info, "Sets the sensitivity");
        assert_eq!(merged.reports_to_follow, 0);
    }

    #[test]
    fn test_properties_report_v3_and_v4() {
        // parameter 0x0102, unsigned (1 << 3), size 1, min 0, max 200, default 10, next 0x0103
        let wire = [0x01, 0x02, 0x08 | 0x01, 0, 200, 10, 0x01, 0x03];
        let v3: ConfigurationPropertiesReport = parse(&wire, 3).unwrap();
        assert_eq!(v3.value_format, ValueFormat::UnsignedInteger);
        assert_eq!(v3.max_value, Some(200));
        assert_eq!(v3.next_parameter, 0x0103);
        assert_eq!(v3.is_read_only, None);
        assert_eq!(serialize(&v3, 3), wire.to_vec());

        let mut wire_v4 = wire.to_vec();
        wire_v4[2] |= FLAG_READ_ONLY;
        wire_v4.push(OPTION_ADVANCED);
        let v4: ConfigurationPropertiesReport = parse(&wire_v4, 4).unwrap();
        assert_eq!(v4.is_read_only, Some(true));
        assert_eq!(v4.alters_capabilities, Some(false));
        assert_eq!(v4.is_advanced, Some(true));
        assert_eq!(v4.no_bulk_support, Some(false));
        assert_eq!(serialize(&v4, 4), wire_v4);
    }

    #[test]
    fn test_properties_report_missing_parameter() {
        let report: ConfigurationPropertiesReport = parse(&[0x00, 0x05, 0x00, 0x00, 0x07], 3).unwrap();
        assert_eq!(report.value_size, 0);
        assert_eq!(report.min_value, None);
        assert_eq!(report.next_parameter, 7);

        let mut store = MemoryValueStore::new();
        let mut report = report;
        report.persist(&mut PersistContext::new(&mut store, PeerAddress::new(2)));
        assert_eq!(store.metadata(&PARAM.id((5, None))), None);
    }

    #[test]
    fn test_properties_persist_metadata() {
        let mut store = MemoryValueStore::new();
        let mut report: ConfigurationPropertiesReport =
            parse(&[0x00, 0x02, 0x10 | 0x01, 0, 2, 1, 0x00, 0x00], 3).unwrap();
        report.persist(&mut PersistContext::new(&mut store, PeerAddress::new(2)));

        let meta = store.metadata(&PARAM.id((2, None))).unwrap();
        assert_eq!(meta.format, Some(ValueFormat::Enumerated));
        assert_eq!(meta.max, Some(2));
        assert_eq!(meta.default, Some(1));
        assert_eq!(meta.allow_manual_entry, Some(false));
    }

    #[test]
    fn test_response_matching() {
        let report = |parameter| {
            Command::from(ConfigurationReport {
                parameter,
                value_size: 1,
                value: 0,
            })
        };
        let get = Command::from(ConfigurationGet::new(5));
        assert!(response_matches_request(&get, &report(5)));
        assert!(!response_matches_request(&get, &report(6)));

        let probe = Command::from(ConfigurationGet::new(5).allowing_unexpected_response());
        assert!(response_matches_request(&probe, &report(6)));
    }
}
