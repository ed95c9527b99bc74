//! Color Switch command class (0x33).

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::command::Command;
use crate::constants::{
    COLOR_SWITCH_GET, COLOR_SWITCH_REPORT, COLOR_SWITCH_SET, COLOR_SWITCH_SUPPORTED_GET,
    COLOR_SWITCH_SUPPORTED_REPORT,
};
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::{opt, LogFields};
use crate::numeric::Duration;
use crate::persist::{Persist, PersistContext};
use crate::values::{Value, ValueDescriptor, ValueId, ValueKind, ValueMetadata};
use std::fmt;

/// Largest number of components in one set command.
pub const MAX_SET_COMPONENTS: usize = 0x1F;

/// A color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorComponent {
    /// Warm white.
    WarmWhite,
    /// Cold white.
    ColdWhite,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Amber.
    Amber,
    /// Cyan.
    Cyan,
    /// Purple.
    Purple,
    /// Index into a device color table.
    Index,
}

impl ColorComponent {
    /// Every component, in wire order.
    pub const ALL: [ColorComponent; 9] = [
        ColorComponent::WarmWhite,
        ColorComponent::ColdWhite,
        ColorComponent::Red,
        ColorComponent::Green,
        ColorComponent::Blue,
        ColorComponent::Amber,
        ColorComponent::Cyan,
        ColorComponent::Purple,
        ColorComponent::Index,
    ];

    /// Component from its wire id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// Wire id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Property key name.
    pub fn key(self) -> &'static str {
        match self {
            ColorComponent::WarmWhite => "warmWhite",
            ColorComponent::ColdWhite => "coldWhite",
            ColorComponent::Red => "red",
            ColorComponent::Green => "green",
            ColorComponent::Blue => "blue",
            ColorComponent::Amber => "amber",
            ColorComponent::Cyan => "cyan",
            ColorComponent::Purple => "purple",
            ColorComponent::Index => "index",
        }
    }
}

impl fmt::Display for ColorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn component<T: CcCommand>(byte: u8) -> Result<ColorComponent, DecodeError> {
    ColorComponent::from_id(byte).ok_or_else(|| T::invalid("color component", format!("unknown id {}", byte)))
}

// ============================================================================
// Values
// ============================================================================

fn supported_components(_: ()) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::COLOR_SWITCH, "supportedColorComponents"),
        ValueMetadata::internal(),
    )
}

fn current_color(component: ColorComponent) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::COLOR_SWITCH, "currentColor").with_key(component.key()),
        ValueMetadata::read_only_number()
            .with_range(0, 255)
            .with_label(format!("Current value ({})", component)),
    )
}

fn target_color(component: ColorComponent) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::COLOR_SWITCH, "targetColor").with_key(component.key()),
        ValueMetadata::number()
            .with_range(0, 255)
            .with_label(format!("Target value ({})", component)),
    )
}

fn duration(_: ()) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::COLOR_SWITCH, "duration"),
        ValueMetadata::read_only_duration().with_label("Remaining duration"),
    )
}

/// Components the device supports; internal.
pub static SUPPORTED_COMPONENTS: ValueKind<()> = ValueKind {
    name: "supportedColorComponents",
    build: supported_components,
    matches: |id| id.is(CcId::COLOR_SWITCH, "supportedColorComponents"),
};

/// Current value of one component.
pub static CURRENT_COLOR: ValueKind<ColorComponent> = ValueKind {
    name: "currentColor",
    build: current_color,
    matches: |id| id.is(CcId::COLOR_SWITCH, "currentColor") && id.property_key.is_some(),
};

/// Target value of one component.
pub static TARGET_COLOR: ValueKind<ColorComponent> = ValueKind {
    name: "targetColor",
    build: target_color,
    matches: |id| id.is(CcId::COLOR_SWITCH, "targetColor") && id.property_key.is_some(),
};

/// Remaining transition time.
pub static DURATION: ValueKind<()> = ValueKind {
    name: "duration",
    build: duration,
    matches: |id| id.is(CcId::COLOR_SWITCH, "duration"),
};

// ============================================================================
// Supported Get / Report
// ============================================================================

/// Request the supported components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSwitchSupportedGet;

impl CcCommand for ColorSwitchSupportedGet {
    const CC_ID: CcId = CcId::COLOR_SWITCH;
    const COMMAND: u8 = COLOR_SWITCH_SUPPORTED_GET;
    const NAME: &'static str = "ColorSwitchSupportedGet";
}

impl SerializeCommand for ColorSwitchSupportedGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(Vec::new())
    }
}

impl LogFields for ColorSwitchSupportedGet {}

impl Persist for ColorSwitchSupportedGet {}

/// The supported components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSwitchSupportedReport {
    /// Supported components, in wire order.
    pub supported: Vec<ColorComponent>,
}

impl CcCommand for ColorSwitchSupportedReport {
    const CC_ID: CcId = CcId::COLOR_SWITCH;
    const COMMAND: u8 = COLOR_SWITCH_SUPPORTED_REPORT;
    const NAME: &'static str = "ColorSwitchSupportedReport";
}

impl ParseCommand for ColorSwitchSupportedReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 2)?;
        let mask = u16::from_le_bytes([payload[0], payload[1]]);
        let supported = ColorComponent::ALL
            .into_iter()
            .filter(|c| mask & (1 << c.id()) != 0)
            .collect();
        Ok(Self { supported })
    }
}

impl SerializeCommand for ColorSwitchSupportedReport {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let mask = self.supported.iter().fold(0u16, |acc, c| acc | (1 << c.id()));
        Ok(mask.to_le_bytes().to_vec())
    }
}

impl LogFields for ColorSwitchSupportedReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        let names: Vec<_> = self.supported.iter().map(|c| c.key()).collect();
        vec![("supported components", names.join(", "))]
    }
}

impl Persist for ColorSwitchSupportedReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        let ids = self.supported.iter().map(|c| Value::from(c.id())).collect();
        ctx.set(SUPPORTED_COMPONENTS.descriptor(()), Value::List(ids));
    }
}

// ============================================================================
// Get / Report
// ============================================================================

/// Request one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSwitchGet {
    /// Requested component.
    pub component: ColorComponent,
}

impl CcCommand for ColorSwitchGet {
    const CC_ID: CcId = CcId::COLOR_SWITCH;
    const COMMAND: u8 = COLOR_SWITCH_GET;
    const NAME: &'static str = "ColorSwitchGet";
}

impl SerializeCommand for ColorSwitchGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![self.component.id()])
    }
}

impl LogFields for ColorSwitchGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("color component", self.component.to_string())]
    }
}

impl Persist for ColorSwitchGet {}

/// The report answers the get when it is for the same component.
pub fn report_matches_get(sent: &Command, received: &Command) -> bool {
    match (sent, received) {
        (Command::ColorSwitchGet(get), Command::ColorSwitchReport(report)) => {
            get.component == report.component
        }
        _ => false,
    }
}

/// State of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSwitchReport {
    /// Reported component.
    pub component: ColorComponent,
    /// Current value.
    pub current_value: u8,
    /// Value being transitioned to (v3).
    pub target_value: Option<u8>,
    /// Remaining transition time (v3).
    pub duration: Option<Duration>,
}

impl CcCommand for ColorSwitchReport {
    const CC_ID: CcId = CcId::COLOR_SWITCH;
    const COMMAND: u8 = COLOR_SWITCH_REPORT;
    const NAME: &'static str = "ColorSwitchReport";
}

impl ParseCommand for ColorSwitchReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 2)?;
        let (target_value, duration) = if payload.len() >= 4 {
            (Some(payload[2]), Some(Duration::from_report_byte(payload[3])))
        } else {
            (None, None)
        };
        Ok(Self {
            component: component::<Self>(payload[0])?,
            current_value: payload[1],
            target_value,
            duration,
        })
    }
}

impl SerializeCommand for ColorSwitchReport {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let mut payload = vec![self.component.id(), self.current_value];
        match (self.target_value, self.duration) {
            (Some(target), Some(duration)) => {
                if ctx.version(CcId::COLOR_SWITCH) >= 3 {
                    payload.push(target);
                    payload.push(duration.to_byte());
                }
            }
            (None, None) => {}
            _ => {
                return Err(EncodeError::Invalid(
                    "target value and duration must be given together".into(),
                ))
            }
        }
        Ok(payload)
    }
}

impl LogFields for ColorSwitchReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("color component", self.component.to_string()),
            ("current value", self.current_value.to_string()),
            ("target value", opt(&self.target_value)),
            ("duration", opt(&self.duration)),
        ]
    }
}

impl Persist for ColorSwitchReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        ctx.set(CURRENT_COLOR.descriptor(self.component), self.current_value);
        if let Some(target) = self.target_value {
            ctx.set(TARGET_COLOR.descriptor(self.component), target);
        }
        if let Some(duration) = self.duration {
            ctx.set(DURATION.descriptor(()), duration);
        }
    }
}

// ============================================================================
// Set
// ============================================================================

/// Set one or more components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSwitchSet {
    /// Components and their values.
    pub components: Vec<(ColorComponent, u8)>,
    /// Transition duration (v2).
    pub duration: Option<Duration>,
}

impl ColorSwitchSet {
    /// Create a set command.
    pub fn new(components: Vec<(ColorComponent, u8)>, duration: Option<Duration>) -> Result<Self, EncodeError> {
        if components.is_empty() {
            return Err(EncodeError::Invalid("at least one color component is required".into()));
        }
        EncodeError::check_len("color components", components.len(), MAX_SET_COMPONENTS)?;
        for (i, (c, _)) in components.iter().enumerate() {
            if components[..i].iter().any(|(other, _)| other == c) {
                return Err(EncodeError::Invalid(format!("color component {} given twice", c)));
            }
        }
        Ok(Self {
            components,
            duration,
        })
    }
}

impl CcCommand for ColorSwitchSet {
    const CC_ID: CcId = CcId::COLOR_SWITCH;
    const COMMAND: u8 = COLOR_SWITCH_SET;
    const NAME: &'static str = "ColorSwitchSet";
}

impl SerializeCommand for ColorSwitchSet {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        EncodeError::check_len("color components", self.components.len(), MAX_SET_COMPONENTS)?;
        let mut payload = Vec::with_capacity(2 + 2 * self.components.len());
        payload.push(self.components.len() as u8);
        for (component, value) in &self.components {
            payload.push(component.id());
            payload.push(*value);
        }
        if ctx.version(CcId::COLOR_SWITCH) >= 2 {
            payload.push(self.duration.unwrap_or(Duration::Default).to_byte());
        }
        Ok(payload)
    }
}

impl LogFields for ColorSwitchSet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = self
            .components
            .iter()
            .map(|(c, v)| (c.key(), v.to_string()))
            .collect();
        fields.push(("duration", opt(&self.duration)));
        fields
    }
}

impl Persist for ColorSwitchSet {}
