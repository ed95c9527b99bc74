//! Basic command class (0x20).
//!
//! Levels are 0 to 99, with 0xFF meaning "on" (restore last level) in sets
//! and 0xFE meaning "unknown" in reports. Version 2 adds the target level and
//! the remaining transition duration to the report.

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::constants::{BASIC_GET, BASIC_REPORT, BASIC_SET};
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::{opt, LogFields};
use crate::numeric::Duration;
use crate::persist::{Persist, PersistContext};
use crate::values::{Value, ValueDescriptor, ValueId, ValueKind, ValueMetadata};

/// Level byte for "unknown".
pub const LEVEL_UNKNOWN: u8 = 0xFE;

/// Level byte for "on".
pub const LEVEL_ON: u8 = 0xFF;

// ============================================================================
// Values
// ============================================================================

fn current_value(_: ()) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::BASIC, "currentValue"),
        ValueMetadata::level().read_only().with_label("Current value"),
    )
}

fn target_value(_: ()) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::BASIC, "targetValue"),
        ValueMetadata::level().with_label("Target value"),
    )
}

fn duration(_: ()) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::BASIC, "duration"),
        ValueMetadata::read_only_duration().with_label("Remaining duration"),
    )
}

/// Current level.
pub static CURRENT_VALUE: ValueKind<()> = ValueKind {
    name: "currentValue",
    build: current_value,
    matches: |id| id.is(CcId::BASIC, "currentValue"),
};

/// Level being transitioned to.
pub static TARGET_VALUE: ValueKind<()> = ValueKind {
    name: "targetValue",
    build: target_value,
    matches: |id| id.is(CcId::BASIC, "targetValue"),
};

/// Remaining transition time.
pub static DURATION: ValueKind<()> = ValueKind {
    name: "duration",
    build: duration,
    matches: |id| id.is(CcId::BASIC, "duration"),
};

fn check_level<T: CcCommand>(field: &'static str, byte: u8) -> Result<u8, DecodeError> {
    match byte {
        0..=99 | LEVEL_UNKNOWN | LEVEL_ON => Ok(byte),
        _ => Err(T::invalid(field, format!("level {} is reserved", byte))),
    }
}

fn level_value(byte: u8) -> Value {
    match byte {
        LEVEL_UNKNOWN => Value::Null,
        LEVEL_ON => Value::Number(99),
        level => Value::Number(i64::from(level)),
    }
}

// ============================================================================
// Set
// ============================================================================

/// Set the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicSet {
    /// Level 0 to 99, or 0xFF for "on".
    pub target_value: u8,
}

impl BasicSet {
    /// Create a set command.
    pub fn new(target_value: u8) -> Result<Self, EncodeError> {
        if target_value != LEVEL_ON {
            EncodeError::check_range("target value", i64::from(target_value), 0, 99)?;
        }
        Ok(Self { target_value })
    }
}

impl CcCommand for BasicSet {
    const CC_ID: CcId = CcId::BASIC;
    const COMMAND: u8 = BASIC_SET;
    const NAME: &'static str = "BasicSet";
}

// Devices send Basic Set to their lifeline, so it is received too.
impl ParseCommand for BasicSet {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 1)?;
        let target_value = payload[0];
        if target_value > 99 && target_value != LEVEL_ON {
            return Err(Self::invalid("target value", format!("level {} is reserved", target_value)));
        }
        Ok(Self { target_value })
    }
}

impl SerializeCommand for BasicSet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![self.target_value])
    }
}

impl LogFields for BasicSet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("target value", self.target_value.to_string())]
    }
}

impl Persist for BasicSet {}

// ============================================================================
// Get
// ============================================================================

/// Request the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicGet;

impl CcCommand for BasicGet {
    const CC_ID: CcId = CcId::BASIC;
    const COMMAND: u8 = BASIC_GET;
    const NAME: &'static str = "BasicGet";
}

impl SerializeCommand for BasicGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(Vec::new())
    }
}

impl LogFields for BasicGet {}

impl Persist for BasicGet {}

// ============================================================================
// Report
// ============================================================================

/// Report the level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicReport {
    /// Current level byte.
    pub current_value: u8,
    /// Target level byte (v2).
    pub target_value: Option<u8>,
    /// Remaining transition time (v2).
    pub duration: Option<Duration>,
}

impl CcCommand for BasicReport {
    const CC_ID: CcId = CcId::BASIC;
    const COMMAND: u8 = BASIC_REPORT;
    const NAME: &'static str = "BasicReport";
}

impl ParseCommand for BasicReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 1)?;
        let current_value = check_level::<Self>("current value", payload[0])?;

        let (target_value, duration) = if payload.len() >= 3 {
            (
                Some(check_level::<Self>("target value", payload[1])?),
                Some(Duration::from_report_byte(payload[2])),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            current_value,
            target_value,
            duration,
        })
    }
}

impl SerializeCommand for BasicReport {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let mut payload = vec![self.current_value];
        match (self.target_value, self.duration) {
            (Some(target), Some(duration)) => {
                if ctx.version(CcId::BASIC) >= 2 {
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

impl LogFields for BasicReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("current value", self.current_value.to_string()),
            ("target value", opt(&self.target_value)),
            ("duration", opt(&self.duration)),
        ]
    }
}

impl Persist for BasicReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        ctx.set(CURRENT_VALUE.descriptor(()), level_value(self.current_value));
        if let Some(target) = self.target_value {
            ctx.set(TARGET_VALUE.descriptor(()), level_value(target));
        }
        if let Some(duration) = self.duration {
            ctx.set(DURATION.descriptor(()), duration);
        }
    }
}
