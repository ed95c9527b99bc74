//! Scene Actuator Configuration command class (0x2C).
//!
//! Stores, per scene id, the level and dimming duration the device applies
//! when the scene is activated. Querying scene 0 asks for the currently
//! active scene; a report for scene 0 means no scene is active.

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::command::Command;
use crate::constants::{
    SCENE_ACTUATOR_CONF_GET, SCENE_ACTUATOR_CONF_REPORT, SCENE_ACTUATOR_CONF_SET,
};
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::{opt, LogFields};
use crate::numeric::Duration;
use crate::persist::{Persist, PersistContext};
use crate::values::{ValueDescriptor, ValueId, ValueKind, ValueMetadata};
use tracing::trace;

/// Override bit of the set flags byte.
const FLAG_OVERRIDE: u8 = 0x80;

// ============================================================================
// Values
// ============================================================================

fn level(scene_id: u8) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::SCENE_ACTUATOR_CONF, "level").with_key(u32::from(scene_id)),
        ValueMetadata::level().with_label(format!("Level ({})", scene_id)),
    )
}

fn dimming_duration(scene_id: u8) -> ValueDescriptor {
    ValueDescriptor::new(
        ValueId::new(CcId::SCENE_ACTUATOR_CONF, "dimmingDuration").with_key(u32::from(scene_id)),
        ValueMetadata::duration().with_label(format!("Dimming duration ({})", scene_id)),
    )
}

fn keyed(id: &ValueId, property: &str) -> bool {
    id.is(CcId::SCENE_ACTUATOR_CONF, property) && id.property_key.is_some()
}

/// Level applied by a scene.
pub static LEVEL: ValueKind<u8> = ValueKind {
    name: "level",
    build: level,
    matches: |id| keyed(id, "level"),
};

/// Dimming duration applied by a scene.
pub static DIMMING_DURATION: ValueKind<u8> = ValueKind {
    name: "dimmingDuration",
    build: dimming_duration,
    matches: |id| keyed(id, "dimmingDuration"),
};

// ============================================================================
// Set
// ============================================================================

/// Configure the level and duration of a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneActuatorConfSet {
    /// Scene id, 1 to 255.
    pub scene_id: u8,
    /// Dimming duration.
    pub dimming_duration: Duration,
    /// Level to store; `None` stores the current level.
    pub level: Option<u8>,
}

impl SceneActuatorConfSet {
    /// Create a set command.
    pub fn new(scene_id: u8, dimming_duration: Duration, level: Option<u8>) -> Result<Self, EncodeError> {
        EncodeError::check_range("scene id", i64::from(scene_id), 1, 255)?;
        if let Some(level) = level {
            if level != 0xFF {
                EncodeError::check_range("level", i64::from(level), 0, 99)?;
            }
        }
        Ok(Self {
            scene_id,
            dimming_duration,
            level,
        })
    }
}

impl CcCommand for SceneActuatorConfSet {
    const CC_ID: CcId = CcId::SCENE_ACTUATOR_CONF;
    const COMMAND: u8 = SCENE_ACTUATOR_CONF_SET;
    const NAME: &'static str = "SceneActuatorConfSet";
}

impl SerializeCommand for SceneActuatorConfSet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let (flags, level) = match self.level {
            Some(level) => (FLAG_OVERRIDE, level),
            None => (0, 0xFF),
        };
        Ok(vec![self.scene_id, self.dimming_duration.to_byte(), flags, level])
    }
}

impl LogFields for SceneActuatorConfSet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("scene id", self.scene_id.to_string()),
            ("level", opt(&self.level)),
            ("dimming duration", self.dimming_duration.to_string()),
        ]
    }
}

impl Persist for SceneActuatorConfSet {}

// ============================================================================
// Get
// ============================================================================

/// Request the configuration of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneActuatorConfGet {
    /// Scene id; 0 asks for the active scene.
    pub scene_id: u8,
}

impl SceneActuatorConfGet {
    /// Request scene `scene_id`.
    pub fn new(scene_id: u8) -> Self {
        Self { scene_id }
    }

    /// Request the active scene.
    pub fn active_scene() -> Self {
        Self { scene_id: 0 }
    }
}

impl CcCommand for SceneActuatorConfGet {
    const CC_ID: CcId = CcId::SCENE_ACTUATOR_CONF;
    const COMMAND: u8 = SCENE_ACTUATOR_CONF_GET;
    const NAME: &'static str = "SceneActuatorConfGet";
}

impl SerializeCommand for SceneActuatorConfGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![self.scene_id])
    }
}

impl LogFields for SceneActuatorConfGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("scene id", self.scene_id.to_string())]
    }
}

impl Persist for SceneActuatorConfGet {}

/// The report answers the get: same scene, or any scene for scene 0.
pub fn report_matches_get(sent: &Command, received: &Command) -> bool {
    match (sent, received) {
        (Command::SceneActuatorConfGet(get), Command::SceneActuatorConfReport(report)) => {
            get.scene_id == 0 || get.scene_id == report.scene_id
        }
        _ => false,
    }
}

// ============================================================================
// Report
// ============================================================================

/// Configuration of one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneActuatorConfReport {
    /// Scene id; 0 means no scene is active.
    pub scene_id: u8,
    /// Level.
    pub level: u8,
    /// Dimming duration.
    pub dimming_duration: Duration,
}

impl CcCommand for SceneActuatorConfReport {
    const CC_ID: CcId = CcId::SCENE_ACTUATOR_CONF;
    const COMMAND: u8 = SCENE_ACTUATOR_CONF_REPORT;
    const NAME: &'static str = "SceneActuatorConfReport";
}

impl ParseCommand for SceneActuatorConfReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 3)?;
        Ok(Self {
            scene_id: payload[0],
            level: payload[1],
            dimming_duration: Duration::from_report_byte(payload[2]),
        })
    }
}

impl SerializeCommand for SceneActuatorConfReport {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![self.scene_id, self.level, self.dimming_duration.to_byte()])
    }
}

impl LogFields for SceneActuatorConfReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("scene id", self.scene_id.to_string()),
            ("level", self.level.to_string()),
            ("dimming duration", self.dimming_duration.to_string()),
        ]
    }
}

impl Persist for SceneActuatorConfReport {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        if self.scene_id == 0 {
            trace!("{}: no active scene, nothing to persist", ctx.peer());
            return;
        }
        ctx.set(LEVEL.descriptor(self.scene_id), self.level);
        ctx.set(DIMMING_DURATION.descriptor(self.scene_id), self.dimming_duration);
    }
}
