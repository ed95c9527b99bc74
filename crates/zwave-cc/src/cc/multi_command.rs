//! Multi Command command class (0x8F).
//!
//! Batches several commands into one frame. The batch is a leaf of the
//! single-child unwrap walk; its commands are handled one by one.

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::command::Command;
use crate::constants::MULTI_COMMAND_ENCAP;
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::LogFields;
use crate::persist::{Persist, PersistContext};

/// Several commands in one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiCommandEncapsulation {
    /// The batched commands, in order.
    pub encapsulated: Vec<Command>,
}

impl MultiCommandEncapsulation {
    /// Batch `commands`.
    pub fn new(commands: Vec<Command>) -> Result<Self, EncodeError> {
        EncodeError::check_len("batched commands", commands.len(), u8::MAX as usize)?;
        Ok(Self {
            encapsulated: commands,
        })
    }
}

impl CcCommand for MultiCommandEncapsulation {
    const CC_ID: CcId = CcId::MULTI_COMMAND;
    const COMMAND: u8 = MULTI_COMMAND_ENCAP;
    const NAME: &'static str = "MultiCommandEncapsulation";
}

impl ParseCommand for MultiCommandEncapsulation {
    fn parse(payload: &[u8], ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 1)?;
        let count = payload[0] as usize;
        let mut offset = 1;
        let mut encapsulated = Vec::with_capacity(count);

        for _ in 0..count {
            Self::require_len(payload, offset + 1)?;
            let length = payload[offset] as usize;
            offset += 1;
            Self::require_len(payload, offset + length)?;
            encapsulated.push(ctx.decode_encapsulated(&payload[offset..offset + length], ctx.peer)?);
            offset += length;
        }

        Ok(Self { encapsulated })
    }
}

impl SerializeCommand for MultiCommandEncapsulation {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        EncodeError::check_len("batched commands", self.encapsulated.len(), u8::MAX as usize)?;
        let mut payload = vec![self.encapsulated.len() as u8];
        for command in &self.encapsulated {
            let frame = command.encode(ctx)?;
            EncodeError::check_len("batched command", frame.len(), u8::MAX as usize)?;
            payload.push(frame.len() as u8);
            payload.extend(frame);
        }
        Ok(payload)
    }
}

impl LogFields for MultiCommandEncapsulation {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("commands", self.encapsulated.len().to_string())]
    }
}

impl Persist for MultiCommandEncapsulation {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        for command in &mut self.encapsulated {
            command.persist(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::basic::BasicReport;
    use crate::cc::scene_actuator_conf::SceneActuatorConfReport;
    use crate::numeric::Duration;
    use crate::test_util::{parse, serialize};

    #[test]
    fn test_batch_layout() {
        let batch = MultiCommandEncapsulation::new(vec![
            BasicReport {
                current_value: 1,
                target_value: None,
                duration: None,
            }
            .into(),
            SceneActuatorConfReport {
                scene_id: 2,
                level: 3,
                dimming_duration: Duration::Seconds(4),
            }
            .into(),
        ])
        .unwrap();
        let wire = serialize(&batch, 1);
        assert_eq!(wire, vec![2, 3, 0x20, 0x03, 1, 5, 0x2C, 0x03, 2, 3, 4]);
        assert_eq!(parse::<MultiCommandEncapsulation>(&wire, 1).unwrap(), batch);
    }

    #[test]
    fn test_count_exceeds_payload() {
        assert!(matches!(
            parse::<MultiCommandEncapsulation>(&[2, 3, 0x20, 0x03, 1], 1),
            Err(DecodeError::PayloadTooShort { expected: 6, actual: 5, .. })
        ));
    }
}
