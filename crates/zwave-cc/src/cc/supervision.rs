//! Supervision command class (0x6C).
//!
//! A Supervision Get wraps one command and asks the receiver to report
//! whether it was applied. Reports are correlated by session id.

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::command::Command;
use crate::constants::{SUPERVISION_GET, SUPERVISION_REPORT};
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::LogFields;
use crate::numeric::Duration;
use crate::persist::{Persist, PersistContext};
use std::fmt;

/// Largest session id; it occupies six bits.
pub const MAX_SESSION_ID: u8 = 0x3F;

const FLAG_STATUS_UPDATES: u8 = 0x80;
const FLAG_MORE_UPDATES: u8 = 0x80;
const FLAG_WAKE_UP_REQUEST: u8 = 0x40;

/// Outcome reported for a supervised command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisionStatus {
    /// The command is not supported.
    NoSupport,
    /// The command is being applied.
    Working,
    /// The command failed.
    Fail,
    /// The command was applied.
    Success,
}

impl SupervisionStatus {
    /// Status from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(SupervisionStatus::NoSupport),
            0x01 => Some(SupervisionStatus::Working),
            0x02 => Some(SupervisionStatus::Fail),
            0xFF => Some(SupervisionStatus::Success),
            _ => None,
        }
    }

    /// Wire byte.
    pub fn to_byte(self) -> u8 {
        match self {
            SupervisionStatus::NoSupport => 0x00,
            SupervisionStatus::Working => 0x01,
            SupervisionStatus::Fail => 0x02,
            SupervisionStatus::Success => 0xFF,
        }
    }
}

impl fmt::Display for SupervisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisionStatus::NoSupport => "no support",
            SupervisionStatus::Working => "working",
            SupervisionStatus::Fail => "fail",
            SupervisionStatus::Success => "success",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Get
// ============================================================================

/// A command wrapped for supervised delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisionGet {
    /// Session id, 0 to 63.
    pub session_id: u8,
    /// Ask for intermediate Working reports.
    pub status_updates: bool,
    /// The supervised command.
    pub encapsulated: Box<Command>,
}

impl SupervisionGet {
    /// Wrap `command` in session `session_id`.
    pub fn new(session_id: u8, command: Command) -> Result<Self, EncodeError> {
        EncodeError::check_range("session id", i64::from(session_id), 0, i64::from(MAX_SESSION_ID))?;
        Ok(Self {
            session_id,
            status_updates: false,
            encapsulated: Box::new(command),
        })
    }

    /// Ask for intermediate Working reports.
    pub fn with_status_updates(mut self) -> Self {
        self.status_updates = true;
        self
    }
}

impl CcCommand for SupervisionGet {
    const CC_ID: CcId = CcId::SUPERVISION;
    const COMMAND: u8 = SUPERVISION_GET;
    const NAME: &'static str = "SupervisionGet";
}

impl ParseCommand for SupervisionGet {
    fn parse(payload: &[u8], ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 2)?;
        let length = payload[1] as usize;
        Self::require_len(payload, 2 + length)?;
        let encapsulated = ctx.decode_encapsulated(&payload[2..2 + length], ctx.peer)?;
        Ok(Self {
            session_id: payload[0] & MAX_SESSION_ID,
            status_updates: payload[0] & FLAG_STATUS_UPDATES != 0,
            encapsulated: Box::new(encapsulated),
        })
    }
}

impl SerializeCommand for SupervisionGet {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        EncodeError::check_range("session id", i64::from(self.session_id), 0, i64::from(MAX_SESSION_ID))?;
        let inner = self.encapsulated.encode(ctx)?;
        EncodeError::check_len("supervised command", inner.len(), u8::MAX as usize)?;

        let mut first = self.session_id;
        if self.status_updates {
            first |= FLAG_STATUS_UPDATES;
        }
        let mut payload = vec![first, inner.len() as u8];
        payload.extend(inner);
        Ok(payload)
    }
}

impl LogFields for SupervisionGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("session id", self.session_id.to_string()),
            ("request updates", self.status_updates.to_string()),
        ]
    }
}

impl Persist for SupervisionGet {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        self.encapsulated.persist(ctx);
    }
}

// ============================================================================
// Report
// ============================================================================

/// Delivery status of a supervised command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisionReport {
    /// More reports for this session follow.
    pub more_updates_follow: bool,
    /// The receiver asks to be kept awake (v2).
    pub wake_up_request: Option<bool>,
    /// Session id.
    pub session_id: u8,
    /// Status.
    pub status: SupervisionStatus,
    /// Expected time until completion.
    pub duration: Duration,
}

impl CcCommand for SupervisionReport {
    const CC_ID: CcId = CcId::SUPERVISION;
    const COMMAND: u8 = SUPERVISION_REPORT;
    const NAME: &'static str = "SupervisionReport";
}

impl ParseCommand for SupervisionReport {
    fn parse(payload: &[u8], ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 3)?;
        let status = SupervisionStatus::from_byte(payload[1])
            .ok_or_else(|| Self::invalid("status", format!("unknown status 0x{:02X}", payload[1])))?;
        let wake_up_request = if ctx.version(CcId::SUPERVISION) >= 2 {
            Some(payload[0] & FLAG_WAKE_UP_REQUEST != 0)
        } else {
            None
        };
        Ok(Self {
            more_updates_follow: payload[0] & FLAG_MORE_UPDATES != 0,
            wake_up_request,
            session_id: payload[0] & MAX_SESSION_ID,
            status,
            duration: Duration::from_report_byte(payload[2]),
        })
    }
}

impl SerializeCommand for SupervisionReport {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        EncodeError::check_range("session id", i64::from(self.session_id), 0, i64::from(MAX_SESSION_ID))?;
        let mut first = self.session_id;
        if self.more_updates_follow {
            first |= FLAG_MORE_UPDATES;
        }
        if ctx.version(CcId::SUPERVISION) >= 2 && self.wake_up_request == Some(true) {
            first |= FLAG_WAKE_UP_REQUEST;
        }
        Ok(vec![first, self.status.to_byte(), self.duration.to_byte()])
    }
}

impl LogFields for SupervisionReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("session id", self.session_id.to_string()),
            ("more updates follow", self.more_updates_follow.to_string()),
            ("status", self.status.to_string()),
            ("duration", self.duration.to_string()),
        ]
    }
}

impl Persist for SupervisionReport {}

/// The report belongs to the session of the get.
pub fn report_matches_get(sent: &Command, received: &Command) -> bool {
    match (sent, received) {
        (Command::SupervisionGet(get), Command::SupervisionReport(report)) => {
            get.session_id == report.session_id
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::basic::BasicSet;
    use crate::codec::CcVersions;
    use crate::test_util::{parse, serialize};

    #[test]
    fn test_get_wraps_command() {
        let get = SupervisionGet::new(5, BasicSet::new(0x63).unwrap().into())
            .unwrap()
            .with_status_updates();
        let wire = serialize(&get, 1);
        assert_eq!(wire, vec![0x85, 3, 0x20, 0x01, 0x63]);
        assert_eq!(parse::<SupervisionGet>(&wire, 1).unwrap(), get);
    }

    #[test]
    fn test_get_rejects_large_session_id() {
        assert!(SupervisionGet::new(64, BasicSet::new(0).unwrap().into()).is_err());

        let mut get = SupervisionGet::new(1, BasicSet::new(0).unwrap().into()).unwrap();
        get.session_id = 0x41;
        let versions = CcVersions::new(1);
        assert!(matches!(
            get.serialize(&SerializeContext::new(&versions)),
            Err(EncodeError::FieldOutOfRange { field: "session id", value: 0x41, .. })
        ));
    }

    #[test]
    fn test_get_length_exceeds_payload() {
        assert!(matches!(
            parse::<SupervisionGet>(&[0x05, 4, 0x20, 0x01, 0x63], 1),
            Err(DecodeError::PayloadTooShort { expected: 6, actual: 5, .. })
        ));
    }

    #[test]
    fn test_report_v2_wake_up() {
        let report: SupervisionReport = parse(&[0x40 | 0x07, 0xFF, 0x00], 2).unwrap();
        assert_eq!(report.session_id, 7);
        assert_eq!(report.status, SupervisionStatus::Success);
        assert_eq!(report.wake_up_request, Some(true));
        assert_eq!(serialize(&report, 2), vec![0x47, 0xFF, 0x00]);

        let v1: SupervisionReport = parse(&[0x40 | 0x07, 0xFF, 0x00], 1).unwrap();
        assert_eq!(v1.wake_up_request, None);
        assert!(parse::<SupervisionReport>(&[0x07, 0x10, 0x00], 1).is_err());
    }

    #[test]
    fn test_session_predicate() {
        let get = Command::from(SupervisionGet::new(9, BasicSet::new(1).unwrap().into()).unwrap());
        let report = |session_id| {
            Command::from(SupervisionReport {
                more_updates_follow: false,
                wake_up_request: None,
                session_id,
                status: SupervisionStatus::Success,
                duration: Duration::INSTANT,
            })
        };
        assert!(report_matches_get(&get, &report(9)));
        assert!(!report_matches_get(&get, &report(10)));
    }
}
