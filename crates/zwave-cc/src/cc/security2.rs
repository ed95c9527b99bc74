//! Security 2 command class (0x9F): nonce exchange and message
//! encapsulation.
//!
//! Decryption happens in the transport. A message encapsulation arrives here
//! in plaintext form when the transport decrypted it, and as opaque
//! ciphertext otherwise; [`ParseContext::decrypted`] says which.
//!
//! Extension chains are validated with [`zwave_s2::validate_chain`]: the
//! unencrypted chain as not decrypted, the encrypted chain as decrypted. An
//! unknown critical extension discards the whole command.

use crate::codec::{CcCommand, ParseCommand, ParseContext, SerializeCommand, SerializeContext};
use crate::command::Command;
use crate::constants::{SECURITY_2_MESSAGE_ENCAP, SECURITY_2_NONCE_GET, SECURITY_2_NONCE_REPORT};
use crate::error::{DecodeError, EncodeError};
use crate::frame::CcId;
use crate::log::LogFields;
use crate::persist::{Persist, PersistContext};
use zwave_s2::{decode_chain, encode_chain, validate_chain, ChainVerdict, Security2Extension, ENTROPY_SIZE};

const FLAG_SOS: u8 = 0x01;
const FLAG_MOS: u8 = 0x02;

const FLAG_UNENCRYPTED_EXTENSIONS: u8 = 0x01;
const FLAG_ENCRYPTED_EXTENSIONS: u8 = 0x02;

/// Read and validate one extension chain at the start of `data`.
///
/// Returns the accepted extensions and the bytes consumed.
fn read_chain(data: &[u8], decrypted: bool) -> Result<(Vec<Security2Extension>, usize), DecodeError> {
    let (raws, consumed) = decode_chain(data)?;
    match validate_chain(&raws, decrypted) {
        ChainVerdict::Accepted(extensions) => Ok((extensions, consumed)),
        ChainVerdict::DiscardCommand { kind } => Err(DecodeError::DiscardedByExtension { kind }),
    }
}

// ============================================================================
// Nonce Get / Report
// ============================================================================

/// Request a fresh nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Security2NonceGet {
    /// Sequence number, echoed by the report.
    pub sequence_number: u8,
}

impl CcCommand for Security2NonceGet {
    const CC_ID: CcId = CcId::SECURITY_2;
    const COMMAND: u8 = SECURITY_2_NONCE_GET;
    const NAME: &'static str = "Security2NonceGet";
}

impl ParseCommand for Security2NonceGet {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 1)?;
        Ok(Self {
            sequence_number: payload[0],
        })
    }
}

impl SerializeCommand for Security2NonceGet {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![self.sequence_number])
    }
}

impl LogFields for Security2NonceGet {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![("sequence number", self.sequence_number.to_string())]
    }
}

impl Persist for Security2NonceGet {}

/// Nonce state of the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Security2NonceReport {
    /// Sequence number of the get this answers.
    pub sequence_number: u8,
    /// Singlecast out of sync; carries new receiver entropy.
    pub sos: bool,
    /// Multicast out of sync.
    pub mos: bool,
    /// Receiver entropy, present when `sos` is set.
    pub receiver_entropy: Option<[u8; ENTROPY_SIZE]>,
}

impl Security2NonceReport {
    /// Report singlecast out of sync with fresh receiver entropy.
    pub fn singlecast_out_of_sync(sequence_number: u8, receiver_entropy: [u8; ENTROPY_SIZE]) -> Self {
        Self {
            sequence_number,
            sos: true,
            mos: false,
            receiver_entropy: Some(receiver_entropy),
        }
    }

    /// Report multicast out of sync.
    pub fn multicast_out_of_sync(sequence_number: u8) -> Self {
        Self {
            sequence_number,
            sos: false,
            mos: true,
            receiver_entropy: None,
        }
    }
}

impl CcCommand for Security2NonceReport {
    const CC_ID: CcId = CcId::SECURITY_2;
    const COMMAND: u8 = SECURITY_2_NONCE_REPORT;
    const NAME: &'static str = "Security2NonceReport";
}

impl ParseCommand for Security2NonceReport {
    fn parse(payload: &[u8], _ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 2)?;
        let sos = payload[1] & FLAG_SOS != 0;
        let mos = payload[1] & FLAG_MOS != 0;
        if !sos && !mos {
            return Err(Self::invalid("flags", "neither SOS nor MOS is set"));
        }

        let receiver_entropy = if sos {
            Self::require_len(payload, 2 + ENTROPY_SIZE)?;
            let mut entropy = [0u8; ENTROPY_SIZE];
            entropy.copy_from_slice(&payload[2..2 + ENTROPY_SIZE]);
            Some(entropy)
        } else {
            None
        };

        Ok(Self {
            sequence_number: payload[0],
            sos,
            mos,
            receiver_entropy,
        })
    }
}

impl SerializeCommand for Security2NonceReport {
    fn serialize(&self, _ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        if !self.sos && !self.mos {
            return Err(EncodeError::Invalid("nonce report needs SOS or MOS".into()));
        }
        let mut flags = 0;
        if self.sos {
            flags |= FLAG_SOS;
        }
        if self.mos {
            flags |= FLAG_MOS;
        }

        let mut payload = vec![self.sequence_number, flags];
        if self.sos {
            let entropy = self
                .receiver_entropy
                .ok_or_else(|| EncodeError::Invalid("SOS nonce report without receiver entropy".into()))?;
            payload.extend_from_slice(&entropy);
        }
        Ok(payload)
    }
}

impl LogFields for Security2NonceReport {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sequence number", self.sequence_number.to_string()),
            ("SOS", self.sos.to_string()),
            ("MOS", self.mos.to_string()),
        ]
    }
}

impl Persist for Security2NonceReport {}

/// The report answers the get with the same sequence number.
pub fn nonce_report_matches_get(sent: &Command, received: &Command) -> bool {
    match (sent, received) {
        (Command::Security2NonceGet(get), Command::Security2NonceReport(report)) => {
            get.sequence_number == report.sequence_number
        }
        _ => false,
    }
}

// ============================================================================
// Message Encapsulation
// ============================================================================

/// What follows the unencrypted extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Security2Payload {
    /// Decrypted by the transport. The command is absent for frames that
    /// only carry extensions.
    Plaintext(Option<Box<Command>>),
    /// Not decrypted; kept opaque.
    Ciphertext {
        /// The encrypted bytes.
        data: Vec<u8>,
        /// The encrypted section starts with an extension chain.
        has_encrypted_extensions: bool,
    },
}

/// A command protected by Security 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Security2MessageEncapsulation {
    /// Sequence number.
    pub sequence_number: u8,
    /// Accepted extensions of the unencrypted section.
    pub extensions: Vec<Security2Extension>,
    /// Accepted extensions of the encrypted section; empty for ciphertext.
    pub encrypted_extensions: Vec<Security2Extension>,
    /// The protected content.
    pub payload: Security2Payload,
}

impl Security2MessageEncapsulation {
    /// Protect `command`.
    pub fn new(sequence_number: u8, command: Command) -> Self {
        Self {
            sequence_number,
            extensions: Vec::new(),
            encrypted_extensions: Vec::new(),
            payload: Security2Payload::Plaintext(Some(Box::new(command))),
        }
    }

    /// Add an extension to the section it belongs in.
    pub fn with_extension(mut self, extension: Security2Extension) -> Self {
        if extension.kind().requires_encryption() {
            self.encrypted_extensions.push(extension);
        } else {
            self.extensions.push(extension);
        }
        self
    }

    /// The protected command, if decrypted and present.
    pub fn command(&self) -> Option<&Command> {
        match &self.payload {
            Security2Payload::Plaintext(Some(command)) => Some(command),
            _ => None,
        }
    }
}

impl CcCommand for Security2MessageEncapsulation {
    const CC_ID: CcId = CcId::SECURITY_2;
    const COMMAND: u8 = SECURITY_2_MESSAGE_ENCAP;
    const NAME: &'static str = "Security2MessageEncapsulation";
}

impl ParseCommand for Security2MessageEncapsulation {
    fn parse(payload: &[u8], ctx: &ParseContext<'_>) -> Result<Self, DecodeError> {
        Self::require_len(payload, 2)?;
        let sequence_number = payload[0];
        let flags = payload[1];
        let mut offset = 2;

        let mut extensions = Vec::new();
        if flags & FLAG_UNENCRYPTED_EXTENSIONS != 0 {
            let (accepted, consumed) = read_chain(&payload[offset..], false)?;
            extensions = accepted;
            offset += consumed;
        }

        let has_encrypted_extensions = flags & FLAG_ENCRYPTED_EXTENSIONS != 0;
        if !ctx.decrypted {
            return Ok(Self {
                sequence_number,
                extensions,
                encrypted_extensions: Vec::new(),
                payload: Security2Payload::Ciphertext {
                    data: payload[offset..].to_vec(),
                    has_encrypted_extensions,
                },
            });
        }

        let mut encrypted_extensions = Vec::new();
        if has_encrypted_extensions {
            let (accepted, consumed) = read_chain(&payload[offset..], true)?;
            encrypted_extensions = accepted;
            offset += consumed;
        }

        let inner = &payload[offset..];
        let command = if inner.is_empty() {
            None
        } else {
            Some(Box::new(ctx.decode_encapsulated(inner, ctx.peer)?))
        };

        Ok(Self {
            sequence_number,
            extensions,
            encrypted_extensions,
            payload: Security2Payload::Plaintext(command),
        })
    }
}

impl SerializeCommand for Security2MessageEncapsulation {
    fn serialize(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let mut flags = 0;
        if !self.extensions.is_empty() {
            flags |= FLAG_UNENCRYPTED_EXTENSIONS;
        }
        let encrypted_chain = match &self.payload {
            Security2Payload::Plaintext(_) => !self.encrypted_extensions.is_empty(),
            Security2Payload::Ciphertext {
                has_encrypted_extensions,
                ..
            } => *has_encrypted_extensions,
        };
        if encrypted_chain {
            flags |= FLAG_ENCRYPTED_EXTENSIONS;
        }

        let mut payload = vec![self.sequence_number, flags];
        payload.extend(encode_chain(&self.extensions));
        match &self.payload {
            Security2Payload::Plaintext(command) => {
                payload.extend(encode_chain(&self.encrypted_extensions));
                if let Some(command) = command {
                    payload.extend(command.encode(ctx)?);
                }
            }
            Security2Payload::Ciphertext { data, .. } => payload.extend_from_slice(data),
        }
        Ok(payload)
    }
}

impl LogFields for Security2MessageEncapsulation {
    fn log_fields(&self) -> Vec<(&'static str, String)> {
        let kinds = |extensions: &[Security2Extension]| {
            extensions
                .iter()
                .map(|e| e.kind().as_label())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut fields = vec![
            ("sequence number", self.sequence_number.to_string()),
            ("extensions", kinds(&self.extensions)),
        ];
        match &self.payload {
            Security2Payload::Plaintext(_) => {
                fields.push(("encrypted extensions", kinds(&self.encrypted_extensions)))
            }
            Security2Payload::Ciphertext { data, .. } => {
                fields.push(("ciphertext", format!("{} bytes", data.len())))
            }
        }
        fields
    }
}

impl Persist for Security2MessageEncapsulation {
    fn persist(&mut self, ctx: &mut PersistContext<'_>) {
        if let Security2Payload::Plaintext(Some(command)) = &mut self.payload {
            command.persist(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::basic::BasicGet;
    use crate::test_util::{parse, parse_with, serialize};

    #[test]
    fn test_nonce_report_sos() {
        let mut wire = vec![7, FLAG_SOS];
        wire.extend_from_slice(&[0xAB; ENTROPY_SIZE]);
        let report: Security2NonceReport = parse(&wire, 1).unwrap();
        assert_eq!(report, Security2NonceReport::singlecast_out_of_sync(7, [0xAB; ENTROPY_SIZE]));
        assert_eq!(serialize(&report, 1), wire);
    }

    #[test]
    fn test_nonce_report_needs_a_flag() {
        assert!(matches!(
            parse::<Security2NonceReport>(&[7, 0x00], 1),
            Err(DecodeError::InvalidField { field: "flags", .. })
        ));
        assert!(matches!(
            parse::<Security2NonceReport>(&[7, FLAG_SOS, 1, 2], 1),
            Err(DecodeError::PayloadTooShort { expected: 18, .. })
        ));
        let mos = Security2NonceReport::multicast_out_of_sync(3);
        assert_eq!(serialize(&mos, 1), vec![3, FLAG_MOS]);
    }

    #[test]
    fn test_plaintext_with_command() {
        let encap = Security2MessageEncapsulation::new(9, BasicGet.into())
            .with_extension(Security2Extension::Mgrp { group_id: 2 });
        let wire = serialize(&encap, 1);
        assert_eq!(wire, vec![9, FLAG_UNENCRYPTED_EXTENSIONS, 3, 0x43, 2, 0x20, 0x02]);
        // Basic Get is never received, so only the outer layers decode
        assert!(matches!(
            parse_with::<Security2MessageEncapsulation>(&wire, 1, true),
            Err(DecodeError::UnrecognizedFrame { .. })
        ));
    }

    #[test]
    fn test_extension_only_frame() {
        let wire = [4, 0x00];
        let encap: Security2MessageEncapsulation = parse_with(&wire, 1, true).unwrap();
        assert_eq!(encap.payload, Security2Payload::Plaintext(None));
        assert_eq!(encap.command(), None);
    }

    #[test]
    fn test_truncated_chain_is_an_error() {
        assert!(matches!(
            parse_with::<Security2MessageEncapsulation>(&[1, FLAG_UNENCRYPTED_EXTENSIONS, 18, 0x41, 0], 1, false),
            Err(DecodeError::Extension(_))
        ));
    }

    #[test]
    fn test_mpan_routed_to_encrypted_section() {
        let encap = Security2MessageEncapsulation::new(1, BasicGet.into()).with_extension(
            Security2Extension::Mpan {
                group_id: 1,
                inner_state: [0; 16],
            },
        );
        assert!(encap.extensions.is_empty());
        assert_eq!(encap.encrypted_extensions.len(), 1);
    }
}
