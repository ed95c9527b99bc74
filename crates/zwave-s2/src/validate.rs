//! Extension validation.
//!
//! Validation never reports anything back to the peer. Unacceptable
//! extensions are dropped with a debug log and a metric; an unknown critical
//! extension discards the containing command, because it may change what the
//! command means.

use crate::{ExtensionKind, RawExtension, Security2Extension};
use tracing::debug;
use zwave_metrics::{metric_defs, metrics};

/// Why a single extension was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Known kind with the wrong length.
    Malformed,
    /// Unknown, non-critical kind.
    UnknownKind,
    /// The kind is not allowed in this encryption context.
    WrongEncryptionContext,
}

impl DropReason {
    /// Label used in metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            DropReason::Malformed => "malformed",
            DropReason::UnknownKind => "unknown_kind",
            DropReason::WrongEncryptionContext => "wrong_context",
        }
    }
}

/// Outcome of validating one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The extension is accepted.
    Keep(Security2Extension),
    /// Only this extension is dropped.
    Drop(DropReason),
    /// The whole containing command must be discarded.
    DiscardCommand,
}

/// Outcome of validating a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainVerdict {
    /// The extensions that survived validation, in wire order.
    Accepted(Vec<Security2Extension>),
    /// An unknown critical extension was found.
    DiscardCommand {
        /// The unknown kind bits.
        kind: u8,
    },
}

/// Validate one extension.
///
/// `was_encrypted` is whether the section holding the extension arrived
/// encrypted and was decrypted.
pub fn validate_extension(raw: &RawExtension, was_encrypted: bool) -> Verdict {
    let ext = match Security2Extension::interpret(raw) {
        Some(ext) => ext,
        None => {
            return match raw.kind {
                ExtensionKind::Unknown(_) if raw.critical => Verdict::DiscardCommand,
                ExtensionKind::Unknown(_) => Verdict::Drop(DropReason::UnknownKind),
                _ => Verdict::Drop(DropReason::Malformed),
            };
        }
    };

    if ext.kind().requires_encryption() != was_encrypted {
        return Verdict::Drop(DropReason::WrongEncryptionContext);
    }

    Verdict::Keep(ext)
}

/// Validate every extension in a chain.
pub fn validate_chain(raws: &[RawExtension], was_encrypted: bool) -> ChainVerdict {
    let mut accepted = Vec::with_capacity(raws.len());

    for raw in raws {
        match validate_extension(raw, was_encrypted) {
            Verdict::Keep(ext) => accepted.push(ext),
            Verdict::Drop(reason) => {
                debug!(
                    "Dropping S2 extension kind={} critical={} reason={:?}",
                    raw.kind.to_bits(),
                    raw.critical,
                    reason
                );
                let labels = [
                    ("kind", raw.kind.as_label().to_string()),
                    ("reason", reason.as_label().to_string()),
                ];
                metrics::counter!(metric_defs::S2_EXTENSIONS_DROPPED.name, &labels).increment(1);
            }
            Verdict::DiscardCommand => {
                let kind = raw.kind.to_bits();
                debug!("Discarding command: unknown critical S2 extension kind={}", kind);
                let labels = [("kind", kind.to_string())];
                metrics::counter!(metric_defs::S2_COMMANDS_DISCARDED.name, &labels).increment(1);
                return ChainVerdict::DiscardCommand { kind };
            }
        }
    }

    ChainVerdict::Accepted(accepted)
}
