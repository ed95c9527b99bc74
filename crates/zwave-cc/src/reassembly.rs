//! Reassembly of values split across several report frames.
//!
//! Some reports carry a "reports to follow" counter. Fragments sharing a
//! session key are collected until a fragment arrives with the counter at
//! zero; then all fragments of the session are merged, in arrival order,
//! into one command. The counter must go down with every fragment, so a
//! session holds at most the first fragment's counter plus one fragments.
//! Sessions that never complete are abandoned by the caller's timeout and
//! leave no trace.
//!
//! ```text
//! Empty --push(more)--> Collecting(n) --push(last)--> Complete(merged)
//!                            |
//!                            +--abandon / timeout--> Abandoned
//! ```

use crate::command::Command;
use crate::error::DecodeError;
use crate::frame::{CcId, PeerAddress};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use zwave_metrics::{metric_defs, metrics, MetricLabels};

/// Per-command part of a session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartialKey {
    /// One session per frame type.
    PerFrameType,
    /// One session per parameter number.
    Parameter(u16),
}

/// Identifies one partial session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialSessionKey {
    /// Node the fragments come from.
    pub node_id: u16,
    /// Endpoint the fragments come from.
    pub endpoint: u8,
    /// Command class of the fragments.
    pub cc_id: CcId,
    /// Command id of the fragments.
    pub command: u8,
    /// Per-command discriminator.
    pub key: PartialKey,
}

/// A report that may be split across frames.
pub trait PartialReport: Sized {
    /// Session discriminator; stable across all fragments of a session.
    fn partial_key(&self) -> PartialKey;

    /// Number of fragments still expected after this one.
    fn reports_to_follow(&self) -> u8;

    /// Merge fragments, given in arrival order, into one report.
    fn merge(fragments: Vec<Self>) -> Result<Self, DecodeError>;
}

/// Partial-session properties of a received command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialInfo {
    /// Session discriminator.
    pub key: PartialKey,
    /// Number of fragments still expected after this one.
    pub reports_to_follow: u8,
}

impl PartialInfo {
    /// Whether more fragments are expected.
    pub fn more_to_follow(&self) -> bool {
        self.reports_to_follow > 0
    }
}

impl PartialInfo {
    fn of<T: PartialReport>(report: &T) -> Self {
        Self {
            key: report.partial_key(),
            reports_to_follow: report.reports_to_follow(),
        }
    }
}

fn merge_as<T: PartialReport>(
    fragments: Vec<Command>,
    extract: fn(Command) -> Option<T>,
) -> Result<T, DecodeError> {
    let typed = fragments
        .into_iter()
        .map(|cmd| {
            let name = cmd.name();
            extract(cmd).ok_or_else(|| DecodeError::Merge(format!("unexpected fragment {}", name)))
        })
        .collect::<Result<Vec<T>, _>>()?;
    T::merge(typed)
}

impl Command {
    /// Partial-session properties, for commands that can be split.
    pub fn partial_info(&self) -> Option<PartialInfo> {
        match self {
            Command::ConfigurationBulkReport(r) => Some(PartialInfo::of(r)),
            Command::ConfigurationNameReport(r) => Some(PartialInfo::of(r)),
            Command::ConfigurationInfoReport(r) => Some(PartialInfo::of(r)),
            _ => None,
        }
    }

    /// Merge the fragments of one session, in arrival order.
    pub fn merge_partials(fragments: Vec<Command>) -> Result<Command, DecodeError> {
        let first = fragments
            .first()
            .ok_or_else(|| DecodeError::Merge("no fragments".into()))?;
        match first {
            Command::ConfigurationBulkReport(_) => merge_as(fragments, |cmd| match cmd {
                Command::ConfigurationBulkReport(r) => Some(r),
                _ => None,
            })
            .map(Command::from),
            Command::ConfigurationNameReport(_) => merge_as(fragments, |cmd| match cmd {
                Command::ConfigurationNameReport(r) => Some(r),
                _ => None,
            })
            .map(Command::from),
            Command::ConfigurationInfoReport(_) => merge_as(fragments, |cmd| match cmd {
                Command::ConfigurationInfoReport(r) => Some(r),
                _ => None,
            })
            .map(Command::from),
            other => Err(DecodeError::Merge(format!("{} is not a partial report", other.name()))),
        }
    }
}

/// Result of feeding one command to the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembly {
    /// The command is not a partial report; it is handed back untouched.
    NotPartial(Command),
    /// The fragment was stored; more are expected.
    Collecting {
        /// Session the fragment belongs to.
        key: PartialSessionKey,
        /// Fragments collected so far.
        fragments: usize,
    },
    /// The session is complete.
    Complete(Command),
}

/// State of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No fragment stored.
    Empty,
    /// Fragments stored, more expected.
    Collecting(usize),
}

#[derive(Debug)]
struct Session {
    fragments: Vec<Command>,
    started: Instant,
    last_to_follow: u8,
}

/// Collects partial reports per session.
#[derive(Debug, Default)]
pub struct Reassembler {
    sessions: HashMap<PartialSessionKey, Session>,
}

impl Reassembler {
    /// Create a reassembler with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a received command, stamped with the current time.
    pub fn push(&mut self, peer: PeerAddress, command: Command) -> Result<Reassembly, DecodeError> {
        self.push_at(peer, command, Instant::now())
    }

    /// Feed a received command that arrived at `now`.
    ///
    /// `peer` is the address the command is attributed to after unwrapping
    /// encapsulation.
    pub fn push_at(
        &mut self,
        peer: PeerAddress,
        command: Command,
        now: Instant,
    ) -> Result<Reassembly, DecodeError> {
        let info = match command.partial_info() {
            Some(info) => info,
            None => return Ok(Reassembly::NotPartial(command)),
        };

        let key = PartialSessionKey {
            node_id: peer.node_id,
            endpoint: peer.endpoint,
            cc_id: command.cc_id(),
            command: command.command(),
            key: info.key,
        };

        if let Some(session) = self.sessions.get(&key) {
            if info.reports_to_follow >= session.last_to_follow {
                let last = session.last_to_follow;
                if let Some(session) = self.sessions.remove(&key) {
                    record_abandoned(&key, session.fragments.len(), "counter not decreasing");
                }
                return Err(DecodeError::Merge(format!(
                    "reports to follow went from {} to {}",
                    last, info.reports_to_follow
                )));
            }
        }

        let session = self.sessions.entry(key).or_insert_with(|| Session {
            fragments: Vec::new(),
            started: now,
            last_to_follow: info.reports_to_follow,
        });
        session.fragments.push(command);
        session.last_to_follow = info.reports_to_follow;

        if info.more_to_follow() {
            let fragments = session.fragments.len();
            trace!("Collecting {:?} from {}: {} fragment(s)", key.key, peer, fragments);
            return Ok(Reassembly::Collecting { key, fragments });
        }

        let Some(session) = self.sessions.remove(&key) else {
            return Err(DecodeError::Merge("session vanished".into()));
        };
        let count = session.fragments.len();
        let merged = match Command::merge_partials(session.fragments) {
            Ok(merged) => merged,
            Err(e) => {
                record_abandoned(&key, count, "merge failed");
                return Err(e);
            }
        };

        let labels = MetricLabels::new(peer.node_id, key.cc_id.name()).with_endpoint(peer.endpoint);
        metrics::counter!(metric_defs::REASSEMBLY_COMPLETED.name, &labels.to_labels()).increment(1);
        metrics::histogram!(metric_defs::REASSEMBLY_FRAGMENTS.name, &labels.to_labels())
            .record(count as f64);
        trace!("Merged {} fragment(s) of {} from {}", count, merged.name(), peer);

        Ok(Reassembly::Complete(merged))
    }

    /// State of a session.
    pub fn state(&self, key: &PartialSessionKey) -> SessionState {
        match self.sessions.get(key) {
            Some(session) => SessionState::Collecting(session.fragments.len()),
            None => SessionState::Empty,
        }
    }

    /// Number of incomplete sessions.
    pub fn pending(&self) -> usize {
        self.sessions.len()
    }

    /// Drop one session. Returns whether it existed.
    pub fn abandon(&mut self, key: &PartialSessionKey) -> bool {
        match self.sessions.remove(key) {
            Some(session) => {
                record_abandoned(key, session.fragments.len(), "cancelled");
                true
            }
            None => false,
        }
    }

    /// Drop every session of one node. Returns how many were dropped.
    pub fn abandon_node(&mut self, node_id: u16) -> usize {
        self.abandon_where(|key, _| key.node_id == node_id, "cancelled")
    }

    /// Drop sessions started more than `timeout` before `now`.
    pub fn abandon_expired(&mut self, now: Instant, timeout: Duration) -> usize {
        self.abandon_where(
            |_, session| now.saturating_duration_since(session.started) >= timeout,
            "timeout",
        )
    }

    fn abandon_where(
        &mut self,
        mut predicate: impl FnMut(&PartialSessionKey, &Session) -> bool,
        reason: &'static str,
    ) -> usize {
        let keys: Vec<_> = self
            .sessions
            .iter()
            .filter(|(key, session)| predicate(key, session))
            .map(|(key, _)| *key)
            .collect();
        for key in &keys {
            if let Some(session) = self.sessions.remove(key) {
                record_abandoned(key, session.fragments.len(), reason);
            }
        }
        keys.len()
    }
}

fn record_abandoned(key: &PartialSessionKey, fragments: usize, reason: &'static str) {
    debug!(
        "Abandoning partial session {:?} of node {} after {} fragment(s): {}",
        key.key,
        key.node_id,
        fragments,
        reason
    );
    let labels = MetricLabels::new(key.node_id, key.cc_id.name())
        .with_endpoint(key.endpoint)
        .with(&[("reason", reason.to_string())]);
    metrics::counter!(metric_defs::REASSEMBLY_ABANDONED.name, &labels).increment(1);
}
