//! Matching received frames to outstanding requests.
//!
//! A request declares the command it expects back and, where several
//! responses of that kind could be in flight, a predicate over the sent and
//! received commands. Both sides are compared at the innermost command of
//! their single-child encapsulation chain. A response must come from the
//! node and endpoint the request was addressed to, before the deadline.
//! Running out of time is an ordinary outcome, [`MatchOutcome::NoResponse`],
//! not an error.

use crate::cc::multi_channel::EndpointDestination;
use crate::cc::{color_switch, configuration, scene_actuator_conf, security2, supervision};
use crate::codec::CcCommand;
use crate::command::Command;
use crate::encapsulation;
use crate::frame::{CcId, PeerAddress};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use zwave_metrics::{metric_defs, metrics, MetricLabels};

/// Decides whether a received command answers the sent one.
pub type ResponsePredicate = fn(&Command, &Command) -> bool;

/// The response a request waits for.
#[derive(Clone, Copy)]
pub struct ExpectedResponse {
    /// Command class of the response.
    pub cc_id: CcId,
    /// Command id of the response.
    pub command: u8,
    /// Extra check for ambiguous responses.
    pub predicate: Option<ResponsePredicate>,
}

impl ExpectedResponse {
    /// Expect any command of type `T`.
    pub fn of<T: CcCommand>() -> Self {
        Self {
            cc_id: T::CC_ID,
            command: T::COMMAND,
            predicate: None,
        }
    }

    /// Expect a command of type `T` that also passes `predicate`.
    pub fn checked<T: CcCommand>(predicate: ResponsePredicate) -> Self {
        Self {
            predicate: Some(predicate),
            ..Self::of::<T>()
        }
    }

    /// Whether `received` is of the expected kind.
    pub fn is_kind_of(&self, received: &Command) -> bool {
        received.cc_id() == self.cc_id && received.command() == self.command
    }
}

impl fmt::Debug for ExpectedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectedResponse")
            .field("cc_id", &self.cc_id)
            .field("command", &format_args!("0x{:02X}", self.command))
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl Command {
    /// The response this command waits for, and the command along its
    /// single-child chain that declares it.
    ///
    /// The outermost declaring layer wins, so a supervised set waits for the
    /// Supervision Report.
    pub fn expected_response(&self) -> Option<(&Command, ExpectedResponse)> {
        self.encapsulation_chain()
            .into_iter()
            .find_map(|cmd| cmd.declared_response().map(|expected| (cmd, expected)))
    }

    fn declared_response(&self) -> Option<ExpectedResponse> {
        use crate::cc::basic::BasicReport;
        use crate::cc::color_switch::{ColorSwitchReport, ColorSwitchSupportedReport};
        use crate::cc::configuration::{
            ConfigurationBulkReport, ConfigurationInfoReport, ConfigurationNameReport,
            ConfigurationPropertiesReport, ConfigurationReport,
        };
        use crate::cc::scene_actuator_conf::SceneActuatorConfReport;
        use crate::cc::security2::Security2NonceReport;
        use crate::cc::supervision::SupervisionReport;

        let expected = match self {
            Command::BasicGet(_) => ExpectedResponse::of::<BasicReport>(),
            Command::SceneActuatorConfGet(_) => {
                ExpectedResponse::checked::<SceneActuatorConfReport>(scene_actuator_conf::report_matches_get)
            }
            Command::ColorSwitchSupportedGet(_) => ExpectedResponse::of::<ColorSwitchSupportedReport>(),
            Command::ColorSwitchGet(_) => {
                ExpectedResponse::checked::<ColorSwitchReport>(color_switch::report_matches_get)
            }
            Command::ConfigurationGet(_) => {
                ExpectedResponse::checked::<ConfigurationReport>(configuration::response_matches_request)
            }
            Command::ConfigurationBulkGet(_) => {
                ExpectedResponse::checked::<ConfigurationBulkReport>(configuration::response_matches_request)
            }
            Command::ConfigurationNameGet(_) => {
                ExpectedResponse::checked::<ConfigurationNameReport>(configuration::response_matches_request)
            }
            Command::ConfigurationInfoGet(_) => {
                ExpectedResponse::checked::<ConfigurationInfoReport>(configuration::response_matches_request)
            }
            Command::ConfigurationPropertiesGet(_) => ExpectedResponse::checked::<ConfigurationPropertiesReport>(
                configuration::response_matches_request,
            ),
            Command::SupervisionGet(_) => {
                ExpectedResponse::checked::<SupervisionReport>(supervision::report_matches_get)
            }
            Command::Security2NonceGet(_) => {
                ExpectedResponse::checked::<Security2NonceReport>(security2::nonce_report_matches_get)
            }
            _ => return None,
        };
        Some(expected)
    }
}

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The accepted response, unwrapped to its innermost command.
    Matched(Command),
    /// Nothing acceptable arrived in time.
    NoResponse,
}

/// Waits for the response to one request.
#[derive(Debug, Clone)]
pub struct ResponseMatcher {
    sent: Command,
    expected: ExpectedResponse,
    peer: PeerAddress,
    destination: EndpointDestination,
    deadline: Instant,
}

impl ResponseMatcher {
    /// Start waiting for the response to `sent`, sent to `peer` now.
    ///
    /// Returns `None` when `sent` expects no response.
    pub fn new(sent: &Command, peer: PeerAddress, timeout: Duration) -> Option<Self> {
        Self::new_at(sent, peer, timeout, Instant::now())
    }

    /// Like [`ResponseMatcher::new`], for a request sent at `now`.
    pub fn new_at(sent: &Command, peer: PeerAddress, timeout: Duration, now: Instant) -> Option<Self> {
        let (declaring, expected) = sent.expected_response()?;
        let destination = sent.destination(peer);
        trace!(
            "Waiting for {:?} from {} endpoint {} in answer to {}",
            expected,
            peer,
            destination,
            declaring.name()
        );
        Some(Self {
            sent: declaring.clone(),
            expected,
            peer,
            destination,
            deadline: now + timeout,
        })
    }

    /// The response being waited for.
    pub fn expected(&self) -> ExpectedResponse {
        self.expected
    }

    /// Whether `received` from `from` answers the request, ignoring the
    /// deadline.
    ///
    /// The endpoint compared is the one the response is attributed to after
    /// unwrapping Multi Channel encapsulation.
    pub fn accepts(&self, from: PeerAddress, received: &Command) -> bool {
        if from.node_id != self.peer.node_id {
            return false;
        }
        if !self.destination.includes(received.attributed_to(from).endpoint) {
            return false;
        }
        let received = received.innermost();
        if !self.expected.is_kind_of(received) {
            return false;
        }
        match self.expected.predicate {
            Some(predicate) => predicate(&self.sent, received),
            None => true,
        }
    }

    /// Offer a command received now. Returns the unwrapped response when it
    /// is accepted; otherwise hands the command back.
    pub fn offer(&self, from: PeerAddress, received: Command) -> Result<Command, Command> {
        self.offer_at(from, received, Instant::now())
    }

    /// Like [`ResponseMatcher::offer`], for a command received at `now`.
    /// Nothing is accepted once the deadline has passed.
    pub fn offer_at(&self, from: PeerAddress, received: Command, now: Instant) -> Result<Command, Command> {
        if self.is_expired(now) {
            trace!("Ignoring {} from {}: request to {} expired", received.name(), from, self.peer);
            return Err(received);
        }
        if self.accepts(from, &received) {
            return Ok(encapsulation::unwrap(received, from).1);
        }

        if from.node_id == self.peer.node_id && self.expected.is_kind_of(received.innermost()) {
            debug!(
                "Ignoring {} from {}: it does not answer {}",
                received.innermost().name(),
                from,
                self.sent.name()
            );
            let labels = MetricLabels::new(from.node_id, self.expected.cc_id.name()).to_labels();
            metrics::counter!(metric_defs::RESPONSES_REJECTED.name, &labels).increment(1);
        }
        Err(received)
    }

    /// Offer received commands in arrival order until one is accepted.
    ///
    /// The end of `received`, or the deadline passing while it is consumed,
    /// stands for the timeout.
    pub fn resolve(self, received: impl IntoIterator<Item = (PeerAddress, Command)>) -> MatchOutcome {
        for (from, command) in received {
            let now = Instant::now();
            if self.is_expired(now) {
                break;
            }
            if let Ok(response) = self.offer_at(from, command, now) {
                return MatchOutcome::Matched(response);
            }
        }
        self.time_out()
    }

    /// Whether the deadline has passed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Give up waiting.
    pub fn time_out(self) -> MatchOutcome {
        debug!("No response from {} to {}", self.peer, self.sent.name());
        let labels = MetricLabels::new(self.peer.node_id, self.sent.cc_id().name()).to_labels();
        metrics::counter!(metric_defs::RESPONSE_TIMEOUTS.name, &labels).increment(1);
        MatchOutcome::NoResponse
    }
}
