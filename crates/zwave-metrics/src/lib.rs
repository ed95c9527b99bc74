//! Metrics infrastructure for the Command Class codec layer.
//!
//! This crate describes every metric emitted by the codec, the reassembler,
//! the response matcher and the Security 2 extension validator. It re-exports
//! the `metrics` crate and declares each metric as a structured [`Metric`]
//! constant so names and label keys are never typed twice.
//!
//! # Example
//!
//! ```rust,ignore
//! use zwave_metrics::{metric_defs, describe_metrics, MetricLabels};
//!
//! // Initialize metric descriptions at startup
//! describe_metrics();
//!
//! let labels = MetricLabels::new(12, "Configuration");
//! metrics::counter!(metric_defs::CC_FRAMES_DECODED.name, &labels.to_labels()).increment(1);
//! ```
//!
//! Emission without an installed recorder is a no-op, so library code can
//! emit unconditionally.

pub use metrics;

use metrics::{describe_counter, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use zwave_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const FRAMES: Metric = Metric::counter("zwave.cc.frames")
///     .with_description("Frames seen")
///     .with_unit(Unit::Count)
///     .with_labels(&["node", "command_class"]);
///
/// assert_eq!(FRAMES.name, "zwave.cc.frames");
/// assert_eq!(FRAMES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "zwave.cc.frames_decoded").
    pub name: &'static str,
    /// The kind of metric (counter or histogram).
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Histogram,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the codec layer.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels present on all peer-scoped metrics.
    pub const STANDARD_LABELS: &[&str] = &["node", "command_class"];

    // ========================================================================
    // Codec
    // ========================================================================

    /// Frames successfully parsed into a typed command.
    ///
    /// Labels: node, command_class, command
    pub const CC_FRAMES_DECODED: Metric = Metric::counter("zwave.cc.frames_decoded")
        .with_description("Frames successfully parsed into a typed command")
        .with_unit(Unit::Count)
        .with_labels(&["node", "command_class", "command"]);

    /// Frames that failed to parse.
    ///
    /// Labels: node, command_class, reason
    pub const CC_DECODE_FAILURES: Metric = Metric::counter("zwave.cc.decode_failures")
        .with_description("Frames whose payload failed validation")
        .with_unit(Unit::Count)
        .with_labels(&["node", "command_class", "reason"]);

    /// Frames whose (CC, command) pair has no inbound codec.
    ///
    /// Labels: node, command_class
    pub const CC_UNRECOGNIZED_FRAMES: Metric = Metric::counter("zwave.cc.unrecognized_frames")
        .with_description("Frames with no registered inbound codec")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Values written to the value store.
    ///
    /// Labels: node, command_class
    pub const CC_VALUES_PERSISTED: Metric = Metric::counter("zwave.cc.values_persisted")
        .with_description("Values written to the value store during persist")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    // ========================================================================
    // Security 2 extensions
    // ========================================================================

    /// Extensions dropped by validation.
    ///
    /// Labels: kind, reason
    pub const S2_EXTENSIONS_DROPPED: Metric = Metric::counter("zwave.s2.extensions_dropped")
        .with_description("Security 2 extensions silently dropped by validation")
        .with_unit(Unit::Count)
        .with_labels(&["kind", "reason"]);

    /// Commands discarded because of an unknown critical extension.
    ///
    /// Labels: kind
    pub const S2_COMMANDS_DISCARDED: Metric = Metric::counter("zwave.s2.commands_discarded")
        .with_description("Commands discarded because of an unknown critical extension")
        .with_unit(Unit::Count)
        .with_labels(&["kind"]);

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Partial report sessions merged into one result.
    ///
    /// Labels: node, command_class
    pub const REASSEMBLY_COMPLETED: Metric = Metric::counter("zwave.session.reassembly_completed")
        .with_description("Partial report sessions merged into one result")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Partial report sessions abandoned before completion.
    ///
    /// Labels: node, command_class
    pub const REASSEMBLY_ABANDONED: Metric = Metric::counter("zwave.session.reassembly_abandoned")
        .with_description("Partial report sessions abandoned before completion")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Fragments collected per completed session.
    ///
    /// Labels: node, command_class
    pub const REASSEMBLY_FRAGMENTS: Metric = Metric::histogram("zwave.session.reassembly_fragments")
        .with_description("Fragments collected per completed partial session")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Requests that resolved without a matching response.
    ///
    /// Labels: node, command_class
    pub const RESPONSE_TIMEOUTS: Metric = Metric::counter("zwave.session.response_timeouts")
        .with_description("Requests that resolved without a matching response")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Responses of the expected kind rejected by the request predicate.
    ///
    /// Labels: node, command_class
    pub const RESPONSES_REJECTED: Metric = Metric::counter("zwave.session.responses_rejected")
        .with_description("Responses of the expected kind rejected by the request predicate")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        // Codec
        &CC_FRAMES_DECODED,
        &CC_DECODE_FAILURES,
        &CC_UNRECOGNIZED_FRAMES,
        &CC_VALUES_PERSISTED,
        // Security 2
        &S2_EXTENSIONS_DROPPED,
        &S2_COMMANDS_DISCARDED,
        // Sessions
        &REASSEMBLY_COMPLETED,
        &REASSEMBLY_ABANDONED,
        &REASSEMBLY_FRAGMENTS,
        &RESPONSE_TIMEOUTS,
        &RESPONSES_REJECTED,
    ];
}

/// Metric labels identifying the peer and command class a metric refers to.
///
/// ```rust
/// use zwave_metrics::MetricLabels;
///
/// let labels = MetricLabels::new(5, "Basic").with_endpoint(2);
/// let label_vec = labels.to_labels();
/// assert_eq!(label_vec.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MetricLabels {
    /// Node id of the peer.
    pub node: u16,
    /// Command class name.
    pub command_class: String,
    /// Endpoint index, when not the root device.
    pub endpoint: Option<u8>,
}

impl MetricLabels {
    /// Creates labels for a node and command class.
    pub fn new(node: u16, command_class: impl Into<String>) -> Self {
        Self {
            node,
            command_class: command_class.into(),
            endpoint: None,
        }
    }

    /// Adds an endpoint label. Endpoint 0 (root) is not labelled.
    pub fn with_endpoint(mut self, endpoint: u8) -> Self {
        self.endpoint = (endpoint != 0).then_some(endpoint);
        self
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        let mut labels = vec![
            ("node", self.node.to_string()),
            ("command_class", self.command_class.clone()),
        ];

        if let Some(endpoint) = self.endpoint {
            labels.push(("endpoint", endpoint.to_string()));
        }

        labels
    }

    /// Returns labels with additional key-value pairs.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes all metrics used by the codec layer.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_labels_root_endpoint_omitted() {
        let labels = MetricLabels::new(7, "Basic").with_endpoint(0);
        let label_vec = labels.to_labels();

        assert_eq!(label_vec.len(), 2);
        assert!(label_vec.contains(&("node", "7".to_string())));
        assert!(label_vec.contains(&("command_class", "Basic".to_string())));
    }

    #[test]
    fn test_metric_labels_with_endpoint() {
        let labels = MetricLabels::new(7, "Basic").with_endpoint(3);
        assert!(labels.to_labels().contains(&("endpoint", "3".to_string())));
    }

    #[test]
    fn test_with_extra_labels() {
        let labels = MetricLabels::new(1, "Configuration");
        let extended = labels.with(&[("reason", "too_short".to_string())]);

        assert_eq!(extended.len(), 3);
        assert!(extended.contains(&("reason", "too_short".to_string())));
    }

    #[test]
    fn test_root_labels_are_standard() {
        let labels = MetricLabels::new(4, "Basic").to_labels();
        let keys: Vec<_> = labels.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, metric_defs::STANDARD_LABELS);
        assert_eq!(metric_defs::RESPONSE_TIMEOUTS.labels, metric_defs::STANDARD_LABELS);
    }

    #[test]
    fn test_metric_definitions() {
        assert_eq!(metric_defs::CC_FRAMES_DECODED.name, "zwave.cc.frames_decoded");
        assert_eq!(metric_defs::CC_FRAMES_DECODED.kind, MetricKind::Counter);
        assert_eq!(metric_defs::REASSEMBLY_FRAGMENTS.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::S2_EXTENSIONS_DROPPED.labels, &["kind", "reason"]);
    }

    #[test]
    fn test_all_metric_names_unique() {
        let mut names: Vec<_> = metric_defs::ALL.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len());
    }
}
