//! The broker message protocol (§3, §9 "Tagged message unions").
//!
//! The source passes Python dicts with a `"type"` key across its queues.
//! Here that becomes a proper sum type: [`Task`] is a `#[serde(tag = "type")]`
//! enum whose variants carry typed payloads, while still serialising to the
//! same `{"type": "...", ...}` JSON shape on the wire.

use serde::{Deserialize, Serialize};

/// A tagged message carried on a broker channel.
///
/// Variant names use the original wire `type` strings verbatim so the
/// JSON encoding stays compatible with anything that inspects the raw
/// `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Task {
    /// An observed (and possibly diffed) node management read.
    #[serde(rename = "gNMI notification")]
    GnmiNotification {
        /// Topology that produced this read (`"realnet"` or a sibling name).
        source: String,
        /// Node name the read was taken from.
        node: String,
        /// Protocol-level path that was read.
        path: String,
        /// The raw response value.
        data: serde_json::Value,
        /// Structural diff against the previously observed value for this
        /// node/path, or `None` if this is the first read or the diff is
        /// empty and was suppressed.
        #[serde(skip_serializing_if = "Option::is_none")]
        diff: Option<serde_json::Value>,
    },

    /// Request to run the fuzzer, published by `ci` and consumed by `sec`.
    #[serde(rename = "run fuzzer")]
    RunFuzzer {
        /// App or topology that requested the run.
        source: String,
        /// Unix timestamp (seconds) the request was issued at.
        timestamp: f64,
        /// Free-form request payload.
        data: serde_json::Value,
    },

    /// Fuzzer result, published by `sec` and consumed by `ci`.
    #[serde(rename = "fuzzer result")]
    FuzzerResult {
        /// App or topology that produced the result.
        source: String,
        /// Echoes the originating `run fuzzer` timestamp so latency can be
        /// measured on receipt.
        request_timestamp: f64,
        /// Unix timestamp (seconds) the result was produced at.
        timestamp: f64,
        /// Free-form result payload.
        data: serde_json::Value,
    },

    /// Supervisor → controller: materialise this sibling's topology.
    #[serde(rename = "topology build request")]
    TopologyBuildRequest {
        /// Always `"realnet"` in the current protocol.
        source: String,
        /// Name of the sibling to build.
        sibling: String,
    },

    /// Controller → everyone: a sibling finished (or failed) materialising.
    #[serde(rename = "topology build response")]
    TopologyBuildResponse {
        /// Name of the controller that produced this response.
        source: String,
        /// Name of the sibling that was built.
        sibling: String,
        /// The sibling's materialised topology.
        topology: crate::topology::Topology,
        /// Per-node observed state, keyed by node name then path.
        nodes: std::collections::BTreeMap<String, std::collections::BTreeMap<String, serde_json::Value>>,
        /// Names of the node-management interfaces wired up for this sibling.
        interfaces: Vec<String>,
        /// Whether the underlying container topology is actually running.
        running: bool,
    },

    /// A periodic summary view of one or more topologies.
    Overview {
        /// Topology name → summary payload.
        summary: std::collections::BTreeMap<String, serde_json::Value>,
    },
}

impl Task {
    /// The channel-independent "source" topology this task originated from,
    /// when the variant carries one.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Task::GnmiNotification { source, .. }
            | Task::RunFuzzer { source, .. }
            | Task::FuzzerResult { source, .. }
            | Task::TopologyBuildRequest { source, .. }
            | Task::TopologyBuildResponse { source, .. } => Some(source),
            Task::Overview { .. } => None,
        }
    }

    /// The `sibling` field, for the two variants that carry one. Used by the
    /// supervisor's "any task with a `sibling` field" dispatch rule (§4.7).
    #[must_use]
    pub fn sibling(&self) -> Option<&str> {
        match self {
            Task::TopologyBuildRequest { sibling, .. } | Task::TopologyBuildResponse { sibling, .. } => {
                Some(sibling)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gnmi_notification_round_trips_with_type_tag() {
        let task = Task::GnmiNotification {
            source: "realnet".to_string(),
            node: "r1".to_string(),
            path: "openconfig:interfaces".to_string(),
            data: json!({"foo": "bar"}),
            diff: None,
        };
        let encoded = serde_json::to_value(&task).unwrap();
        assert_eq!(encoded["type"], "gNMI notification");
        let decoded: Task = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, task);
    }

    #[test]
    fn sibling_only_set_on_topology_build_variants() {
        let task = Task::RunFuzzer {
            source: "ci".to_string(),
            timestamp: 1.0,
            data: json!(""),
        };
        assert_eq!(task.sibling(), None);

        let task = Task::TopologyBuildRequest {
            source: "realnet".to_string(),
            sibling: "ci".to_string(),
        };
        assert_eq!(task.sibling(), Some("ci"));
    }
}
