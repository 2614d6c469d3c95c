//! Sibling state.
//!
//! A [`SiblingState`] is created when a `topology build response` arrives,
//! mutated only by the controller that owns it, and destroyed on shutdown.
//! It holds no back-pointers to apps or interfaces, which would create
//! reference cycles — those are handed a broker instead.

use crate::topology::Topology;
use std::collections::BTreeMap;

/// Per-node observed state: path → last-observed response value.
pub type NodeState = BTreeMap<String, serde_json::Value>;

/// Owned state for one sibling (or the real network, which is modelled the
/// same way for uniformity inside the supervisor).
#[derive(Debug, Clone, Default)]
pub struct SiblingState {
    /// The sibling's (or real network's) name.
    pub name: String,
    /// Materialised topology, once known.
    pub topology: Option<Topology>,
    /// `node_name -> (path -> last-observed value)`.
    pub nodes: BTreeMap<String, NodeState>,
    /// Names of the node-management interfaces configured for this sibling.
    pub interfaces: Vec<String>,
    /// Whether the underlying container topology is running.
    pub running: bool,
}

impl SiblingState {
    /// Build an empty, not-yet-built sibling state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topology: None,
            nodes: BTreeMap::new(),
            interfaces: Vec::new(),
            running: false,
        }
    }

    /// Record the result of a `topology build response`.
    pub fn apply_build_response(
        &mut self,
        topology: Topology,
        nodes: BTreeMap<String, NodeState>,
        interfaces: Vec<String>,
        running: bool,
    ) {
        self.topology = Some(topology);
        self.nodes = nodes;
        self.interfaces = interfaces;
        self.running = running;
    }

    /// Read-write access to one node's path → value map, creating it on
    /// first touch.
    pub fn node_state_mut(&mut self, node_name: &str) -> &mut NodeState {
        self.nodes.entry(node_name.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sibling_is_not_running() {
        let sibling = SiblingState::new("ci");
        assert!(!sibling.running);
        assert!(sibling.topology.is_none());
    }

    #[test]
    fn apply_build_response_sets_running_and_topology() {
        let mut sibling = SiblingState::new("ci");
        let topology = Topology::builder().build();
        sibling.apply_build_response(topology.clone(), BTreeMap::new(), vec!["gnmi".to_string()], true);
        assert!(sibling.running);
        assert_eq!(sibling.topology, Some(topology));
    }
}
