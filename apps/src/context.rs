//! The read-only view a controller hands its apps each tick.

use digsinet_core::sibling::NodeState;
use digsinet_nmi::NodeManagementInterface;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything an [`crate::Application`] is allowed to see about the
/// sibling (or real network) it is running against. Apps must not mutate
/// sibling state directly.
pub struct AppContext<'a> {
    /// Name of the topology this app instance is attached to.
    pub topology_name: &'a str,
    /// Whether the underlying container topology is currently running.
    pub running: bool,
    /// Per-node, per-path cached state.
    pub nodes: &'a BTreeMap<String, NodeState>,
    /// Node management interfaces configured for this topology, keyed by
    /// name (e.g. `"gnmi"`).
    pub interfaces: &'a HashMap<String, Arc<NodeManagementInterface>>,
}

impl<'a> AppContext<'a> {
    /// Look up a configured interface by name.
    #[must_use]
    pub fn interface(&self, name: &str) -> Option<&Arc<NodeManagementInterface>> {
        self.interfaces.get(name)
    }
}
