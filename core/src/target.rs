//! Topology identity and host-name derivation.
//!
//! Every node-management call needs to turn a `(topology, node)` pair into a
//! concrete container host name. The rule differs for the real network
//! versus a sibling, so we model "which topology is this" as its own small
//! type rather than stringly-typed comparisons scattered through the NMI.

use serde::{Deserialize, Serialize};

/// Identifies whether a component is operating against the real network or
/// a named sibling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyTarget {
    /// The real, live network.
    Realnet,
    /// A sibling, by its configured name.
    Sibling(String),
}

impl TopologyTarget {
    /// The channel/source name used on the wire: `"realnet"` or the sibling
    /// name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            TopologyTarget::Realnet => "realnet",
            TopologyTarget::Sibling(name) => name,
        }
    }

    /// Derive the container host name for `node_name` within this target.
    ///
    /// - real-net: `<prefix>-<topology_name>-<node_name>`
    /// - sibling: `<prefix>-<topology_name>_<sibling_name>-<node_name>`
    #[must_use]
    pub fn host_name(&self, prefix: &str, topology_name: &str, node_name: &str) -> String {
        match self {
            TopologyTarget::Realnet => format!("{prefix}-{topology_name}-{node_name}"),
            TopologyTarget::Sibling(sibling) => {
                format!("{prefix}-{topology_name}_{sibling}-{node_name}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realnet_host_name_rule() {
        let target = TopologyTarget::Realnet;
        assert_eq!(target.host_name("clab", "net", "r1"), "clab-net-r1");
    }

    #[test]
    fn sibling_host_name_rule() {
        let target = TopologyTarget::Sibling("ci".to_string());
        assert_eq!(target.host_name("clab", "net", "r1"), "clab-net_ci-r1");
    }
}
