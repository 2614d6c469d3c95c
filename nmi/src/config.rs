//! Per-topology node management configuration.

use serde::{Deserialize, Serialize};

/// Configuration for one [`crate::NodeManagementInterface`] instance:
/// credentials, the node-selector regex, and the set of paths to poll.
///
/// Grounded on `interfaces/gnmi.py`'s `self.interface_config` /
/// `self.topology_interface_config` (the `interfaces.gnmi` and
/// per-topology `gnmi-sync` blocks of `config/settings.py`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NmiConfig {
    /// Management protocol port (gNMI default 6030, container-lab default
    /// varies by vendor image).
    pub port: u16,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Regex a node's name must fully match to be polled or written to.
    pub node_selector: String,
    /// Protocol-level paths to poll on each matching node.
    pub paths: Vec<String>,
    /// gNMI `datatype` argument (`"all"`, `"config"`, `"state"`, ...).
    #[serde(default = "default_datatype")]
    pub datatype: String,
    /// Container-lab topology prefix used in host-name derivation
    ///.
    pub clab_topology_prefix: String,
    /// Topology name used in host-name derivation.
    pub clab_topology_name: String,
}

fn default_datatype() -> String {
    "all".to_string()
}
