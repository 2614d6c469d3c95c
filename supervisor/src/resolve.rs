//! Resolve configuration names against the app/builder/client registries
//!.
//!
//! Grounded on `digsinet.py`'s `load_controllers`/`load_realnet_apps`/
//! `load_realnet_interfaces`: each walks a list of configured names,
//! `importlib.import_module`s the configured module, and instantiates it.
//! Rust has no runtime module loading, so these walk the same configured
//! name lists and `Registry::create` the pre-registered factory instead.

use crate::error::BootError;
use digsinet_apps::{AppRegistry, Application};
use digsinet_builder::{DeployerRegistry, TopologyDeployer};
use digsinet_config::{AppSettings, BuilderSettings, InterfaceCredentials, InterfaceSettings};
use digsinet_nmi::client::ClientRegistry;
use digsinet_nmi::{NmiConfig, NodeManagementInterface};
use digsinet_core::TopologyTarget;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const CLAB_TOPOLOGY_PREFIX: &str = "clab";

/// Resolve `names` against `apps`/`registry`, in the configured order.
///
/// # Errors
///
/// Returns [`BootError::UnknownModule`] if a name is missing from `apps`
/// (unreachable once [`digsinet_config::validate`] has run) or its module
/// is not registered.
pub fn build_apps(
    section: &str,
    names: &[String],
    apps: &BTreeMap<String, AppSettings>,
    registry: &AppRegistry,
) -> Result<Vec<Arc<dyn Application>>, BootError> {
    names
        .iter()
        .map(|name| {
            let module = &apps
                .get(name)
                .unwrap_or_else(|| unreachable!("validate() guarantees app '{name}' exists"))
                .module;
            registry.create(module).ok_or_else(|| BootError::UnknownModule {
                section: section.to_string(),
                module: module.clone(),
            })
        })
        .collect()
}

/// Build every [`NodeManagementInterface`] configured for one topology
/// target (the real network, or one sibling), keyed by interface name.
///
/// # Errors
///
/// Returns [`BootError::UnknownModule`] if an interface's credentials name
/// a module not registered in `clients`, or [`BootError::Interface`] if the
/// node-selector regex fails to compile.
pub fn build_interfaces(
    section: &str,
    target: &TopologyTarget,
    topology_name: &str,
    interfaces: &BTreeMap<String, InterfaceSettings>,
    credentials: &BTreeMap<String, InterfaceCredentials>,
    clients: &ClientRegistry,
) -> Result<HashMap<String, Arc<NodeManagementInterface>>, BootError> {
    let mut resolved = HashMap::with_capacity(interfaces.len());

    for (name, interface) in interfaces {
        let creds = credentials
            .get(name)
            .unwrap_or_else(|| unreachable!("validate() guarantees interface '{name}' exists"));

        let client = clients.create(&creds.module).ok_or_else(|| BootError::UnknownModule {
            section: section.to_string(),
            module: creds.module.clone(),
        })?;

        let config = NmiConfig {
            port: creds.port,
            username: creds.username.clone(),
            password: creds.password.clone(),
            node_selector: interface.nodes.clone(),
            paths: interface.paths.clone(),
            datatype: interface.datatype.clone(),
            clab_topology_prefix: CLAB_TOPOLOGY_PREFIX.to_string(),
            clab_topology_name: topology_name.to_string(),
        };

        let nmi = NodeManagementInterface::new(target.clone(), config, client)?;
        resolved.insert(name.clone(), Arc::new(nmi));
    }

    Ok(resolved)
}

/// Resolve one `builders.<name>.module` against `registry`.
///
/// # Errors
///
/// Returns [`BootError::UnknownModule`] if `name` is not in `builders`
/// (unreachable once [`digsinet_config::validate`] has run) or its module
/// is not registered.
pub fn build_deployer(
    section: &str,
    name: &str,
    builders: &BTreeMap<String, BuilderSettings>,
    registry: &DeployerRegistry,
) -> Result<Arc<dyn TopologyDeployer>, BootError> {
    let module = &builders
        .get(name)
        .unwrap_or_else(|| unreachable!("validate() guarantees builder '{name}' exists"))
        .module;

    registry.create(module).ok_or_else(|| BootError::UnknownModule {
        section: section.to_string(),
        module: module.clone(),
    })
}
