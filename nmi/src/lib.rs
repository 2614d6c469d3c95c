//! # DigSiNet Node Management Interface
//!
//! Component C3: the per-topology façade over the node management
//! protocol (get/set against real devices or sibling containers), built
//! against the [`NodeManagementClient`] boundary so the protocol itself is
//! swappable.
//!
//! Grounded on `examples/original_source/interfaces/gnmi.py`: host-name
//! derivation (`getHost`), diffed bulk reads (`getGNMI`), replace-on-write
//! semantics (`setNodeUpdate`), and the generic `set`.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod diff;
pub mod error;

pub use client::{DummyGnmiClient, NodeManagementClient, SetOp};
pub use config::NmiConfig;
pub use error::NmiError;

use digsinet_broker::EventBroker;
use digsinet_core::sibling::NodeState;
use digsinet_core::{SiblingState, Task, TopologyTarget};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One (topology target, credentials) node management façade.
pub struct NodeManagementInterface {
    target: TopologyTarget,
    config: NmiConfig,
    client: Arc<dyn NodeManagementClient>,
    node_selector: Regex,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NodeManagementInterface {
    /// Build an interface for `target`, using `client` as the underlying
    /// protocol client.
    ///
    /// # Errors
    ///
    /// Returns [`NmiError::InvalidSelector`] if `config.node_selector` is
    /// not a valid regex.
    pub fn new(
        target: TopologyTarget,
        config: NmiConfig,
        client: Arc<dyn NodeManagementClient>,
    ) -> Result<Self, NmiError> {
        let node_selector = Regex::new(&config.node_selector)
            .map_err(|e| NmiError::InvalidSelector(config.node_selector.clone(), e.to_string()))?;
        Ok(Self {
            target,
            config,
            client,
            node_selector,
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    /// The host name a node would be addressed by, or `None` if its name
    /// does not fully match the configured node selector (a full-string
    /// match, not merely a prefix).
    #[must_use]
    pub fn host_name(&self, node_name: &str) -> Option<String> {
        full_match(&self.node_selector, node_name).then(|| {
            self.target
                .host_name(&self.config.clab_topology_prefix, &self.config.clab_topology_name, node_name)
        })
    }

    async fn write_lock_for(&self, host: &str) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks.entry(host.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Refresh every watched path on every node in `nodes`, updating the
    /// cached state in place. When `diff` is `true`, also publish a
    /// `gNMI notification` to every known sibling channel for any path
    /// whose value changed.
    ///
    /// Per-host and per-path errors are logged and do not abort the
    /// sweep — a single unreachable device cannot stall the tick.
    pub async fn get_nodes_update(
        &self,
        nodes: &mut BTreeMap<String, NodeState>,
        broker: &dyn EventBroker,
        diff: bool,
    ) {
        let channels = if diff { broker.get_sibling_channels().await } else { Vec::new() };
        let node_names: Vec<String> = nodes.keys().cloned().collect();

        for node_name in node_names {
            let Some(host) = self.host_name(&node_name) else {
                continue;
            };

            for path in &self.config.paths {
                let old_value = nodes.get(&node_name).and_then(|state| state.get(path)).cloned();

                match self.client.get(&host, self.config.port, path, &self.config.datatype).await {
                    Ok(new_value) => {
                        digsinet_runtime::NmiMetrics::record_read();
                        nodes.entry(node_name.clone()).or_default().insert(path.clone(), new_value.clone());

                        if !diff {
                            continue;
                        }

                        let Some(change) = diff::diff_excluding_timestamp(old_value.as_ref(), &new_value) else {
                            continue;
                        };

                        let task = Task::GnmiNotification {
                            source: self.target.as_str().to_string(),
                            node: node_name.clone(),
                            path: path.clone(),
                            data: new_value,
                            diff: Some(change),
                        };

                        for channel in &channels {
                            if let Err(error) = broker.publish(channel, &task).await {
                                tracing::error!(channel, %error, "failed to publish gNMI notification");
                            }
                        }
                    }
                    Err(error) => {
                        digsinet_runtime::NmiMetrics::record_error();
                        tracing::error!(host, path, %error, "error getting gNMI data");
                    }
                }
            }
        }
    }

    /// Replay a received `gNMI notification`'s update entries as replaces
    /// on `node_name`'s sibling mirror.
    ///
    /// `delete` notifications and any other shape are logged and skipped —
    /// only the "turn update into replace" translation is implemented,
    /// matching the source's rationale (replacing, rather than updating,
    /// avoids gRPC errors on fields like IP addresses that the device
    /// rejects as a partial update).
    pub async fn set_node_update(&self, node_name: &str, path: &str, notification_data: &Value) {
        let Some(host) = self.host_name(node_name) else {
            return;
        };

        let Some(notifications) = notification_data.get("notification").and_then(Value::as_array) else {
            tracing::warn!(node = node_name, "notification data missing 'notification' array");
            return;
        };

        let lock = self.write_lock_for(&host).await;

        for notification in notifications {
            let Some(updates) = notification.get("update").and_then(Value::as_array) else {
                tracing::info!(node = node_name, ?notification, "unsupported gNMI notification type");
                continue;
            };

            for update in updates {
                let Some(val) = update.get("val") else {
                    continue;
                };

                let _guard = lock.lock().await;
                match self.client.set(&host, self.config.port, path, SetOp::Replace, val).await {
                    Ok(result) => {
                        digsinet_runtime::NmiMetrics::record_write();
                        tracing::debug!(host, path, ?result, "gNMI set result");
                    }
                    Err(error) => {
                        digsinet_runtime::NmiMetrics::record_error();
                        tracing::error!(host, path, %error, "error syncing gNMI data");
                    }
                }
            }
        }
    }

    /// Apply a generic `set` on `node_name`.
    ///
    /// # Errors
    ///
    /// Returns [`NmiError::UnsupportedOperation`] for any `op` other than
    /// `"update"`, `"replace"`, `"delete"`.
    pub async fn set(&self, node_name: &str, op: &str, data: &Value) -> Result<(), NmiError> {
        let op = SetOp::parse(op)?;

        let Some(host) = self.host_name(node_name) else {
            return Ok(());
        };

        let lock = self.write_lock_for(&host).await;
        let _guard = lock.lock().await;

        match self.client.set(&host, self.config.port, "", op, data).await {
            Ok(result) => {
                digsinet_runtime::NmiMetrics::record_write();
                tracing::debug!(host, ?result, "gNMI set result");
            }
            Err(error) => {
                digsinet_runtime::NmiMetrics::record_error();
                tracing::error!(host, %error, "error setting gNMI data");
            }
        }

        Ok(())
    }
}

/// Build a summary view of `nodes` suitable for publishing on the
/// `overview` channel: the per-node, per-path cached state as a single
/// JSON value (spec.md §4.5, `overview` app — grounded on `gnmi.py`'s
/// unimplemented-in-source `getOverview`, reconstructed here as "dump
/// whatever C3 has already cached").
#[must_use]
pub fn overview(nodes: &BTreeMap<String, NodeState>) -> Value {
    serde_json::to_value(nodes).unwrap_or(Value::Null)
}

/// A convenience bundle: one [`NodeManagementInterface`] plus the mutable
/// state it reads and writes, as owned by a controller.
pub struct ManagedSibling {
    /// The interface used to reach this sibling's (or the real net's)
    /// nodes.
    pub interface: NodeManagementInterface,
    /// The sibling's mutable observed state.
    pub state: SiblingState,
}

fn full_match(re: &Regex, candidate: &str) -> bool {
    re.find(candidate).is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use digsinet_broker::{ConsumerKey, EventBrokerError};
    use serde_json::json;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    fn test_config(selector: &str) -> NmiConfig {
        NmiConfig {
            port: 6030,
            username: "admin".to_string(),
            password: "admin".to_string(),
            node_selector: selector.to_string(),
            paths: vec!["openconfig:/interfaces".to_string()],
            datatype: "all".to_string(),
            clab_topology_prefix: "clab".to_string(),
            clab_topology_name: "net".to_string(),
        }
    }

    struct NullBroker;

    impl EventBroker for NullBroker {
        fn publish<'a>(
            &'a self,
            _channel: &'a str,
            _task: &'a Task,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>> {
            Box::pin(async { Ok(()) })
        }
        fn subscribe<'a>(
            &'a self,
            channel: &'a str,
            group_prefix: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<ConsumerKey, EventBrokerError>> + Send + 'a>> {
            let key = ConsumerKey::new(channel, group_prefix);
            Box::pin(async move { Ok(key) })
        }
        fn poll<'a>(
            &'a self,
            _consumer: &'a ConsumerKey,
            _timeout: Duration,
        ) -> Pin<Box<dyn Future<Output = Result<Option<digsinet_broker::Delivery>, EventBrokerError>> + Send + 'a>>
        {
            Box::pin(async { Ok(None) })
        }
        fn get_sibling_channels<'a>(&'a self) -> Pin<Box<dyn Future<Output = Vec<String>> + Send + 'a>> {
            Box::pin(async { vec!["ci".to_string()] })
        }
        fn new_sibling_channel<'a>(
            &'a self,
            _channel: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>> {
            Box::pin(async { Ok(()) })
        }
        fn close_consumer<'a>(&'a self, _consumer: &'a ConsumerKey) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async {})
        }
        fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async {})
        }
    }

    #[test]
    fn host_name_respects_node_selector() {
        let client = Arc::new(DummyGnmiClient::new());
        let nmi = NodeManagementInterface::new(TopologyTarget::Realnet, test_config("r.*"), client).unwrap();

        assert_eq!(nmi.host_name("r1"), Some("clab-net-r1".to_string()));
        assert_eq!(nmi.host_name("sw1"), None);
    }

    #[tokio::test]
    async fn get_nodes_update_populates_state_and_publishes_on_change() {
        let client = Arc::new(DummyGnmiClient::new().with_seed(
            "clab-net-r1",
            "openconfig:/interfaces",
            json!({"admin-status": "UP"}),
        ));
        let nmi = NodeManagementInterface::new(TopologyTarget::Realnet, test_config("r1"), client).unwrap();
        let broker = NullBroker;

        let mut nodes: BTreeMap<String, NodeState> = BTreeMap::new();
        nodes.insert("r1".to_string(), BTreeMap::new());

        nmi.get_nodes_update(&mut nodes, &broker, true).await;

        assert_eq!(
            nodes["r1"]["openconfig:/interfaces"],
            json!({"admin-status": "UP"})
        );
    }

    #[tokio::test]
    async fn set_rejects_unknown_operation() {
        let client = Arc::new(DummyGnmiClient::new());
        let nmi = NodeManagementInterface::new(TopologyTarget::Realnet, test_config("r1"), client).unwrap();

        let result = nmi.set("r1", "frobnicate", &json!({})).await;
        assert!(matches!(result, Err(NmiError::UnsupportedOperation(_))));
    }
}
