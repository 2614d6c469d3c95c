//! The top-level configuration schema.
//!
//! Grounded on `examples/original_source/config/settings.py`'s pydantic
//! `Settings` model and its nested `BaseModel`s, reimplemented with
//! `serde` derives and `#[serde(rename = "...")]`/`rename_all` in place of
//! pydantic's `Field(alias=...)`. The source's `TopologyAdjustment.link_add`
//! being mistakenly aliased to the same wire key as `link_remove` is not
//! reproduced — `digsinet_core::TopologyAdjustment` already uses distinct
//! `link-add`/`link-remove` keys.

use digsinet_core::TopologyAdjustment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `topology:{type, file}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyFile {
    /// Topology source kind, e.g. `"file"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Path to the real-network topology definition.
    pub file: String,
}

/// `realnet.interfaces.<name>` / `siblings.<name>.interfaces.<name>`: the
/// per-interface selection of which nodes and paths it watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSettings {
    /// Regex selecting which node names this interface applies to.
    pub nodes: String,
    /// gNMI `datatype` passed on every read (e.g. `"all"`).
    pub datatype: String,
    /// Protocol-level paths to poll.
    pub paths: Vec<String>,
    /// Top-level keys stripped from a read response before diffing.
    #[serde(default)]
    pub strip: Vec<String>,
}

/// `realnet:{apps, interfaces}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealnetSettings {
    /// Names of apps (from the top-level `apps` table) to run against the
    /// real network.
    #[serde(default)]
    pub apps: Vec<String>,
    /// Node management interfaces configured for the real network, keyed
    /// by name.
    pub interfaces: BTreeMap<String, InterfaceSettings>,
}

/// `siblings.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingSettings {
    /// Declarative diff applied to the real topology to derive this
    /// sibling's topology.
    #[serde(rename = "topology-adjustments")]
    pub topology_adjustments: Option<TopologyAdjustment>,
    /// Node management interfaces configured for this sibling.
    pub interfaces: BTreeMap<String, InterfaceSettings>,
    /// Name of the `controllers.<name>` entry that drives this sibling.
    pub controller: String,
    /// Whether the sibling's topology is launched at boot.
    pub autostart: bool,
}

/// `controllers.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// Dynamic-module name this controller is implemented by (currently
    /// only the built-in controller loop is supported; reserved for
    /// future dynamic-module loading).
    pub module: String,
    /// Name of the `builders.<name>` entry used to materialise topologies.
    pub builder: String,
    /// Names of the `interfaces.<name>` entries this controller's
    /// siblings use.
    pub interfaces: Vec<String>,
    /// Names of the `apps.<name>` entries this controller runs.
    pub apps: Vec<String>,
}

/// `builders.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderSettings {
    /// Dynamic-module name, resolved against the builder (topology
    /// deployer) registry.
    pub module: String,
}

/// `interfaces.<name>`: connection credentials for a node management
/// interface, shared across every sibling (and the real network) that
/// references it by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCredentials {
    /// Dynamic-module name, resolved against a node management client
    /// registry (currently only `"gnmi"` is implemented).
    pub module: String,
    /// Port the protocol client connects on.
    pub port: u16,
    /// Protocol username.
    pub username: String,
    /// Protocol password.
    pub password: String,
}

/// `apps.<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Dynamic-module name, resolved against the app registry.
    pub module: String,
}

/// Where a brand-new Kafka consumer group starts reading a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetResetType {
    /// Start from the beginning of the topic.
    Earliest,
    /// Start from the end (only new messages).
    Latest,
}

/// `kafka.topics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaTopicSettings {
    /// Partitions to request when provisioning a new topic.
    pub num_partitions: i32,
    /// Replication factor to request when provisioning a new topic.
    pub replication_factor: i32,
}

/// `kafka.offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaOffsetSettings {
    /// Offset reset policy applied to newly created consumer groups.
    pub reset_type: OffsetResetType,
}

/// `kafka:{host, port, topics, offset}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaSettings {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Topic-provisioning parameters.
    pub topics: KafkaTopicSettings,
    /// Consumer-group offset policy.
    pub offset: KafkaOffsetSettings,
    /// Whether `close()` deletes topics this process created (not part of
    /// the original schema; defaults to `false`).
    #[serde(default)]
    pub delete_topics_on_close: bool,
}

/// `rabbit:{host, port, username, password}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RabbitSettings {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// AMQP username.
    pub username: String,
    /// AMQP password.
    pub password: String,
    /// AMQP virtual host. Not part of the documented schema; defaults to
    /// `"/"`.
    #[serde(default = "default_vhost")]
    pub vhost: String,
}

fn default_vhost() -> String {
    "/".to_string()
}

/// The full configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Topology name, used to derive container host names and sibling
    /// topology file names.
    #[serde(rename = "name")]
    pub topology_name: String,
    /// The real network's topology source.
    pub topology: TopologyFile,
    /// Supervisor and controller tick interval, milliseconds.
    #[serde(rename = "interval")]
    pub sync_interval_ms: u64,
    /// How long to wait for a sibling's `topology build response` before
    /// boot fails, milliseconds.
    #[serde(rename = "create_sibling_timeout")]
    pub sibling_timeout_ms: u64,
    /// Real-network apps and interfaces.
    pub realnet: RealnetSettings,
    /// Sibling definitions, keyed by name.
    pub siblings: BTreeMap<String, SiblingSettings>,
    /// Controller definitions, keyed by name.
    pub controllers: BTreeMap<String, ControllerSettings>,
    /// Builder (topology deployer) definitions, keyed by name.
    pub builders: BTreeMap<String, BuilderSettings>,
    /// Node management interface credentials, keyed by name.
    #[serde(rename = "interfaces")]
    pub interface_credentials: BTreeMap<String, InterfaceCredentials>,
    /// App definitions, keyed by name.
    pub apps: BTreeMap<String, AppSettings>,
    /// Kafka broker configuration, if selected.
    #[serde(default)]
    pub kafka: Option<KafkaSettings>,
    /// AMQP broker configuration, if selected.
    #[serde(default)]
    pub rabbit: Option<RabbitSettings>,
}
