//! Kafka backend configuration.

use serde::{Deserialize, Serialize};

/// Where a brand-new consumer group starts reading a topic.
///
/// Only applies to groups with no committed offset yet (`config/kafka.py`'s
/// `OffsetResetType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    /// Start from the beginning of the topic.
    Earliest,
    /// Start from the end (only new messages).
    Latest,
}

impl OffsetReset {
    /// The `auto.offset.reset` client config value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OffsetReset::Earliest => "earliest",
            OffsetReset::Latest => "latest",
        }
    }
}

/// Connection and topic-provisioning configuration for [`crate::KafkaBroker`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Partitions to request when provisioning a new topic.
    pub num_partitions: i32,
    /// Replication factor to request when provisioning a new topic.
    pub replication_factor: i32,
    /// Offset reset policy applied to newly created consumer groups.
    #[serde(default = "default_offset_reset")]
    pub offset_reset: OffsetReset,
    /// Whether `close()` deletes topics this process created.
    ///
    /// REDESIGN FLAG: the source always deletes on close,
    /// which is convenient for tests but destructive in production.
    /// Defaults to `false`.
    #[serde(default)]
    pub delete_topics_on_close: bool,
}

fn default_offset_reset() -> OffsetReset {
    OffsetReset::Latest
}

impl KafkaConfig {
    /// The `bootstrap.servers` client config value.
    #[must_use]
    pub fn bootstrap_servers(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
