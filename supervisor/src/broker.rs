//! Instantiate the configured [`EventBroker`] backend.
//!
//! Grounded on `digsinet.py`'s `create_queues` (the real broker provisions
//! one channel per sibling plus `realnet` up front) and spec.md §4.7 step
//! (b): "Instantiate the broker with the channel set `{realnet} ∪
//! siblings`".

use crate::error::BootError;
use digsinet_amqp::{AmqpBroker, AmqpConfig};
use digsinet_broker::EventBroker;
use digsinet_config::Settings;
use digsinet_kafka::{KafkaBroker, KafkaConfig, OffsetReset};
use std::sync::Arc;

/// Connect to whichever of `kafka`/`rabbit` is configured and provision a
/// channel for `realnet` plus every sibling.
///
/// `digsinet_config::validate` already guarantees exactly one of
/// `settings.kafka`/`settings.rabbit` is `Some`, so the `unreachable!` below
/// can never trigger against a [`Settings`] that passed [`digsinet_config::load`].
///
/// # Errors
///
/// Returns [`BootError::Broker`] if the backend cannot be reached.
pub async fn connect(settings: &Settings) -> Result<Arc<dyn EventBroker>, BootError> {
    let channels: Vec<String> = std::iter::once("realnet".to_string())
        .chain(settings.siblings.keys().cloned())
        .collect();
    let channel_refs: Vec<&str> = channels.iter().map(String::as_str).collect();

    if let Some(kafka) = &settings.kafka {
        let config = KafkaConfig {
            host: kafka.host.clone(),
            port: kafka.port,
            num_partitions: kafka.topics.num_partitions,
            replication_factor: kafka.topics.replication_factor,
            offset_reset: match kafka.offset.reset_type {
                digsinet_config::OffsetResetType::Earliest => OffsetReset::Earliest,
                digsinet_config::OffsetResetType::Latest => OffsetReset::Latest,
            },
            delete_topics_on_close: kafka.delete_topics_on_close,
        };
        let broker = KafkaBroker::connect(config, &channel_refs).await?;
        return Ok(Arc::new(broker));
    }

    if let Some(rabbit) = &settings.rabbit {
        let config = AmqpConfig {
            host: rabbit.host.clone(),
            port: rabbit.port,
            username: rabbit.username.clone(),
            password: rabbit.password.clone(),
            vhost: rabbit.vhost.clone(),
        };
        let broker = AmqpBroker::connect(&config, &channel_refs).await?;
        return Ok(Arc::new(broker));
    }

    unreachable!("digsinet_config::validate guarantees exactly one broker backend is configured")
}
