//! # DigSiNet Kafka Broker
//!
//! A [`digsinet_broker::EventBroker`] implementation backed by Kafka (or
//! any Kafka-compatible system — Redpanda, AWS MSK, ...) via `rdkafka`.
//!
//! Grounded on the teacher's `composable_rust_redpanda::RedpandaEventBus`
//! (producer/consumer construction via `rdkafka::config::ClientConfig`,
//! async `FutureProducer` sends) generalised with the admin-client topic
//! provisioning, per-subscribe unique consumer groups, and configurable
//! topic teardown described in `examples/original_source/event/kafka.py`.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::{KafkaConfig, OffsetReset};

use digsinet_broker::{ConsumerKey, Delivery, EventBroker, EventBrokerError};
use digsinet_core::Task;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout as RdTimeout;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A Kafka-backed [`EventBroker`]. One topic per channel.
pub struct KafkaBroker {
    config: KafkaConfig,
    admin: AdminClient<DefaultClientContext>,
    producer: FutureProducer,
    consumers: Mutex<HashMap<String, Arc<BaseConsumer>>>,
    known_channels: Mutex<Vec<String>>,
    created_by_us: Mutex<Vec<String>>,
}

impl KafkaBroker {
    /// Connect to Kafka and provision `channels` as topics (skipping any
    /// that already exist), mirroring `KafkaClient.__init__`'s eager
    /// `new_sibling_channel` loop over the configured channel set.
    ///
    /// # Errors
    ///
    /// Returns [`EventBrokerError::ConnectionFailed`] if the admin client or
    /// producer cannot be constructed.
    pub async fn connect(config: KafkaConfig, channels: &[&str]) -> Result<Self, EventBrokerError> {
        let bootstrap = config.bootstrap_servers();

        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &bootstrap)
            .create()
            .map_err(|e| EventBrokerError::ConnectionFailed(format!("admin client: {e}")))?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &bootstrap)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| EventBrokerError::ConnectionFailed(format!("producer: {e}")))?;

        let broker = Self {
            config,
            admin,
            producer,
            consumers: Mutex::new(HashMap::new()),
            known_channels: Mutex::new(Vec::new()),
            created_by_us: Mutex::new(Vec::new()),
        };

        for channel in channels {
            if let Err(error) = broker.new_sibling_channel(channel).await {
                tracing::error!(%error, channel, "failed to provision channel at startup");
                return Err(error);
            }
        }

        Ok(broker)
    }

    fn consumer_config(&self, group_id: &str) -> ClientConfig {
        let mut conf = ClientConfig::new();
        conf.set("bootstrap.servers", self.config.bootstrap_servers())
            .set("group.id", group_id)
            .set("auto.offset.reset", self.config.offset_reset.as_str())
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "true");
        conf
    }
}

impl EventBroker for KafkaBroker {
    fn publish<'a>(
        &'a self,
        channel: &'a str,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = digsinet_broker::serialize_with_fallback(task);
            let record: FutureRecord<'_, (), [u8]> = FutureRecord::to(channel).payload(&payload);

            tracing::info!(channel, bytes = payload.len(), "producing message");

            let start = std::time::Instant::now();
            let result = self
                .producer
                .send(record, RdTimeout::After(Duration::from_secs(5)))
                .await
                .map(|_| ())
                .map_err(|(error, _)| EventBrokerError::PublishFailed {
                    channel: channel.to_string(),
                    reason: error.to_string(),
                });

            match &result {
                Ok(()) => digsinet_runtime::BrokerMetrics::record_publish(start.elapsed()),
                Err(_) => digsinet_runtime::BrokerMetrics::record_publish_error(),
            }

            result
        })
    }

    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
        group_prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ConsumerKey, EventBrokerError>> + Send + 'a>> {
        Box::pin(async move {
            let (key, group_id) = ConsumerKey::with_group_id(channel, group_prefix);

            let consumer: BaseConsumer =
                self.consumer_config(&group_id)
                    .create()
                    .map_err(|e| EventBrokerError::SubscriptionFailed {
                        channel: channel.to_string(),
                        reason: e.to_string(),
                    })?;
            consumer
                .subscribe(&[channel])
                .map_err(|e| EventBrokerError::SubscriptionFailed {
                    channel: channel.to_string(),
                    reason: e.to_string(),
                })?;

            tracing::info!(channel, group_id, key = %key, "consumer subscribed");

            self.consumers
                .lock()
                .await
                .insert(key.as_str().to_string(), Arc::new(consumer));

            Ok(key)
        })
    }

    fn poll<'a>(
        &'a self,
        consumer: &'a ConsumerKey,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Delivery>, EventBrokerError>> + Send + 'a>> {
        Box::pin(async move {
            let handle = {
                let consumers = self.consumers.lock().await;
                consumers
                    .get(consumer.as_str())
                    .cloned()
                    .ok_or_else(|| EventBrokerError::UnknownConsumer(consumer.as_str().to_string()))?
            };

            // BaseConsumer::poll is a blocking call; run it on the blocking
            // pool so it doesn't stall the tokio runtime (spec.md §5:
            // "Kafka: offset advances on poll").
            let message = tokio::task::spawn_blocking(move || handle.poll(timeout))
                .await
                .map_err(|e| EventBrokerError::UnknownConsumer(e.to_string()))?;

            let Some(message) = message else {
                return Ok(None);
            };

            let message = message.map_err(|e| {
                digsinet_runtime::BrokerMetrics::record_poll_error();
                EventBrokerError::DecodeFailed(e.to_string())
            })?;
            let payload = message.payload().ok_or_else(|| {
                digsinet_runtime::BrokerMetrics::record_poll_error();
                EventBrokerError::DecodeFailed("message had no payload".to_string())
            })?;
            let task: Task = serde_json::from_slice(payload).map_err(|e| {
                digsinet_runtime::BrokerMetrics::record_poll_error();
                EventBrokerError::DecodeFailed(e.to_string())
            })?;

            digsinet_runtime::BrokerMetrics::record_consume();
            Ok(Some(Delivery {
                channel: message.topic().to_string(),
                task,
            }))
        })
    }

    fn get_sibling_channels<'a>(&'a self) -> Pin<Box<dyn Future<Output = Vec<String>> + Send + 'a>> {
        Box::pin(async move { self.known_channels.lock().await.clone() })
    }

    fn new_sibling_channel<'a>(
        &'a self,
        channel: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>> {
        Box::pin(async move {
            {
                let known = self.known_channels.lock().await;
                if known.iter().any(|c| c == channel) {
                    return Ok(());
                }
            }

            let metadata = self
                .admin
                .inner()
                .fetch_metadata(None, Duration::from_secs(10))
                .map_err(|e| EventBrokerError::ChannelCreationFailed {
                    channel: channel.to_string(),
                    reason: e.to_string(),
                })?;
            let exists = metadata.topics().iter().any(|t| t.name() == channel);

            if !exists {
                let topic = NewTopic::new(
                    channel,
                    self.config.num_partitions,
                    TopicReplication::Fixed(self.config.replication_factor),
                );
                let results = self
                    .admin
                    .create_topics([&topic], &AdminOptions::new())
                    .await
                    .map_err(|e| EventBrokerError::ChannelCreationFailed {
                        channel: channel.to_string(),
                        reason: e.to_string(),
                    })?;
                for result in results {
                    if let Err((topic_name, code)) = result {
                        return Err(EventBrokerError::ChannelCreationFailed {
                            channel: topic_name,
                            reason: code.to_string(),
                        });
                    }
                }
                self.created_by_us.lock().await.push(channel.to_string());
                tracing::info!(channel, "topic created");
            }

            self.known_channels.lock().await.push(channel.to_string());
            Ok(())
        })
    }

    fn close_consumer<'a>(&'a self, consumer: &'a ConsumerKey) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if let Some(consumer) = self.consumers.lock().await.remove(consumer.as_str()) {
                consumer.unsubscribe();
                tracing::info!(key = %consumer_key_debug(consumer.as_ref()), "consumer closed");
            }
        })
    }

    fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut consumers = self.consumers.lock().await;
            for (key, consumer) in consumers.drain() {
                consumer.unsubscribe();
                tracing::info!(key, "consumer closed");
            }
            drop(consumers);

            if self.config.delete_topics_on_close {
                let created = self.created_by_us.lock().await.clone();
                if !created.is_empty() {
                    let refs: Vec<&str> = created.iter().map(String::as_str).collect();
                    match self.admin.delete_topics(&refs, &AdminOptions::new()).await {
                        Ok(_) => tracing::info!(topics = ?created, "ephemeral topics deleted"),
                        Err(error) => tracing::error!(%error, topics = ?created, "failed to delete ephemeral topics"),
                    }
                }
            }
        })
    }
}

/// `BaseConsumer` has no name/id worth logging; this just keeps the log
/// line shaped like the rest of the crate without leaking a raw pointer.
fn consumer_key_debug(_consumer: &BaseConsumer) -> &'static str {
    "kafka-consumer"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_reset_renders_lowercase() {
        assert_eq!(OffsetReset::Earliest.as_str(), "earliest");
        assert_eq!(OffsetReset::Latest.as_str(), "latest");
    }

    #[test]
    fn kafka_broker_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<KafkaBroker>();
        assert_sync::<KafkaBroker>();
    }
}
