//! # DigSiNet Event Broker
//!
//! The uniform publish/subscribe/poll contract (C2) that sits between the
//! supervisor, the controllers, and whichever message backend is actually
//! configured (Kafka in `digsinet-kafka`, AMQP in `digsinet-amqp`, or the
//! in-memory stand-in in `digsinet-testing`).
//!
//! # Design
//!
//! Grounded on the teacher's `composable_rust_core::event_bus::EventBus`
//! trait: dyn-compatible via `Pin<Box<dyn Future>>` return types so the
//! supervisor and controllers can hold an `Arc<dyn EventBroker>` rather
//! than being generic over the backend. Generalised from one-topic-per-call
//! publish/subscribe to the fuller DigSiNet contract: named channels, an
//! explicit consumer handle returned from `subscribe`, and a `poll` with an
//! explicit timeout rather than a pull-stream.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;

use digsinet_core::Task;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub use error::EventBrokerError;

/// Opaque handle identifying one subscriber's consumer.
///
/// Callers treat this as opaque (spec.md §5 "callers treat consumer
/// handles as opaque and single-owner") and pass it back into `poll` and
/// `close_consumer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConsumerKey(String);

impl ConsumerKey {
    /// Build a consumer key from a channel name and a caller-supplied group
    /// prefix, suffixing a random component so every `subscribe` call gets
    /// its own isolated consumer group.
    #[must_use]
    pub fn new(channel: &str, group_prefix: &str) -> Self {
        let (key, _group_id) = Self::with_group_id(channel, group_prefix);
        key
    }

    /// Like [`ConsumerKey::new`], but also returns the generated group id
    /// (`prefix + "_" + random`) for backends — Kafka — whose client needs
    /// the group id as a separate configuration value.
    #[must_use]
    pub fn with_group_id(channel: &str, group_prefix: &str) -> (Self, String) {
        let group_id = format!("{group_prefix}_{}", uuid::Uuid::new_v4().simple());
        (Self(format!("{channel}_{group_id}")), group_id)
    }

    /// The raw key string, as handed to the backend's consumer registry.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsumerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A received message: the [`Task`] payload plus the channel it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Channel the message was published to.
    pub channel: String,
    /// Decoded task payload.
    pub task: Task,
}

/// The publish/subscribe/poll surface every broker backend implements
/// identically.
///
/// All operations take `&self` and return boxed futures rather than being
/// `async fn`, keeping the trait dyn-compatible so supervisor and
/// controllers can share a single `Arc<dyn EventBroker>`.
pub trait EventBroker: Send + Sync {
    /// Publish `task` to `channel`.
    ///
    /// Delivery is best-effort durable (Kafka) or durable-until-acked
    /// (AMQP); order is preserved within a channel from a single publisher.
    /// A payload that fails to serialise is never rejected outright — see
    /// [`serialize_with_fallback`] — so this only fails on a genuine
    /// transport error.
    ///
    /// # Errors
    ///
    /// Returns [`EventBrokerError::PublishFailed`] on a transport-level
    /// failure.
    fn publish<'a>(
        &'a self,
        channel: &'a str,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>>;

    /// Subscribe to `channel` under an isolated consumer group derived from
    /// `group_prefix`, so every subscriber sees every published message.
    ///
    /// # Errors
    ///
    /// Returns [`EventBrokerError::SubscriptionFailed`] if the backend
    /// cannot create the consumer (connection loss, auth, ...).
    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
        group_prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ConsumerKey, EventBrokerError>> + Send + 'a>>;

    /// Wait up to `timeout` for the next message on `consumer`'s channel.
    /// Returns `None` on timeout with no message available.
    ///
    /// # Errors
    ///
    /// Returns [`EventBrokerError::UnknownConsumer`] if the key does not
    /// name a live consumer, or [`EventBrokerError::DecodeFailed`] if a
    /// message arrived but could not be parsed as a [`Task`].
    fn poll<'a>(
        &'a self,
        consumer: &'a ConsumerKey,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Delivery>, EventBrokerError>> + Send + 'a>>;

    /// List the currently known sibling channels (plus `realnet`).
    fn get_sibling_channels<'a>(&'a self) -> Pin<Box<dyn Future<Output = Vec<String>> + Send + 'a>>;

    /// Idempotently create `channel` if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`EventBrokerError::ChannelCreationFailed`] if the backend
    /// rejects topic/queue creation.
    fn new_sibling_channel<'a>(
        &'a self,
        channel: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>>;

    /// Release one consumer's backend resources.
    fn close_consumer<'a>(
        &'a self,
        consumer: &'a ConsumerKey,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Release all backend resources held by this broker (connections,
    /// consumers, and — depending on configuration — ephemeral channels).
    fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Serialise `task` to JSON bytes, substituting the literal string
/// `"<not serializable>"` if serialisation fails rather than rejecting the
/// publish outright.
///
/// Grounded on `message/kafka.py`'s
/// `json.dumps(data, default=lambda obj: "<not serializable>")` and
/// `event/rabbit.py`'s identical pattern. In practice every [`Task`] field
/// is well-typed JSON, so this fallback only matters for the free-form
/// `data` field carried by some variants.
#[must_use]
pub fn serialize_with_fallback(task: &Task) -> Vec<u8> {
    match serde_json::to_vec(task) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(%error, "task failed to serialize, substituting fallback literal");
            b"\"<not serializable>\"".to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_keys_are_unique_per_subscribe() {
        let a = ConsumerKey::new("realnet", "controller");
        let b = ConsumerKey::new("realnet", "controller");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("realnet_controller_"));
    }

    #[test]
    fn serialize_with_fallback_round_trips_normal_task() {
        let task = Task::RunFuzzer {
            source: "ci".to_string(),
            timestamp: 1.0,
            data: serde_json::json!({}),
        };
        let bytes = serialize_with_fallback(&task);
        let decoded: Task = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, task);
    }
}
