//! An in-memory [`EventBroker`] backed by `tokio::sync::broadcast`.

use digsinet_broker::{ConsumerKey, Delivery, EventBroker, EventBrokerError};
use digsinet_core::Task;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::Mutex;

/// Queue depth for each channel's broadcast ring buffer. Generous enough
/// that a test driving a handful of ticks never lags a slow consumer.
const CHANNEL_CAPACITY: usize = 256;

/// A broker backend with no external dependencies, for unit and
/// integration tests. One `tokio::sync::broadcast` channel per named
/// channel; every subscriber gets its own receiver, so publishing to a
/// channel with no subscribers simply drops the message rather than
/// erroring (matching a real broker's at-least-one-consumer assumption).
pub struct InMemoryBroker {
    channels: Mutex<HashMap<String, broadcast::Sender<Delivery>>>,
    consumers: Mutex<HashMap<String, (String, broadcast::Receiver<Delivery>)>>,
    known_channels: Mutex<Vec<String>>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    /// An empty broker with no channels provisioned yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            consumers: Mutex::new(HashMap::new()),
            known_channels: Mutex::new(Vec::new()),
        }
    }

    async fn sender_for(&self, channel: &str) -> broadcast::Sender<Delivery> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl EventBroker for InMemoryBroker {
    fn publish<'a>(
        &'a self,
        channel: &'a str,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>> {
        Box::pin(async move {
            let sender = self.sender_for(channel).await;
            let delivery = Delivery { channel: channel.to_string(), task: task.clone() };
            // No subscribers is not an error: a real broker durably queues
            // the message for whoever subscribes later, which this stand-in
            // does not need to model for the cases it's used in.
            let _ = sender.send(delivery);
            Ok(())
        })
    }

    fn subscribe<'a>(
        &'a self,
        channel: &'a str,
        group_prefix: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ConsumerKey, EventBrokerError>> + Send + 'a>> {
        Box::pin(async move {
            let sender = self.sender_for(channel).await;
            let receiver = sender.subscribe();
            let key = ConsumerKey::new(channel, group_prefix);
            self.consumers.lock().await.insert(key.as_str().to_string(), (channel.to_string(), receiver));
            Ok(key)
        })
    }

    fn poll<'a>(
        &'a self,
        consumer: &'a ConsumerKey,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Delivery>, EventBrokerError>> + Send + 'a>> {
        Box::pin(async move {
            loop {
                let mut consumers = self.consumers.lock().await;
                let Some((_, receiver)) = consumers.get_mut(consumer.as_str()) else {
                    return Err(EventBrokerError::UnknownConsumer(consumer.as_str().to_string()));
                };

                match tokio::time::timeout(timeout, receiver.recv()).await {
                    Ok(Ok(delivery)) => return Ok(Some(delivery)),
                    Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                        tracing::warn!(skipped, consumer = %consumer, "in-memory broker consumer lagged, retrying");
                        continue;
                    }
                    Ok(Err(broadcast::error::RecvError::Closed)) => {
                        return Err(EventBrokerError::UnknownConsumer(consumer.as_str().to_string()));
                    }
                    Err(_elapsed) => return Ok(None),
                }
            }
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
            let mut known = self.known_channels.lock().await;
            if !known.iter().any(|c| c == channel) {
                self.sender_for(channel).await;
                known.push(channel.to_string());
            }
            Ok(())
        })
    }

    fn close_consumer<'a>(&'a self, consumer: &'a ConsumerKey) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.consumers.lock().await.remove(consumer.as_str());
        })
    }

    fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.consumers.lock().await.clear();
            self.channels.lock().await.clear();
            self.known_channels.lock().await.clear();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_published_tasks() {
        let broker = InMemoryBroker::new();
        let consumer = broker.subscribe("realnet", "controller").await.unwrap();

        let task = Task::RunFuzzer { source: "ci".to_string(), timestamp: 1.0, data: serde_json::json!({}) };
        broker.publish("realnet", &task).await.unwrap();

        let delivery = broker.poll(&consumer, Duration::from_millis(100)).await.unwrap();
        assert_eq!(delivery.unwrap().task, task);
    }

    #[tokio::test]
    async fn poll_times_out_with_no_message() {
        let broker = InMemoryBroker::new();
        let consumer = broker.subscribe("realnet", "controller").await.unwrap();

        let delivery = broker.poll(&consumer, Duration::from_millis(10)).await.unwrap();
        assert!(delivery.is_none());
    }

    #[tokio::test]
    async fn new_sibling_channel_is_idempotent_and_listed() {
        let broker = InMemoryBroker::new();
        broker.new_sibling_channel("ci").await.unwrap();
        broker.new_sibling_channel("ci").await.unwrap();

        assert_eq!(broker.get_sibling_channels().await, vec!["ci".to_string()]);
    }

    #[tokio::test]
    async fn poll_after_close_consumer_fails_with_unknown_consumer() {
        let broker = InMemoryBroker::new();
        let consumer = broker.subscribe("realnet", "controller").await.unwrap();
        broker.close_consumer(&consumer).await;

        let result = broker.poll(&consumer, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(EventBrokerError::UnknownConsumer(_))));
    }
}
