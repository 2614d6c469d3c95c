//! Error taxonomy for event broker operations.

use thiserror::Error;

/// Errors raised by an [`crate::EventBroker`] implementation.
///
/// At boot, these are fatal. During the steady loop
/// they are logged and tolerated — the next tick retries.
#[derive(Error, Debug, Clone)]
pub enum EventBrokerError {
    /// Failed to connect to the backend (broker-down, auth failure, ...).
    #[error("broker connection failed: {0}")]
    ConnectionFailed(String),

    /// A channel (topic/queue) could not be created.
    #[error("failed to create channel '{channel}': {reason}")]
    ChannelCreationFailed {
        /// Channel that failed to be created.
        channel: String,
        /// Underlying reason reported by the backend.
        reason: String,
    },

    /// Publishing to a channel failed.
    #[error("publish to channel '{channel}' failed: {reason}")]
    PublishFailed {
        /// Target channel.
        channel: String,
        /// Underlying reason reported by the backend.
        reason: String,
    },

    /// Subscribing to a channel failed.
    #[error("subscribe to channel '{channel}' failed: {reason}")]
    SubscriptionFailed {
        /// Target channel.
        channel: String,
        /// Underlying reason reported by the backend.
        reason: String,
    },

    /// A consumer key did not resolve to a live consumer.
    #[error("unknown consumer: {0}")]
    UnknownConsumer(String),

    /// A message could not be decoded back into a [`digsinet_core::Task`].
    #[error("failed to decode message: {0}")]
    DecodeFailed(String),
}
