//! AMQP backend configuration.

use serde::{Deserialize, Serialize};

/// Connection configuration for [`crate::AmqpBroker`].
///
/// Mirrors `config/rabbit.py`'s `RabbitSettings`: a single direct exchange
/// named `"digsinet"` is declared on connect, one durable queue per channel
/// bound to it under a routing key matching the channel name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmqpConfig {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Virtual host. Defaults to `/`.
    #[serde(default = "default_vhost")]
    pub vhost: String,
}

fn default_vhost() -> String {
    "/".to_string()
}

impl AmqpConfig {
    /// The `amqp://` connection URL passed to `lapin::Connection::connect`.
    #[must_use]
    pub fn connection_url(&self) -> String {
        let vhost = self.vhost.trim_start_matches('/');
        format!(
            "amqp://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, vhost
        )
    }
}
