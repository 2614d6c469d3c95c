//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for DigSiNet's three main
//! components:
//! - The event broker (publish/consume/error counters)
//! - Node-management interfaces (read/write/error counters)
//! - Controllers (tick and app-invocation counters)
//!
//! # Example
//!
//! ```rust,no_run
//! use digsinet_runtime::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other crates.
pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Initialize metrics and install the Prometheus exporter.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this
    /// will fail with `MetricsError::Install`; callers should ensure this is
    /// only called once per process.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|error| MetricsError::Build(error.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "metrics server started");
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();
                if message.contains("already initialized") {
                    tracing::warn!("metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(message))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if the server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!("broker_messages_published_total", "Total number of tasks published to the event broker");
    describe_counter!("broker_messages_consumed_total", "Total number of tasks consumed from the event broker");
    describe_counter!("broker_publish_errors_total", "Total number of publish errors");
    describe_counter!("broker_poll_errors_total", "Total number of poll errors");
    describe_histogram!("broker_publish_duration_seconds", "Time taken to publish a task");

    describe_counter!("nmi_reads_total", "Total number of node state reads via gNMI");
    describe_counter!("nmi_writes_total", "Total number of node state writes via gNMI");
    describe_counter!("nmi_errors_total", "Total number of node-management interface errors");

    describe_counter!("controller_ticks_total", "Total number of controller tick iterations");
    describe_counter!("controller_app_invocations_total", "Total number of application invocations by controllers");
}

/// Event broker metrics recorder.
pub struct BrokerMetrics;

impl BrokerMetrics {
    /// Record a successful publish.
    pub fn record_publish(duration: Duration) {
        counter!("broker_messages_published_total").increment(1);
        histogram!("broker_publish_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a successful consume (one task dequeued via `poll`).
    pub fn record_consume() {
        counter!("broker_messages_consumed_total").increment(1);
    }

    /// Record a publish failure.
    pub fn record_publish_error() {
        counter!("broker_publish_errors_total").increment(1);
    }

    /// Record a poll failure.
    pub fn record_poll_error() {
        counter!("broker_poll_errors_total").increment(1);
    }
}

/// Node-management interface metrics recorder.
pub struct NmiMetrics;

impl NmiMetrics {
    /// Record a node state read (one `get_nodes_update` call).
    pub fn record_read() {
        counter!("nmi_reads_total").increment(1);
    }

    /// Record a node state write (one `set`/`set_node_update` call).
    pub fn record_write() {
        counter!("nmi_writes_total").increment(1);
    }

    /// Record an interface error.
    pub fn record_error() {
        counter!("nmi_errors_total").increment(1);
    }
}

/// Controller metrics recorder.
pub struct ControllerMetrics;

impl ControllerMetrics {
    /// Record one tick of a controller's run loop.
    pub fn record_tick() {
        counter!("controller_ticks_total").increment(1);
    }

    /// Record one application invocation.
    pub fn record_app_invocation() {
        counter!("controller_app_invocations_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_server_starts_without_a_bound_handle_before_start() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
    }

    #[test]
    fn recorders_do_not_panic_before_a_server_is_started() {
        BrokerMetrics::record_consume();
        BrokerMetrics::record_publish_error();
        NmiMetrics::record_read();
        ControllerMetrics::record_tick();
    }
}
