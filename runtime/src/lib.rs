//! # DigSiNet Runtime
//!
//! Prometheus metrics server and domain metric recorders, shared across the
//! broker, node-management, and controller crates.
//!
//! Grounded on `composable-rust-runtime`'s `metrics` module: the Prometheus
//! exporter setup is kept near-verbatim, while the per-domain recorder
//! structs (`EventStoreMetrics`, `CircuitBreakerMetrics`, ...) are replaced
//! with DigSiNet's own domains (broker, node-management interface,
//! controller).
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod metrics;

pub use metrics::{BrokerMetrics, ControllerMetrics, MetricsError, MetricsServer, NmiMetrics};
