//! # DigSiNet Testing
//!
//! Fixtures for exercising `digsinet-*` components without a real broker
//! or a real device behind `gNMI`: an in-memory [`EventBroker`] and a
//! scriptable [`NodeManagementClient`].
//!
//! Grounded on `digsinet-kafka`'s `KafkaBroker` for the broker's
//! channel/consumer bookkeeping shape, and on `digsinet-nmi`'s
//! `DummyGnmiClient` for the client boundary — generalised here to let a
//! test pre-seed canned responses and inject per-host failures rather
//! than only replaying whatever was last written.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod broker;
mod nmi;

pub use broker::InMemoryBroker;
pub use nmi::StaticNodeManagementClient;
