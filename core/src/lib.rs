//! # DigSiNet Core
//!
//! Core types shared across the DigSiNet control plane: the topology model
//! (C1), the broker's tagged task protocol, sibling state, topology
//! identity/host-name derivation, and the dynamic-module registry used by
//! controllers, builders, apps and interfaces.
//!
//! ## Architecture
//!
//! DigSiNet runs one or more *digital siblings* of a live network. A
//! supervisor polls the real network, diffs observed state, and fans
//! change notifications out to per-sibling controllers over an event
//! broker; each controller mirrors relevant state into its sibling and
//! runs a fixed set of pluggable applications against it.
//!
//! This crate has no knowledge of *how* state gets polled or published —
//! that lives in `digsinet-nmi` and `digsinet-broker` — it only defines the
//! shapes both sides agree on.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod registry;
pub mod sibling;
pub mod target;
pub mod task;
pub mod topology;

pub use sibling::SiblingState;
pub use target::TopologyTarget;
pub use task::Task;
pub use topology::{Endpoint, Link, Node, Topology, TopologyAdjustment, TopologyBuilder, TopologyError};
