//! The reference periodic "overview" app.
//!
//! Grounded on `examples/original_source/apps/overview.py`: runs every
//! `run_every_n_cycles`th periodic tick (default 10), publishing a
//! summary view to the `overview` channel.

use crate::{AppContext, Application};
use digsinet_broker::EventBroker;
use digsinet_core::Task;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

const OVERVIEW_CHANNEL: &str = "overview";

/// Periodically publishes a summary of the topology's node state.
pub struct OverviewApp {
    run_every_n_cycles: u64,
    cycle: AtomicU64,
}

impl Default for OverviewApp {
    fn default() -> Self {
        Self::new(10)
    }
}

impl OverviewApp {
    /// Build an overview app that runs every `run_every_n_cycles` periodic
    /// ticks (the `apps.overview.run_every_n_cycles` config value).
    #[must_use]
    pub fn new(run_every_n_cycles: u64) -> Self {
        Self {
            run_every_n_cycles: run_every_n_cycles.max(1),
            cycle: AtomicU64::new(0),
        }
    }
}

impl Application for OverviewApp {
    fn run<'a>(
        &'a self,
        ctx: &'a AppContext<'a>,
        broker: &'a dyn EventBroker,
        task: Option<&'a Task>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if !ctx.running {
                tracing::info!(topology = ctx.topology_name, "overview not running, sibling is down");
                return;
            }

            if let Some(task) = task {
                tracing::info!(topology = ctx.topology_name, ?task, "overview ignoring task");
                return;
            }

            let tick = self.cycle.fetch_add(1, Ordering::Relaxed);
            if tick % self.run_every_n_cycles != 0 {
                return;
            }

            tracing::info!(topology = ctx.topology_name, "running overview app");

            let Some(_gnmi) = ctx.interface("gnmi") else {
                tracing::warn!(topology = ctx.topology_name, "no gNMI interface configured, skipping overview");
                return;
            };

            let mut summary = BTreeMap::new();
            summary.insert(ctx.topology_name.to_string(), digsinet_nmi::overview(ctx.nodes));
            let task = Task::Overview { summary };

            if let Err(error) = broker.publish(OVERVIEW_CHANNEL, &task).await {
                tracing::error!(%error, "failed to publish overview");
            }
        })
    }
}
