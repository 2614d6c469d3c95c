//! The reference periodic "hello world" app.
//!
//! Grounded on `examples/original_source/apps/hello_world.py`: on every
//! periodic tick (never on a task), writes an `Ethernet1` description
//! containing a timestamp to every node in the topology.

use crate::{AppContext, Application};
use digsinet_broker::EventBroker;
use digsinet_core::Task;
use std::future::Future;
use std::pin::Pin;

/// Periodically stamps `Ethernet1`'s description with a timestamp on every
/// node. Ignores all inbound tasks.
#[derive(Debug, Default)]
pub struct HelloWorldApp;

impl Application for HelloWorldApp {
    fn run<'a>(
        &'a self,
        ctx: &'a AppContext<'a>,
        _broker: &'a dyn EventBroker,
        task: Option<&'a Task>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if !ctx.running {
                tracing::debug!(topology = ctx.topology_name, "hello-world not running, sibling is down");
                return;
            }

            if let Some(task) = task {
                tracing::debug!(topology = ctx.topology_name, ?task, "hello-world ignoring task");
                return;
            }

            let Some(gnmi) = ctx.interface("gnmi") else {
                tracing::warn!(topology = ctx.topology_name, "no gNMI interface configured, skipping update");
                return;
            };

            for node_name in ctx.nodes.keys() {
                let message = format!(
                    "Hello World! update for node {node_name} in topology {} at {}",
                    ctx.topology_name,
                    chrono::Utc::now().format("%H:%M:%S")
                );

                tracing::debug!(node = node_name, topology = ctx.topology_name, message, "setting interface description");

                let data = serde_json::json!({
                    "path": "openconfig:interfaces/interface[name=Ethernet1]",
                    "val": {
                        "config": {
                            "name": "Ethernet1",
                            "description": message,
                        }
                    },
                });

                if let Err(error) = gnmi.set(node_name, "update", &data).await {
                    tracing::error!(node = node_name, %error, "hello-world failed to set interface description");
                }
            }
        })
    }
}
