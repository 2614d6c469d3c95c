//! The `--start` boot sequence and the
//! [`Supervisor`] it hands off to the real-net tick loop.
//!
//! Grounded on `digsinet.py`'s `main`/`create_siblings`.

use crate::error::BootError;
use crate::resolve;
use digsinet_broker::{ConsumerKey, EventBroker};
use digsinet_builder::TopologyDeployer;
use digsinet_config::Settings;
use digsinet_controller::{Controller, ControllerConfig};
use digsinet_core::sibling::NodeState;
use digsinet_core::{SiblingState, Task, Topology, TopologyTarget};
use digsinet_nmi::NodeManagementInterface;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Everything the real-net tick loop needs once boot has completed.
pub struct Supervisor {
    settings: Settings,
    broker: Arc<dyn EventBroker>,
    realnet_apps: Vec<Arc<dyn digsinet_apps::Application>>,
    realnet_interfaces: HashMap<String, Arc<NodeManagementInterface>>,
    realnet_nodes: Mutex<BTreeMap<String, NodeState>>,
    realnet_consumer: ConsumerKey,
    sibling_cache: Mutex<HashMap<String, SiblingState>>,
    controller_handles: Vec<JoinHandle<()>>,
    controller_shutdown: watch::Sender<bool>,
}

/// Run the `--start` boot sequence against an already-loaded configuration.
///
/// # Errors
///
/// See [`BootError`]. Any failure here is fatal to the process (spec.md
/// §4.7, §6 "Exit codes: ... 1 any fatal boot error").
pub async fn boot(settings: Settings, reconfigure: bool) -> Result<Supervisor, BootError> {
    let topology_yaml = tokio::fs::read_to_string(&settings.topology.file)
        .await
        .map_err(|source| BootError::ReadTopology {
            path: settings.topology.file.clone(),
            source,
        })?;
    let topology = digsinet_builder::dump::load(&topology_yaml)?;

    tracing::info!(topology = settings.topology_name, path = %settings.topology.file, "loaded real-net topology");

    let broker = crate::broker::connect(&settings).await?;

    let client_registry = digsinet_nmi::client::with_reference_clients();
    let app_registry = digsinet_apps::with_reference_apps();
    let deployer_registry = digsinet_builder::with_reference_deployers();

    let realnet_interfaces = resolve::build_interfaces(
        "realnet",
        &TopologyTarget::Realnet,
        &settings.topology_name,
        &settings.realnet.interfaces,
        &settings.interface_credentials,
        &client_registry,
    )?;
    let realnet_apps = resolve::build_apps("realnet", &settings.realnet.apps, &settings.apps, &app_registry)?;

    deploy_realnet(&settings.topology.file, reconfigure).await;

    let realnet_topology = Arc::new(RwLock::new(topology));
    let realnet_consumer = broker.subscribe("realnet", "supervisor").await?;

    let (controller_shutdown, controller_shutdown_rx) = watch::channel(false);
    let mut controller_handles = Vec::with_capacity(settings.siblings.len());
    let mut sibling_cache = HashMap::with_capacity(settings.siblings.len());

    for (sibling_name, sibling) in &settings.siblings {
        tracing::info!(sibling = sibling_name, "starting controller");

        let controller_settings = settings
            .controllers
            .get(&sibling.controller)
            .unwrap_or_else(|| unreachable!("validate() guarantees controller '{}' exists", sibling.controller));

        let interfaces = resolve::build_interfaces(
            &format!("siblings.{sibling_name}"),
            &TopologyTarget::Sibling(sibling_name.clone()),
            &settings.topology_name,
            &sibling.interfaces,
            &settings.interface_credentials,
            &client_registry,
        )?;
        let apps = resolve::build_apps(
            &format!("controllers.{}", sibling.controller),
            &controller_settings.apps,
            &settings.apps,
            &app_registry,
        )?;
        let deployer: Arc<dyn TopologyDeployer> = resolve::build_deployer(
            &format!("controllers.{}", sibling.controller),
            &controller_settings.builder,
            &settings.builders,
            &deployer_registry,
        )?;

        let config = ControllerConfig {
            topology_name: settings.topology_name.clone(),
            sibling_name: sibling_name.clone(),
            sync_interval: Duration::from_millis(settings.sync_interval_ms),
            adjustment: sibling.topology_adjustments.clone().unwrap_or_default(),
            autostart: sibling.autostart,
            reconfigure,
        };

        let controller = Arc::new(
            Controller::start(config, Arc::clone(&broker), Arc::clone(&realnet_topology), apps, interfaces, deployer)
                .await?,
        );

        broker
            .publish(
                sibling_name,
                &Task::TopologyBuildRequest {
                    source: "realnet".to_string(),
                    sibling: sibling_name.clone(),
                },
            )
            .await?;

        let response = wait_for_build_response(
            broker.as_ref(),
            &realnet_consumer,
            sibling_name,
            Duration::from_millis(settings.sibling_timeout_ms),
        )
        .await?;
        sibling_cache.insert(sibling_name.clone(), response);

        let shutdown_rx = controller_shutdown_rx.clone();
        let task_controller = Arc::clone(&controller);
        controller_handles.push(tokio::spawn(async move {
            task_controller.run(shutdown_rx).await;
        }));
    }

    tracing::info!("all siblings built, entering main loop");

    Ok(Supervisor {
        settings,
        broker,
        realnet_apps,
        realnet_interfaces,
        realnet_nodes: Mutex::new(BTreeMap::new()),
        realnet_consumer,
        sibling_cache: Mutex::new(sibling_cache),
        controller_handles,
        controller_shutdown,
    })
}

async fn deploy_realnet(topology_file: &str, reconfigure: bool) {
    let mut command = tokio::process::Command::new("clab");
    command.arg("deploy").arg("-t").arg(topology_file);
    if reconfigure {
        command.arg("--reconfigure");
    }

    match command.output().await {
        Ok(output) if output.status.success() => {
            tracing::info!(path = topology_file, "deployed real-net topology");
        }
        Ok(output) => {
            tracing::error!(
                path = topology_file,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "real-net deployment exited non-zero"
            );
        }
        Err(error) => {
            tracing::error!(%error, path = topology_file, "failed to invoke container runtime");
        }
    }
}

/// Wait on the `realnet` channel for a `topology build response` matching
/// `sibling`, discarding anything else; `create_siblings`
/// in the source does the same, sleeping and re-checking until its own
/// timeout budget is spent.
async fn wait_for_build_response(
    broker: &dyn EventBroker,
    consumer: &ConsumerKey,
    sibling: &str,
    timeout: Duration,
) -> Result<SiblingState, BootError> {
    let deadline = Instant::now() + timeout;
    const POLL_SLICE: Duration = Duration::from_millis(200);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(BootError::SiblingTimeout(sibling.to_string()));
        }

        match broker.poll(consumer, remaining.min(POLL_SLICE)).await {
            Ok(Some(delivery)) => {
                if let Task::TopologyBuildResponse {
                    sibling: response_sibling,
                    topology,
                    nodes,
                    interfaces,
                    running,
                    ..
                } = delivery.task
                {
                    if response_sibling == sibling {
                        let mut state = SiblingState::new(sibling.to_string());
                        state.apply_build_response(topology, nodes, interfaces, running);
                        return Ok(state);
                    }
                }
            }
            Ok(None) => {}
            Err(error) => tracing::warn!(%error, sibling, "poll failed while waiting for build response"),
        }
    }
}

impl Supervisor {
    /// Run the real-net tick loop until `shutdown` reports `true` (spec.md
    /// §4.7 step f).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut stats_interval: u8 = 10;

        loop {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_millis(self.settings.sync_interval_ms)) => {}
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }

            stats_interval -= 1;
            if stats_interval == 0 {
                stats_interval = 10;
                let channels = self.broker.get_sibling_channels().await;
                tracing::info!(channels = ?channels, "tick stats");
            }

            self.tick().await;
        }
    }

    async fn tick(&self) {
        {
            let mut nodes = self.realnet_nodes.lock().await;
            for interface in self.realnet_interfaces.values() {
                interface.get_nodes_update(&mut nodes, self.broker.as_ref(), true).await;
            }
        }

        loop {
            match self.broker.poll(&self.realnet_consumer, Duration::ZERO).await {
                Ok(Some(delivery)) => self.handle_task(delivery.task).await,
                Ok(None) => break,
                Err(error) => {
                    tracing::error!(%error, "realnet poll failed");
                    break;
                }
            }
        }
    }

    async fn handle_task(&self, task: Task) {
        tracing::debug!(target: "digsinet::task", ?task, "realnet got task");

        if let Task::TopologyBuildResponse {
            sibling,
            topology,
            nodes,
            interfaces,
            running,
            ..
        } = &task
        {
            let mut cache = self.sibling_cache.lock().await;
            let state = cache.entry(sibling.clone()).or_insert_with(|| SiblingState::new(sibling.clone()));
            state.apply_build_response(topology.clone(), nodes.clone(), interfaces.clone(), *running);
        }

        let Some(sibling) = task.sibling() else {
            return;
        };

        let cache = self.sibling_cache.lock().await;
        let Some(state) = cache.get(sibling) else {
            return;
        };

        let ctx = digsinet_apps::AppContext {
            topology_name: sibling,
            running: state.running,
            nodes: &state.nodes,
            interfaces: &self.realnet_interfaces,
        };

        for app in &self.realnet_apps {
            app.run(&ctx, self.broker.as_ref(), Some(&task)).await;
        }
    }

    /// Signal every controller to stop, wait for them to exit, then release
    /// the broker's backend resources.
    pub async fn shutdown(self) {
        tracing::info!("shutting down");
        let _ = self.controller_shutdown.send(true);

        for handle in self.controller_handles {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "controller task panicked during shutdown");
            }
        }

        self.broker.close_consumer(&self.realnet_consumer).await;
        self.broker.close().await;
    }
}
