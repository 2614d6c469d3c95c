//! # DigSiNet Controller
//!
//! Component C6: one instance per sibling, running the main loop that
//! mirrors real-net changes, runs apps, and drains its task inbox.
//!
//! Grounded on `examples/original_source/controllers/controller.py` for
//! the overall shape and `digsinet.py`'s `create_siblings` for the
//! topology-build-request/response exchange.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;

pub use error::ControllerError;

use digsinet_apps::{AppContext, Application};
use digsinet_broker::{ConsumerKey, EventBroker};
use digsinet_builder::TopologyDeployer;
use digsinet_core::sibling::SiblingState;
use digsinet_core::{Task, Topology, TopologyAdjustment, TopologyTarget};
use digsinet_nmi::NodeManagementInterface;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};

/// Static, per-sibling configuration a [`Controller`] is built from.
pub struct ControllerConfig {
    /// Name of the topology this controller's siblings belong to.
    pub topology_name: String,
    /// This controller's sibling name.
    pub sibling_name: String,
    /// How long to sleep between main-loop iterations.
    pub sync_interval: Duration,
    /// Declarative adjustment applied to the real topology to derive this
    /// sibling's topology on a build request.
    pub adjustment: TopologyAdjustment,
    /// Whether a `topology build request` should actually launch the
    /// container runtime (vs. just rendering the topology file).
    pub autostart: bool,
    /// Whether to pass `--reconfigure` to the container runtime.
    pub reconfigure: bool,
}

/// One sibling's controller: owns its [`SiblingState`], apps, and node
/// management interfaces, and runs the per-tick main loop.
pub struct Controller {
    config: ControllerConfig,
    state: Mutex<SiblingState>,
    apps: Vec<Arc<dyn Application>>,
    interfaces: HashMap<String, Arc<NodeManagementInterface>>,
    deployer: Arc<dyn TopologyDeployer>,
    realnet_topology: Arc<RwLock<Topology>>,
    broker: Arc<dyn EventBroker>,
    consumer: ConsumerKey,
}

impl Controller {
    /// Subscribe to the sibling's channel and build a controller ready to
    /// run. `apps` and `interfaces` are the already-resolved instances for
    /// this sibling (resolved from configuration by the supervisor via the
    /// app/interface registries).
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Subscribe`] if the channel subscription
    /// fails.
    pub async fn start(
        config: ControllerConfig,
        broker: Arc<dyn EventBroker>,
        realnet_topology: Arc<RwLock<Topology>>,
        apps: Vec<Arc<dyn Application>>,
        interfaces: HashMap<String, Arc<NodeManagementInterface>>,
        deployer: Arc<dyn TopologyDeployer>,
    ) -> Result<Self, ControllerError> {
        let consumer = broker
            .subscribe(&config.sibling_name, "controller")
            .await
            .map_err(ControllerError::Subscribe)?;

        let state = Mutex::new(SiblingState::new(config.sibling_name.clone()));

        Ok(Self {
            config,
            state,
            apps,
            interfaces,
            deployer,
            realnet_topology,
            broker,
            consumer,
        })
    }

    /// Run the main loop until `shutdown` reports `true`.
    ///
    /// The loop exits at its sleep or poll boundary (spec.md §4.6
    /// "Cancellation"); in-flight C3 calls are not cancelled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                () = tokio::time::sleep(self.config.sync_interval) => {}
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }

            digsinet_runtime::ControllerMetrics::record_tick();
            self.tick().await;
        }

        self.broker.close_consumer(&self.consumer).await;
    }

    /// Run exactly one main-loop iteration without sleeping first. Exposed
    /// for tests and for a supervisor that wants tighter control over
    /// scheduling.
    pub async fn tick(&self) {
        let mut state = self.state.lock().await;

        if state.running {
            for interface in self.interfaces.values() {
                interface.get_nodes_update(&mut state.nodes, self.broker.as_ref(), true).await;
            }
        }

        self.run_apps(&state, None).await;

        loop {
            match self.broker.poll(&self.consumer, Duration::ZERO).await {
                Ok(Some(delivery)) => self.handle_task(&mut state, delivery.task).await,
                Ok(None) => break,
                Err(error) => {
                    tracing::error!(%error, sibling = self.config.sibling_name, "controller poll failed");
                    break;
                }
            }
        }
    }

    async fn run_apps(&self, state: &SiblingState, task: Option<&Task>) {
        let ctx = AppContext {
            topology_name: &self.config.sibling_name,
            running: state.running,
            nodes: &state.nodes,
            interfaces: &self.interfaces,
        };

        for app in &self.apps {
            digsinet_runtime::ControllerMetrics::record_app_invocation();
            app.run(&ctx, self.broker.as_ref(), task).await;
        }
    }

    async fn handle_task(&self, state: &mut SiblingState, task: Task) {
        match &task {
            Task::GnmiNotification { source, node, path, data, diff }
                if source == "realnet" && diff.is_some() =>
            {
                if state.running {
                    if let Some(gnmi) = self.interfaces.get("gnmi") {
                        gnmi.set_node_update(node, path, data).await;
                    }
                }
            }
            Task::TopologyBuildRequest { sibling, .. } if sibling == &self.config.sibling_name => {
                self.handle_build_request(state).await;
            }
            _ => {}
        }

        self.run_apps(state, Some(&task)).await;
    }

    async fn handle_build_request(&self, state: &mut SiblingState) {
        let real = self.realnet_topology.read().await.clone();

        let topology = match real.adjust(&self.config.adjustment) {
            Ok(topology) => topology,
            Err(error) => {
                tracing::error!(%error, sibling = self.config.sibling_name, "failed to adjust topology");
                return;
            }
        };

        let running = match self
            .deployer
            .deploy(
                &self.config.topology_name,
                &self.config.sibling_name,
                &topology,
                self.config.autostart,
                self.config.reconfigure,
            )
            .await
        {
            Ok(running) => running,
            Err(error) => {
                tracing::error!(%error, sibling = self.config.sibling_name, "failed to build sibling topology");
                return;
            }
        };

        let interface_names: Vec<String> = self.interfaces.keys().cloned().collect();
        state.apply_build_response(topology.clone(), state.nodes.clone(), interface_names.clone(), running);

        let response = Task::TopologyBuildResponse {
            source: self.config.sibling_name.clone(),
            sibling: self.config.sibling_name.clone(),
            topology,
            nodes: state.nodes.clone(),
            interfaces: interface_names,
            running,
        };

        for channel in self.broker.get_sibling_channels().await {
            if let Err(error) = self.broker.publish(&channel, &response).await {
                tracing::error!(%error, channel, "failed to publish topology build response");
            }
        }
    }
}

/// The per-host write-target identity a controller's interfaces read and
/// write through.
#[must_use]
pub fn controller_target(sibling_name: &str) -> TopologyTarget {
    TopologyTarget::Sibling(sibling_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use digsinet_broker::{ConsumerKey as BrokerConsumerKey, Delivery, EventBrokerError};
    use std::future::Future;
    use std::pin::Pin;

    /// A broker stub with no channels and no queued deliveries, just
    /// enough to drive [`Controller::tick`] in isolation.
    struct NullBroker;

    impl EventBroker for NullBroker {
        fn publish<'a>(
            &'a self,
            _channel: &'a str,
            _task: &'a Task,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>> {
            Box::pin(async { Ok(()) })
        }
        fn subscribe<'a>(
            &'a self,
            channel: &'a str,
            group_prefix: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<BrokerConsumerKey, EventBrokerError>> + Send + 'a>> {
            let key = BrokerConsumerKey::new(channel, group_prefix);
            Box::pin(async move { Ok(key) })
        }
        fn poll<'a>(
            &'a self,
            _consumer: &'a BrokerConsumerKey,
            _timeout: Duration,
        ) -> Pin<Box<dyn Future<Output = Result<Option<Delivery>, EventBrokerError>> + Send + 'a>> {
            Box::pin(async { Ok(None) })
        }
        fn get_sibling_channels<'a>(&'a self) -> Pin<Box<dyn Future<Output = Vec<String>> + Send + 'a>> {
            Box::pin(async { Vec::new() })
        }
        fn new_sibling_channel<'a>(
            &'a self,
            _channel: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBrokerError>> + Send + 'a>> {
            Box::pin(async { Ok(()) })
        }
        fn close_consumer<'a>(
            &'a self,
            _consumer: &'a BrokerConsumerKey,
        ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async {})
        }
        fn close<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async {})
        }
    }

    struct CountingApp(Arc<std::sync::atomic::AtomicUsize>);

    impl Application for CountingApp {
        fn run<'a>(
            &'a self,
            _ctx: &'a AppContext<'a>,
            _broker: &'a dyn EventBroker,
            _task: Option<&'a Task>,
        ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    #[tokio::test]
    async fn tick_runs_apps_even_when_sibling_not_running() {
        let broker: Arc<dyn EventBroker> = Arc::new(NullBroker);

        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let config = ControllerConfig {
            topology_name: "net".to_string(),
            sibling_name: "ci".to_string(),
            sync_interval: Duration::from_millis(10),
            adjustment: TopologyAdjustment::default(),
            autostart: false,
            reconfigure: false,
        };

        let controller = Controller::start(
            config,
            Arc::clone(&broker),
            Arc::new(RwLock::new(Topology::default())),
            vec![Arc::new(CountingApp(Arc::clone(&calls)))],
            HashMap::new(),
            Arc::new(digsinet_builder::ClabDeployer),
        )
        .await
        .unwrap();

        controller.tick().await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
