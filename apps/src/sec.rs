//! The reference "sec" app.
//!
//! Grounded on `examples/original_source/apps/sec.py`: reacts to a
//! `run fuzzer` request by "running the fuzzer" (a stand-in — the actual
//! fuzzing harness is out of scope) and reporting a `fuzzer result` back
//! to `ci`.

use crate::{AppContext, Application};
use digsinet_broker::EventBroker;
use digsinet_core::Task;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

const CONTINUOUS_INTEGRATION_CHANNEL: &str = "continuous_integration";

/// Runs the fuzzer on request and reports the result back to `ci`.
#[derive(Debug, Default)]
pub struct SecApp;

impl Application for SecApp {
    fn run<'a>(
        &'a self,
        ctx: &'a AppContext<'a>,
        broker: &'a dyn EventBroker,
        task: Option<&'a Task>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let Some(Task::RunFuzzer { timestamp, .. }) = task else {
                return;
            };

            let duration = unix_timestamp() - timestamp;
            tracing::info!(topology = ctx.topology_name, duration_secs = duration, "running fuzzer");

            let result = Task::FuzzerResult {
                source: "sec".to_string(),
                request_timestamp: *timestamp,
                timestamp: unix_timestamp(),
                data: Value::String(String::new()),
            };

            if let Err(error) = broker.publish(CONTINUOUS_INTEGRATION_CHANNEL, &result).await {
                tracing::error!(%error, "sec app failed to publish fuzzer result");
            }
        })
    }
}

fn unix_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
