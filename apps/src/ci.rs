//! The reference "ci" app.
//!
//! Grounded on `examples/original_source/apps/ci.py`: reacts to a real-net
//! `gNMI notification` carrying a `"fuzz_me"` trigger in its diff by
//! asking `sec` to run the fuzzer, and logs `fuzzer result` round-trip
//! latency.

use crate::{AppContext, Application};
use digsinet_broker::EventBroker;
use digsinet_core::Task;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

const SECURITY_CHANNEL: &str = "security";

/// Watches real-net gNMI notifications for a fuzz trigger and asks `sec`
/// to run the fuzzer; logs the resulting round-trip latency.
#[derive(Debug, Default)]
pub struct CiApp;

impl Application for CiApp {
    fn run<'a>(
        &'a self,
        ctx: &'a AppContext<'a>,
        broker: &'a dyn EventBroker,
        task: Option<&'a Task>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let Some(task) = task else {
                return;
            };

            tracing::debug!(topology = ctx.topology_name, ?task, "ci app got task");

            match task {
                Task::GnmiNotification { source, diff, .. } if source == "realnet" => {
                    let triggered = diff.as_ref().is_some_and(contains_fuzz_me_trigger);
                    if !triggered {
                        return;
                    }

                    tracing::info!(
                        topology = ctx.topology_name,
                        "detected gNMI notification 'fuzz_me', asking sec app to run fuzzer..."
                    );

                    let request = Task::RunFuzzer {
                        source: "ci".to_string(),
                        timestamp: unix_timestamp(),
                        data: Value::String(String::new()),
                    };

                    if let Err(error) = broker.publish(SECURITY_CHANNEL, &request).await {
                        tracing::error!(%error, "ci app failed to publish run-fuzzer request");
                    }
                }
                Task::FuzzerResult { request_timestamp, data, .. } => {
                    let duration = unix_timestamp() - request_timestamp;
                    tracing::info!(
                        topology = ctx.topology_name,
                        duration_secs = duration,
                        ?data,
                        "got fuzzer result"
                    );
                }
                _ => {}
            }
        })
    }
}

/// `true` if `diff` contains the literal string `"fuzz_me"` as a value
/// anywhere in its structure (the source's
/// `diff['values_changed'].items[1].t2 == 'fuzz_me'` check, generalised
/// since our diff representation is a plain JSON value rather than a
/// `DeepDiff` tree).
fn contains_fuzz_me_trigger(diff: &Value) -> bool {
    match diff {
        Value::String(s) => s == "fuzz_me",
        Value::Array(items) => items.iter().any(contains_fuzz_me_trigger),
        Value::Object(map) => map.values().any(contains_fuzz_me_trigger),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

fn unix_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzz_me_trigger_detected_in_nested_object() {
        let diff = serde_json::json!({"values_changed": {"root": {"new_value": "fuzz_me"}}});
        assert!(contains_fuzz_me_trigger(&diff));
    }

    #[test]
    fn unrelated_diff_does_not_trigger() {
        let diff = serde_json::json!({"values_changed": {"root": {"new_value": "DOWN"}}});
        assert!(!contains_fuzz_me_trigger(&diff));
    }
}
