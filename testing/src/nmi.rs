//! A scriptable [`NodeManagementClient`] for tests that need fixed
//! responses or injected failures rather than the stateful replay
//! `digsinet_nmi::DummyGnmiClient` provides.

use digsinet_nmi::client::{NodeManagementClient, SetOp};
use digsinet_nmi::NmiError;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

type HostPath = (String, String);

/// A [`NodeManagementClient`] whose `get`/`set` responses are fixed at
/// construction time, with individual `(host, path)` pairs optionally
/// wired to fail instead. Unlike `DummyGnmiClient`, `set` never mutates
/// what a later `get` returns — tests that need that can seed
/// `DummyGnmiClient` instead.
#[derive(Default)]
pub struct StaticNodeManagementClient {
    responses: HashMap<HostPath, Value>,
    failures: Mutex<HashSet<HostPath>>,
}

impl StaticNodeManagementClient {
    /// A client with no canned responses and no injected failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the value `get(host, path, ..)` returns.
    #[must_use]
    pub fn with_response(mut self, host: &str, path: &str, value: Value) -> Self {
        self.responses.insert((host.to_string(), path.to_string()), value);
        self
    }

    /// Make both `get` and `set` fail for `(host, path)` with
    /// [`NmiError::ClientError`].
    #[must_use]
    pub fn with_failure(self, host: &str, path: &str) -> Self {
        self.failures.lock().expect("failure set lock poisoned").insert((host.to_string(), path.to_string()));
        self
    }

    fn should_fail(&self, host: &str, path: &str) -> bool {
        self.failures.lock().expect("failure set lock poisoned").contains(&(host.to_string(), path.to_string()))
    }
}

impl NodeManagementClient for StaticNodeManagementClient {
    fn get<'a>(
        &'a self,
        host: &'a str,
        _port: u16,
        path: &'a str,
        _datatype: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Value, NmiError>> + Send + 'a>> {
        Box::pin(async move {
            if self.should_fail(host, path) {
                return Err(NmiError::ClientError { host: host.to_string(), reason: "injected failure".to_string() });
            }
            Ok(self.responses.get(&(host.to_string(), path.to_string())).cloned().unwrap_or(Value::Null))
        })
    }

    fn set<'a>(
        &'a self,
        host: &'a str,
        _port: u16,
        path: &'a str,
        op: SetOp,
        _data: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, NmiError>> + Send + 'a>> {
        Box::pin(async move {
            if self.should_fail(host, path) {
                return Err(NmiError::ClientError { host: host.to_string(), reason: "injected failure".to_string() });
            }
            Ok(serde_json::json!({"op": format!("{op:?}").to_lowercase(), "path": path}))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_the_seeded_response() {
        let client = StaticNodeManagementClient::new().with_response(
            "clab-net-r1",
            "openconfig:/interfaces",
            serde_json::json!({"admin-status": "UP"}),
        );

        let value = client.get("clab-net-r1", 6030, "openconfig:/interfaces", "all").await.unwrap();
        assert_eq!(value, serde_json::json!({"admin-status": "UP"}));
    }

    #[tokio::test]
    async fn get_with_no_seed_returns_null() {
        let client = StaticNodeManagementClient::new();
        let value = client.get("clab-net-r1", 6030, "openconfig:/interfaces", "all").await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn injected_failures_affect_both_get_and_set() {
        let client = StaticNodeManagementClient::new().with_failure("clab-net-r1", "openconfig:/interfaces");

        assert!(client.get("clab-net-r1", 6030, "openconfig:/interfaces", "all").await.is_err());
        assert!(client
            .set("clab-net-r1", 6030, "openconfig:/interfaces", SetOp::Replace, &Value::Null)
            .await
            .is_err());
    }
}
