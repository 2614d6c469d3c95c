//! The management-protocol client boundary.
//!
//! The concrete wire client (gNMI over gRPC) is a concrete
//! management-protocol client modelled on gNMI, left unspecified here.
//! [`NodeManagementClient`] is that boundary:
//! anything that can `get`/`set` a path on a host plugs in here, and
//! [`crate::NodeManagementInterface`] (host derivation, diffing, the
//! write lock, hello-world suppression) is fully exercised against
//! [`DummyGnmiClient`] without a protobuf/gRPC dependency.

use crate::error::NmiError;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

/// The three gNMI write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// Merge `data` into the existing config at `path`.
    Update,
    /// Replace the config at `path` with `data`.
    Replace,
    /// Delete `path`.
    Delete,
}

impl SetOp {
    /// Parse the wire string used by `Interface::set`'s `op` argument.
    ///
    /// # Errors
    ///
    /// Returns [`NmiError::UnsupportedOperation`] for anything other than
    /// `"update"`, `"replace"`, or `"delete"`.
    pub fn parse(op: &str) -> Result<Self, NmiError> {
        match op {
            "update" => Ok(SetOp::Update),
            "replace" => Ok(SetOp::Replace),
            "delete" => Ok(SetOp::Delete),
            other => Err(NmiError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// A single gNMI-style management client, addressed per call by host.
///
/// Object-safe via boxed futures (same pattern as
/// `digsinet_broker::EventBroker`) so [`crate::NodeManagementInterface`]
/// can hold an `Arc<dyn NodeManagementClient>`.
pub trait NodeManagementClient: Send + Sync {
    /// Read `path` on `host` with the given `datatype` hint.
    ///
    /// # Errors
    ///
    /// Returns [`NmiError::ClientError`] if the host is unreachable or the
    /// client otherwise fails.
    fn get<'a>(
        &'a self,
        host: &'a str,
        port: u16,
        path: &'a str,
        datatype: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Value, NmiError>> + Send + 'a>>;

    /// Apply `op` with `data` at `path` on `host`.
    ///
    /// # Errors
    ///
    /// Returns [`NmiError::ClientError`] if the host is unreachable or the
    /// client otherwise fails.
    fn set<'a>(
        &'a self,
        host: &'a str,
        port: u16,
        path: &'a str,
        op: SetOp,
        data: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, NmiError>> + Send + 'a>>;
}

/// An in-memory stand-in for a real gNMI client, keyed by `(host, path)`.
///
/// `get` returns whatever was last written via `set` (or
/// `serde_json::Value::Null` if nothing has been written yet), so tests
/// can exercise a full read-modify-write cycle through
/// [`crate::NodeManagementInterface`] without a network.
#[derive(Debug, Default)]
pub struct DummyGnmiClient {
    state: Mutex<HashMap<(String, String), Value>>,
}

impl DummyGnmiClient {
    /// An empty client with no prior state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `(host, path)` with an initial value, as if a prior `set` had
    /// already run.
    #[must_use]
    pub fn with_seed(self, host: &str, path: &str, value: Value) -> Self {
        self.state
            .lock()
            .expect("dummy gnmi client lock poisoned")
            .insert((host.to_string(), path.to_string()), value);
        self
    }
}

impl NodeManagementClient for DummyGnmiClient {
    fn get<'a>(
        &'a self,
        host: &'a str,
        _port: u16,
        path: &'a str,
        _datatype: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Value, NmiError>> + Send + 'a>> {
        Box::pin(async move {
            let state = self.state.lock().expect("dummy gnmi client lock poisoned");
            Ok(state
                .get(&(host.to_string(), path.to_string()))
                .cloned()
                .unwrap_or(Value::Null))
        })
    }

    fn set<'a>(
        &'a self,
        host: &'a str,
        _port: u16,
        path: &'a str,
        op: SetOp,
        data: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value, NmiError>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().expect("dummy gnmi client lock poisoned");
            let key = (host.to_string(), path.to_string());
            match op {
                SetOp::Update | SetOp::Replace => {
                    state.insert(key, data.clone());
                }
                SetOp::Delete => {
                    state.remove(&key);
                }
            }
            Ok(serde_json::json!({"op": format!("{op:?}").to_lowercase(), "path": path}))
        })
    }
}

/// A name → [`NodeManagementClient`] factory registry, resolved from the
/// `interfaces.<name>.module` configuration string. The concrete gNMI
/// wire client is out of scope, so only the `"gnmi"` module resolves —
/// to [`DummyGnmiClient`].
pub type ClientRegistry = digsinet_core::registry::Registry<dyn NodeManagementClient>;

/// Build the registry pre-populated with the reference client.
#[must_use]
pub fn with_reference_clients() -> ClientRegistry {
    let registry = ClientRegistry::new();
    registry.register("gnmi", || std::sync::Arc::new(DummyGnmiClient::new()));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_clients_are_registered() {
        let registry = with_reference_clients();
        assert_eq!(registry.names(), vec!["gnmi".to_string()]);
    }

    #[test]
    fn set_op_parses_wire_strings() {
        assert_eq!(SetOp::parse("update").unwrap(), SetOp::Update);
        assert_eq!(SetOp::parse("replace").unwrap(), SetOp::Replace);
        assert_eq!(SetOp::parse("delete").unwrap(), SetOp::Delete);
        assert!(SetOp::parse("frobnicate").is_err());
    }
}
