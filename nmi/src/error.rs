//! Error taxonomy for node management operations.

use thiserror::Error;

/// Errors raised by [`crate::NodeManagementInterface`] and
/// [`crate::NodeManagementClient`] implementations.
///
/// Errors are logged with host context and swallowed at the call site —
/// this type exists so callers *can* log with that context, not so
/// they're forced to propagate it.
#[derive(Error, Debug, Clone)]
pub enum NmiError {
    /// `node_selector` in the node management config is not a valid regex.
    #[error("invalid node selector pattern '{0}': {1}")]
    InvalidSelector(String, String),

    /// `set`'s `op` argument was not one of `update`, `replace`, `delete`.
    #[error("unsupported node management operation: {0}")]
    UnsupportedOperation(String),

    /// The underlying client failed to reach or respond for `host`.
    #[error("node management client error on host '{host}': {reason}")]
    ClientError {
        /// Host the request targeted.
        host: String,
        /// Underlying reason reported by the client.
        reason: String,
    },
}
