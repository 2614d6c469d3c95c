//! Error taxonomy for topology deployment.

use thiserror::Error;

/// Errors raised while dumping or deploying a sibling's topology.
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Rendering the topology to the container-runtime YAML shape failed.
    #[error("failed to render topology yaml: {0}")]
    Render(#[from] serde_yaml::Error),

    /// Writing the rendered topology file to disk failed.
    #[error("failed to write topology file '{path}': {source}")]
    Write {
        /// Path that could not be written.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The container runtime binary (`clab`) could not be launched.
    #[error("container runtime not available: {0}")]
    RuntimeNotFound(std::io::Error),

    /// The container runtime exited with a non-zero status.
    #[error("topology deployment failed with status {status}: {stderr}")]
    DeploymentFailed {
        /// Process exit status (or -1 if the process was signalled).
        status: i32,
        /// Captured stderr output.
        stderr: String,
    },
}
