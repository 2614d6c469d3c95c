//! Error taxonomy for the supervisor's boot sequence.
//!
//! Everything after boot (the steady-state tick loop) logs and tolerates
//! errors rather than propagating them — only boot-time failures are fatal,
//! matching `digsinet.py`'s "exit(1) on timeout" posture.

use thiserror::Error;

/// Errors that can abort the boot sequence before the main loop starts.
#[derive(Error, Debug)]
pub enum BootError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] digsinet_config::ConfigError),

    /// The real-network topology file could not be read.
    #[error("failed to read topology file '{path}': {source}")]
    ReadTopology {
        /// Path from `config.topology.file`.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The real-network topology file could not be parsed.
    #[error(transparent)]
    ParseTopology(#[from] digsinet_builder::LoadError),

    /// The event broker could not be reached.
    #[error(transparent)]
    Broker(#[from] digsinet_broker::EventBrokerError),

    /// A configured `apps.<name>.module`, `builders.<name>.module`, or
    /// `interfaces.<name>.module` did not resolve against the
    /// corresponding registry.
    #[error("{section} references unknown module '{module}'")]
    UnknownModule {
        /// Section the dangling module reference was found in.
        section: String,
        /// The unresolved module name.
        module: String,
    },

    /// Building a node management interface failed (an invalid selector
    /// regex in configuration).
    #[error(transparent)]
    Interface(#[from] digsinet_nmi::NmiError),

    /// Starting a sibling's controller failed.
    #[error(transparent)]
    Controller(#[from] digsinet_controller::ControllerError),

    /// A sibling's `topology build response` did not arrive within
    /// `create_sibling_timeout`.
    #[error("timed out waiting for topology build response from sibling '{0}'")]
    SiblingTimeout(String),
}
