//! Error taxonomy for the controller main loop.

use thiserror::Error;

/// Errors raised while starting or running a [`crate::Controller`].
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Subscribing to the sibling's channel failed at startup.
    #[error("failed to subscribe to sibling channel: {0}")]
    Subscribe(#[source] digsinet_broker::EventBrokerError),

    /// The configured node selector regex failed to compile.
    #[error("failed to build node management interface: {0}")]
    Interface(#[source] digsinet_nmi::NmiError),
}
