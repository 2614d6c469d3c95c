//! # DigSiNet Applications
//!
//! Component C5: pluggable, per-sibling behaviours that react to
//! (or periodically ignore) broker tasks.
//!
//! Grounded on `examples/original_source/apps/app.py`'s abstract `run`
//! contract, generalised to a dyn-compatible trait via boxed futures (the
//! same pattern as `digsinet_broker::EventBroker`) so a controller can hold
//! a list of `Arc<dyn Application>`.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ci;
mod context;
mod hello_world;
mod overview;
mod registry;
mod sec;

pub use ci::CiApp;
pub use context::AppContext;
pub use hello_world::HelloWorldApp;
pub use overview::OverviewApp;
pub use registry::{with_reference_apps, AppRegistry};
pub use sec::SecApp;

use digsinet_broker::EventBroker;
use digsinet_core::Task;
use std::future::Future;
use std::pin::Pin;

/// One pluggable per-sibling behaviour.
///
/// Apps are stateless across ticks except for small internal counters
/// (e.g. [`OverviewApp`]'s cadence). They read sibling state through
/// [`AppContext`] and may publish new tasks via `broker`, but must not
/// mutate sibling state directly — only the controller does that, through
/// the node management interface.
pub trait Application: Send + Sync {
    /// Run one invocation: `task` is `None` on the periodic call and
    /// `Some` when dispatching a dequeued task.
    fn run<'a>(
        &'a self,
        ctx: &'a AppContext<'a>,
        broker: &'a dyn EventBroker,
        task: Option<&'a Task>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}
