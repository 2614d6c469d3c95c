//! App factory registry.

use crate::Application;
use digsinet_core::registry::Registry;

/// A name → [`Application`] factory registry, resolved from the `apps`
/// section of configuration.
pub type AppRegistry = Registry<dyn Application>;

/// Build the registry pre-populated with the reference apps shipped in
/// this crate.
#[must_use]
pub fn with_reference_apps() -> AppRegistry {
    let registry = AppRegistry::new();
    registry.register("hello_world", || std::sync::Arc::new(crate::hello_world::HelloWorldApp));
    registry.register("overview", || std::sync::Arc::new(crate::overview::OverviewApp::default()));
    registry.register("ci", || std::sync::Arc::new(crate::ci::CiApp));
    registry.register("sec", || std::sync::Arc::new(crate::sec::SecApp));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_apps_are_all_registered() {
        let registry = with_reference_apps();
        assert_eq!(
            registry.names(),
            vec!["ci".to_string(), "hello_world".to_string(), "overview".to_string(), "sec".to_string()]
        );
    }
}
