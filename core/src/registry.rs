//! A small thread-safe name → factory registry.
//!
//! Controllers, builders, apps and interfaces are resolved from
//! configuration strings. Rust has no
//! runtime module loading, so the registry is the documented substitute:
//! `register(name, factory)` at program start, then `create(name, ...)`
//! looks the factory up by the string that came out of YAML. Grounded on
//! the teacher's `composable_rust_tools::registry::ToolRegistry`, generalised
//! from `(Tool, ToolExecutorFn)` pairs to an arbitrary factory function.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A registry mapping names to factory closures producing `Arc<T>` values.
///
/// `T` is left generic so the same type can back the controller, builder,
/// app and interface registries without four near-identical structs.
pub struct Registry<T: ?Sized> {
    factories: Arc<RwLock<HashMap<String, Arc<dyn Fn() -> Arc<T> + Send + Sync>>>>,
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            factories: Arc::clone(&self.factories),
        }
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Registry<T> {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a factory under `name`. Replaces any existing factory for
    /// that name and returns whether one was replaced.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in
    /// another thread while holding the lock).
    #[allow(clippy::expect_used)]
    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let mut factories = self.factories.write().expect("registry lock poisoned");
        factories.insert(name.into(), Arc::new(factory)).is_some()
    }

    /// Instantiate the value registered under `name`, or `None` if nothing
    /// is registered for it.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn create(&self, name: &str) -> Option<Arc<T>> {
        let factories = self.factories.read().expect("registry lock poisoned");
        factories.get(name).map(|factory| factory())
    }

    /// Names currently registered, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let factories = self.factories.read().expect("registry lock poisoned");
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn register_then_create() {
        let registry: Registry<dyn Greeter> = Registry::new();
        registry.register("hello", || Arc::new(Hello));
        let instance = registry.create("hello").expect("registered");
        assert_eq!(instance.greet(), "hello");
    }

    #[test]
    fn unknown_name_returns_none() {
        let registry: Registry<dyn Greeter> = Registry::new();
        assert!(registry.create("missing").is_none());
    }

    #[test]
    fn names_are_sorted() {
        let registry: Registry<dyn Greeter> = Registry::new();
        registry.register("b", || Arc::new(Hello));
        registry.register("a", || Arc::new(Hello));
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }
}
