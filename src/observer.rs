//! Diagnostic observers for resolution and lifetime events.
//!
//! Observers are notified synchronously while the container works, so keep
//! implementations cheap. With no observers registered the notification
//! paths reduce to an empty-vector check.

use std::sync::Arc;
use std::time::Duration;

use crate::key::{InstanceId, TypeKey};

/// Observer trait for container events.
///
/// # Examples
///
/// ```
/// use lifecycle_di::{Container, ContainerObserver, Resolver, StoragePolicy, TypeKey};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Counting {
///     resolved: AtomicUsize,
/// }
///
/// impl ContainerObserver for Counting {
///     fn resolving(&self, _key: &TypeKey) {}
///     fn resolved(&self, _key: &TypeKey, _duration: Duration) {
///         self.resolved.fetch_add(1, Ordering::Relaxed);
///     }
///     fn factory_panic(&self, _key: &TypeKey, _message: &str) {}
/// }
///
/// #[derive(Default)]
/// struct Page;
///
/// let observer = Arc::new(Counting::default());
/// let container = Container::new();
/// container.add_observer(observer.clone());
/// container.register_type::<Page>(StoragePolicy::IsolatedInstance).with_default().register();
///
/// container.resolve::<Page>().unwrap();
/// assert_eq!(observer.resolved.load(Ordering::Relaxed), 1);
/// ```
pub trait ContainerObserver: Send + Sync {
    /// Called when a resolution for `key` starts.
    fn resolving(&self, key: &TypeKey);

    /// Called when a resolution for `key` succeeded.
    fn resolved(&self, key: &TypeKey, duration: Duration);

    /// Called when a factory or constructor for the concrete type `key`
    /// panicked. The panic is converted into `ConstructionFailed` afterwards.
    fn factory_panic(&self, key: &TypeKey, message: &str);

    /// Called when a stored singleton is replaced by a racing construction.
    fn singleton_overwritten(&self, _owner: &TypeKey) {}

    /// Called when an instance leaves the stores, either announced as dying
    /// or orphaned by the shared-instance cascade.
    fn instance_retired(&self, _id: InstanceId) {}
}

/// Container for registered observers.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn ContainerObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn ContainerObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &TypeKey) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &TypeKey, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn factory_panic(&self, key: &TypeKey, message: &str) {
        for observer in &self.observers {
            observer.factory_panic(key, message);
        }
    }

    pub(crate) fn singleton_overwritten(&self, owner: &TypeKey) {
        for observer in &self.observers {
            observer.singleton_overwritten(owner);
        }
    }

    pub(crate) fn instance_retired(&self, id: InstanceId) {
        for observer in &self.observers {
            observer.instance_retired(id);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// ```
/// use lifecycle_di::{Container, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.add_observer(Arc::new(LoggingObserver::with_target("pages")));
/// ```
pub struct LoggingObserver {
    target: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            target: "lifecycle-di".to_string(),
        }
    }

    /// Uses `target` as the `source` field of every event.
    pub fn with_target(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerObserver for LoggingObserver {
    fn resolving(&self, key: &TypeKey) {
        tracing::trace!(source = %self.target, requested = key.name(), "resolving");
    }

    fn resolved(&self, key: &TypeKey, duration: Duration) {
        tracing::debug!(
            source = %self.target,
            requested = key.name(),
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn factory_panic(&self, key: &TypeKey, message: &str) {
        tracing::error!(source = %self.target, concrete = key.name(), message, "construction panicked");
    }

    fn singleton_overwritten(&self, owner: &TypeKey) {
        tracing::warn!(source = %self.target, owner = owner.name(), "singleton overwritten");
    }

    fn instance_retired(&self, id: InstanceId) {
        tracing::debug!(source = %self.target, instance = %id, "instance retired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tally {
        panics: AtomicUsize,
        retired: AtomicUsize,
    }

    impl ContainerObserver for Tally {
        fn resolving(&self, _key: &TypeKey) {}
        fn resolved(&self, _key: &TypeKey, _duration: Duration) {}
        fn factory_panic(&self, _key: &TypeKey, _message: &str) {
            self.panics.fetch_add(1, Ordering::SeqCst);
        }
        fn instance_retired(&self, _id: InstanceId) {
            self.retired.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn fan_out_reaches_every_observer() {
        let a = Arc::new(Tally::default());
        let b = Arc::new(Tally::default());
        let mut observers = Observers::new();
        assert!(!observers.has_observers());
        observers.add(a.clone());
        observers.add(b.clone());
        assert_eq!(observers.len(), 2);

        let key = TypeKey::of::<u8>();
        observers.factory_panic(&key, "boom");
        observers.instance_retired(InstanceId::of(&Arc::new(1u8)));
        // default no-op
        observers.singleton_overwritten(&key);

        for tally in [&a, &b] {
            assert_eq!(tally.panics.load(Ordering::SeqCst), 1);
            assert_eq!(tally.retired.load(Ordering::SeqCst), 1);
        }
    }
}
