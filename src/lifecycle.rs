//! Lifecycle signals from the host application.
//!
//! Hosts publish "this object is disappearing" on a [`LifecycleBus`];
//! attached containers tear the object down. The bus keeps only weak
//! references to its listeners and never holds the published object, so
//! neither side keeps the other alive.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::key::InstanceId;

/// Receives retirement signals from a [`LifecycleBus`].
pub trait RetirementListener: Send + Sync {
    fn on_retiring(&self, id: InstanceId);
}

/// Message bus for "object is disappearing" signals.
///
/// # Examples
///
/// ```
/// use lifecycle_di::{Container, LifecycleBus, Resolver, StoragePolicy};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Settings;
///
/// let bus = LifecycleBus::new();
/// let container = Container::new();
/// container.attach_to(&bus);
/// container.register_type::<Settings>(StoragePolicy::GlobalSingleton).with_default().register();
///
/// let settings = container.resolve::<Settings>().unwrap();
/// assert_eq!(bus.publish(&settings), 1);
/// assert!(!container.has_singleton::<Settings>());
///
/// container.detach_from(&bus);
/// assert_eq!(bus.listener_count(), 0);
/// ```
#[derive(Default)]
pub struct LifecycleBus {
    listeners: RwLock<Vec<Weak<dyn RetirementListener>>>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener`, held weakly. Subscribing twice is a no-op.
    pub fn subscribe(&self, listener: &Arc<dyn RetirementListener>) {
        let mut listeners = self.listeners.write();
        let target = data_ptr(listener);
        if listeners.iter().any(|w| Weak::as_ptr(w) as *const () == target) {
            return;
        }
        listeners.push(Arc::downgrade(listener));
    }

    pub fn unsubscribe(&self, listener: &Arc<dyn RetirementListener>) {
        let target = data_ptr(listener);
        self.listeners
            .write()
            .retain(|w| Weak::as_ptr(w) as *const () != target);
    }

    /// Announces that `instance` is disappearing. Returns how many live
    /// listeners were notified; dropped listeners are pruned.
    pub fn publish<T: ?Sized>(&self, instance: &Arc<T>) -> usize {
        self.publish_id(InstanceId::of(instance))
    }

    pub fn publish_id(&self, id: InstanceId) -> usize {
        // Upgrade first so no lock is held while listeners run
        let live: Vec<Arc<dyn RetirementListener>> = {
            let mut listeners = self.listeners.write();
            listeners.retain(|w| w.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        tracing::trace!(instance = %id, listeners = live.len(), "publishing retirement");
        for listener in &live {
            listener.on_retiring(id);
        }
        live.len()
    }

    /// Number of listeners still alive.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

fn data_ptr(listener: &Arc<dyn RetirementListener>) -> *const () {
    Arc::as_ptr(listener) as *const ()
}
