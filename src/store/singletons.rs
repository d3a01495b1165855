use parking_lot::RwLock;

use super::FastMap;
use crate::key::{InstanceId, TypeKey};
use crate::registration::AnyArc;

/// Result of storing a freshly constructed singleton.
pub(crate) enum Stored {
    Inserted,
    /// A racing construction had already stored an instance; it was replaced.
    Replaced,
    /// Exactly-once mode kept the earlier instance, returned here.
    Kept(AnyArc),
}

/// Concrete type -> its single live instance.
#[derive(Default)]
pub(crate) struct SingletonStore {
    entries: RwLock<FastMap<TypeKey, AnyArc>>,
}

impl SingletonStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, owner: TypeKey) -> Option<AnyArc> {
        self.entries.read().get(&owner).cloned()
    }

    pub(crate) fn insert(&self, owner: TypeKey, instance: AnyArc, exactly_once: bool) -> Stored {
        let mut entries = self.entries.write();
        if exactly_once {
            if let Some(existing) = entries.get(&owner) {
                return Stored::Kept(existing.clone());
            }
        }
        match entries.insert(owner, instance) {
            Some(_) => Stored::Replaced,
            None => Stored::Inserted,
        }
    }

    /// Drops every entry whose instance is `id`; returns the owners removed.
    pub(crate) fn retire(&self, id: InstanceId) -> Vec<TypeKey> {
        let mut removed = Vec::new();
        self.entries.write().retain(|owner, instance| {
            if InstanceId::of(instance) == id {
                removed.push(*owner);
                false
            } else {
                true
            }
        });
        removed
    }

    pub(crate) fn remove(&self, owner: TypeKey) -> Option<AnyArc> {
        self.entries.write().shift_remove(&owner)
    }

    pub(crate) fn contains(&self, owner: TypeKey) -> bool {
        self.entries.read().contains_key(&owner)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn owners(&self) -> Vec<TypeKey> {
        self.entries.read().keys().copied().collect()
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }
}
