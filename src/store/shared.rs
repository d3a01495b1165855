use parking_lot::Mutex;

use super::{BoundSet, FastMap};
use crate::container::BoundInstance;
use crate::descriptors::DisposeFn;
use crate::error::{DiError, DiResult};
use crate::key::{InstanceId, TypeKey};
use crate::registration::AnyArc;

/// One shared ("parent") instance and the dependents it was resolved for.
pub(crate) struct SharedEntry {
    pub(crate) owner: TypeKey,
    pub(crate) instance: AnyArc,
    pub(crate) bound: BoundSet,
    pub(crate) disposer: Option<DisposeFn>,
}

impl SharedEntry {
    fn new(owner: TypeKey, instance: AnyArc, disposer: Option<DisposeFn>) -> Self {
        Self {
            owner,
            instance,
            bound: BoundSet::new(),
            disposer,
        }
    }

    /// Adds `bound` unless it is already a member.
    fn bind(&mut self, bound: &BoundInstance) -> bool {
        if self.is_bound(bound.id()) {
            return false;
        }
        self.bound.push(bound.clone());
        true
    }

    fn unbind(&mut self, id: InstanceId) -> bool {
        let before = self.bound.len();
        self.bound.retain(|b| b.id() != id);
        before != self.bound.len()
    }

    fn is_bound(&self, id: InstanceId) -> bool {
        self.bound.iter().any(|b| b.id() == id)
    }

    /// A shared instance may never be one of its own dependents.
    fn refuse_self(&self, key: InstanceId, bound: &BoundInstance) -> DiResult<()> {
        if key == bound.id() {
            return Err(DiError::IllegalSharing {
                shared: self.owner.name(),
                bound: bound.type_key().name(),
            });
        }
        Ok(())
    }

    /// Disposes the instance if its type registered a disposer.
    pub(crate) fn dispose(&self) {
        if let Some(disposer) = &self.disposer {
            disposer(&self.instance);
        }
    }
}

/// What a teardown did to the shared store.
#[derive(Default)]
pub(crate) struct RetireOutcome {
    /// The retiring object was itself a shared instance
    pub(crate) parent_removed: bool,
    /// Entries the retiring object was a dependent of
    pub(crate) unbound: usize,
    /// Entries left without dependents, removed
    pub(crate) orphans: Vec<(InstanceId, SharedEntry)>,
}

impl RetireOutcome {
    pub(crate) fn touched(&self) -> bool {
        self.parent_removed || self.unbound > 0
    }
}

/// Shared instance -> its dependents.
#[derive(Default)]
pub(crate) struct SharedStore {
    entries: Mutex<FastMap<InstanceId, SharedEntry>>,
}

impl SharedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Finds a live shared instance of `owner` and records `bound` as one of
    /// its dependents. Binding the instance to itself is `IllegalSharing`.
    pub(crate) fn bind_existing(&self, owner: TypeKey, bound: &BoundInstance) -> DiResult<Option<AnyArc>> {
        let mut entries = self.entries.lock();
        let Some((key, entry)) = entries.iter_mut().find(|(_, entry)| entry.owner == owner) else {
            return Ok(None);
        };
        entry.refuse_self(*key, bound)?;
        entry.bind(bound);
        Ok(Some(entry.instance.clone()))
    }

    /// Stores a freshly constructed shared instance with `bound` as its sole
    /// dependent and returns the instance handed out. In exactly-once mode an
    /// instance of `owner` stored meanwhile wins and `bound` joins it instead.
    pub(crate) fn insert(
        &self,
        owner: TypeKey,
        instance: AnyArc,
        bound: &BoundInstance,
        disposer: Option<DisposeFn>,
        exactly_once: bool,
    ) -> DiResult<AnyArc> {
        let mut entries = self.entries.lock();
        if exactly_once {
            if let Some((key, existing)) = entries.iter_mut().find(|(_, entry)| entry.owner == owner) {
                existing.refuse_self(*key, bound)?;
                existing.bind(bound);
                return Ok(existing.instance.clone());
            }
        }
        let key = InstanceId::of(&instance);
        let mut entry = SharedEntry::new(owner, instance.clone(), disposer);
        entry.refuse_self(key, bound)?;
        entry.bind(bound);
        entries.insert(key, entry);
        Ok(instance)
    }

    /// Binds every instance in `bounds` to the shared instance `shared`,
    /// creating its entry when needed. Returns how many memberships were new.
    pub(crate) fn bind_all(&self, owner: TypeKey, shared: AnyArc, bounds: &[BoundInstance]) -> usize {
        if bounds.is_empty() {
            return 0;
        }
        let mut entries = self.entries.lock();
        let entry = entries
            .entry(InstanceId::of(&shared))
            .or_insert_with(|| SharedEntry::new(owner, shared, None));
        bounds.iter().filter(|bound| entry.bind(bound)).count()
    }

    /// Removes the given dependents from `shared`. An entry left empty is
    /// removed and returned as an orphan.
    pub(crate) fn unbind(&self, shared: InstanceId, bounds: &[InstanceId]) -> (usize, Option<SharedEntry>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&shared) else {
            return (0, None);
        };
        let removed = bounds.iter().filter(|id| entry.unbind(**id)).count();
        let orphan = if entry.bound.is_empty() {
            entries.shift_remove(&shared)
        } else {
            None
        };
        (removed, orphan)
    }

    /// Teardown of `id`: drops its own entry, then removes it from every
    /// other entry's dependents. Entries emptied by that are returned as
    /// orphans; the retiring object's own entry is not.
    pub(crate) fn retire(&self, id: InstanceId) -> RetireOutcome {
        let mut outcome = RetireOutcome::default();
        let mut entries = self.entries.lock();

        outcome.parent_removed = entries.shift_remove(&id).is_some();

        let mut emptied = Vec::new();
        for (key, entry) in entries.iter_mut() {
            if entry.unbind(id) {
                outcome.unbound += 1;
                if entry.bound.is_empty() {
                    emptied.push(*key);
                }
            }
        }
        for key in emptied {
            if let Some(entry) = entries.shift_remove(&key) {
                outcome.orphans.push((key, entry));
            }
        }
        outcome
    }

    pub(crate) fn owner_of(&self, shared: InstanceId) -> Option<TypeKey> {
        self.entries.lock().get(&shared).map(|entry| entry.owner)
    }

    pub(crate) fn contains(&self, shared: InstanceId) -> bool {
        self.entries.lock().contains_key(&shared)
    }

    pub(crate) fn bound_count(&self, shared: InstanceId) -> usize {
        self.entries.lock().get(&shared).map_or(0, |entry| entry.bound.len())
    }

    pub(crate) fn is_bound_to(&self, shared: InstanceId, bound: InstanceId) -> bool {
        self.entries
            .lock()
            .get(&shared)
            .is_some_and(|entry| entry.is_bound(bound))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn snapshot(&self) -> Vec<(InstanceId, TypeKey, usize)> {
        self.entries
            .lock()
            .iter()
            .map(|(id, entry)| (*id, entry.owner, entry.bound.len()))
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }
}
