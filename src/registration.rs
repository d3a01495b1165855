//! Type-contract registry and the `register_type` builder.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::constructor::Constructor;
use crate::descriptors::{
    erase_cast, erase_disposer, erase_factory, erase_try_factory, CastFn, ContractDescriptor,
    ContractSummary, DisposeFn, FactoryFn,
};
use crate::error::DiResult;
use crate::key::TypeKey;
use crate::policy::StoragePolicy;
use crate::traits::Dispose;

// ResolverContext is defined in container module
pub use crate::container::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Everything registered under one owner (concrete) type.
#[derive(Clone, Default)]
pub(crate) struct OwnerContracts {
    pub(crate) constructors: Arc<Vec<Constructor>>,
    pub(crate) contracts: IndexMap<TypeKey, Vec<ContractDescriptor>>,
}

/// One owner whose contracts mention a requested type.
#[derive(Clone)]
pub(crate) struct OwnerCandidate {
    pub(crate) owner: TypeKey,
    pub(crate) descriptors: Vec<ContractDescriptor>,
    pub(crate) constructors: Arc<Vec<Constructor>>,
}

/// Owner type -> { requested type -> descriptors }, in registration order.
///
/// Pure storage: no resolution logic lives here.
#[derive(Default)]
pub(crate) struct TypeContractRegistry {
    owners: RwLock<IndexMap<TypeKey, OwnerContracts>>,
}

impl TypeContractRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Merges descriptors into the owner's set. A descriptor with the same
    /// requested type and policy as an existing one replaces it; a different
    /// policy is appended next to it.
    pub(crate) fn register_contracts<I>(&self, owner: TypeKey, descriptors: I) -> usize
    where
        I: IntoIterator<Item = ContractDescriptor>,
    {
        let mut owners = self.owners.write();
        let mut added = 0;
        for descriptor in descriptors {
            let entry = owners.entry(owner).or_default();
            let slot = entry.contracts.entry(descriptor.requested).or_default();
            if let Some(existing) = slot.iter_mut().find(|d| d.policy == descriptor.policy) {
                tracing::debug!(
                    owner = owner.name(),
                    requested = descriptor.requested.name(),
                    policy = %descriptor.policy,
                    "replacing existing contract"
                );
                *existing = descriptor;
            } else {
                slot.push(descriptor);
            }
            added += 1;
        }
        added
    }

    /// Replaces the owner's constructor set. An empty list keeps whatever is
    /// already registered.
    pub(crate) fn register_constructors(&self, owner: TypeKey, constructors: Vec<Constructor>) {
        if constructors.is_empty() {
            return;
        }
        let mut owners = self.owners.write();
        owners.entry(owner).or_default().constructors = Arc::new(constructors);
    }

    /// Removes the listed requested types from the owner. An owner left with
    /// no contracts is removed entirely, constructors included.
    pub(crate) fn unregister(&self, owner: TypeKey, requested: &[TypeKey]) -> usize {
        if requested.is_empty() {
            return 0;
        }
        let mut owners = self.owners.write();
        let Some(entry) = owners.get_mut(&owner) else {
            return 0;
        };
        let removed = requested
            .iter()
            .filter(|key| entry.contracts.shift_remove(*key).is_some())
            .count();
        if entry.contracts.is_empty() {
            owners.shift_remove(&owner);
        }
        removed
    }

    /// Every owner holding a contract for `requested`, in registration order.
    pub(crate) fn candidates(&self, requested: TypeKey) -> Vec<OwnerCandidate> {
        let owners = self.owners.read();
        owners
            .iter()
            .filter_map(|(owner, entry)| {
                entry.contracts.get(&requested).map(|descriptors| OwnerCandidate {
                    owner: *owner,
                    descriptors: descriptors.clone(),
                    constructors: entry.constructors.clone(),
                })
            })
            .collect()
    }

    /// Same type, or one is registered as resolvable as the other.
    pub(crate) fn are_related(&self, a: TypeKey, b: TypeKey) -> bool {
        if a == b {
            return true;
        }
        let owners = self.owners.read();
        let holds = |owner: &TypeKey, requested: &TypeKey| {
            owners
                .get(owner)
                .is_some_and(|entry| entry.contracts.contains_key(requested))
        };
        holds(&a, &b) || holds(&b, &a)
    }

    pub(crate) fn is_registered(&self, requested: TypeKey) -> bool {
        self.owners
            .read()
            .values()
            .any(|entry| entry.contracts.contains_key(&requested))
    }

    pub(crate) fn owner_count(&self) -> usize {
        self.owners.read().len()
    }

    pub(crate) fn summaries(&self) -> Vec<ContractSummary> {
        self.owners
            .read()
            .values()
            .flat_map(|entry| entry.contracts.values().flatten().map(ContractDescriptor::summary))
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.owners.write().clear();
    }
}

/// Builder returned by [`Container::register_type`](crate::Container::register_type).
///
/// Collects the concrete type's storage policy, how to build it and which
/// types it may be resolved as, then commits everything with
/// [`register`](Self::register). Without any [`as_type`](Self::as_type) the
/// concrete type is registered as itself; with some, it is registered as
/// itself only when [`add_concrete_as_default`](Self::add_concrete_as_default)
/// is set.
///
/// # Examples
///
/// ```rust
/// use lifecycle_di::{Container, Resolver, StoragePolicy};
/// use std::sync::Arc;
///
/// trait Animal: Send + Sync {
///     fn sound(&self) -> &'static str;
/// }
///
/// struct Cat;
/// impl Animal for Cat {
///     fn sound(&self) -> &'static str { "meow" }
/// }
///
/// let container = Container::new();
/// container
///     .register_type::<Cat>(StoragePolicy::IsolatedInstance)
///     .with_factory(|_| Cat)
///     .as_type::<dyn Animal, _>(|cat| cat as Arc<dyn Animal>)
///     .register();
///
/// let animal = container.resolve::<dyn Animal>().unwrap();
/// assert_eq!(animal.sound(), "meow");
///
/// // Not registered as itself, so the concrete type is not resolvable
/// assert!(container.resolve::<Cat>().is_err());
/// ```
#[must_use = "call `register()` to commit the registration"]
pub struct TypeRegistration<'c, C> {
    registry: &'c TypeContractRegistry,
    policy: StoragePolicy,
    factory: Option<FactoryFn>,
    constructors: Vec<Constructor>,
    accessible: Vec<(TypeKey, CastFn)>,
    add_concrete_as_default: bool,
    disposer: Option<DisposeFn>,
    _marker: PhantomData<fn() -> C>,
}

impl<'c, C> TypeRegistration<'c, C>
where
    C: Send + Sync + 'static,
{
    pub(crate) fn new(registry: &'c TypeContractRegistry, policy: StoragePolicy) -> Self {
        Self {
            registry,
            policy,
            factory: None,
            constructors: Vec::new(),
            accessible: Vec::new(),
            add_concrete_as_default: false,
            disposer: None,
            _marker: PhantomData,
        }
    }

    /// Builds instances with `factory` for every contract of this registration.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ResolverContext) -> C + Send + Sync + 'static,
    {
        self.factory = Some(erase_factory(factory));
        self
    }

    /// Like [`with_factory`](Self::with_factory) for factories that can fail.
    pub fn with_try_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ResolverContext) -> DiResult<C> + Send + Sync + 'static,
    {
        self.factory = Some(erase_try_factory(factory));
        self
    }

    /// Adds a constructor to the owner's constructor set.
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Adds `C::default` as a parameterless constructor.
    pub fn with_default(self) -> Self
    where
        C: Default,
    {
        self.with_constructor(Constructor::nullary(C::default))
    }

    /// Makes the concrete type resolvable as `R` through `cast`.
    pub fn as_type<R, F>(mut self, cast: F) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<R> + Send + Sync + 'static,
    {
        let key = TypeKey::of::<R>();
        self.accessible.retain(|(existing, _)| *existing != key);
        self.accessible.push((key, erase_cast(cast)));
        self
    }

    /// Also registers the concrete type as itself next to its accessible types.
    pub fn add_concrete_as_default(mut self) -> Self {
        self.add_concrete_as_default = true;
        self
    }

    /// Disposes instances the container retires on its own (orphaned shared
    /// instances).
    pub fn disposable(mut self) -> Self
    where
        C: Dispose,
    {
        self.disposer = Some(erase_disposer::<C>());
        self
    }

    /// Commits the registration and returns the number of contracts written.
    pub fn register(self) -> usize {
        let owner = TypeKey::of::<C>();
        let Self {
            registry,
            policy,
            factory,
            constructors,
            accessible,
            add_concrete_as_default,
            disposer,
            ..
        } = self;

        let includes_self = accessible.iter().any(|(key, _)| *key == owner);
        let mut descriptors = Vec::with_capacity(accessible.len() + 1);
        if accessible.is_empty() || (add_concrete_as_default && !includes_self) {
            descriptors.push(
                ContractDescriptor::for_self::<C>(policy).with_parts(factory.clone(), disposer.clone()),
            );
        }
        for (requested, cast) in accessible {
            descriptors.push(ContractDescriptor {
                owner,
                requested,
                policy,
                factory: factory.clone(),
                cast,
                disposer: disposer.clone(),
            });
        }

        tracing::debug!(
            owner = owner.name(),
            policy = %policy,
            contracts = descriptors.len(),
            "registering type"
        );
        registry.register_constructors(owner, constructors);
        registry.register_contracts(owner, descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owner;
    struct Other;

    #[test]
    fn same_policy_replaces_different_policy_appends() {
        let registry = TypeContractRegistry::new();
        let owner = TypeKey::of::<Owner>();
        registry.register_contracts(owner, [ContractDescriptor::for_self::<Owner>(StoragePolicy::GlobalSingleton)]);
        registry.register_contracts(owner, [ContractDescriptor::for_self::<Owner>(StoragePolicy::GlobalSingleton)]);
        assert_eq!(registry.candidates(owner)[0].descriptors.len(), 1);

        registry.register_contracts(owner, [ContractDescriptor::for_self::<Owner>(StoragePolicy::IsolatedInstance)]);
        assert_eq!(registry.candidates(owner)[0].descriptors.len(), 2);
    }

    #[test]
    fn unregister_last_contract_removes_owner() {
        let registry = TypeContractRegistry::new();
        let owner = TypeKey::of::<Owner>();
        registry.register_constructors(owner, vec![Constructor::nullary(|| Owner)]);
        registry.register_contracts(owner, [ContractDescriptor::for_self::<Owner>(StoragePolicy::AnyAccessLevel)]);
        assert_eq!(registry.owner_count(), 1);

        assert_eq!(registry.unregister(owner, &[TypeKey::of::<Other>()]), 0);
        assert_eq!(registry.owner_count(), 1);

        assert_eq!(registry.unregister(owner, &[owner]), 1);
        assert_eq!(registry.owner_count(), 0);
        assert!(!registry.is_registered(owner));
    }

    #[test]
    fn relation_follows_registered_contracts() {
        let registry = TypeContractRegistry::new();
        let owner = TypeKey::of::<Owner>();
        let other = TypeKey::of::<Other>();
        assert!(registry.are_related(owner, owner));
        assert!(!registry.are_related(owner, other));

        registry.register_contracts(
            owner,
            [ContractDescriptor {
                owner,
                requested: other,
                policy: StoragePolicy::AnyAccessLevel,
                factory: None,
                cast: Arc::new(|_: &AnyArc| None),
                disposer: None,
            }],
        );
        assert!(registry.are_related(owner, other));
        assert!(registry.are_related(other, owner));
    }
}
