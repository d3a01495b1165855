//! The container: registration, resolution and teardown.
//!
//! [`Container`] is the public face. Resolution runs in four steps: select
//! one contract, check the store the contract's policy points at, construct
//! on a miss, store per policy. No lock is held while a factory or
//! constructor runs, so recursive resolution from inside a factory is safe.

mod context;
mod request;

pub use context::ResolverContext;
pub use request::{BoundInstance, ResolveRequest};

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::ContainerConfig;
use crate::constructor::Constructor;
use crate::descriptors::{ContractDescriptor, ContractSummary};
use crate::error::{DiError, DiResult};
use crate::internal::{catch_panic, ResolutionGuard};
use crate::key::{InstanceId, TypeKey};
use crate::lifecycle::{LifecycleBus, RetirementListener};
use crate::observer::{ContainerObserver, Observers};
use crate::policy::StoragePolicy;
use crate::registration::{AnyArc, TypeContractRegistry, TypeRegistration};
use crate::selection::{select, Selection};
use crate::store::{SharedEntry, SharedStore, SingletonStore, Stored};
use crate::traits::{Resolver, ResolverCore};

/// Dependency container with lifetime-aware storage.
///
/// Cloning is cheap and every clone shares the same registry and stores.
/// The container is `Send + Sync`; registry, singleton store and shared
/// store each sit behind their own lock.
///
/// # Examples
///
/// ```
/// use lifecycle_di::{Container, Resolver, StoragePolicy};
/// use std::sync::Arc;
///
/// trait IAmSimple: Send + Sync {}
///
/// #[derive(Default)]
/// struct SimpleClass;
/// impl IAmSimple for SimpleClass {}
///
/// let container = Container::new();
/// container
///     .register_type::<SimpleClass>(StoragePolicy::GlobalSingleton)
///     .with_default()
///     .as_type::<dyn IAmSimple, _>(|s| s as Arc<dyn IAmSimple>)
///     .register();
///
/// let first = container.resolve::<dyn IAmSimple>().unwrap();
/// let second = container.resolve::<dyn IAmSimple>().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(container.singleton_count(), 1);
///
/// // The host announces the end of the instance's life
/// container.container_class_is_dying(&first);
/// assert_eq!(container.singleton_count(), 0);
/// let third = container.resolve::<dyn IAmSimple>().unwrap();
/// assert!(!Arc::ptr_eq(&first, &third));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    registry: TypeContractRegistry,
    singletons: SingletonStore,
    shared: SharedStore,
    config: RwLock<ContainerConfig>,
    observers: RwLock<Observers>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container with the default (strict) configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: TypeContractRegistry::new(),
                singletons: SingletonStore::new(),
                shared: SharedStore::new(),
                config: RwLock::new(config),
                observers: RwLock::new(Observers::new()),
            }),
        }
    }

    /// Creates a container configured from `LIFECYCLE_DI_*` variables.
    pub fn from_env() -> DiResult<Self> {
        Ok(Self::with_config(ContainerConfig::from_env()?))
    }

    // ----- Registration -----

    /// Starts registering the concrete type `C` under `policy`.
    pub fn register_type<C>(&self, policy: StoragePolicy) -> TypeRegistration<'_, C>
    where
        C: Send + Sync + 'static,
    {
        TypeRegistration::new(&self.inner.registry, policy)
    }

    /// Merges hand-built descriptors into `owner`'s contracts.
    ///
    /// Descriptors whose own owner differs from `owner` are stored as given
    /// and fail with `TypeMismatch` when selected.
    pub fn register_type_contracts<I>(&self, owner: TypeKey, descriptors: I) -> usize
    where
        I: IntoIterator<Item = ContractDescriptor>,
    {
        self.inner.registry.register_contracts(owner, descriptors)
    }

    /// Replaces `owner`'s constructor set. An empty list is ignored.
    pub fn register_constructors(&self, owner: TypeKey, constructors: Vec<Constructor>) {
        self.inner.registry.register_constructors(owner, constructors);
    }

    /// Removes contracts of `owner` for the listed requested types. Cached
    /// instances are left alone.
    pub fn unregister_type_contracts(&self, owner: TypeKey, requested: &[TypeKey]) -> usize {
        let removed = self.inner.registry.unregister(owner, requested);
        tracing::debug!(owner = owner.name(), removed, "unregistered contracts");
        removed
    }

    // ----- Teardown -----

    /// Teardown entry point: `instance` is retiring.
    ///
    /// Removes a singleton that is `instance`, the shared entry keyed by
    /// `instance`, and `instance` from every shared entry's dependents.
    /// Entries left without dependents are removed and, when their type is
    /// disposable, disposed. Unknown instances are ignored, so extra calls
    /// are harmless.
    pub fn container_class_is_dying<T>(&self, instance: &Arc<T>)
    where
        T: ?Sized,
    {
        self.inner.retire(InstanceId::of(instance));
    }

    /// [`container_class_is_dying`](Self::container_class_is_dying) by id.
    pub fn retire_instance(&self, id: InstanceId) {
        self.inner.retire(id);
    }

    /// Wipes the registry and both stores. Nothing is disposed.
    pub fn clear_container(&self) {
        self.inner.registry.clear();
        self.inner.singletons.clear();
        self.inner.shared.clear();
        tracing::debug!("container cleared");
    }

    // ----- Configuration -----

    pub fn config(&self) -> ContainerConfig {
        *self.inner.config.read()
    }

    pub fn set_config(&self, config: ContainerConfig) {
        *self.inner.config.write() = config;
    }

    pub fn set_throw_on_multiple_resolutions(&self, value: bool) {
        self.inner.config.write().throw_on_multiple_resolutions = value;
    }

    pub fn set_throw_on_storage_rule_coercion(&self, value: bool) {
        self.inner.config.write().throw_on_storage_rule_coercion = value;
    }

    pub fn set_throw_when_more_than_one_owner_contract(&self, value: bool) {
        self.inner.config.write().throw_when_more_than_one_owner_contract = value;
    }

    // ----- Explicit store management -----

    /// Stores `instance` as the singleton of `C`, replacing any existing one.
    pub fn create_singleton_instance<C>(&self, instance: Arc<C>)
    where
        C: Send + Sync + 'static,
    {
        let owner = TypeKey::of::<C>();
        if let Stored::Replaced = self.inner.singletons.insert(owner, instance, false) {
            tracing::warn!(owner = owner.name(), "overwrote an existing singleton");
            self.inner.observers.read().singleton_overwritten(&owner);
        }
    }

    /// Drops the singleton of `C`; returns whether one was stored.
    pub fn remove_singleton_instance<C>(&self) -> bool
    where
        C: Send + Sync + 'static,
    {
        self.inner.singletons.remove(TypeKey::of::<C>()).is_some()
    }

    /// Records `bound` as dependents of `shared`, creating the shared entry
    /// if needed. Returns the number of new memberships.
    ///
    /// Fails with `IllegalSharing`, without changing anything, when a bound
    /// instance is `shared` itself or its type is related to `S`.
    ///
    /// ```
    /// use lifecycle_di::{BoundInstance, Container};
    /// use std::sync::Arc;
    ///
    /// struct Session;
    /// struct Page;
    ///
    /// let container = Container::new();
    /// let session = Arc::new(Session);
    /// let page = Arc::new(Page);
    ///
    /// container.create_shared_instances(&session, &[BoundInstance::of(&page)]).unwrap();
    /// assert!(container.is_bound_to(&session, &page));
    ///
    /// let self_share = container.create_shared_instances(&session, &[BoundInstance::of(&session)]);
    /// assert!(self_share.is_err());
    /// ```
    pub fn create_shared_instances<S>(&self, shared: &Arc<S>, bound: &[BoundInstance]) -> DiResult<usize>
    where
        S: Send + Sync + 'static,
    {
        let owner = TypeKey::of::<S>();
        let shared_id = InstanceId::of(shared);
        for b in bound {
            self.inner.check_sharing(owner, owner, b)?;
            if b.id() == shared_id {
                return Err(DiError::IllegalSharing {
                    shared: owner.name(),
                    bound: b.type_key().name(),
                });
            }
        }
        Ok(self.inner.shared.bind_all(owner, shared.clone(), bound))
    }

    /// Removes `bound` from `shared`'s dependents. When none remain the
    /// entry is deleted and its instance disposed if disposable. Returns the
    /// number of memberships removed.
    pub fn remove_parent_child_instance_dependencies<S>(
        &self,
        shared: &Arc<S>,
        bound: &[BoundInstance],
    ) -> DiResult<usize>
    where
        S: ?Sized,
    {
        let shared_id = InstanceId::of(shared);
        let Some(owner) = self.inner.shared.owner_of(shared_id) else {
            return Ok(0);
        };
        for b in bound {
            self.inner.check_sharing(owner, owner, b)?;
        }
        let ids: Vec<InstanceId> = bound.iter().map(BoundInstance::id).collect();
        let (removed, orphan) = self.inner.shared.unbind(shared_id, &ids);
        if let Some(entry) = orphan {
            self.inner.release_orphans(vec![(shared_id, entry)]);
        }
        Ok(removed)
    }

    // ----- Queries -----

    pub fn singleton_count(&self) -> usize {
        self.inner.singletons.len()
    }

    pub fn has_singleton<C>(&self) -> bool
    where
        C: Send + Sync + 'static,
    {
        self.inner.singletons.contains(TypeKey::of::<C>())
    }

    /// Whether `instance` currently keys a shared entry.
    pub fn is_shared<T: ?Sized>(&self, instance: &Arc<T>) -> bool {
        self.inner.shared.contains(InstanceId::of(instance))
    }

    pub fn shared_count(&self) -> usize {
        self.inner.shared.len()
    }

    /// Number of dependents bound to `shared`; zero when it is not shared.
    pub fn bound_count<T: ?Sized>(&self, shared: &Arc<T>) -> usize {
        self.inner.shared.bound_count(InstanceId::of(shared))
    }

    pub fn is_bound_to<S: ?Sized, B: ?Sized>(&self, shared: &Arc<S>, bound: &Arc<B>) -> bool {
        self.inner
            .shared
            .is_bound_to(InstanceId::of(shared), InstanceId::of(bound))
    }

    pub fn is_registered<R>(&self) -> bool
    where
        R: ?Sized + 'static,
    {
        self.inner.registry.is_registered(TypeKey::of::<R>())
    }

    /// Every registered contract, owners and contracts in registration order.
    pub fn contract_summaries(&self) -> Vec<ContractSummary> {
        self.inner.registry.summaries()
    }

    // ----- Observers and lifecycle wiring -----

    pub fn add_observer(&self, observer: Arc<dyn ContainerObserver>) {
        self.inner.observers.write().add(observer);
    }

    /// Subscribes to `bus`: every object published on it is torn down here.
    /// The bus holds the container weakly.
    pub fn attach_to(&self, bus: &LifecycleBus) {
        let listener: Arc<dyn RetirementListener> = self.inner.clone();
        bus.subscribe(&listener);
    }

    pub fn detach_from(&self, bus: &LifecycleBus) {
        let listener: Arc<dyn RetirementListener> = self.inner.clone();
        bus.unsubscribe(&listener);
    }

    /// Multi-line dump of contracts and stores.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(out, "{:#?}", self.config());
        let _ = writeln!(out, "contracts ({} owners):", self.inner.registry.owner_count());
        for s in self.contract_summaries() {
            let _ = writeln!(
                out,
                "  {} as {} [{}]{}",
                s.owner,
                s.requested,
                s.policy,
                if s.has_factory { " factory" } else { "" }
            );
        }
        let _ = writeln!(out, "singletons ({}):", self.singleton_count());
        for owner in self.inner.singletons.owners() {
            let _ = writeln!(out, "  {}", owner);
        }
        let _ = writeln!(out, "shared ({}):", self.shared_count());
        for (id, owner, bound) in self.inner.shared.snapshot() {
            let _ = writeln!(out, "  {} {} <- {} bound", owner, id, bound);
        }
        out
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, requested: TypeKey, request: &ResolveRequest) -> DiResult<AnyArc> {
        self.inner.resolve_any(requested, request)
    }
}

impl Resolver for Container {}

impl ResolverCore for ContainerInner {
    fn resolve_any(&self, requested: TypeKey, request: &ResolveRequest) -> DiResult<AnyArc> {
        let observers = self.observers.read();
        if !observers.has_observers() {
            drop(observers);
            return self.resolve_inner(requested, request);
        }
        observers.resolving(&requested);
        drop(observers);

        let start = Instant::now();
        let result = self.resolve_inner(requested, request);
        if result.is_ok() {
            self.observers.read().resolved(&requested, start.elapsed());
        }
        result
    }
}

impl RetirementListener for ContainerInner {
    fn on_retiring(&self, id: InstanceId) {
        self.retire(id);
    }
}

impl ContainerInner {
    fn resolve_inner(&self, requested: TypeKey, request: &ResolveRequest) -> DiResult<AnyArc> {
        if request.policy.requires_bound_instance() && request.bound.is_none() {
            return Err(DiError::MissingBoundInstance(requested.name()));
        }

        let config = *self.config.read();
        let selection = select(
            requested,
            self.registry.candidates(requested),
            request.policy,
            request.tie_break.as_ref(),
            &config,
        )?;

        match selection.policy {
            StoragePolicy::GlobalSingleton => self.resolve_singleton(&selection, &config),
            StoragePolicy::SharedDependencyBetweenInstances => {
                let bound = request
                    .bound
                    .as_ref()
                    .ok_or(DiError::MissingBoundInstance(requested.name()))?;
                self.resolve_shared(&selection, bound, &config)
            }
            _ => {
                let instance = self.construct(&selection, &config)?;
                selection.descriptor.cast_instance(&instance)
            }
        }
    }

    fn resolve_singleton(&self, selection: &Selection, config: &ContainerConfig) -> DiResult<AnyArc> {
        let owner = selection.owner;
        if let Some(existing) = self.singletons.get(owner) {
            return selection.descriptor.cast_instance(&existing);
        }

        let instance = self.construct(selection, config)?;
        let resolved = selection.descriptor.cast_instance(&instance)?;
        match self.singletons.insert(owner, instance, config.exactly_once_singletons) {
            Stored::Inserted => Ok(resolved),
            Stored::Replaced => {
                tracing::warn!(owner = owner.name(), "overwrote an existing singleton");
                self.observers.read().singleton_overwritten(&owner);
                Ok(resolved)
            }
            Stored::Kept(winner) => {
                tracing::debug!(owner = owner.name(), "discarding duplicate singleton construction");
                selection.descriptor.cast_instance(&winner)
            }
        }
    }

    fn resolve_shared(
        &self,
        selection: &Selection,
        bound: &BoundInstance,
        config: &ContainerConfig,
    ) -> DiResult<AnyArc> {
        let owner = selection.owner;
        self.check_sharing(owner, selection.descriptor.requested, bound)?;

        if let Some(existing) = self.shared.bind_existing(owner, bound)? {
            return selection.descriptor.cast_instance(&existing);
        }

        let instance = self.construct(selection, config)?;
        let resolved = selection.descriptor.cast_instance(&instance)?;
        let stored = self.shared.insert(
            owner,
            instance.clone(),
            bound,
            selection.descriptor.disposer.clone(),
            config.exactly_once_singletons,
        )?;
        if InstanceId::of(&stored) == InstanceId::of(&instance) {
            Ok(resolved)
        } else {
            selection.descriptor.cast_instance(&stored)
        }
    }

    /// A bound instance may not be of the shared type, nor of a type
    /// registered as (or resolvable as) it.
    fn check_sharing(&self, shared: TypeKey, requested: TypeKey, bound: &BoundInstance) -> DiResult<()> {
        let bound_type = bound.type_key();
        if self.registry.are_related(shared, bound_type) || self.registry.are_related(requested, bound_type) {
            return Err(DiError::IllegalSharing {
                shared: shared.name(),
                bound: bound_type.name(),
            });
        }
        Ok(())
    }

    fn construct(&self, selection: &Selection, config: &ContainerConfig) -> DiResult<AnyArc> {
        let owner = selection.owner;
        let _guard = ResolutionGuard::enter(owner, config.max_resolution_depth)?;

        // A declared factory is final: constructors are never consulted
        if let Some(factory) = &selection.descriptor.factory {
            let ctx = ResolverContext::new(self);
            return self.contained(owner, || factory(&ctx));
        }
        self.construct_with_constructors(owner, &selection.constructors)
    }

    fn construct_with_constructors(&self, owner: TypeKey, constructors: &[Constructor]) -> DiResult<AnyArc> {
        let mut ranked: Vec<&Constructor> = constructors.iter().collect();
        ranked.sort_by_key(|ctor| ctor.param_count());

        'candidates: for ctor in ranked {
            let mut values = Vec::with_capacity(ctor.param_count());
            for param in ctor.params() {
                match self.resolve_any(*param, &ResolveRequest::new()) {
                    Ok(value) => values.push(value),
                    Err(err) if err.is_structural() => return Err(err),
                    Err(err) => {
                        tracing::debug!(
                            concrete = owner.name(),
                            parameter = param.name(),
                            error = %err,
                            "skipping constructor"
                        );
                        continue 'candidates;
                    }
                }
            }

            return self.contained(owner, || ctor.invoke(values)).map_err(|err| match err {
                DiError::ConstructionFailed { .. } => err,
                other => DiError::ConstructionFailed {
                    concrete: owner.name(),
                    reason: other.to_string(),
                },
            });
        }

        Err(DiError::NoUsableConstructor(owner.name()))
    }

    /// Runs user construction code, turning a panic into `ConstructionFailed`.
    fn contained<F>(&self, owner: TypeKey, f: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        match catch_panic(f) {
            Ok(result) => result,
            Err(message) => {
                tracing::error!(concrete = owner.name(), message = %message, "construction panicked");
                self.observers.read().factory_panic(&owner, &message);
                Err(DiError::ConstructionFailed {
                    concrete: owner.name(),
                    reason: format!("panicked: {}", message),
                })
            }
        }
    }

    fn retire(&self, id: InstanceId) {
        let singletons = self.singletons.retire(id);
        let shared = self.shared.retire(id);
        if singletons.is_empty() && !shared.touched() {
            tracing::trace!(instance = %id, "retiring instance is not tracked");
            return;
        }

        tracing::debug!(
            instance = %id,
            singletons = singletons.len(),
            parent = shared.parent_removed,
            unbound = shared.unbound,
            orphans = shared.orphans.len(),
            "instance retired"
        );
        self.observers.read().instance_retired(id);
        self.release_orphans(shared.orphans);
    }

    /// Disposes orphaned shared instances and retires each of them in turn,
    /// so entries they were dependents of are released as well.
    fn release_orphans(&self, mut pending: Vec<(InstanceId, SharedEntry)>) {
        while let Some((id, entry)) = pending.pop() {
            tracing::debug!(instance = %id, owner = entry.owner.name(), "dropping orphaned shared instance");
            if let Err(message) = catch_panic(|| entry.dispose()) {
                tracing::error!(owner = entry.owner.name(), message = %message, "dispose panicked");
            }
            drop(entry);
            self.observers.read().instance_retired(id);

            self.singletons.retire(id);
            pending.extend(self.shared.retire(id).orphans);
        }
    }
}
