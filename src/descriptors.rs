//! Contract descriptors: the per-(owner, requested type) construction and
//! storage rule, plus a plain summary for introspection.

use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::policy::StoragePolicy;
use crate::registration::{AnyArc, ResolverContext};
use crate::traits::Dispose;

pub(crate) type FactoryFn =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type CastFn = Arc<dyn Fn(&AnyArc) -> Option<AnyArc> + Send + Sync>;
pub(crate) type DisposeFn = Arc<dyn Fn(&AnyArc) + Send + Sync>;

/// Construction and storage rule for one requested type of one owner type.
///
/// A descriptor is created at registration time and never mutated
/// afterwards. It carries the storage policy, an optional factory and the
/// cast that turns an instance of the owner (concrete) type into the
/// requested type. Casting is explicit because Rust has no runtime
/// assignability: the cast closure is the proof that the owner can be handed
/// out as the requested type.
///
/// Most code registers through [`Container::register_type`](crate::Container::register_type);
/// descriptors are built by hand only for the low-level
/// [`Container::register_type_contracts`](crate::Container::register_type_contracts)
/// entry point, and are what tie-break closures get to choose from.
///
/// # Examples
///
/// ```rust
/// use lifecycle_di::{ContractDescriptor, StoragePolicy, TypeKey};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let descriptor = ContractDescriptor::for_type::<English, dyn Greeter, _>(
///     StoragePolicy::GlobalSingleton,
///     |e| e as Arc<dyn Greeter>,
/// )
/// .with_factory(|_| English);
///
/// assert_eq!(descriptor.owner(), TypeKey::of::<English>());
/// assert_eq!(descriptor.requested_type(), TypeKey::of::<dyn Greeter>());
/// assert_eq!(descriptor.policy(), StoragePolicy::GlobalSingleton);
/// assert!(descriptor.has_factory());
/// ```
#[derive(Clone)]
pub struct ContractDescriptor {
    pub(crate) owner: TypeKey,
    pub(crate) requested: TypeKey,
    pub(crate) policy: StoragePolicy,
    pub(crate) factory: Option<FactoryFn>,
    pub(crate) cast: CastFn,
    pub(crate) disposer: Option<DisposeFn>,
}

impl ContractDescriptor {
    /// A contract that hands the concrete type `C` out as itself.
    pub fn for_self<C>(policy: StoragePolicy) -> Self
    where
        C: Send + Sync + 'static,
    {
        Self::for_type::<C, C, _>(policy, |c| c)
    }

    /// A contract that hands the concrete type `C` out as `R`.
    pub fn for_type<C, R, F>(policy: StoragePolicy, cast: F) -> Self
    where
        C: Send + Sync + 'static,
        R: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<R> + Send + Sync + 'static,
    {
        Self {
            owner: TypeKey::of::<C>(),
            requested: TypeKey::of::<R>(),
            policy,
            factory: None,
            cast: erase_cast(cast),
            disposer: None,
        }
    }

    /// Attaches an infallible factory. Once a factory is declared, the
    /// owner's constructors are never consulted for this contract.
    pub fn with_factory<C, F>(mut self, factory: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> C + Send + Sync + 'static,
    {
        self.factory = Some(erase_factory(factory));
        self
    }

    /// Attaches a fallible factory. An `Err` is reported as
    /// `ConstructionFailed` (cycle and depth errors pass through untouched).
    pub fn with_try_factory<C, F>(mut self, factory: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<C> + Send + Sync + 'static,
    {
        self.factory = Some(erase_try_factory(factory));
        self
    }

    pub(crate) fn with_parts(mut self, factory: Option<FactoryFn>, disposer: Option<DisposeFn>) -> Self {
        self.factory = factory;
        self.disposer = disposer;
        self
    }

    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    pub fn requested_type(&self) -> TypeKey {
        self.requested
    }

    pub fn policy(&self) -> StoragePolicy {
        self.policy
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    pub fn is_disposable(&self) -> bool {
        self.disposer.is_some()
    }

    /// Casts a stored owner instance to the requested type, erased as
    /// `Arc<Arc<R>>`.
    pub(crate) fn cast_instance(&self, instance: &AnyArc) -> DiResult<AnyArc> {
        (self.cast)(instance).ok_or(DiError::CastFailure {
            from: self.owner.name(),
            to: self.requested.name(),
        })
    }

    pub(crate) fn summary(&self) -> ContractSummary {
        ContractSummary {
            owner: self.owner,
            requested: self.requested,
            policy: self.policy,
            has_factory: self.has_factory(),
            disposable: self.is_disposable(),
        }
    }
}

impl fmt::Debug for ContractDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractDescriptor")
            .field("owner", &self.owner.name())
            .field("requested", &self.requested.name())
            .field("policy", &self.policy)
            .field("has_factory", &self.has_factory())
            .finish()
    }
}

pub(crate) fn erase_cast<C, R, F>(cast: F) -> CastFn
where
    C: Send + Sync + 'static,
    R: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<C>) -> Arc<R> + Send + Sync + 'static,
{
    Arc::new(move |instance: &AnyArc| {
        instance
            .clone()
            .downcast::<C>()
            .ok()
            .map(|concrete| Arc::new(cast(concrete)) as AnyArc)
    })
}

pub(crate) fn erase_factory<C, F>(factory: F) -> FactoryFn
where
    C: Send + Sync + 'static,
    F: Fn(&ResolverContext) -> C + Send + Sync + 'static,
{
    let ctor = move |ctx: &ResolverContext| -> DiResult<AnyArc> { Ok(Arc::new(factory(ctx)) as AnyArc) };
    Arc::new(ctor)
}

pub(crate) fn erase_try_factory<C, F>(factory: F) -> FactoryFn
where
    C: Send + Sync + 'static,
    F: Fn(&ResolverContext) -> DiResult<C> + Send + Sync + 'static,
{
    let ctor = move |ctx: &ResolverContext| -> DiResult<AnyArc> {
        match factory(ctx) {
            Ok(value) => Ok(Arc::new(value) as AnyArc),
            Err(err @ DiError::ConstructionFailed { .. }) => Err(err),
            Err(err) if err.is_structural() => Err(err),
            Err(err) => Err(DiError::construction::<C>(err.to_string())),
        }
    };
    Arc::new(ctor)
}

pub(crate) fn erase_disposer<C: Dispose>() -> DisposeFn {
    Arc::new(|instance: &AnyArc| {
        if let Some(concrete) = instance.downcast_ref::<C>() {
            concrete.dispose();
        }
    })
}

/// Plain view of a registered contract for diagnostics.
///
/// ```rust
/// use lifecycle_di::{Container, StoragePolicy};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// #[derive(Default)]
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// let container = Container::new();
/// container
///     .register_type::<SystemClock>(StoragePolicy::GlobalSingleton)
///     .with_default()
///     .as_type::<dyn Clock, _>(|c| c as Arc<dyn Clock>)
///     .add_concrete_as_default()
///     .register();
///
/// let summaries = container.contract_summaries();
/// assert_eq!(summaries.len(), 2);
/// assert!(summaries.iter().all(|s| s.policy == StoragePolicy::GlobalSingleton));
/// assert!(summaries.iter().any(|s| s.requested.name().contains("Clock")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSummary {
    pub owner: TypeKey,
    pub requested: TypeKey,
    pub policy: StoragePolicy,
    pub has_factory: bool,
    pub disposable: bool,
}
