//! Per-call resolution options.

use std::fmt;
use std::sync::Arc;

use crate::descriptors::ContractDescriptor;
use crate::key::{InstanceId, TypeKey};
use crate::policy::StoragePolicy;
use crate::registration::AnyArc;
use crate::selection::TieBreak;

/// The dependent ("child") instance a shared instance is resolved for.
///
/// Holds a strong handle so that the address backing its [`InstanceId`]
/// cannot be reused while the container still tracks it.
#[derive(Clone)]
pub struct BoundInstance {
    id: InstanceId,
    type_key: TypeKey,
    _handle: AnyArc,
}

impl BoundInstance {
    pub fn of<B>(instance: &Arc<B>) -> Self
    where
        B: ?Sized + Send + Sync + 'static,
    {
        Self {
            id: InstanceId::of(instance),
            type_key: TypeKey::of::<B>(),
            _handle: Arc::new(instance.clone()),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }
}

impl fmt::Debug for BoundInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundInstance")
            .field("id", &self.id)
            .field("type", &self.type_key.name())
            .finish()
    }
}

/// Options for a single resolution: the storage policy filter, the bound
/// instance for shared storage and an optional tie-break.
///
/// ```rust
/// use lifecycle_di::{Container, Resolver, ResolveRequest, StoragePolicy};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Theme;
///
/// let container = Container::new();
/// container.register_type::<Theme>(StoragePolicy::IsolatedInstance).with_default().register();
/// container.register_type::<Theme>(StoragePolicy::GlobalSingleton).with_default().register();
///
/// // Two contracts qualify; the tie-break picks the singleton one
/// let request = ResolveRequest::new().tie_break(|candidates| {
///     candidates.iter().find(|d| d.policy() == StoragePolicy::GlobalSingleton)
/// });
/// let a = container.resolve_with::<Theme>(&request).unwrap();
/// let b = container.resolve_with::<Theme>(&request).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// // Asking for a policy filters down to one contract without a tie-break
/// assert!(container.resolve_as::<Theme>(StoragePolicy::IsolatedInstance).is_ok());
/// ```
#[derive(Clone, Default)]
pub struct ResolveRequest {
    pub(crate) policy: StoragePolicy,
    pub(crate) bound: Option<BoundInstance>,
    pub(crate) tie_break: Option<TieBreak>,
}

impl ResolveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: StoragePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(mut self, policy: StoragePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Binds the resolution to a dependent instance.
    pub fn bound_to<B>(mut self, instance: &Arc<B>) -> Self
    where
        B: ?Sized + Send + Sync + 'static,
    {
        self.bound = Some(BoundInstance::of(instance));
        self
    }

    pub fn bound_to_instance(mut self, bound: BoundInstance) -> Self {
        self.bound = Some(bound);
        self
    }

    /// Chooses among several qualifying contracts. Returning `None` counts
    /// as no decision.
    pub fn tie_break<F>(mut self, choose: F) -> Self
    where
        F: Fn(&[ContractDescriptor]) -> Option<&ContractDescriptor> + Send + Sync + 'static,
    {
        self.tie_break = Some(Arc::new(choose));
        self
    }

    pub fn requested_policy(&self) -> StoragePolicy {
        self.policy
    }

    pub fn bound(&self) -> Option<&BoundInstance> {
        self.bound.as_ref()
    }
}

impl fmt::Debug for ResolveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveRequest")
            .field("policy", &self.policy)
            .field("bound", &self.bound)
            .field("tie_break", &self.tie_break.is_some())
            .finish()
    }
}
