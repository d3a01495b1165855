//! Storage policy definitions.

use std::fmt;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Storage rules controlling how a resolved instance is cached.
///
/// A policy is attached to every contract at registration time. At resolve
/// time the caller may ask for a policy too, but that request only filters
/// the registered contracts: the winning contract's own policy decides what
/// gets stored.
///
/// # Examples
///
/// ```rust
/// use lifecycle_di::{Container, Resolver, StoragePolicy};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Settings;
/// #[derive(Default)]
/// struct Draft;
///
/// let container = Container::new();
/// container.register_type::<Settings>(StoragePolicy::GlobalSingleton).with_default().register();
/// container.register_type::<Draft>(StoragePolicy::IsolatedInstance).with_default().register();
///
/// // GlobalSingleton: one instance for the container's lifetime
/// let s1 = container.resolve::<Settings>().unwrap();
/// let s2 = container.resolve::<Settings>().unwrap();
/// assert!(Arc::ptr_eq(&s1, &s2));
///
/// // IsolatedInstance: a fresh instance every time
/// let d1 = container.resolve::<Draft>().unwrap();
/// let d2 = container.resolve::<Draft>().unwrap();
/// assert!(!Arc::ptr_eq(&d1, &d2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub enum StoragePolicy {
    /// Caller-decided at resolve time
    ///
    /// As a registration, it accepts whatever policy the caller requests.
    /// As a request, it accepts whatever policy was registered. When both
    /// sides say `AnyAccessLevel` the instance is treated as isolated.
    #[default]
    AnyAccessLevel,
    /// New instance per resolution, never cached
    IsolatedInstance,
    /// One instance shared by a set of bound dependents
    ///
    /// Resolving requires a bound ("host") instance. The shared instance is
    /// kept while at least one bound instance remains registered against it.
    SharedDependencyBetweenInstances,
    /// Exactly one instance per concrete type, kept until it retires
    GlobalSingleton,
}

impl StoragePolicy {
    /// Whether a resolved instance under this policy lands in a store.
    pub fn is_cached(&self) -> bool {
        matches!(
            self,
            StoragePolicy::SharedDependencyBetweenInstances | StoragePolicy::GlobalSingleton
        )
    }

    /// Whether resolving under this policy needs a bound instance.
    pub fn requires_bound_instance(&self) -> bool {
        matches!(self, StoragePolicy::SharedDependencyBetweenInstances)
    }

    /// The policy that actually governs storage once a contract registered
    /// with `self` has been selected for a request of `requested`.
    pub(crate) fn effective(self, requested: StoragePolicy) -> StoragePolicy {
        match (self, requested) {
            (StoragePolicy::AnyAccessLevel, StoragePolicy::AnyAccessLevel) => {
                StoragePolicy::IsolatedInstance
            }
            (StoragePolicy::AnyAccessLevel, requested) => requested,
            (registered, _) => registered,
        }
    }

    /// Whether a contract registered with `self` satisfies a request.
    pub(crate) fn admits(self, requested: StoragePolicy) -> bool {
        requested == StoragePolicy::AnyAccessLevel
            || self == StoragePolicy::AnyAccessLevel
            || self == requested
    }
}

impl fmt::Display for StoragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoragePolicy::AnyAccessLevel => "AnyAccessLevel",
            StoragePolicy::IsolatedInstance => "IsolatedInstance",
            StoragePolicy::SharedDependencyBetweenInstances => "SharedDependencyBetweenInstances",
            StoragePolicy::GlobalSingleton => "GlobalSingleton",
        };
        f.write_str(name)
    }
}
