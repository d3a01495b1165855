//! Disposal hook for instances the container retires on its own.

/// Trait for synchronous resource disposal.
///
/// The container calls `dispose` only for instances it drops by itself: a
/// shared instance whose last bound dependent retired. Instances announced
/// through [`Container::container_class_is_dying`](crate::Container::container_class_is_dying)
/// belong to the caller and are never disposed by the container.
///
/// # Examples
///
/// ```
/// use lifecycle_di::{Container, Dispose, Resolver, StoragePolicy};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// static FLUSHED: AtomicBool = AtomicBool::new(false);
///
/// #[derive(Default)]
/// struct Cache;
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         FLUSHED.store(true, Ordering::SeqCst);
///     }
/// }
///
/// struct Page;
///
/// let container = Container::new();
/// container
///     .register_type::<Cache>(StoragePolicy::SharedDependencyBetweenInstances)
///     .with_default()
///     .disposable()
///     .register();
///
/// let page = Arc::new(Page);
/// let _cache = container.resolve_shared::<Cache, _>(&page).unwrap();
///
/// // The page was the only dependent, so the cache is orphaned and disposed
/// container.container_class_is_dying(&page);
/// assert!(FLUSHED.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
