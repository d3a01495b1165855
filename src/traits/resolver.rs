//! Resolver traits for typed resolution.

use std::sync::Arc;

use crate::container::ResolveRequest;
use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::policy::StoragePolicy;
use crate::registration::AnyArc;

/// Object-safe core of resolution.
///
/// Implementations return the requested type erased as `Arc<Arc<R>>` inside
/// `Arc<dyn Any>`, which lets unsized requested types such as `dyn Trait`
/// travel through the same path as concrete ones. Most callers use
/// [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves `requested` according to `request`.
    fn resolve_any(&self, requested: TypeKey, request: &ResolveRequest) -> DiResult<AnyArc>;
}

/// Typed resolution built on [`ResolverCore`].
///
/// Implemented by [`Container`](crate::Container) and by the
/// [`ResolverContext`](crate::ResolverContext) that factories receive, so a
/// factory resolves its own dependencies the same way callers do.
///
/// # Examples
///
/// ```
/// use lifecycle_di::{Container, Resolver, StoragePolicy};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// #[derive(Default)]
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// struct UserService {
///     logger: Arc<dyn Logger>,
/// }
///
/// let container = Container::new();
/// container
///     .register_type::<ConsoleLogger>(StoragePolicy::GlobalSingleton)
///     .with_default()
///     .as_type::<dyn Logger, _>(|l| l as Arc<dyn Logger>)
///     .register();
/// container
///     .register_type::<UserService>(StoragePolicy::IsolatedInstance)
///     .with_factory(|ctx| UserService { logger: ctx.resolve_required::<dyn Logger>() })
///     .register();
///
/// let service = container.resolve::<UserService>().unwrap();
/// assert_eq!(service.logger.log("hi"), "LOG: hi");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `T` with the default request: any storage policy, no bound
    /// instance, no tie-break.
    fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_with::<T>(&ResolveRequest::new())
    }

    /// Resolves `T` with an explicit request.
    fn resolve_with<T>(&self, request: &ResolveRequest) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let any = self.resolve_any(key, request)?;
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::CastFailure {
                from: "<erased>",
                to: key.name(),
            })
    }

    /// Resolves `T`, keeping only contracts registered with `policy`.
    fn resolve_as<T>(&self, policy: StoragePolicy) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_with::<T>(&ResolveRequest::with_policy(policy))
    }

    /// Resolves `T` as a shared dependency of `bound`.
    fn resolve_shared<T, B>(&self, bound: &Arc<B>) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
    {
        self.resolve_with::<T>(
            &ResolveRequest::with_policy(StoragePolicy::SharedDependencyBetweenInstances).bound_to(bound),
        )
    }

    /// Resolves `T` or panics with the resolution error.
    fn resolve_required<T>(&self) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }
}
