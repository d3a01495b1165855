//! Resolver context handed to factories.

use crate::container::ResolveRequest;
use crate::error::DiResult;
use crate::key::TypeKey;
use crate::registration::AnyArc;
use crate::traits::{Resolver, ResolverCore};

/// Context passed to factory functions for resolving dependencies.
///
/// Resolutions made through the context run inside the current construction,
/// so the cycle guard sees them.
///
/// ```
/// use lifecycle_di::{Container, Resolver, StoragePolicy};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container
///     .register_type::<Database>(StoragePolicy::GlobalSingleton)
///     .with_factory(|_| Database { url: "postgres://localhost".into() })
///     .register();
/// container
///     .register_type::<UserService>(StoragePolicy::IsolatedInstance)
///     .with_try_factory(|ctx| Ok(UserService { db: ctx.resolve::<Database>()? }))
///     .register();
///
/// let service = container.resolve::<UserService>().unwrap();
/// assert_eq!(service.db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, requested: TypeKey, request: &ResolveRequest) -> DiResult<AnyArc> {
        self.resolver.resolve_any(requested, request)
    }
}

impl<'a> Resolver for ResolverContext<'a> {}
