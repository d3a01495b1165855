//! Constructor descriptions used when a contract has no factory.
//!
//! Rust has no runtime reflection, so a concrete type publishes its
//! constructors explicitly: each one is a list of parameter types plus an
//! invoker. The container tries them from the fewest parameters upwards and
//! invokes the first one whose parameters all resolve.

use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::registration::AnyArc;

type InvokeFn = Arc<dyn Fn(&mut ConstructorArgs) -> DiResult<AnyArc> + Send + Sync>;

/// One way of building a concrete type from resolved dependencies.
///
/// # Examples
///
/// ```rust
/// use lifecycle_di::{Constructor, Container, Resolver, StoragePolicy};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Database;
///
/// struct Repository {
///     db: Option<Arc<Database>>,
/// }
///
/// let container = Container::new();
/// container.register_type::<Database>(StoragePolicy::GlobalSingleton).with_default().register();
/// container
///     .register_type::<Repository>(StoragePolicy::IsolatedInstance)
///     .with_constructor(Constructor::unary(|db: Arc<Database>| Repository { db: Some(db) }))
///     .register();
///
/// let repo = container.resolve::<Repository>().unwrap();
/// assert!(repo.db.is_some());
/// ```
#[derive(Clone)]
pub struct Constructor {
    params: Vec<TypeKey>,
    produces: TypeKey,
    invoke: InvokeFn,
}

impl Constructor {
    /// Builds a constructor from explicit parameter types and an invoker
    /// that pulls each argument, in order, from [`ConstructorArgs`].
    pub fn new<C, F>(params: Vec<TypeKey>, invoke: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(&mut ConstructorArgs) -> DiResult<C> + Send + Sync + 'static,
    {
        Self {
            params,
            produces: TypeKey::of::<C>(),
            invoke: Arc::new(move |args: &mut ConstructorArgs| -> DiResult<AnyArc> {
                Ok(Arc::new(invoke(args)?) as AnyArc)
            }),
        }
    }

    pub fn nullary<C, F>(f: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self::new(Vec::new(), move |_| Ok(f()))
    }

    pub fn unary<C, A, F>(f: F) -> Self
    where
        C: Send + Sync + 'static,
        A: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<A>) -> C + Send + Sync + 'static,
    {
        Self::new(vec![TypeKey::of::<A>()], move |args| Ok(f(args.next::<A>()?)))
    }

    pub fn binary<C, A, B, F>(f: F) -> Self
    where
        C: Send + Sync + 'static,
        A: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<A>, Arc<B>) -> C + Send + Sync + 'static,
    {
        Self::new(vec![TypeKey::of::<A>(), TypeKey::of::<B>()], move |args| {
            let a = args.next::<A>()?;
            let b = args.next::<B>()?;
            Ok(f(a, b))
        })
    }

    pub fn ternary<C, A, B, D, F>(f: F) -> Self
    where
        C: Send + Sync + 'static,
        A: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
        D: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<A>, Arc<B>, Arc<D>) -> C + Send + Sync + 'static,
    {
        Self::new(
            vec![TypeKey::of::<A>(), TypeKey::of::<B>(), TypeKey::of::<D>()],
            move |args| {
                let a = args.next::<A>()?;
                let b = args.next::<B>()?;
                let d = args.next::<D>()?;
                Ok(f(a, b, d))
            },
        )
    }

    pub fn params(&self) -> &[TypeKey] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// The type the invoker builds. Nothing checks that it matches the owner
    /// it is registered under; a mismatch surfaces as `CastFailure` when the
    /// result is handed out.
    pub fn produces(&self) -> TypeKey {
        self.produces
    }

    pub(crate) fn invoke(&self, values: Vec<AnyArc>) -> DiResult<AnyArc> {
        let mut args = ConstructorArgs {
            values: self.params.iter().copied().zip(values).collect::<Vec<_>>().into_iter(),
        };
        (self.invoke)(&mut args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("produces", &self.produces.name())
            .field("params", &self.params.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Resolved constructor arguments, consumed in parameter order.
pub struct ConstructorArgs {
    values: std::vec::IntoIter<(TypeKey, AnyArc)>,
}

impl ConstructorArgs {
    /// Takes the next argument as `Arc<T>`.
    pub fn next<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        let (param, value) = self.values.next().ok_or(DiError::CastFailure {
            from: "<missing argument>",
            to: std::any::type_name::<T>(),
        })?;
        value
            .downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::CastFailure {
                from: param.name(),
                to: std::any::type_name::<T>(),
            })
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
