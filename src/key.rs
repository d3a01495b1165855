//! Type and instance identity for the container.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Identity of a requested or concrete type.
///
/// Equality and hashing use the `TypeId` only; the name is carried for
/// diagnostics and error messages. Unsized trait-object types such as
/// `dyn Logger` have a `TypeId` too, which is how interface-like requested
/// types are named.
///
/// # Examples
///
/// ```rust
/// use lifecycle_di::TypeKey;
///
/// trait Animal: Send + Sync {}
///
/// let a = TypeKey::of::<String>();
/// let b = TypeKey::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "alloc::string::String");
///
/// let animal = TypeKey::of::<dyn Animal>();
/// assert_ne!(animal, a);
/// assert!(animal.name().contains("Animal"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`, sized or not.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The `std::any::type_name` of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[inline(always)]
pub fn key_of<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}

/// Reference identity of an `Arc` allocation.
///
/// Two `Arc`s share an `InstanceId` when they point at the same allocation,
/// regardless of whether one of them has been cast to a trait object or
/// erased to `dyn Any`. Teardown and shared-dependent membership compare
/// instances by this id.
///
/// ```rust
/// use lifecycle_di::InstanceId;
/// use std::any::Any;
/// use std::sync::Arc;
///
/// let page = Arc::new(5u8);
/// let erased: Arc<dyn Any + Send + Sync> = page.clone();
/// assert_eq!(InstanceId::of(&page), InstanceId::of(&erased));
/// assert_ne!(InstanceId::of(&page), InstanceId::of(&Arc::new(5u8)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

impl InstanceId {
    #[inline]
    pub fn of<T: ?Sized>(instance: &Arc<T>) -> Self {
        InstanceId(Arc::as_ptr(instance) as *const () as usize)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
