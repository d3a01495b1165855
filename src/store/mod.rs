//! Lifetime stores: global singletons and shared instances.
//!
//! Each store is an independent map behind its own lock. Nothing here holds a
//! lock while user code runs; disposers of orphaned entries are handed back
//! to the caller and run after the lock is released.

mod shared;
mod singletons;

pub(crate) use shared::{SharedEntry, SharedStore};
pub(crate) use singletons::{SingletonStore, Stored};

use crate::container::BoundInstance;

#[cfg(feature = "ahash")]
pub(crate) type FastMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type FastMap<K, V> = indexmap::IndexMap<K, V>;

/// Dependents of one shared instance. Membership is unique by instance id.
#[cfg(feature = "smallvec")]
pub(crate) type BoundSet = smallvec::SmallVec<[BoundInstance; 4]>;
#[cfg(not(feature = "smallvec"))]
pub(crate) type BoundSet = Vec<BoundInstance>;
