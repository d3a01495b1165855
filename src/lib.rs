//! # lifecycle-di
//!
//! A dependency container whose cached instances live exactly as long as the
//! host application says they do.
//!
//! ## Features
//!
//! - **Storage policies**: isolated, global singleton, shared between a set
//!   of bound dependents, or decided by the caller at resolve time
//! - **Explicit contracts**: a concrete type is resolvable as a trait object
//!   only through a registered cast, never by runtime inference
//! - **Deterministic teardown**: `container_class_is_dying` drops singleton
//!   and shared state for an instance and cascades to orphaned shared
//!   instances
//! - **Configurable strictness**: ambiguity and policy coercion fail or fall
//!   back to a deterministic choice
//! - **Circular dependency detection**: cycles fail fast with the full path
//! - **Thread-safe**: one lock per map, none held while user code runs
//!
//! ## Quick Start
//!
//! ```rust
//! use lifecycle_di::{Constructor, Container, Resolver, StoragePolicy};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! #[derive(Default)]
//! struct FixedClock;
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 { 42 }
//! }
//!
//! struct Scheduler {
//!     clock: Arc<dyn Clock>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_type::<FixedClock>(StoragePolicy::GlobalSingleton)
//!     .with_default()
//!     .as_type::<dyn Clock, _>(|c| c as Arc<dyn Clock>)
//!     .register();
//! container
//!     .register_type::<Scheduler>(StoragePolicy::IsolatedInstance)
//!     .with_constructor(Constructor::unary(|clock: Arc<dyn Clock>| Scheduler { clock }))
//!     .register();
//!
//! let scheduler = container.resolve::<Scheduler>().unwrap();
//! assert_eq!(scheduler.clock.now(), 42);
//! ```
//!
//! ## Shared Instances
//!
//! A `SharedDependencyBetweenInstances` type is resolved on behalf of a bound
//! instance. Every bound instance gets the same shared instance, which is
//! dropped once its last bound instance retires.
//!
//! ```rust
//! use lifecycle_di::{Container, Resolver, StoragePolicy};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct NavigationState;
//! struct Page;
//!
//! let container = Container::new();
//! container
//!     .register_type::<NavigationState>(StoragePolicy::SharedDependencyBetweenInstances)
//!     .with_default()
//!     .register();
//!
//! let (p1, p2) = (Arc::new(Page), Arc::new(Page));
//! let s1 = container.resolve_shared::<NavigationState, _>(&p1).unwrap();
//! let s2 = container.resolve_shared::<NavigationState, _>(&p2).unwrap();
//! assert!(Arc::ptr_eq(&s1, &s2));
//! assert_eq!(container.bound_count(&s1), 2);
//!
//! container.container_class_is_dying(&p1);
//! container.container_class_is_dying(&p2);
//! assert!(!container.is_shared(&s1));
//! ```

// Module declarations
pub mod config;
pub mod constructor;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifecycle;
pub mod observer;
pub mod policy;
pub mod traits;

// Internal modules
mod internal;
mod registration;
mod selection;
mod store;

pub use config::{ContainerConfig, DEFAULT_ENV_PREFIX};
pub use constructor::{Constructor, ConstructorArgs};
pub use container::{BoundInstance, Container, ResolveRequest, ResolverContext};
pub use descriptors::{ContractDescriptor, ContractSummary};
pub use error::{DiError, DiResult};
pub use key::{key_of, InstanceId, TypeKey};
pub use lifecycle::{LifecycleBus, RetirementListener};
pub use observer::{ContainerObserver, LoggingObserver};
pub use policy::StoragePolicy;
pub use registration::TypeRegistration;
pub use selection::TieBreak;
pub use traits::{Dispose, Resolver, ResolverCore};
