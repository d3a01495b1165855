//! Error types for the dependency resolution container.

use std::fmt;

use crate::policy::StoragePolicy;

/// Dependency resolution errors
///
/// Represents the conditions that can occur while registering, resolving or
/// sharing instances. Only the ambiguity and policy-mismatch variants depend
/// on the container's strictness switches; every other variant is always
/// reported.
///
/// # Examples
///
/// ```rust
/// use lifecycle_di::{Container, DiError, Resolver};
///
/// let container = Container::new();
/// match container.resolve::<String>() {
///     Err(DiError::NotRegistered(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use lifecycle_di::DiError;
///
/// let circular = DiError::CircularDependency(vec!["PageA", "PageB", "PageA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: PageA -> PageB -> PageA");
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// No contract for the requested type
    NotRegistered(&'static str),
    /// More than one owner type holds a contract for the requested type
    AmbiguousOwner {
        requested: &'static str,
        owners: Vec<&'static str>,
    },
    /// Several contracts qualify and no tie-break settled it
    AmbiguousResolution {
        requested: &'static str,
        candidates: usize,
    },
    /// No contract carries the requested storage policy
    StoragePolicyMismatch {
        requested: &'static str,
        policy: StoragePolicy,
    },
    /// A contract's owner cannot be handed out as the requested type
    TypeMismatch {
        owner: &'static str,
        requested: &'static str,
    },
    /// Shared storage needs a bound instance and none was given
    MissingBoundInstance(&'static str),
    /// A bound instance is the shared type itself or related to it
    IllegalSharing {
        shared: &'static str,
        bound: &'static str,
    },
    /// A factory or constructor ran and failed
    ConstructionFailed {
        concrete: &'static str,
        reason: String,
    },
    /// No constructor of the concrete type could be satisfied
    NoUsableConstructor(&'static str),
    /// A constructed instance could not be cast to the requested type
    CastFailure {
        from: &'static str,
        to: &'static str,
    },
    /// Circular dependency detected (includes path)
    CircularDependency(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    DepthExceeded(usize),
    /// Configuration value could not be parsed
    InvalidConfig(String),
}

impl DiError {
    /// Builds a `ConstructionFailed` for the concrete type `C`.
    ///
    /// Handy inside fallible factories:
    ///
    /// ```rust
    /// use lifecycle_di::DiError;
    ///
    /// struct Connection;
    /// let err = DiError::construction::<Connection>("socket refused");
    /// assert!(err.to_string().contains("socket refused"));
    /// ```
    pub fn construction<C: ?Sized + 'static>(reason: impl Into<String>) -> Self {
        DiError::ConstructionFailed {
            concrete: std::any::type_name::<C>(),
            reason: reason.into(),
        }
    }

    /// Errors that abort the whole resolution chain instead of just
    /// disqualifying one constructor candidate.
    pub(crate) fn is_structural(&self) -> bool {
        matches!(self, DiError::CircularDependency(_) | DiError::DepthExceeded(_))
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotRegistered(name) => write!(f, "No registered contracts for: {}", name),
            DiError::AmbiguousOwner { requested, owners } => write!(
                f,
                "Too many owner contracts ({}) for {}: {}",
                owners.len(),
                requested,
                owners.join(", ")
            ),
            DiError::AmbiguousResolution { requested, candidates } => write!(
                f,
                "Cannot decide between {} registrations for {}",
                candidates, requested
            ),
            DiError::StoragePolicyMismatch { requested, policy } => write!(
                f,
                "No registration for {} using storage policy {}",
                requested, policy
            ),
            DiError::TypeMismatch { owner, requested } => {
                write!(f, "Cannot hand out an instance of {} as {}", owner, requested)
            }
            DiError::MissingBoundInstance(name) => {
                write!(f, "Shared resolution of {} requires a bound instance", name)
            }
            DiError::IllegalSharing { shared, bound } => write!(
                f,
                "Cannot share {} with {}: the types are the same or related",
                shared, bound
            ),
            DiError::ConstructionFailed { concrete, reason } => {
                write!(f, "Construction of {} failed: {}", concrete, reason)
            }
            DiError::NoUsableConstructor(name) => {
                write!(f, "No usable constructor for: {}", name)
            }
            DiError::CastFailure { from, to } => write!(f, "Failed to cast {} as {}", from, to),
            DiError::CircularDependency(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
            DiError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
