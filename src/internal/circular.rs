//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;

// Concrete types currently under construction on this thread
thread_local! {
    static IN_FLIGHT: RefCell<Vec<TypeKey>> = const { RefCell::new(Vec::new()) };
}

/// Marks a concrete type as under construction for as long as it lives.
///
/// Entering a type that is already on this thread's stack fails with
/// `CircularDependency` carrying the full path, e.g.
/// `["PageA", "PageB", "PageA"]`. Entering past `max_depth` fails with
/// `DepthExceeded`.
pub(crate) struct ResolutionGuard {
    key: TypeKey,
}

impl ResolutionGuard {
    pub(crate) fn enter(key: TypeKey, max_depth: usize) -> DiResult<Self> {
        IN_FLIGHT.with(|stack| {
            let mut stack = stack.borrow_mut();

            // Cycle detection before pushing
            if stack.contains(&key) {
                let mut path: Vec<&'static str> = stack.iter().map(|k| k.name()).collect();
                path.push(key.name());
                return Err(DiError::CircularDependency(path));
            }

            if stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(stack.len()));
            }

            stack.push(key);
            Ok(Self { key })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(last) = stack.pop() {
                debug_assert_eq!(last, self.key);
            }
        });
    }
}

#[cfg(test)]
pub(crate) fn in_flight_depth() -> usize {
    IN_FLIGHT.with(|stack| stack.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn reentering_reports_path() {
        let _a = ResolutionGuard::enter(TypeKey::of::<A>(), 16).unwrap();
        let _b = ResolutionGuard::enter(TypeKey::of::<B>(), 16).unwrap();
        match ResolutionGuard::enter(TypeKey::of::<A>(), 16) {
            Err(DiError::CircularDependency(path)) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("::A"));
                assert!(path[1].ends_with("::B"));
                assert!(path[2].ends_with("::A"));
            }
            _ => panic!("expected CircularDependency"),
        }
    }

    #[test]
    fn guard_pops_on_drop() {
        assert_eq!(in_flight_depth(), 0);
        {
            let _a = ResolutionGuard::enter(TypeKey::of::<A>(), 16).unwrap();
            assert_eq!(in_flight_depth(), 1);
        }
        assert_eq!(in_flight_depth(), 0);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let _a = ResolutionGuard::enter(TypeKey::of::<A>(), 1).unwrap();
        assert!(matches!(
            ResolutionGuard::enter(TypeKey::of::<B>(), 1),
            Err(DiError::DepthExceeded(1))
        ));
    }
}
