//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod unwind;

pub(crate) use circular::ResolutionGuard;
pub(crate) use unwind::catch_panic;
