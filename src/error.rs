//! Error types for fallible tree operations.
//!
//! Only node allocation can fail. Every other operation on a
//! [`BirchSet`](crate::BirchSet) is infallible, and violating a documented
//! precondition (such as erasing through [`end`](crate::BirchSet::end)) is a
//! panic rather than an error.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors returned by the `try_*` family of operations.
///
/// When one of these is returned, the container involved is left exactly as
/// it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocator could not provide storage for new tree nodes.
    #[error("failed to allocate tree node storage")]
    AllocationFailed(#[from] TryReserveError),
}

/// A Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn allocation_failure_message() {
        let source = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
        let err = Error::from(source.clone());

        assert_eq!(err.to_string(), "failed to allocate tree node storage");
        assert_eq!(err, Error::AllocationFailed(source));
        assert!(std::error::Error::source(&err).is_some());
    }
}
