//! Error types for the refcache library.
//!
//! ## Key Components
//!
//! - [`NotFound`]: Returned by [`RefCache::at`](crate::RefCache::at) when the
//!   key has no entry.
//! - [`InUse`]: Returned by [`RefCache::erase`](crate::RefCache::erase) while
//!   handles to the entry are still alive.
//! - [`InvariantError`]: Returned by
//!   [`RefCache::check_invariants`](crate::RefCache::check_invariants) when the
//!   unused queue, its counter and the map disagree.
//! - [`CacheError`]: One enum over the above plus a factory error, for callers
//!   that funnel every cache failure through a single type.
//!
//! Factory failures are not wrapped by the cache:
//! [`RefCache::get_or_create`](crate::RefCache::get_or_create) returns the
//! factory's own error type.
//!
//! ## Example Usage
//!
//! ```
//! use refcache::RefCache;
//! use refcache::error::{CacheError, InUse};
//!
//! let cache: RefCache<u32, String> = RefCache::new(4);
//! let handle = cache.emplace(1, "one".to_string()).0;
//! assert_eq!(cache.erase(&1), Err(InUse));
//!
//! drop(handle);
//! let err: CacheError = cache.at(&2).unwrap_err().into();
//! assert_eq!(err.to_string(), "key not found");
//! ```

use std::convert::Infallible;
use std::fmt;

// ---------------------------------------------------------------------------
// NotFound
// ---------------------------------------------------------------------------

/// The requested key has no entry in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found")
    }
}

impl std::error::Error for NotFound {}

// ---------------------------------------------------------------------------
// InUse
// ---------------------------------------------------------------------------

/// The entry still has live handles and cannot be erased.
///
/// Recoverable: drop the outstanding handles and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InUse;

impl fmt::Display for InUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("entry is referenced by live handles")
    }
}

impl std::error::Error for InUse {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Carries a human-readable description of which invariant failed. Seeing
/// one outside of a test means the locking contract was broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Any failure a cache operation can report.
///
/// `E` is the factory's error type; it defaults to [`Infallible`] for caches
/// built with the default factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError<E = Infallible> {
    NotFound,
    InUse,
    Factory(E),
}

impl<E: fmt::Display> fmt::Display for CacheError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound => fmt::Display::fmt(&NotFound, f),
            CacheError::InUse => fmt::Display::fmt(&InUse, f),
            CacheError::Factory(err) => write!(f, "factory failed: {err}"),
        }
    }
}

impl<E> std::error::Error for CacheError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Factory(err) => Some(err),
            _ => None,
        }
    }
}

impl<E> From<NotFound> for CacheError<E> {
    fn from(_: NotFound) -> Self {
        CacheError::NotFound
    }
}

impl<E> From<InUse> for CacheError<E> {
    fn from(_: InUse) -> Self {
        CacheError::InUse
    }
}

impl<E> CacheError<E> {
    /// Wraps a factory error. Not a `From` impl: it would overlap with the
    /// `NotFound`/`InUse` conversions for a generic `E`.
    pub fn factory(err: E) -> Self {
        CacheError::Factory(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- NotFound / InUse -------------------------------------------------

    #[test]
    fn not_found_display() {
        assert_eq!(NotFound.to_string(), "key not found");
    }

    #[test]
    fn in_use_display() {
        assert_eq!(InUse.to_string(), "entry is referenced by live handles");
    }

    #[test]
    fn unit_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<NotFound>();
        assert_error::<InUse>();
    }

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("unused counter mismatch");
        assert_eq!(err.to_string(), "unused counter mismatch");
        assert_eq!(err.message(), "unused counter mismatch");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    // -- CacheError -------------------------------------------------------

    #[test]
    fn cache_error_from_unit_errors() {
        let a: CacheError = NotFound.into();
        let b: CacheError = InUse.into();
        assert_eq!(a, CacheError::NotFound);
        assert_eq!(b, CacheError::InUse);
    }

    #[test]
    fn cache_error_factory_display_and_source() {
        use std::error::Error;

        let parse = "x".parse::<u32>().unwrap_err();
        let err = CacheError::factory(parse.clone());
        assert_eq!(err.to_string(), format!("factory failed: {parse}"));
        assert!(err.source().is_some());
        assert!(CacheError::<std::num::ParseIntError>::NotFound.source().is_none());
    }
}
