//! refcache: a concurrent, reference-counted cache that evicts entries in the
//! order their last handle was dropped.
//!
//! Callers receive [`Handle`]s. While any handle to an entry is alive the
//! entry cannot be evicted; once the last one is dropped the key joins the
//! back of the unused queue, and when more than `max_unused` entries are
//! unused the oldest is removed. See [`cache`] for the lifecycle and locking
//! rules.
//!
//! ```
//! use refcache::RefCache;
//!
//! let cache: RefCache<u32, String> = RefCache::new(10);
//! let handle = cache.get_or_create(&1).unwrap();
//! assert!(handle.is_empty());
//! assert!(cache.erase(&1).is_err());
//! ```

pub mod builder;
pub mod cache;
pub mod ds;
mod entry;
pub mod error;
pub mod factory;
pub mod handle;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod prelude;
pub mod sink;

pub use builder::RefCacheBuilder;
pub use cache::{DEFAULT_MAX_UNUSED, RefCache};
pub use error::{CacheError, InUse, InvariantError, NotFound};
pub use factory::{DefaultFactory, Factory};
pub use handle::Handle;
