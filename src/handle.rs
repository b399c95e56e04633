//! Caller-facing reference into a cache entry.
//!
//! A [`Handle`] is what keeps an entry out of the unused queue. Creating the
//! first handle for an entry reports a *use* transition; dropping the last one
//! reports an *unuse* transition, which is the only way an entry becomes
//! eligible for eviction.
//!
//! The handle borrows the cache (`&'a RefCache`), so the compiler rejects any
//! program in which a handle outlives the cache that issued it:
//!
//! ```compile_fail
//! use refcache::RefCache;
//!
//! let handle = {
//!     let cache: RefCache<u32, u32> = RefCache::new(4);
//!     cache.emplace(1, 1).0
//! };
//! ```

use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use crate::cache::RefCache;
use crate::entry::Entry;
use crate::factory::DefaultFactory;
use crate::sink::TraceEvent;

/// Live reference to a cached value.
///
/// Dereferences to `V`. Cloning adds a holder without a transition; two
/// handles compare equal when they point at the same stored entry, not when
/// their values are equal.
pub struct Handle<'a, K, V, F = DefaultFactory>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    cache: &'a RefCache<K, V, F>,
    key: K,
    entry: Arc<Entry<V>>,
}

impl<'a, K, V, F> Handle<'a, K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Wraps an entry that was pinned under the map lock. `first` is what
    /// [`Entry::pin`] returned; it must be reported only after that lock is
    /// released.
    pub(crate) fn attach(
        cache: &'a RefCache<K, V, F>,
        key: K,
        entry: Arc<Entry<V>>,
        first: bool,
    ) -> Self {
        let handle = Handle { cache, key, entry };
        if first {
            cache.report(TraceEvent::Use, &handle.key, &handle.entry);
        }
        handle
    }

    /// Key this handle was issued for.
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        self.entry.value()
    }

    /// Number of live handles to this entry, this one included.
    pub fn use_count(&self) -> usize {
        self.entry.holders()
    }

    /// `true` if both handles point at the same stored entry.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.entry, &other.entry)
    }
}

impl<K, V, F> Clone for Handle<'_, K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn clone(&self) -> Self {
        let first = self.entry.pin();
        debug_assert!(!first, "cloned a handle to an unheld entry");
        Handle {
            cache: self.cache,
            key: self.key.clone(),
            entry: Arc::clone(&self.entry),
        }
    }
}

impl<K, V, F> Drop for Handle<'_, K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn drop(&mut self) {
        if self.entry.unpin() {
            self.cache.report(TraceEvent::Unuse, &self.key, &self.entry);
        }
    }
}

impl<K, V, F> Deref for Handle<'_, K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    type Target = V;

    fn deref(&self) -> &V {
        self.entry.value()
    }
}

impl<K, V, F> AsRef<V> for Handle<'_, K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn as_ref(&self) -> &V {
        self.entry.value()
    }
}

impl<K, V, F> PartialEq for Handle<'_, K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn eq(&self, other: &Self) -> bool {
        Handle::ptr_eq(self, other)
    }
}

impl<K, V, F> Eq for Handle<'_, K, V, F> where K: Eq + Hash + Clone + fmt::Debug {}

impl<K, V, F> fmt::Debug for Handle<'_, K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("key", &self.key)
            .field("value", self.entry.value())
            .field("use_count", &self.entry.holders())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::RefCache;

    #[test]
    fn clone_shares_entry_without_transition() {
        let cache: RefCache<u32, String> = RefCache::new(2);
        let (a, _) = cache.emplace(1, "one".to_string());
        let b = a.clone();

        assert_eq!(a, b);
        assert_eq!(a.use_count(), 2);
        assert_eq!(*b, "one");
        assert_eq!(b.key(), &1);

        drop(a);
        assert_eq!(b.use_count(), 1);
        assert_eq!(cache.unused_len(), 0);

        drop(b);
        assert_eq!(cache.unused_len(), 1);
    }

    #[test]
    fn equality_is_identity_not_value() {
        let cache: RefCache<u32, u32> = RefCache::new(4);
        let (a, _) = cache.emplace(1, 7);
        let (b, _) = cache.emplace(2, 7);

        assert_eq!(*a, *b);
        assert_ne!(a, b);
        assert_eq!(a, cache.at(&1).unwrap());
    }

    #[test]
    fn debug_shows_key_and_value() {
        let cache: RefCache<&str, u8> = RefCache::new(1);
        let (h, _) = cache.emplace("k", 3);
        let text = format!("{h:?}");
        assert!(text.contains("\"k\""));
        assert!(text.contains("value: 3"));
        assert_eq!(h.as_ref(), &3);
        assert_eq!(h.value(), &3);
    }
}
