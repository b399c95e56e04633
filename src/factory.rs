//! Value construction for keys that miss the cache.
//!
//! [`RefCache::get_or_create`](crate::RefCache::get_or_create) builds absent
//! values through a [`Factory`]. Any closure `Fn(&K) -> Result<V, E>` is a
//! factory; [`DefaultFactory`] builds `V::default()` and is what
//! [`RefCache::new`](crate::RefCache::new) installs.
//!
//! ```
//! use refcache::RefCache;
//!
//! let cache: RefCache<i32, String, _> = RefCache::with_factory(8, |key: &i32| {
//!     if *key < 0 {
//!         Err("negative key")
//!     } else {
//!         Ok(key.to_string())
//!     }
//! });
//!
//! assert_eq!(*cache.get_or_create(&7).unwrap(), "7");
//! assert_eq!(cache.get_or_create(&-1).unwrap_err(), "negative key");
//! assert!(!cache.contains(&-1));
//! ```

use std::convert::Infallible;

/// Builds the value stored for a key that is not in the cache yet.
///
/// The cache calls [`create`](Factory::create) at most once per insertion,
/// while holding its map write lock. A returned error is handed to the caller
/// unchanged and nothing is inserted.
pub trait Factory<K, V> {
    type Error;

    fn create(&self, key: &K) -> Result<V, Self::Error>;
}

impl<K, V, E, F> Factory<K, V> for F
where
    F: Fn(&K) -> Result<V, E>,
{
    type Error = E;

    #[inline]
    fn create(&self, key: &K) -> Result<V, E> {
        self(key)
    }
}

/// Factory that ignores the key and returns `V::default()`.
///
/// Only this variant requires `V: Default`; caches with a custom factory do
/// not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultFactory;

impl<K, V: Default> Factory<K, V> for DefaultFactory {
    type Error = Infallible;

    #[inline]
    fn create(&self, _key: &K) -> Result<V, Infallible> {
        Ok(V::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factory_builds_default_value() {
        let value: Result<String, Infallible> = DefaultFactory.create(&5u32);
        assert_eq!(value, Ok(String::new()));
    }

    #[test]
    fn closure_factory_sees_key() {
        let factory = |key: &u32| -> Result<u64, ()> { Ok(u64::from(*key) * 2) };
        assert_eq!(factory.create(&21), Ok(42));
    }

    #[test]
    fn closure_factory_error_passes_through() {
        let factory = |key: &i32| {
            if *key < 0 {
                Err(format!("bad key {key}"))
            } else {
                Ok(*key)
            }
        };
        assert_eq!(factory.create(&-3), Err("bad key -3".to_string()));
    }
}
