//! Builder for configuring a [`RefCache`].
//!
//! Collects the knobs [`RefCache::new`] does not expose: map pre-sizing and
//! a trace sink.
//!
//! ## Example
//!
//! ```rust
//! use refcache::RefCacheBuilder;
//!
//! let cache = RefCacheBuilder::new(100)
//!     .initial_capacity(256)
//!     .build_with_factory::<u64, u64, _>(|key: &u64| Ok::<_, std::convert::Infallible>(key * 2));
//!
//! assert_eq!(*cache.get_or_create(&21).unwrap(), 42);
//! assert_eq!(cache.max_unused(), 100);
//! ```

use std::fmt;
use std::hash::Hash;

use crate::cache::RefCache;
use crate::factory::DefaultFactory;
use crate::sink::TraceSink;

/// Builder for creating [`RefCache`] instances.
pub struct RefCacheBuilder {
    max_unused: usize,
    initial_capacity: usize,
    sink: Option<Box<dyn TraceSink>>,
}

impl RefCacheBuilder {
    /// Starts a builder for a cache tolerating `max_unused` unreferenced
    /// entries.
    pub fn new(max_unused: usize) -> Self {
        Self {
            max_unused,
            initial_capacity: 0,
            sink: None,
        }
    }

    /// Pre-sizes the map (and the unused queue, up to `max_unused + 1`).
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Installs a sink receiving one line per use, unuse and erase.
    pub fn trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Builds a cache whose missing values are `V::default()`.
    ///
    /// ```rust
    /// use refcache::RefCacheBuilder;
    ///
    /// let cache = RefCacheBuilder::new(8).build::<&str, Vec<u8>>();
    /// assert!(cache.get_or_create(&"k").unwrap().is_empty());
    /// ```
    pub fn build<K, V>(self) -> RefCache<K, V, DefaultFactory>
    where
        K: Eq + Hash + Clone + fmt::Debug,
    {
        self.build_with_factory(DefaultFactory)
    }

    /// Builds a cache whose missing values come from `factory`.
    pub fn build_with_factory<K, V, F>(self, factory: F) -> RefCache<K, V, F>
    where
        K: Eq + Hash + Clone + fmt::Debug,
    {
        RefCache::from_parts(self.max_unused, self.initial_capacity, factory, self.sink)
    }
}

impl fmt::Debug for RefCacheBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCacheBuilder")
            .field("max_unused", &self.max_unused)
            .field("initial_capacity", &self.initial_capacity)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::WriterSink;

    #[test]
    fn builder_applies_settings() {
        let builder = RefCacheBuilder::new(3).initial_capacity(16);
        let text = format!("{builder:?}");
        assert!(text.contains("max_unused: 3"));
        assert!(text.contains("initial_capacity: 16"));

        let cache = builder.build::<u32, u32>();
        assert_eq!(cache.max_unused(), 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn builder_factory_error_propagates() {
        let cache = RefCacheBuilder::new(2).build_with_factory::<u32, u32, _>(|key: &u32| {
            if *key == 0 { Err("zero") } else { Ok(*key) }
        });
        assert_eq!(cache.get_or_create(&0).unwrap_err(), "zero");
        assert_eq!(*cache.get_or_create(&4).unwrap(), 4);
    }

    #[test]
    fn builder_installs_sink() {
        let cache = RefCacheBuilder::new(1)
            .trace_sink(WriterSink::stderr())
            .build::<u32, u32>();
        assert!(format!("{cache:?}").contains("has_sink: true"));
        cache.emplace(1, 1);
        cache.emplace(2, 2);
        assert!(!cache.contains(&1));
    }
}
