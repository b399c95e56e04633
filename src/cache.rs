//! Reference-counted cache whose eviction order follows handle release.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         RefCache<K, V, F>                            │
//!   │                                                                      │
//!   │  map: RwLock<FxHashMap<K, Arc<Entry<V>>>>     (owns every value)     │
//!   │  unused: Mutex<UnusedQueue<K>>                (oldest unused first)  │
//!   │  unused_size: AtomicUsize                     (== unused.len())      │
//!   │  factory: F                                   (get_or_create)        │
//!   │  sink: Option<Box<dyn TraceSink>>             (use/unuse/erase)      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!          at / emplace / get_or_create                     drop(Handle)
//!                     │                                          │
//!                     ▼                                          ▼
//!       pin entry under map lock (0→1 = use)          unpin (1→0 = unuse)
//!                     │                                          │
//!                     └──────────────► report ◄──────────────────┘
//!                                        │  queue lock
//!                                        ▼
//!                       held?   remove key from unused queue
//!                       unheld? append key; unused_size > max_unused?
//!                                        │
//!                                        ▼
//!                              cleanup: pop oldest, take map write lock,
//!                              remove it if still unheld
//! ```
//!
//! ## Lifecycle
//!
//! An entry is *used* while at least one [`Handle`] points at it and
//! *unused* otherwise. Only unused entries sit in the unused queue, and only
//! they count against `max_unused`. Held entries are never evicted however
//! large the map grows.
//!
//! Eviction is strict FIFO by the moment an entry last became unused. Reading
//! a value through a live handle does not change its position; picking an
//! unused entry up again removes it from the queue, and releasing it again
//! appends it at the back.
//!
//! ## Locking
//!
//! | Lock          | Mode      | Held by                                         |
//! |---------------|-----------|-------------------------------------------------|
//! | map `RwLock`  | shared    | `at`, `contains`, `emplace`/`get_or_create`     |
//! |               |           | fast path                                       |
//! | map `RwLock`  | exclusive | `emplace`, `get_or_create` insert, `erase`,     |
//! |               |           | `clear`, eviction                               |
//! | queue `Mutex` | exclusive | use/unuse reports, eviction, `erase`, `clear`   |
//!
//! When both are needed the queue lock is taken first. Lookups pin the entry
//! while the map lock is held and report the transition after releasing it,
//! so no path waits on the queue while holding the map.
//!
//! A report reconciles the queue against the entry's *current* holder
//! count rather than replaying the event, which makes the outcome independent
//! of the order in which racing reports reach the queue lock. A key can
//! therefore sit in the queue for a moment after it was pinned; eviction
//! re-checks the holder count under the map write lock and leaves such an
//! entry alone.
//!
//! ## Example Usage
//!
//! ```
//! use refcache::RefCache;
//!
//! let cache: RefCache<u32, String> = RefCache::new(2);
//!
//! let (held, inserted) = cache.emplace(0, "pinned".to_string());
//! assert!(inserted);
//!
//! for key in 1..=3 {
//!     cache.emplace(key, format!("value {key}"));
//! }
//!
//! // Key 1 was released first and is the one evicted.
//! assert!(!cache.contains(&1));
//! assert!(cache.contains(&0));
//! assert_eq!(*held, "pinned");
//! assert_eq!(cache.unused_len(), 2);
//! ```

use std::collections::hash_map::Entry as MapEntry;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::ds::UnusedQueue;
use crate::entry::Entry;
use crate::error::{InUse, InvariantError, NotFound};
use crate::factory::{DefaultFactory, Factory};
use crate::handle::Handle;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::RefCacheMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::RefCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, MetricsReset, MetricsSnapshotProvider, RefCacheMetricsRecorder,
};
use crate::sink::{TraceEvent, TraceSink};

/// `max_unused` used by [`RefCache::default`].
pub const DEFAULT_MAX_UNUSED: usize = 10;

/// Emits a trace line if a sink is installed. Arguments are only formatted
/// when one is.
macro_rules! trace_line {
    ($cache:expr, $event:expr, $($arg:tt)+) => {
        if let Some(sink) = $cache.sink.as_deref() {
            sink.trace($event, format_args!($($arg)+));
        }
    };
}

/// Concurrent cache that hands out [`Handle`]s and evicts the entry whose
/// last handle was dropped longest ago, once more than `max_unused` entries
/// are unreferenced.
///
/// `F` builds values for [`get_or_create`](RefCache::get_or_create); see
/// [`Factory`].
pub struct RefCache<K, V, F = DefaultFactory> {
    map: RwLock<FxHashMap<K, Arc<Entry<V>>>>,
    unused: Mutex<UnusedQueue<K>>,
    unused_size: AtomicUsize,
    max_unused: usize,
    factory: F,
    sink: Option<Box<dyn TraceSink>>,
    #[cfg(feature = "metrics")]
    metrics: RefCacheMetrics,
}

impl<K, V> RefCache<K, V, DefaultFactory>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Creates a cache that tolerates `max_unused` unreferenced entries and
    /// builds missing values with `V::default()`.
    ///
    /// A `max_unused` of 0 evicts every entry as soon as its last handle is
    /// dropped.
    pub fn new(max_unused: usize) -> Self {
        Self::with_factory(max_unused, DefaultFactory)
    }
}

impl<K, V> Default for RefCache<K, V, DefaultFactory>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Creates a cache with `max_unused` of [`DEFAULT_MAX_UNUSED`].
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNUSED)
    }
}

impl<K, V, F> RefCache<K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Creates a cache whose [`get_or_create`](RefCache::get_or_create)
    /// builds missing values with `factory`.
    pub fn with_factory(max_unused: usize, factory: F) -> Self {
        Self::from_parts(max_unused, 0, factory, None)
    }

    pub(crate) fn from_parts(
        max_unused: usize,
        initial_capacity: usize,
        factory: F,
        sink: Option<Box<dyn TraceSink>>,
    ) -> Self {
        let queue_capacity = initial_capacity.min(max_unused.saturating_add(1));
        RefCache {
            map: RwLock::new(FxHashMap::with_capacity_and_hasher(
                initial_capacity,
                Default::default(),
            )),
            unused: Mutex::new(UnusedQueue::with_capacity(queue_capacity)),
            unused_size: AtomicUsize::new(0),
            max_unused,
            factory,
            sink,
            #[cfg(feature = "metrics")]
            metrics: RefCacheMetrics::new(),
        }
    }

    /// Inserts `value` under `key` unless the key is already present, and
    /// returns a handle to whichever entry is now stored.
    ///
    /// `inserted` is `false` when an existing entry was reused; `value` is
    /// dropped in that case.
    ///
    /// ```
    /// use refcache::RefCache;
    ///
    /// let cache: RefCache<&str, u32> = RefCache::new(4);
    /// let (first, inserted) = cache.emplace("a", 1);
    /// assert!(inserted);
    ///
    /// let (second, inserted) = cache.emplace("a", 2);
    /// assert!(!inserted);
    /// assert_eq!(*second, 1);
    /// assert_eq!(first, second);
    /// ```
    pub fn emplace(&self, key: K, value: V) -> (Handle<'_, K, V, F>, bool) {
        self.emplace_with(key, || value)
    }

    /// Like [`emplace`](RefCache::emplace), but only calls `make` when the
    /// key looks absent.
    ///
    /// `make` runs outside every cache lock, so it may use the cache or drop
    /// handles into it. If another caller inserts the key while `make` runs,
    /// that entry wins and the built value is dropped.
    pub fn emplace_with(
        &self,
        key: K,
        make: impl FnOnce() -> V,
    ) -> (Handle<'_, K, V, F>, bool) {
        let found = {
            let map = self.map.read();
            map.get(&key).map(|entry| (Arc::clone(entry), entry.pin()))
        };
        if let Some((entry, first)) = found {
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_existing();
            return (Handle::attach(self, key, entry, first), false);
        }

        let value = make();
        let (entry, first, rejected) = {
            let mut map = self.map.write();
            let (entry, rejected) = match map.entry(key.clone()) {
                MapEntry::Occupied(occupied) => (Arc::clone(occupied.get()), Some(value)),
                MapEntry::Vacant(vacant) => {
                    let entry = vacant.insert(Arc::new(Entry::new(value)));
                    (Arc::clone(entry), None)
                },
            };
            let first = entry.pin();
            (entry, first, rejected)
        };
        let inserted = rejected.is_none();
        drop(rejected);

        #[cfg(feature = "metrics")]
        if inserted {
            self.metrics.record_insert_new();
        } else {
            self.metrics.record_insert_existing();
        }

        (Handle::attach(self, key, entry, first), inserted)
    }

    /// Returns a handle to the entry for `key`.
    ///
    /// # Errors
    ///
    /// [`NotFound`] if the key has no entry.
    pub fn at(&self, key: &K) -> Result<Handle<'_, K, V, F>, NotFound> {
        let found = {
            let map = self.map.read();
            map.get(key).map(|entry| (Arc::clone(entry), entry.pin()))
        };

        match found {
            Some((entry, first)) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_hit();
                Ok(Handle::attach(self, key.clone(), entry, first))
            },
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                Err(NotFound)
            },
        }
    }

    /// `true` if `key` has an entry, used or not. Has no lifecycle effect.
    pub fn contains(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    /// Returns a handle to the entry for `key`, building the value with the
    /// factory if the key is absent.
    ///
    /// The factory runs under the map write lock after a second lookup, so
    /// concurrent callers racing on the same absent key construct the value
    /// once and all receive handles to the one stored entry. It must not call
    /// back into this cache.
    ///
    /// # Errors
    ///
    /// The factory's error, unchanged. Nothing is inserted in that case.
    pub fn get_or_create(&self, key: &K) -> Result<Handle<'_, K, V, F>, F::Error>
    where
        F: Factory<K, V>,
    {
        let found = {
            let map = self.map.read();
            map.get(key).map(|entry| (Arc::clone(entry), entry.pin()))
        };
        if let Some((entry, first)) = found {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_hit();
            return Ok(Handle::attach(self, key.clone(), entry, first));
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_get_miss();

        let (entry, first) = {
            let mut map = self.map.write();
            let entry = match map.get(key) {
                // Another caller inserted it between the two lookups.
                Some(entry) => Arc::clone(entry),
                None => {
                    #[cfg(feature = "metrics")]
                    self.metrics.record_factory_call();
                    let value = match self.factory.create(key) {
                        Ok(value) => value,
                        Err(err) => {
                            #[cfg(feature = "metrics")]
                            self.metrics.record_factory_failure();
                            return Err(err);
                        },
                    };
                    let entry = Arc::new(Entry::new(value));
                    map.insert(key.clone(), Arc::clone(&entry));
                    #[cfg(feature = "metrics")]
                    self.metrics.record_insert_new();
                    entry
                },
            };
            let first = entry.pin();
            (entry, first)
        };

        Ok(Handle::attach(self, key.clone(), entry, first))
    }

    /// Removes the entry for `key`.
    ///
    /// Returns `Ok(false)` if the key was absent. An entry waiting in the
    /// unused queue leaves it, and the unused count drops by one.
    ///
    /// # Errors
    ///
    /// [`InUse`] while any handle to the entry is alive. Erasing it anyway
    /// would let a new entry appear under the same key while the old handle
    /// still reports transitions for it.
    pub fn erase(&self, key: &K) -> Result<bool, InUse> {
        let mut queue = self.unused.lock();
        let removed = {
            let mut map = self.map.write();
            match map.get(key) {
                None => return Ok(false),
                Some(entry) if entry.is_held() => {
                    #[cfg(feature = "metrics")]
                    self.metrics.record_erase_in_use();
                    return Err(InUse);
                },
                Some(entry) => entry.detach(),
            }
            map.remove(key)
        };

        if queue.remove(key) {
            self.unused_size.fetch_sub(1, Ordering::AcqRel);
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_erase();
        trace_line!(
            self,
            TraceEvent::Erase,
            "Erasing {:?}. {} unused elements.",
            key,
            self.unused_size.load(Ordering::Acquire)
        );
        drop(queue);
        drop(removed);
        Ok(true)
    }

    /// Removes every unused entry and empties the unused queue. Entries with
    /// live handles stay in the map and remain reachable.
    ///
    /// Each removed entry is traced as an erase.
    pub fn clear(&self) {
        let mut queue = self.unused.lock();
        let mut removed = Vec::new();
        {
            let mut map = self.map.write();
            map.retain(|key, entry| {
                if entry.is_held() {
                    true
                } else {
                    entry.detach();
                    removed.push((key.clone(), Arc::clone(entry)));
                    false
                }
            });
        }
        queue.clear();
        self.unused_size.store(0, Ordering::Release);
        for (key, _) in &removed {
            trace_line!(self, TraceEvent::Erase, "Erasing {:?}. 0 unused elements.", key);
        }
        drop(queue);

        #[cfg(feature = "metrics")]
        self.metrics.record_clear(removed.len());
        drop(removed);
    }

    /// Number of entries in the map, used and unused.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries with no live handle.
    pub fn unused_len(&self) -> usize {
        self.unused_size.load(Ordering::Acquire)
    }

    pub fn max_unused(&self) -> usize {
        self.max_unused
    }

    /// Applies a use or unuse transition to the unused queue.
    ///
    /// Membership follows the entry's current holder count, not `event`:
    /// by the time the queue lock is acquired a racing handle may already
    /// have flipped it back. Such an overtaken report still reconciles the
    /// queue but is neither traced nor counted; the later transition's own
    /// report is.
    pub(crate) fn report(&self, event: TraceEvent, key: &K, entry: &Entry<V>) {
        let mut queue = self.unused.lock();
        if entry.is_detached() {
            return;
        }

        let held = entry.is_held();
        let mut over_capacity = false;
        if held {
            if queue.remove(key) {
                self.unused_size.fetch_sub(1, Ordering::AcqRel);
            }
        } else if queue.push_back(key.clone()) {
            let size = self.unused_size.fetch_add(1, Ordering::AcqRel) + 1;
            over_capacity = size > self.max_unused;
        }

        if held == (event == TraceEvent::Use) {
            #[cfg(feature = "metrics")]
            match event {
                TraceEvent::Use => self.metrics.record_use(),
                TraceEvent::Unuse => self.metrics.record_unuse(),
                TraceEvent::Erase => {},
            }
            trace_line!(
                self,
                event,
                "{} {:?}. {} unused elements.",
                if held { "Using" } else { "Unusing" },
                key,
                self.unused_size.load(Ordering::Acquire)
            );
        }

        let evicted = if over_capacity {
            self.cleanup(&mut queue)
        } else {
            Vec::new()
        };
        drop(queue);
        drop(evicted);
    }

    /// Evicts from the front of the queue until it is back within
    /// `max_unused`. Caller holds the queue lock and drops the returned
    /// entries after releasing it.
    fn cleanup(&self, queue: &mut UnusedQueue<K>) -> Vec<Arc<Entry<V>>> {
        let mut evicted = Vec::new();
        while self.unused_size.load(Ordering::Acquire) > self.max_unused {
            let Some(key) = queue.pop_front() else {
                unreachable!("unused counter is ahead of an empty unused queue");
            };
            let remaining = self.unused_size.fetch_sub(1, Ordering::AcqRel) - 1;

            let removed = {
                let mut map = self.map.write();
                let Some(entry) = map.get(&key) else {
                    unreachable!("unused queue holds {key:?} but the map does not");
                };
                if entry.is_held() {
                    // Pinned after it was queued; its next release queues it again.
                    #[cfg(feature = "metrics")]
                    self.metrics.record_stale_pop();
                    continue;
                }
                entry.detach();
                map.remove(&key)
            };

            #[cfg(feature = "metrics")]
            self.metrics.record_evicted_entry();
            trace_line!(
                self,
                TraceEvent::Erase,
                "Erasing {:?}. {} unused elements.",
                key,
                remaining
            );
            evicted.extend(removed);
        }
        evicted
    }

    /// Checks that the unused queue, its counter and the map agree.
    ///
    /// Meant for quiescent moments (tests, fuzzing, shutdown): while other
    /// threads are mid-transition a key may legitimately be queued and held
    /// at once.
    ///
    /// # Errors
    ///
    /// An [`InvariantError`] describing the first disagreement found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let queue = self.unused.lock();
        let map = self.map.read();

        let size = self.unused_size.load(Ordering::Acquire);
        if size != queue.len() {
            return Err(InvariantError::new(format!(
                "unused counter is {size} but the unused queue holds {} keys",
                queue.len()
            )));
        }
        if size > self.max_unused {
            return Err(InvariantError::new(format!(
                "{size} unused entries exceed max_unused {}",
                self.max_unused
            )));
        }
        for key in queue.iter() {
            match map.get(key) {
                None => {
                    return Err(InvariantError::new(format!(
                        "queued key {key:?} is missing from the map"
                    )));
                },
                Some(entry) if entry.is_held() => {
                    return Err(InvariantError::new(format!(
                        "queued key {key:?} has {} live handles",
                        entry.holders()
                    )));
                },
                Some(_) => {},
            }
        }
        for (key, entry) in map.iter() {
            if entry.is_detached() {
                return Err(InvariantError::new(format!(
                    "entry for {key:?} is in the map but marked detached"
                )));
            }
            if !entry.is_held() && !queue.contains(key) {
                return Err(InvariantError::new(format!(
                    "unused entry {key:?} is not in the unused queue"
                )));
            }
        }
        Ok(())
    }

    /// Panicking form of [`check_invariants`](RefCache::check_invariants).
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("refcache invariant violated: {err}");
        }
        self.unused.lock().debug_validate_invariants();
    }

    /// Keys of unused entries, oldest first: the order they will be evicted
    /// in.
    pub fn unused_keys(&self) -> Vec<K> {
        self.unused.lock().iter().cloned().collect()
    }
}

impl<K, V, F> fmt::Debug for RefCache<K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCache")
            .field("len", &self.len())
            .field("unused_len", &self.unused_len())
            .field("max_unused", &self.max_unused)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "metrics")]
impl<K, V, F> RefCache<K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Counters plus current gauges.
    pub fn metrics_snapshot(&self) -> RefCacheMetricsSnapshot {
        RefCacheMetricsSnapshot {
            cache_len: self.len(),
            unused_len: self.unused_len(),
            max_unused: self.max_unused,
            ..self.metrics.counters()
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V, F> MetricsSnapshotProvider<RefCacheMetricsSnapshot> for RefCache<K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn snapshot(&self) -> RefCacheMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(feature = "metrics")]
impl<K, V, F> MetricsReset for RefCache<K, V, F>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn reset_metrics(&self) {
        self.metrics.reset_metrics();
    }
}
