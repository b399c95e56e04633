//! Shared cell stored in the map and referenced by handles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A cached value plus the bookkeeping that decides whether it is used.
///
/// `holders` counts live [`Handle`](crate::Handle)s only; the map's own
/// `Arc` is not included. It moves 0→1 only while the map lock is held,
/// which is what lets eviction trust a zero it reads under the write lock.
///
/// `detached` is set, with both the queue lock and the map write lock held,
/// when the entry leaves the map. Transitions reported for a detached entry
/// are ignored.
#[derive(Debug)]
pub(crate) struct Entry<V> {
    value: V,
    holders: AtomicUsize,
    detached: AtomicBool,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V) -> Self {
        Self {
            value,
            holders: AtomicUsize::new(0),
            detached: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// Adds a holder. Returns `true` if the entry was unused before.
    #[inline]
    pub(crate) fn pin(&self) -> bool {
        self.holders.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Drops a holder. Returns `true` if that was the last one.
    #[inline]
    pub(crate) fn unpin(&self) -> bool {
        let prev = self.holders.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "holder count underflow");
        prev == 1
    }

    #[inline]
    pub(crate) fn holders(&self) -> usize {
        self.holders.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_held(&self) -> bool {
        self.holders() > 0
    }

    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }
}
