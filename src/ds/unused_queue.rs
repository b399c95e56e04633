//! FIFO of keys ordered by the moment they became unused.
//!
//! An `IntrusiveList` holds the order and an index maps each key to its
//! node, so a key that is picked up again can be pulled out of the middle
//! of the queue without a scan.
//!
//! ```text
//!   index: FxHashMap<K, SlotId>        list: IntrusiveList<K>
//!   ┌─────────┬─────────┐              head ─► [A] ◄──► [B] ◄──► [C] ◄── tail
//!   │  key A  │  id_1   │              oldest unused          newest unused
//!   │  key B  │  id_2   │
//!   └─────────┴─────────┘
//! ```
//!
//! - `push_back(k)`: appends `k` unless it is already queued
//! - `remove(k)`: unlinks `k` wherever it sits
//! - `pop_front()`: takes the oldest key
//!
//! All three are O(1) average. The queue itself is unbounded; the owning
//! cache decides when to pop.
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::{IntrusiveList, IntrusiveListIter};
use crate::ds::slot_arena::SlotId;

/// Keys of unreferenced entries, oldest first. No key appears twice.
#[derive(Debug)]
pub struct UnusedQueue<K> {
    list: IntrusiveList<K>,
    index: FxHashMap<K, SlotId>,
}

impl<K> UnusedQueue<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Oldest queued key, if any.
    pub fn front(&self) -> Option<&K> {
        self.list.front()
    }

    /// Appends `key` at the back. Returns `false` if it was already queued,
    /// in which case its position is left alone.
    pub fn push_back(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let id = self.list.push_back(key.clone());
        self.index.insert(key, id);
        true
    }

    /// Removes `key`; returns `true` if it was queued.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    /// Removes and returns the oldest key.
    pub fn pop_front(&mut self) -> Option<K> {
        let key = self.list.pop_front()?;
        self.index.remove(&key);
        Some(key)
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> IntrusiveListIter<'_, K> {
        self.list.iter()
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.list.debug_validate_invariants();
        assert_eq!(self.list.len(), self.index.len());
        for key in self.list.iter() {
            let id = self.index.get(key).expect("queued key missing from index");
            assert!(self.list.contains(*id));
        }
    }
}

impl<K> Default for UnusedQueue<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(queue: &UnusedQueue<&'static str>) -> Vec<&'static str> {
        queue.iter().copied().collect()
    }

    #[test]
    fn unused_queue_pops_oldest_first() {
        let mut queue = UnusedQueue::new();
        assert!(queue.push_back("a"));
        assert!(queue.push_back("b"));
        assert!(queue.push_back("c"));

        assert_eq!(queue.front(), Some(&"a"));
        assert_eq!(queue.pop_front(), Some("a"));
        assert_eq!(queue.pop_front(), Some("b"));
        assert!(!queue.contains(&"a"));
        assert_eq!(queue.len(), 1);
        queue.debug_validate_invariants();
    }

    #[test]
    fn unused_queue_rejects_duplicates() {
        let mut queue = UnusedQueue::new();
        assert!(queue.push_back("a"));
        assert!(queue.push_back("b"));
        assert!(!queue.push_back("a"));

        assert_eq!(queue.len(), 2);
        assert_eq!(order(&queue), vec!["a", "b"]);
    }

    #[test]
    fn unused_queue_reuse_moves_key_to_back() {
        let mut queue = UnusedQueue::with_capacity(4);
        queue.push_back("a");
        queue.push_back("b");
        queue.push_back("c");

        // "a" picked up again, then released again.
        assert!(queue.remove(&"a"));
        assert!(queue.push_back("a"));

        assert_eq!(order(&queue), vec!["b", "c", "a"]);
        queue.debug_validate_invariants();
    }

    #[test]
    fn unused_queue_remove_missing_is_noop() {
        let mut queue = UnusedQueue::new();
        queue.push_back(1u64);
        assert!(!queue.remove(&2));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_front(), Some(1));
        assert_eq!(queue.pop_front(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn unused_queue_clear_resets_state() {
        let mut queue = UnusedQueue::new();
        queue.push_back("a");
        queue.push_back("b");
        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.contains(&"a"));
        assert!(queue.push_back("a"));
        assert_eq!(order(&queue), vec!["a"]);
        queue.debug_validate_invariants();
    }
}
