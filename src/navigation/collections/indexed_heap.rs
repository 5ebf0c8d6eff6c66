//! Indexed binary heap: a min-priority queue with decrease-key.
//!
//! # Purpose
//!
//! A* needs to re-prioritise cells that are already on the frontier when a
//! cheaper route to them is found. `std::collections::BinaryHeap` cannot do
//! that without pushing duplicates, so this heap keeps a **position slot**
//! per item key and updates it on every swap.
//!
//! # Type Constraints
//!
//! `T::heap_key()` must return a DENSE index below the `key_space` passed to
//! [`IndexedPriorityQueue::new`] (cell indices of a grid are a perfect fit).
//! Two items with the same key are the same logical element: pushing a key
//! that is already queued replaces its priority instead of duplicating it.
//!
//! # Complexity
//!
//! | Operation  | Cost     |
//! |------------|----------|
//! | `push`     | O(log n) |
//! | `pop_min`  | O(log n) |
//! | `update`   | O(log n) |
//! | `contains` | O(1)     |

/// Sentinel stored in a position slot for keys that are not queued.
const NOT_QUEUED: usize = usize::MAX;

/// An element that can live in an [`IndexedPriorityQueue`].
///
/// Ordering is ascending: the smallest item (by `Ord`) is popped first.
pub trait HeapItem: Ord {
    /// Dense identifier locating this item's position slot.
    fn heap_key(&self) -> usize;
}

/// Array-backed binary min-heap with O(1) membership and O(log n) key updates.
#[derive(Debug, Clone)]
pub struct IndexedPriorityQueue<T: HeapItem> {
    items: Vec<T>,
    /// `positions[key]` = index of that key in `items`, or `NOT_QUEUED`.
    positions: Vec<usize>,
}

impl<T: HeapItem> IndexedPriorityQueue<T> {
    /// Create an empty queue accepting keys in `0..key_space`.
    pub fn new(key_space: usize) -> Self {
        Self {
            items: Vec::new(),
            positions: vec![NOT_QUEUED; key_space],
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Size of the key space this queue was created with.
    pub fn key_space(&self) -> usize {
        self.positions.len()
    }

    /// Whether an item with this key is currently queued.
    #[inline]
    pub fn contains(&self, key: usize) -> bool {
        self.positions.get(key).is_some_and(|&pos| pos != NOT_QUEUED)
    }

    /// Borrow the queued item with this key, if any.
    pub fn get(&self, key: usize) -> Option<&T> {
        match self.positions.get(key) {
            Some(&pos) if pos != NOT_QUEUED => self.items.get(pos),
            _ => None,
        }
    }

    /// Smallest item without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Insert an item. If its key is already queued this behaves like
    /// [`update`](Self::update).
    ///
    /// # Panics
    /// Panics if `item.heap_key()` is outside the key space.
    pub fn push(&mut self, item: T) {
        let key = item.heap_key();
        assert!(
            key < self.positions.len(),
            "heap key {} outside key space {}",
            key,
            self.positions.len()
        );

        if self.contains(key) {
            self.update(item);
            return;
        }

        let pos = self.items.len();
        self.items.push(item);
        self.positions[key] = pos;
        self.sift_up(pos);
    }

    /// Remove and return the smallest item.
    pub fn pop_min(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }

        let last = self.items.len() - 1;
        self.swap(0, last);
        let item = self.items.pop()?;
        self.positions[item.heap_key()] = NOT_QUEUED;

        if !self.items.is_empty() {
            self.sift_down(0);
        }
        Some(item)
    }

    /// Replace the queued item sharing `item`'s key and restore heap order.
    ///
    /// Works for both decreased and increased priorities. Returns `false`
    /// (and drops `item`) when the key is not queued.
    pub fn update(&mut self, item: T) -> bool {
        let key = item.heap_key();
        let Some(&pos) = self.positions.get(key) else {
            return false;
        };
        if pos == NOT_QUEUED {
            return false;
        }

        self.items[pos] = item;
        let pos = self.sift_up(pos);
        self.sift_down(pos);
        true
    }

    /// Remove every item, keeping allocations.
    pub fn clear(&mut self) {
        for item in self.items.drain(..) {
            self.positions[item.heap_key()] = NOT_QUEUED;
        }
    }

    /// Iterate queued items in heap (not priority) order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    // ------------------------------------------------------------------
    // Heap maintenance
    // ------------------------------------------------------------------

    /// Swap two slots and keep both position entries in sync.
    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.items.swap(a, b);
        self.positions[self.items[a].heap_key()] = a;
        self.positions[self.items[b].heap_key()] = b;
    }

    /// Move the item at `pos` towards the root; returns its final slot.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.items[pos] < self.items[parent] {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
        pos
    }

    /// Move the item at `pos` towards the leaves; returns its final slot.
    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.items.len();
        loop {
            let left = pos * 2 + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.items[left] < self.items[smallest] {
                smallest = left;
            }
            if right < len && self.items[right] < self.items[smallest] {
                smallest = right;
            }
            if smallest == pos {
                return pos;
            }

            self.swap(pos, smallest);
            pos = smallest;
        }
    }
}
