//! Tests for IndexedPriorityQueue

#[cfg(test)]
mod tests {
    use super::super::*;

    /// Mirrors the search ordering: total cost first, then estimate, then id.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct TestItem {
        f: u32,
        h: u32,
        id: usize,
    }

    impl HeapItem for TestItem {
        fn heap_key(&self) -> usize {
            self.id
        }
    }

    fn item(id: usize, f: u32, h: u32) -> TestItem {
        TestItem { f, h, id }
    }

    /// Walk the backing array and verify the heap property and position slots.
    fn assert_consistent(queue: &IndexedPriorityQueue<TestItem>) {
        let items: Vec<_> = queue.iter().copied().collect();
        for (pos, it) in items.iter().enumerate() {
            if pos > 0 {
                let parent = (pos - 1) / 2;
                assert!(items[parent] <= *it, "Heap property violated at {}", pos);
            }
            assert!(queue.contains(it.id), "Queued item {} not reported by contains", it.id);
            assert_eq!(queue.get(it.id), Some(it), "Position slot for {} is stale", it.id);
        }
    }

    #[test]
    fn test_pop_returns_ascending_order() {
        let mut queue = IndexedPriorityQueue::new(10);
        for (id, f) in [(0, 50), (1, 10), (2, 40), (3, 20), (4, 30)] {
            queue.push(item(id, f, 0));
        }
        assert_eq!(queue.len(), 5);
        assert_consistent(&queue);

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_min()).map(|i| i.f).collect();
        assert_eq!(order, vec![10, 20, 30, 40, 50]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tie_break_prefers_lower_estimate() {
        let mut queue = IndexedPriorityQueue::new(10);
        queue.push(item(0, 56, 30));
        queue.push(item(1, 56, 10));
        queue.push(item(2, 56, 20));

        assert_eq!(queue.pop_min().map(|i| i.id), Some(1));
        assert_eq!(queue.pop_min().map(|i| i.id), Some(2));
        assert_eq!(queue.pop_min().map(|i| i.id), Some(0));
    }

    #[test]
    fn test_contains_tracks_membership() {
        let mut queue = IndexedPriorityQueue::new(4);
        assert!(!queue.contains(2));

        queue.push(item(2, 5, 0));
        assert!(queue.contains(2));
        assert!(!queue.contains(3));
        assert!(!queue.contains(99), "Out-of-range key must not be reported as queued");

        queue.pop_min();
        assert!(!queue.contains(2), "Popped item must leave the queue");
    }

    #[test]
    fn test_decrease_key_moves_item_to_front() {
        let mut queue = IndexedPriorityQueue::new(8);
        for id in 0..6 {
            queue.push(item(id, 100 + id as u32 * 10, 0));
        }

        assert!(queue.update(item(5, 1, 0)));
        assert_consistent(&queue);
        assert_eq!(queue.peek().map(|i| i.id), Some(5));
        assert_eq!(queue.len(), 6, "Update must not duplicate the item");
    }

    #[test]
    fn test_increase_key_sinks_item() {
        let mut queue = IndexedPriorityQueue::new(8);
        for id in 0..6 {
            queue.push(item(id, id as u32, 0));
        }

        assert!(queue.update(item(0, 1000, 0)));
        assert_consistent(&queue);

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_min()).map(|i| i.id).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn test_update_unknown_key_is_rejected() {
        let mut queue = IndexedPriorityQueue::new(4);
        queue.push(item(0, 1, 0));
        assert!(!queue.update(item(1, 0, 0)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_push_existing_key_replaces_priority() {
        let mut queue = IndexedPriorityQueue::new(4);
        queue.push(item(1, 40, 0));
        queue.push(item(2, 30, 0));
        queue.push(item(1, 10, 0));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_min(), Some(item(1, 10, 0)));
    }

    #[test]
    fn test_clear_resets_positions() {
        let mut queue = IndexedPriorityQueue::new(4);
        queue.push(item(0, 1, 0));
        queue.push(item(3, 2, 0));
        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.contains(0));
        assert!(!queue.contains(3));

        queue.push(item(3, 7, 0));
        assert_eq!(queue.pop_min(), Some(item(3, 7, 0)));
    }

    #[test]
    fn test_random_operations_match_sorted_reference() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let key_space = 64;
        let mut queue = IndexedPriorityQueue::new(key_space);
        let mut reference: Vec<Option<TestItem>> = vec![None; key_space];

        for _ in 0..2000 {
            let id = rng.usize(0..key_space);
            match rng.u8(0..3) {
                0 => {
                    let it = item(id, rng.u32(0..500), rng.u32(0..50));
                    queue.push(it);
                    reference[id] = Some(it);
                }
                1 => {
                    if queue.contains(id) {
                        let it = item(id, rng.u32(0..500), rng.u32(0..50));
                        assert!(queue.update(it));
                        reference[id] = Some(it);
                    }
                }
                _ => {
                    let expected = reference.iter().flatten().min().copied();
                    let popped = queue.pop_min();
                    assert_eq!(popped, expected);
                    if let Some(p) = popped {
                        reference[p.id] = None;
                    }
                }
            }
        }
        assert_consistent(&queue);
        assert_eq!(queue.len(), reference.iter().flatten().count());
    }
}
