//! Ordered container kept sorted by a caller-supplied comparator.
//!
//! Insertion scans from the head and places the new element immediately
//! before the first strictly-greater one, so equal-ranked elements keep
//! their arrival order. The delivery queue relies on that stability as an
//! observable scheduling guarantee; do not replace the scan with a binary
//! search or a heap.

use std::cmp::Ordering;
use std::collections::VecDeque;

/// A sequence kept sorted ascending under `compare`.
///
/// All operations are single-threaded; callers that share a list across
/// threads wrap it in their own lock (see [`crate::queue::DeliveryQueue`]).
pub struct SortedList<T, F> {
    items: VecDeque<T>,
    compare: F,
}

impl<T, F> SortedList<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Creates an empty list ordered by `compare`.
    pub fn new(compare: F) -> Self {
        Self {
            items: VecDeque::new(),
            compare,
        }
    }

    /// Current element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts `element` before the first strictly-greater element, or at
    /// the tail if none exists. O(n); equal-ranked elements stay FIFO.
    pub fn insert(&mut self, element: T) {
        let at = self
            .items
            .iter()
            .position(|current| (self.compare)(&element, current) == Ordering::Less)
            .unwrap_or(self.items.len());
        self.items.insert(at, element);
    }

    /// Returns the minimum element without removing it.
    #[must_use]
    pub fn peek_first(&self) -> Option<&T> {
        self.items.front()
    }

    /// Removes and returns the minimum element.
    ///
    /// `None` on an empty list is a logic error in the caller; check
    /// [`len`](Self::len) or [`peek_first`](Self::peek_first) first.
    pub fn remove_first(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// True if any element satisfies `predicate`. O(n).
    pub fn exists_matching<P>(&self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool,
    {
        self.items.iter().any(predicate)
    }

    /// Removes every element satisfying `predicate`; returns how many were
    /// removed. O(n), order of the survivors is unchanged.
    pub fn remove_matching<P>(&mut self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Equal keys with distinct values, for tie-break checks.
    #[derive(Debug, PartialEq, Eq)]
    struct Keyed {
        key: i32,
        value: i32,
    }

    fn keyed_list() -> SortedList<Keyed, impl Fn(&Keyed, &Keyed) -> Ordering> {
        SortedList::new(|a: &Keyed, b: &Keyed| a.key.cmp(&b.key))
    }

    #[test]
    fn sorted_property() {
        let mut list = SortedList::new(|a: &i32, b: &i32| a.cmp(b));

        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_eq!(list.peek_first(), None);

        list.insert(5);
        assert_eq!(list.len(), 1);
        assert_eq!(list.peek_first(), Some(&5));

        list.insert(2);
        assert_eq!(list.len(), 2);
        assert_eq!(list.peek_first(), Some(&2));

        list.insert(3);
        assert_eq!(list.len(), 3);
        assert_eq!(list.peek_first(), Some(&2));

        assert_eq!(list.remove_first(), Some(2));
        assert_eq!(list.peek_first(), Some(&3));
        assert_eq!(list.remove_first(), Some(3));
        assert_eq!(list.peek_first(), Some(&5));
        assert_eq!(list.remove_first(), Some(5));
        assert_eq!(list.peek_first(), None);
        assert_eq!(list.remove_first(), None);
    }

    #[test]
    fn equal_ranks_stay_fifo() {
        let mut list = keyed_list();
        let n = 100;

        for value in 1..=n {
            list.insert(Keyed { key: 100, value });
            // The first insert stays at the head; later equal keys go after.
            assert_eq!(list.peek_first().map(|k| k.value), Some(1));
            assert_eq!(list.len(), value as usize);
        }

        for value in 1..=n {
            let first = list.remove_first().expect("list still populated");
            assert_eq!(first, Keyed { key: 100, value });
            assert_eq!(list.len(), (n - value) as usize);
        }
    }

    #[test]
    fn remove_matching_is_exhaustive_and_idempotent() {
        let mut list = keyed_list();
        for (key, value) in [(5, 5), (10, 10), (2, 2), (3, 3), (5, 50)] {
            list.insert(Keyed { key, value });
        }
        assert_eq!(list.len(), 5);
        assert_eq!(list.peek_first().map(|k| k.key), Some(2));

        assert!(list.exists_matching(|k| k.key == 2));
        assert_eq!(list.remove_matching(|k| k.key == 2), 1);
        assert!(!list.exists_matching(|k| k.key == 2));
        assert_eq!(list.peek_first().map(|k| k.key), Some(3));

        assert_eq!(list.remove_matching(|k| k.key == 5), 2);
        assert!(!list.exists_matching(|k| k.key == 5));
        assert_eq!(list.len(), 2);

        assert_eq!(list.remove_matching(|k| k.key == 10), 1);
        assert_eq!(list.remove_matching(|k| k.key == 3), 1);
        assert!(list.is_empty());
        assert_eq!(list.peek_first(), None);

        // Removing again finds nothing.
        assert_eq!(list.remove_matching(|k| k.key == 3), 0);
    }

    #[test]
    fn interleaved_inserts_drain_in_order() {
        let mut list = SortedList::new(|a: &i32, b: &i32| a.cmp(b));
        for value in [9, 1, 7, 3, 5, 8, 2, 6, 4, 0] {
            list.insert(value);
        }
        let mut drained = Vec::new();
        while let Some(value) = list.remove_first() {
            drained.push(value);
        }
        assert_eq!(drained, (0..10).collect::<Vec<_>>());
    }
}
