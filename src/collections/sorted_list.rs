use std::fmt;
use std::vec;

/// A sequence that keeps itself sorted on every insert.
///
/// [`insert`](SortedList::insert) places the element at its lower bound, so
/// equal elements stay in a consistent order. Bulk construction sorts once
/// at the end instead of paying the per-insert search. The reactor keeps its
/// timer entries here and harvests the elapsed prefix with
/// [`drain_to`](SortedList::drain_to).
pub struct SortedList<T> {
    items: Vec<T>,
}

impl<T: Ord> SortedList<T> {
    #[must_use]
    pub fn new() -> SortedList<T> {
        SortedList { items: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> SortedList<T> {
        SortedList {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Takes an arbitrarily ordered vector, sorting it once.
    #[must_use]
    pub fn from_vec(mut items: Vec<T>) -> SortedList<T> {
        items.sort();
        SortedList { items }
    }

    /// Inserts `value` at its lower-bound position and returns the index it
    /// landed on.
    pub fn insert(&mut self, value: T) -> usize {
        let at = self.items.partition_point(|item| item < &value);
        self.items.insert(at, value);
        at
    }

    /// The smallest element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// The largest element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Removes and returns the smallest element.
    pub fn pop_first(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.remove(0))
    }

    /// Removes the ordered prefix of elements strictly smaller than
    /// `bound` and yields them in order.
    pub fn drain_to(&mut self, bound: &T) -> vec::Drain<'_, T> {
        let end = self.items.partition_point(|item| item < bound);
        self.items.drain(..end)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Ord> Default for SortedList<T> {
    fn default() -> SortedList<T> {
        SortedList::new()
    }
}

impl<T: Ord> FromIterator<T> for SortedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> SortedList<T> {
        SortedList::from_vec(iter.into_iter().collect())
    }
}

impl<T: fmt::Debug> fmt::Debug for SortedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::SortedList;

    #[test]
    fn single_inserts_stay_sorted() {
        let mut list = SortedList::new();
        for value in [5, 1, 4, 1, 3, 9, 2, 6] {
            list.insert(value);
        }
        let items: Vec<i32> = list.iter().copied().collect();
        let mut expected = vec![5, 1, 4, 1, 3, 9, 2, 6];
        expected.sort();
        assert_eq!(items, expected);
    }

    #[test]
    fn bulk_construction_equals_sorted_input() {
        let input = vec![9, 3, 7, 1, 8, 2, 2, 0];
        let list: SortedList<i32> = input.iter().copied().collect();
        let mut expected = input;
        expected.sort();
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn first_and_pop_first() {
        let mut list = SortedList::from_vec(vec![3, 1, 2]);
        assert_eq!(list.first(), Some(&1));
        assert_eq!(list.pop_first(), Some(1));
        assert_eq!(list.pop_first(), Some(2));
        assert_eq!(list.pop_first(), Some(3));
        assert_eq!(list.pop_first(), None);
    }

    #[test]
    fn drain_to_removes_strict_prefix() {
        let mut list = SortedList::from_vec(vec![1, 2, 3, 4, 5]);
        let drained: Vec<i32> = list.drain_to(&3).collect();
        assert_eq!(drained, vec![1, 2]);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert!(list.drain_to(&0).next().is_none());
    }
}
