//! Borrowing and owning traversals of a [`BirchSet`].
//!
//! All of them walk the tree through parent links, one successor or predecessor step at a
//! time, so no traversal needs a stack proportional to the tree height.

use core::iter::FusedIterator;

use crate::node::NodeIndex;
use crate::{BirchSet, Position};

/// Ascending iterator over the elements of a [`BirchSet`].
///
/// Double-ended: `iter().rev()` walks from the largest element down.
pub struct Iter<'a, K> {
    set: &'a BirchSet<K>,
    front: NodeIndex,
    back: NodeIndex,
    remaining: usize,
}

impl<'a, K> Iter<'a, K> {
    pub(crate) fn new(set: &'a BirchSet<K>) -> Self {
        Self {
            set,
            front: set.arena.successor(NodeIndex::SENTINEL),
            back: set.arena.predecessor(NodeIndex::SENTINEL),
            remaining: set.len,
        }
    }
}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            set: self.set,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let key = self.set.arena.key(self.front);
        self.front = self.set.arena.successor(self.front);
        self.remaining -= 1;

        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let key = self.set.arena.key(self.back);
        self.back = self.set.arena.predecessor(self.back);
        self.remaining -= 1;

        Some(key)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<'a, K> IntoIterator for &'a BirchSet<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over the elements of a [`BirchSet`], in ascending order.
pub struct IntoIter<K> {
    set: BirchSet<K>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.set.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<K> DoubleEndedIterator for IntoIter<K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.set.pop_last()
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

impl<K> FusedIterator for IntoIter<K> {}

impl<K> IntoIterator for BirchSet<K> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { set: self }
    }
}

/// A bidirectional cursor over a [`BirchSet`].
///
/// The cursor sits either on an element or on the end position. Moving past either end lands
/// on the end position, and moving on from there wraps around to the other end.
#[derive(Debug)]
pub struct Cursor<'a, K> {
    set: &'a BirchSet<K>,
    current: NodeIndex,
}

impl<'a, K> Cursor<'a, K> {
    pub(crate) fn new(set: &'a BirchSet<K>, current: NodeIndex) -> Self {
        Self { set, current }
    }

    /// Element under the cursor, or `None` at the end position.
    pub fn current(&self) -> Option<&'a K> {
        self.set.arena.get(self.current)
    }

    pub fn position(&self) -> Position {
        Position(self.current)
    }

    pub fn move_next(&mut self) {
        self.current = self.set.arena.successor(self.current);
    }

    pub fn move_prev(&mut self) {
        self.current = self.set.arena.predecessor(self.current);
    }

    pub fn peek_next(&self) -> Option<&'a K> {
        self.set.arena.get(self.set.arena.successor(self.current))
    }

    pub fn peek_prev(&self) -> Option<&'a K> {
        self.set.arena.get(self.set.arena.predecessor(self.current))
    }
}

impl<K> Clone for Cursor<'_, K> {
    fn clone(&self) -> Self {
        Self::new(self.set, self.current)
    }
}

#[cfg(test)]
mod tests {
    use crate::BirchSet;

    #[test]
    pub fn ascending_and_descending() {
        let tree = BirchSet::from([5, 3, 8, 1, 4]);

        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [1, 3, 4, 5, 8]);
        assert_eq!(tree.iter().rev().copied().collect::<Vec<_>>(), [8, 5, 4, 3, 1]);
        assert_eq!(tree.iter().len(), 5);
    }

    #[test]
    pub fn both_ends_meet() {
        let tree = BirchSet::from([5, 3, 8, 1, 4]);
        let mut iter = tree.iter();

        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&8));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), Some(&4));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    pub fn empty_iteration() {
        let tree = BirchSet::<u8>::new();

        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.iter().next_back(), None);
        assert_eq!(tree.into_iter().next(), None);
    }

    #[test]
    pub fn owning_iteration() {
        let tree = BirchSet::from([String::from("b"), String::from("c"), String::from("a")]);
        let mut iter = tree.into_iter();

        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back().as_deref(), Some("c"));
        assert_eq!(iter.collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    pub fn reference_loop() {
        let tree = BirchSet::from([2, 1, 3]);
        let mut sum = 0;

        for key in &tree {
            sum = sum * 10 + key;
        }

        assert_eq!(sum, 123);
    }

    #[test]
    pub fn cursor_walk() {
        let tree = BirchSet::from([5, 3, 8]);
        let mut cursor = tree.cursor_front();

        assert_eq!(cursor.current(), Some(&3));
        assert_eq!(cursor.peek_prev(), None);
        assert_eq!(cursor.peek_next(), Some(&5));

        cursor.move_next();
        cursor.move_next();
        assert_eq!(cursor.current(), Some(&8));

        cursor.move_next();
        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.position(), tree.end());

        cursor.move_next();
        assert_eq!(cursor.current(), Some(&3));

        cursor.move_prev();
        cursor.move_prev();
        assert_eq!(cursor.current(), Some(&8));
    }

    #[test]
    pub fn cursor_from_bound() {
        let tree = BirchSet::from([10, 20, 30, 40]);
        let mut cursor = tree.cursor_at(tree.lower_bound(&25));
        let mut seen = Vec::new();

        while let Some(key) = cursor.current() {
            seen.push(*key);
            cursor.move_next();
        }

        assert_eq!(seen, [30, 40]);
        assert_eq!(tree.cursor_back().current(), Some(&40));
    }
}
