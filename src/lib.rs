//! An ordered set backed by an unbalanced binary search tree.
//!
//! Nodes keep a back-reference to their parent, so in-order traversal, bound queries and
//! removal all work by walking links rather than by recursion. A sentinel node anchors the
//! root and doubles as the one-past-the-end [`Position`].
//!
//! The tree never rebalances: inserting keys in sorted order degrades it to a linked list.
//! Every operation that walks the whole tree (`clear`, `Drop`, `Clone`, `height`) does so by
//! climbing parent links, so such trees stay safe to handle regardless of their height.
//!
//! ```
//! use birchset::BirchSet;
//!
//! let mut set = BirchSet::new();
//! for key in [5, 3, 8, 1, 4] {
//!     set.insert(key);
//! }
//!
//! let five = set.find(&5);
//! let next = set.erase(five);
//! assert_eq!(set.get(next), Some(&8));
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3, 4, 8]);
//! ```

extern crate alloc;

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;

use alloc::vec::Vec;

pub mod error;
pub mod iter;
mod node;

pub use error::{Error, Result};
pub use iter::{Cursor, IntoIter, Iter};

use node::{NodeArena, NodeIndex, Side};

/// A position inside a [`BirchSet`], either a live element or [`BirchSet::end`].
///
/// Positions are plain handles: they do not borrow the set and stay valid across insertions
/// and across removals of *other* elements. Once the element a position names is removed,
/// the position is stale. Reading through a stale position returns `None`, unless a later
/// insertion has reused the node, in which case it names that newer element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position(NodeIndex);

impl Position {
    /// Returns `true` if this is the one-past-the-end position.
    pub fn is_end(self) -> bool {
        self.0.is_sentinel()
    }
}

enum Descent {
    Found(NodeIndex),
    Vacant(NodeIndex, Side),
}

/// An ordered set of unique keys, stored in an unbalanced binary search tree.
///
/// See the [crate documentation](crate) for an overview.
pub struct BirchSet<K> {
    arena: NodeArena<K>,
    len: usize,
}

impl<K> BirchSet<K> {
    /// Creates an empty set. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            len: 0,
        }
    }

    /// Creates an empty set with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: NodeArena::with_capacity(capacity),
            len: 0,
        }
    }

    /// Reserves node storage for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.arena.reserve(additional);
    }

    /// Fallible version of [`BirchSet::reserve`].
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.arena.try_reserve(additional)?;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.root().is_none()
    }

    /// Number of nodes on the longest root-to-leaf path; `0` for an empty set.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut depth = 0;
        let mut curr = self.arena.root();

        while let Some(idx) = curr {
            depth += 1;
            height = height.max(depth);

            let links = self.arena.links(idx);
            if let Some(child) = links.left.or(links.right) {
                curr = Some(child);
                continue;
            }

            curr = None;
            let mut climb = idx;
            while let Some(parent) = self.arena.links(climb).parent.filter(|p| !p.is_sentinel()) {
                depth -= 1;
                let parent_links = self.arena.links(parent);
                if parent_links.left == Some(climb) && parent_links.right.is_some() {
                    curr = parent_links.right;
                    break;
                }
                climb = parent;
            }
        }

        height
    }

    /// Position of the smallest element, or [`BirchSet::end`] when empty.
    #[must_use]
    pub fn begin(&self) -> Position {
        Position(self.arena.subtree_min(NodeIndex::SENTINEL))
    }

    /// The one-past-the-last position.
    #[must_use]
    pub fn end(&self) -> Position {
        Position(NodeIndex::SENTINEL)
    }

    /// Element at `position`, or `None` for [`BirchSet::end`] and stale positions.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<&K> {
        self.arena.get(position.0)
    }

    /// Position following `position` in ascending order.
    ///
    /// The successor of the last element is [`BirchSet::end`], and the successor of `end` is
    /// [`BirchSet::begin`].
    ///
    /// # Panics
    ///
    /// Panics if `position` is stale.
    #[must_use]
    pub fn next_position(&self, position: Position) -> Position {
        Position(self.arena.successor(position.0))
    }

    /// Position preceding `position` in ascending order.
    ///
    /// The predecessor of [`BirchSet::end`] is the last element, and the predecessor of the
    /// first element is `end`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is stale.
    #[must_use]
    pub fn prev_position(&self, position: Position) -> Position {
        Position(self.arena.predecessor(position.0))
    }

    #[must_use]
    pub fn first(&self) -> Option<&K> {
        self.get(self.begin())
    }

    #[must_use]
    pub fn last(&self) -> Option<&K> {
        self.get(self.prev_position(self.end()))
    }

    pub fn pop_first(&mut self) -> Option<K> {
        let first = self.begin();
        if first.is_end() {
            return None;
        }

        Some(self.remove_node(first.0).0)
    }

    pub fn pop_last(&mut self) -> Option<K> {
        let last = self.prev_position(self.end());
        if last.is_end() {
            return None;
        }

        Some(self.remove_node(last.0).0)
    }

    /// Removes the element at `position` and returns the position of its successor.
    ///
    /// Positions of all other elements stay valid and keep naming the same elements.
    ///
    /// # Panics
    ///
    /// Panics if `position` is [`BirchSet::end`] or does not name a live element.
    pub fn erase(&mut self, position: Position) -> Position {
        Position(self.remove_node(position.0).1)
    }

    fn remove_node(&mut self, cur: NodeIndex) -> (K, NodeIndex) {
        assert!(
            self.arena.is_live(cur),
            "erase called with a position that does not name a live element"
        );

        let links = *self.arena.links(cur);
        let next = match (links.left, links.right) {
            (Some(_), Some(right)) => {
                // `next` has no left child. once it takes over the place of `cur`, `cur` is
                // left with at most a right child and can be spliced out.
                let next = self.arena.subtree_min(right);
                self.arena.swap_positions(cur, next);
                next
            }
            _ => self.arena.successor(cur),
        };

        let key = self.arena.splice_out(cur);
        self.len -= 1;

        (key, next)
    }

    /// Removes every element. The tree is torn down in post-order without recursion.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            log::trace!("tearing down {} nodes", self.len);
        }

        self.arena.clear();
        self.len = 0;
    }

    /// Exchanges the contents of two sets in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(self)
    }

    /// Cursor positioned at `position`.
    pub fn cursor_at(&self, position: Position) -> Cursor<'_, K> {
        Cursor::new(self, position.0)
    }

    /// Cursor positioned at the smallest element, or at the end when empty.
    pub fn cursor_front(&self) -> Cursor<'_, K> {
        self.cursor_at(self.begin())
    }

    /// Cursor positioned at the largest element, or at the end when empty.
    pub fn cursor_back(&self) -> Cursor<'_, K> {
        self.cursor_at(self.prev_position(self.end()))
    }

    /// Checks the structural invariants of the tree, panicking on the first violation.
    ///
    /// Verified: every child names its parent, the sentinel has no parent and no right child,
    /// the element count matches, and in-order traversal is strictly ascending.
    pub fn assert_invariants(&self)
    where
        K: Ord + fmt::Debug,
    {
        let sentinel = self.arena.links(NodeIndex::SENTINEL);
        assert_eq!(sentinel.parent, None, "sentinel has a parent");
        assert_eq!(sentinel.right, None, "sentinel has a right child");

        let mut count = 0;
        let mut curr = self.arena.root();
        while let Some(idx) = curr {
            count += 1;

            let parent = self.arena.links(idx).parent.expect("value node without parent");
            let links = self.arena.links(parent);
            assert!(
                links.left == Some(idx) || links.right == Some(idx),
                "{idx:?} is not a child of its parent {parent:?}"
            );

            curr = self.arena.preorder_next(idx);
        }
        assert_eq!(count, self.len, "node count does not match len");

        let mut keys = self.iter();
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev < key, "keys out of order: {prev:?} before {key:?}");
                prev = key;
            }
        }
    }
}

impl<K: Ord> BirchSet<K> {
    fn descend<Q>(&self, key: &Q) -> Descent
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut parent = NodeIndex::SENTINEL;
        let mut side = Side::Left;

        while let Some(curr) = self.arena.links(parent).child(side) {
            match key.cmp(self.arena.key(curr).borrow()) {
                Ordering::Less => side = Side::Left,
                Ordering::Equal => return Descent::Found(curr),
                Ordering::Greater => side = Side::Right,
            }
            parent = curr;
        }

        Descent::Vacant(parent, side)
    }

    /// Inserts `key`, returning its position and whether it was newly inserted.
    ///
    /// If an equivalent element is already present, the set is unchanged, `key` is dropped,
    /// and the existing element's position is returned with `false`.
    pub fn insert(&mut self, key: K) -> (Position, bool) {
        match self.descend(&key) {
            Descent::Found(idx) => (Position(idx), false),
            Descent::Vacant(parent, side) => (self.link_leaf(parent, side, key), true),
        }
    }

    /// Like [`BirchSet::insert`], but reports allocation failure instead of aborting.
    ///
    /// On error the set is left exactly as it was.
    pub fn try_insert(&mut self, key: K) -> Result<(Position, bool)> {
        match self.descend(&key) {
            Descent::Found(idx) => Ok((Position(idx), false)),
            Descent::Vacant(parent, side) => {
                if let Err(err) = self.arena.try_reserve_node() {
                    log::debug!("node allocation failed during insert: {err}");
                    return Err(err.into());
                }

                Ok((self.link_leaf(parent, side, key), true))
            }
        }
    }

    fn link_leaf(&mut self, parent: NodeIndex, side: Side, key: K) -> Position {
        let idx = self.arena.alloc_node(parent, side, key);
        self.len += 1;

        Position(idx)
    }

    /// Position of the element equivalent to `key`, or [`BirchSet::end`].
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.descend(key) {
            Descent::Found(idx) => Position(idx),
            Descent::Vacant(..) => self.end(),
        }
    }

    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        matches!(self.descend(key), Descent::Found(_))
    }

    /// Removes the element equivalent to `key`. Returns whether one was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes and returns the element equivalent to `key`.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.descend(key) {
            Descent::Found(idx) => Some(self.remove_node(idx).0),
            Descent::Vacant(..) => None,
        }
    }

    /// Position of the first element not less than `key`, or [`BirchSet::end`].
    #[must_use]
    pub fn lower_bound<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bound_by(|node: &K| Borrow::<Q>::borrow(node) < key)
    }

    /// Position of the first element greater than `key`, or [`BirchSet::end`].
    #[must_use]
    pub fn upper_bound<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bound_by(|node: &K| Borrow::<Q>::borrow(node) <= key)
    }

    /// Leftmost node for which `too_small` is false. `too_small` must be monotone over the
    /// in-order sequence.
    fn bound_by(&self, too_small: impl Fn(&K) -> bool) -> Position {
        let mut best = NodeIndex::SENTINEL;
        let mut curr = self.arena.root();

        while let Some(idx) = curr {
            let links = self.arena.links(idx);
            if too_small(self.arena.key(idx)) {
                curr = links.right;
            } else {
                best = idx;
                curr = links.left;
            }
        }

        Position(best)
    }
}

impl<K: Clone> BirchSet<K> {
    /// Copies the set, reporting allocation failure instead of aborting.
    ///
    /// All node storage is reserved before the first key is cloned, so a failure leaves
    /// nothing half-built.
    pub fn try_clone(&self) -> Result<Self> {
        let mut slots = Vec::new();
        if let Err(err) = slots.try_reserve_exact(self.len) {
            log::debug!("node allocation failed while copying {} elements: {err}", self.len);
            return Err(err.into());
        }

        Ok(Self {
            arena: self.arena.duplicate(slots),
            len: self.len,
        })
    }

    /// Replaces the contents of `self` with a copy of `source`.
    ///
    /// The copy is built completely before being swapped in, so on error `self` is untouched.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<()> {
        let mut copy = source.try_clone()?;
        self.swap(&mut copy);

        Ok(())
    }
}

impl<K> Drop for BirchSet<K> {
    fn drop(&mut self) {
        self.arena.clear();
    }
}

impl<K: Clone> Clone for BirchSet<K> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.duplicate(Vec::with_capacity(self.len)),
            len: self.len,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();
        self.swap(&mut copy);
    }
}

impl<K> Default for BirchSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for BirchSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq> PartialEq for BirchSet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq> Eq for BirchSet<K> {}

impl<K: Ord> FromIterator<K> for BirchSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K: Ord> Extend<K> for BirchSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K: Ord + Copy + 'a> Extend<&'a K> for BirchSet<K> {
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for BirchSet<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

/// Exchanges the contents of two sets. Same as [`BirchSet::swap`].
pub fn swap<K>(first: &mut BirchSet<K>, second: &mut BirchSet<K>) {
    first.swap(second);
}
