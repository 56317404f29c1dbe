use std::collections::TryReserveError;

use alloc::vec::Vec;

/*
node storage is a vector of slots. erased slots are chained into a free list through
`Slot::Vacant`, so the index of a live node never changes until that node is erased.

the sentinel is not part of the vector: it sits by value in the arena and is addressed through
`NodeIndex::SENTINEL`. its left link is the root, its right link is always empty and it has no
parent, which makes it the last stop of every climb.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    pub(crate) const SENTINEL: NodeIndex = NodeIndex(usize::MAX);

    pub(crate) fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Links {
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) left: Option<NodeIndex>,
    pub(crate) right: Option<NodeIndex>,
}

impl Links {
    fn leaf(parent: NodeIndex) -> Self {
        Self {
            parent: Some(parent),
            left: None,
            right: None,
        }
    }

    pub(crate) fn child(&self, side: Side) -> Option<NodeIndex> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn child_mut(&mut self, side: Side) -> &mut Option<NodeIndex> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[derive(Debug)]
pub(crate) struct BirchNode<K> {
    pub(crate) links: Links,
    pub(crate) key: K,
}

#[derive(Debug)]
pub(crate) enum Slot<K> {
    Occupied(BirchNode<K>),
    Vacant { next_free: Option<NodeIndex> },
}

#[derive(Debug)]
pub(crate) struct NodeArena<K> {
    sentinel: Links,
    slots: Vec<Slot<K>>,
    free_head: Option<NodeIndex>,
}

impl<K> NodeArena<K> {
    pub(crate) const fn new() -> Self {
        Self {
            sentinel: Links {
                parent: None,
                left: None,
                right: None,
            },
            slots: Vec::new(),
            free_head: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub(crate) fn root(&self) -> Option<NodeIndex> {
        self.sentinel.left
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.slots.try_reserve(additional)
    }

    /// Makes sure the next [`NodeArena::alloc_node`] cannot allocate.
    pub(crate) fn try_reserve_node(&mut self) -> Result<(), TryReserveError> {
        if self.free_head.is_some() {
            return Ok(());
        }

        self.slots.try_reserve(1)
    }

    /// Returns `true` if `idx` denotes a live value node of this arena.
    pub(crate) fn is_live(&self, idx: NodeIndex) -> bool {
        matches!(self.slots.get(idx.0), Some(Slot::Occupied(_)))
    }

    pub(crate) fn get(&self, idx: NodeIndex) -> Option<&K> {
        match self.slots.get(idx.0) {
            Some(Slot::Occupied(node)) => Some(&node.key),
            _ => None,
        }
    }

    pub(crate) fn key(&self, idx: NodeIndex) -> &K {
        match &self.slots[idx.0] {
            Slot::Occupied(node) => &node.key,
            Slot::Vacant { .. } => panic!("node index {idx:?} refers to a vacant slot"),
        }
    }

    pub(crate) fn links(&self, idx: NodeIndex) -> &Links {
        if idx.is_sentinel() {
            return &self.sentinel;
        }

        match &self.slots[idx.0] {
            Slot::Occupied(node) => &node.links,
            Slot::Vacant { .. } => panic!("node index {idx:?} refers to a vacant slot"),
        }
    }

    fn links_mut(&mut self, idx: NodeIndex) -> &mut Links {
        if idx.is_sentinel() {
            return &mut self.sentinel;
        }

        match &mut self.slots[idx.0] {
            Slot::Occupied(node) => &mut node.links,
            Slot::Vacant { .. } => panic!("node index {idx:?} refers to a vacant slot"),
        }
    }

    fn set_parent(&mut self, child: Option<NodeIndex>, parent: NodeIndex) {
        if let Some(child) = child {
            self.links_mut(child).parent = Some(parent);
        }
    }

    /// Which child slot of its parent `idx` hangs from.
    pub(crate) fn side_of(&self, idx: NodeIndex) -> (NodeIndex, Side) {
        let parent = self
            .links(idx)
            .parent
            .expect("the sentinel has no parent slot");

        if self.links(parent).left == Some(idx) {
            (parent, Side::Left)
        } else {
            (parent, Side::Right)
        }
    }

    /// Creates a leaf holding `key` and links it into `side` of `parent`.
    ///
    /// The slot of `parent` must be empty.
    pub(crate) fn alloc_node(&mut self, parent: NodeIndex, side: Side, key: K) -> NodeIndex {
        let node = Slot::Occupied(BirchNode {
            links: Links::leaf(parent),
            key,
        });

        let idx = match self.free_head {
            Some(free) => {
                if let Slot::Vacant { next_free } = self.slots[free.0] {
                    self.free_head = next_free;
                }
                self.slots[free.0] = node;
                free
            }
            None => {
                self.slots.push(node);
                NodeIndex(self.slots.len() - 1)
            }
        };

        debug_assert!(self.links(parent).child(side).is_none());
        *self.links_mut(parent).child_mut(side) = Some(idx);

        idx
    }

    fn free_node(&mut self, idx: NodeIndex) -> K {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        self.free_head = Some(idx);

        match core::mem::replace(&mut self.slots[idx.0], vacant) {
            Slot::Occupied(node) => node.key,
            Slot::Vacant { .. } => unreachable!("freed a vacant slot"),
        }
    }

    pub(crate) fn subtree_min(&self, mut idx: NodeIndex) -> NodeIndex {
        while let Some(left) = self.links(idx).left {
            idx = left;
        }

        idx
    }

    pub(crate) fn subtree_max(&self, mut idx: NodeIndex) -> NodeIndex {
        while let Some(right) = self.links(idx).right {
            idx = right;
        }

        idx
    }

    /// In-order successor. Positions form a ring through the sentinel: the successor of the
    /// last node is the sentinel, and the successor of the sentinel is the first node.
    pub(crate) fn successor(&self, idx: NodeIndex) -> NodeIndex {
        if idx.is_sentinel() {
            return self.subtree_min(idx);
        }

        if let Some(right) = self.links(idx).right {
            return self.subtree_min(right);
        }

        let mut curr = idx;
        while let Some(parent) = self.links(curr).parent {
            if self.links(parent).left == Some(curr) {
                return parent;
            }
            curr = parent;
        }

        NodeIndex::SENTINEL
    }

    /// In-order predecessor, with the same ring convention as [`NodeArena::successor`].
    pub(crate) fn predecessor(&self, idx: NodeIndex) -> NodeIndex {
        if let Some(left) = self.links(idx).left {
            return self.subtree_max(left);
        }

        let mut curr = idx;
        while let Some(parent) = self.links(curr).parent {
            if self.links(parent).right == Some(curr) {
                return parent;
            }
            curr = parent;
        }

        NodeIndex::SENTINEL
    }

    /// Unlinks a node with at most one child, hoisting that child into its slot.
    pub(crate) fn splice_out(&mut self, idx: NodeIndex) -> K {
        let links = *self.links(idx);
        debug_assert!(links.left.is_none() || links.right.is_none());

        let child = links.left.or(links.right);
        let (parent, side) = self.side_of(idx);

        *self.links_mut(parent).child_mut(side) = child;
        self.set_parent(child, parent);

        self.free_node(idx)
    }

    /// Exchanges the tree positions of two value nodes, leaving their keys in place.
    ///
    /// Every other node keeps its index, key and relative order; only the links touching
    /// `first` and `second` change.
    pub(crate) fn swap_positions(&mut self, first: NodeIndex, second: NodeIndex) {
        if self.links(second).parent == Some(first) {
            self.swap_adjacent(first, second);
        } else if self.links(first).parent == Some(second) {
            self.swap_adjacent(second, first);
        } else {
            self.swap_distant(first, second);
        }
    }

    fn swap_adjacent(&mut self, upper: NodeIndex, lower: NodeIndex) {
        log::trace!("relocating {upper:?} below its child {lower:?}");

        let upper_links = *self.links(upper);
        let lower_links = *self.links(lower);
        let (grandparent, upper_side) = self.side_of(upper);
        let (_, lower_side) = self.side_of(lower);

        *self.links_mut(grandparent).child_mut(upper_side) = Some(lower);

        let sibling = match lower_side {
            Side::Left => upper_links.right,
            Side::Right => upper_links.left,
        };
        self.set_parent(sibling, lower);
        self.set_parent(lower_links.left, upper);
        self.set_parent(lower_links.right, upper);

        let mut promoted = Links {
            parent: upper_links.parent,
            left: upper_links.left,
            right: upper_links.right,
        };
        *promoted.child_mut(lower_side) = Some(upper);

        *self.links_mut(lower) = promoted;
        *self.links_mut(upper) = Links {
            parent: Some(lower),
            ..lower_links
        };
    }

    fn swap_distant(&mut self, first: NodeIndex, second: NodeIndex) {
        log::trace!("relocating {first:?} to the position of {second:?}");

        let first_links = *self.links(first);
        let second_links = *self.links(second);

        // both sides are read before writing, `first` and `second` may be siblings.
        let (first_parent, first_side) = self.side_of(first);
        let (second_parent, second_side) = self.side_of(second);

        *self.links_mut(first_parent).child_mut(first_side) = Some(second);
        *self.links_mut(second_parent).child_mut(second_side) = Some(first);

        self.set_parent(first_links.left, second);
        self.set_parent(first_links.right, second);
        self.set_parent(second_links.left, first);
        self.set_parent(second_links.right, first);

        *self.links_mut(first) = second_links;
        *self.links_mut(second) = first_links;
    }

    /// Drops every node in post-order by climbing parent links, then releases the slots.
    pub(crate) fn clear(&mut self) {
        let mut curr = self.root();

        while let Some(idx) = curr {
            let links = *self.links(idx);

            if let Some(child) = links.left.or(links.right) {
                curr = Some(child);
                continue;
            }

            let (parent, side) = self.side_of(idx);
            *self.links_mut(parent).child_mut(side) = None;
            drop(self.free_node(idx));

            curr = (!parent.is_sentinel()).then_some(parent);
        }

        self.slots.clear();
        self.free_head = None;
    }

    /// Next node of a pre-order walk (left subtree before right), or `None` once done.
    pub(crate) fn preorder_next(&self, idx: NodeIndex) -> Option<NodeIndex> {
        let links = self.links(idx);
        if let Some(child) = links.left.or(links.right) {
            return Some(child);
        }

        let mut curr = idx;
        while let Some(parent) = self.links(curr).parent {
            let parent_links = self.links(parent);
            if parent_links.left == Some(curr) {
                if let Some(right) = parent_links.right {
                    return Some(right);
                }
            }
            curr = parent;
        }

        None
    }
}

impl<K: Clone> NodeArena<K> {
    /// Copies the tree shape and keys into `slots`, which must already hold enough capacity for
    /// `live` nodes so that the walk never allocates.
    ///
    /// The source is walked in pre-order, left before right, in lockstep with the copy. If a
    /// key's `clone` panics, the partial copy is dropped together with `slots`.
    pub(crate) fn duplicate(&self, slots: Vec<Slot<K>>) -> NodeArena<K> {
        let mut copy = NodeArena {
            sentinel: Links::default(),
            slots,
            free_head: None,
        };
        copy.slots.clear();

        let Some(root) = self.root() else {
            return copy;
        };

        let mut source = root;
        let mut target = copy.alloc_node(NodeIndex::SENTINEL, Side::Left, self.key(root).clone());

        'walk: loop {
            let links = *self.links(source);

            for side in [Side::Left, Side::Right] {
                if let Some(child) = links.child(side) {
                    source = child;
                    target = copy.alloc_node(target, side, self.key(child).clone());
                    continue 'walk;
                }
            }

            // leaf: climb both trees until a right sibling subtree is still to be copied.
            loop {
                let (source_parent, side) = self.side_of(source);
                if source_parent.is_sentinel() {
                    break 'walk;
                }
                let target_parent = copy.links(target).parent.unwrap_or(NodeIndex::SENTINEL);

                if side == Side::Left {
                    if let Some(right) = self.links(source_parent).right {
                        source = right;
                        target = copy.alloc_node(target_parent, Side::Right, self.key(right).clone());
                        continue 'walk;
                    }
                }

                source = source_parent;
                target = target_parent;
            }
        }

        copy
    }
}
