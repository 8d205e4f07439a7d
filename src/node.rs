//! The node type shared by every tree in this crate along with the raw pointer plumbing used to
//! link nodes together.
//!
//! A node owns its children and holds a non-owning pointer back to its parent. Because a node can
//! be reached both from its parent and from its children, the links are `NonNull` pointers rather
//! than `Box`es. The tree that leaked a node is responsible for freeing it exactly once.

use std::ptr::NonNull;

use crate::util::Side;

pub(crate) type NodePtr<K, V> = NonNull<Node<K, V>>;

/// A possibly empty pointer to a node. As a child this owns the node, as a parent it doesn't.
pub(crate) type Link<K, V> = Option<NodePtr<K, V>>;

pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    /// `height(right) - height(left)`. Always in `-1..=1` between public operations but may
    /// briefly be `-2` or `2` while the tree is being rebalanced.
    balance: i8,
    parent: Link<K, V>,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Allocates a new leaf node and leaks it. The caller takes ownership of the allocation and
    /// must eventually hand it back to [`Node::free`].
    pub(crate) fn new_leaked(key: K, value: V, parent: Link<K, V>) -> NodePtr<K, V> {
        let node = Box::new(Node {
            key,
            value,
            balance: 0,
            parent,
            left: None,
            right: None,
        });
        NonNull::from(Box::leak(node))
    }

    /// Reclaims a node allocated by [`Node::new_leaked`] and returns its contents. Children are
    /// not freed.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from [`Node::new_leaked`], must not have been freed already, and
    /// nothing may dereference it afterwards. Callers must have unlinked it from its parent and
    /// children first.
    pub(crate) unsafe fn free(ptr: NodePtr<K, V>) -> (K, V) {
        let node = Box::from_raw(ptr.as_ptr());
        let Node { key, value, .. } = *node;
        (key, value)
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Overwrites the stored value, returning the previous one.
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }

    pub(crate) fn balance(&self) -> i8 {
        self.balance
    }

    pub(crate) fn set_balance(&mut self, balance: i8) {
        self.balance = balance;
    }

    pub(crate) fn update_balance(&mut self, diff: i8) {
        self.balance += diff;
    }

    pub(crate) fn parent(&self) -> Link<K, V> {
        self.parent
    }

    pub(crate) fn left(&self) -> Link<K, V> {
        self.left
    }

    pub(crate) fn right(&self) -> Link<K, V> {
        self.right
    }

    pub(crate) fn child(&self, side: Side) -> Link<K, V> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Link<K, V>) {
        self.parent = parent;
    }

    pub(crate) fn set_left(&mut self, left: Link<K, V>) {
        self.left = left;
    }

    pub(crate) fn set_right(&mut self, right: Link<K, V>) {
        self.right = right;
    }

    pub(crate) fn set_child(&mut self, side: Side, child: Link<K, V>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    /// Which slot of `self` holds `child`.
    ///
    /// ## Panics
    ///
    /// In debug builds, when `child` is not a child of `self` at all.
    pub(crate) fn side_of(&self, child: NodePtr<K, V>) -> Side {
        if self.left == Some(child) {
            Side::Left
        } else {
            debug_assert_eq!(self.right, Some(child), "`side_of` called on a non-child");
            Side::Right
        }
    }
}

/// Borrows the node behind `ptr`.
///
/// # Safety
///
/// `ptr` must point at a live node and no mutable reference to that node may be alive for the
/// returned lifetime. In practice callers only hold the reference for a single expression.
pub(crate) unsafe fn node_ref<'a, K, V>(ptr: NodePtr<K, V>) -> &'a Node<K, V> {
    &*ptr.as_ptr()
}

/// Mutably borrows the node behind `ptr`.
///
/// # Safety
///
/// `ptr` must point at a live node and no other reference to that node may be alive for the
/// returned lifetime. In practice callers only hold the reference for a single expression.
pub(crate) unsafe fn node_mut<'a, K, V>(ptr: NodePtr<K, V>) -> &'a mut Node<K, V> {
    &mut *ptr.as_ptr()
}

/// The in-order predecessor of `ptr`: the rightmost node of its left subtree if it has one,
/// otherwise the nearest ancestor whose right subtree contains `ptr`.
///
/// # Safety
///
/// `ptr` and every node reachable from it must be live.
pub(crate) unsafe fn predecessor<K, V>(ptr: NodePtr<K, V>) -> Link<K, V> {
    neighbor(ptr, Side::Left)
}

/// The in-order successor of `ptr`. Mirror image of [`predecessor`].
///
/// # Safety
///
/// `ptr` and every node reachable from it must be live.
pub(crate) unsafe fn successor<K, V>(ptr: NodePtr<K, V>) -> Link<K, V> {
    neighbor(ptr, Side::Right)
}

/// The extreme node of the subtree rooted at `ptr` in the direction of `side`.
///
/// # Safety
///
/// `ptr` and every node below it must be live.
pub(crate) unsafe fn extreme<K, V>(mut ptr: NodePtr<K, V>, side: Side) -> NodePtr<K, V> {
    while let Some(next) = node_ref(ptr).child(side) {
        ptr = next;
    }
    ptr
}

unsafe fn neighbor<K, V>(ptr: NodePtr<K, V>, side: Side) -> Link<K, V> {
    if let Some(child) = node_ref(ptr).child(side) {
        return Some(extreme(child, side.opposite()));
    }

    // Climb until we leave a subtree from its `side.opposite()` edge.
    let mut current = ptr;
    while let Some(parent) = node_ref(current).parent() {
        if node_ref(parent).child(side.opposite()) == Some(current) {
            return Some(parent);
        }
        current = parent;
    }
    None
}
