//! A mutable AVL tree whose nodes keep a pointer to their parent. Rebalancing walks up those
//! pointers from the point of mutation instead of unwinding a recursive descent, and every node
//! stores its balance factor rather than its height.
//!
//! # Examples
//!
//! ```
//! use avlbst::avl::AvlTree;
//!
//! let mut tree = AvlTree::new();
//!
//! // Nothing in here yet.
//! assert_eq!(tree.get(&1), None);
//!
//! tree.insert(1, 2);
//! assert_eq!(tree.get(&1), Some(&2));
//!
//! // Inserting a new value for the same key overwrites the value.
//! assert_eq!(tree.insert(1, 3), Some(2));
//! assert_eq!(tree.get(&1), Some(&3));
//!
//! // Removing a node returns its value.
//! assert_eq!(tree.remove(&1), Some(3));
//! assert_eq!(tree.get(&1), None);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::error::KeyError;
use crate::node::{self, node_mut, node_ref, Link, Node, NodePtr};
use crate::util::Side;

/// A self-balancing Binary Search Tree. For every node, the heights of its two subtrees differ by
/// at most one, so lookups, inserts and removals all take `O(lg N)`.
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    len: usize,
    marker: PhantomData<Box<Node<K, V>>>,
}

// SAFETY: the tree owns all of its nodes, so sending it sends the keys and values with it. Shared
// access only ever hands out shared references to keys and values.
unsafe impl<K: Send, V: Send> Send for AvlTree<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for AvlTree<K, V> {}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for AvlTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Clone for AvlTree<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        let root = match self.root {
            // SAFETY: `root` and everything below it is owned by `self` and can't be mutated
            // while we hold `&self`.
            Some(root) => Some(unsafe { clone_subtree(root, None) }),
            None => None,
        };
        Self {
            root,
            len: self.len,
            marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for AvlTree<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Prints the shape of the tree sideways: the root is flush left, the right subtree is above it
/// and the left subtree below. Every line is a node's key followed by its balance factor.
///
/// ```
/// use avlbst::avl::AvlTree;
///
/// let tree: AvlTree<_, _> = [(2, ()), (1, ()), (3, ()), (4, ())].into_iter().collect();
/// assert_eq!(
///     tree.to_string(),
///     "        4 (0)\n    3 (1)\n2 (1)\n    1 (0)\n",
/// );
/// ```
impl<K, V> fmt::Display for AvlTree<K, V>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            // SAFETY: see `Clone`.
            Some(root) => unsafe { write_subtree(f, root, 0) },
            None => Ok(()),
        }
    }
}

impl<K, V> AvlTree<K, V> {
    /// Generate a new, empty `AvlTree`.
    pub fn new() -> Self {
        Self {
            root: None,
            len: 0,
            marker: PhantomData,
        }
    }

    /// The number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of levels in the tree. An empty tree has height 0 and a lone root has height 1.
    ///
    /// Because each node knows which of its subtrees is taller this only follows a single path
    /// from the root.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(ptr) = current {
            // SAFETY: every pointer reachable from `root` is a live node owned by `self`.
            let node = unsafe { node_ref(ptr) };
            height += 1;
            current = if node.balance() < 0 {
                node.left()
            } else {
                node.right().or(node.left())
            };
        }
        height
    }

    /// Removes every entry, freeing each node exactly once.
    pub fn clear(&mut self) {
        let mut stack: Vec<NodePtr<K, V>> = self.root.take().into_iter().collect();
        let mut freed = 0usize;
        while let Some(ptr) = stack.pop() {
            // SAFETY: every node is owned by exactly one link and we took the root's link, so
            // each node is pushed once and freed once. Nothing else references the nodes anymore.
            unsafe {
                let node = node_ref(ptr);
                stack.extend(node.left());
                stack.extend(node.right());
                Node::free(ptr);
            }
            freed += 1;
        }
        self.len = 0;
        if freed > 0 {
            debug!(freed, "cleared tree");
        }
    }

    /// In-order iteration over the entries of the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlbst::avl::AvlTree;
    ///
    /// let tree: AvlTree<_, _> = [(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
    ///
    /// let keys: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [1, 2, 3]);
    ///
    /// let values: Vec<_> = tree.iter().rev().map(|(_, v)| *v).collect();
    /// assert_eq!(values, ['c', 'b', 'a']);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        // SAFETY: `root` and everything below it is live while we hold `&self`.
        let (front, back) = match self.root {
            Some(root) => unsafe {
                (
                    Some(node::extreme(root, Side::Left)),
                    Some(node::extreme(root, Side::Right)),
                )
            },
            None => (None, None),
        };
        Iter {
            front,
            back,
            remaining: self.len,
            marker: PhantomData,
        }
    }

    /// The entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// The entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.iter().next_back()
    }

    /// Walks the whole tree verifying its structure: keys strictly increase in order, parent
    /// pointers agree with child pointers, and every stored balance factor is in `-1..=1` and
    /// equal to the actual height difference of the node's subtrees.
    ///
    /// This is `O(N)`. The tree maintains all of these on its own so this only returns `false` if
    /// there is a bug.
    pub fn is_balanced(&self) -> bool
    where
        K: Ord,
    {
        let Some(root) = self.root else {
            return self.len == 0;
        };
        // SAFETY: `root` and everything below it is live while we hold `&self`.
        let shape_ok =
            unsafe { node_ref(root).parent().is_none() && checked_height(root).is_some() };

        shape_ok
            && self.iter().count() == self.len
            && self
                .iter()
                .zip(self.iter().skip(1))
                .all(|((a, _), (b, _))| a < b)
    }

    /// Potentially finds the value associated with the given key in this tree. If no node has the
    /// corresponding key, `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlbst::avl::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1, 2);
    ///
    /// assert_eq!(tree.get(&1), Some(&2));
    /// assert_eq!(tree.get(&42), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: Ord,
    {
        // SAFETY: the node is owned by `self` so it outlives `&self`, and can't be mutated while
        // `&self` is held.
        self.find_node(key)
            .map(|ptr| unsafe { node_ref(ptr) }.value())
    }

    /// Like [`get`][Self::get] but hands out a mutable reference to the value.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V>
    where
        K: Ord,
    {
        // SAFETY: the node is owned by `self` and `&mut self` guarantees this is the only
        // reference into the tree.
        self.find_node(key)
            .map(|ptr| unsafe { node_mut(ptr) }.value_mut())
    }

    /// Whether the tree holds an entry for `key`.
    pub fn contains_key(&self, key: &K) -> bool
    where
        K: Ord,
    {
        self.find_node(key).is_some()
    }

    /// Like [`get`][Self::get] but treats a missing key as an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlbst::{avl::AvlTree, KeyError};
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert("a", 1);
    ///
    /// assert_eq!(tree.try_get(&"a"), Ok(&1));
    /// assert_eq!(tree.try_get(&"b"), Err(KeyError));
    /// ```
    pub fn try_get(&self, key: &K) -> Result<&V, KeyError>
    where
        K: Ord,
    {
        self.get(key).ok_or(KeyError)
    }

    /// Inserts the given value into the tree stored at the given key. Inserting a new value for an
    /// existing key overwites its value, returning the old one, and leaves the shape of the tree
    /// alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlbst::avl::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    ///
    /// assert_eq!(tree.insert(1, 2), None);
    /// assert_eq!(tree.get(&1), Some(&2));
    ///
    /// assert_eq!(tree.insert(1, 3), Some(2));
    /// assert_eq!(tree.get(&1), Some(&3));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        K: Ord,
    {
        let Some(mut current) = self.root else {
            self.root = Some(Node::new_leaked(key, value, None));
            self.len = 1;
            return None;
        };

        // SAFETY: every pointer reachable from `root` is a live node owned by `self` and `&mut
        // self` means nobody else is looking at them. References made below only live for a
        // single statement.
        unsafe {
            let (parent, side) = loop {
                let node = node_mut(current);
                match key.cmp(node.key()) {
                    Ordering::Less => match node.left() {
                        Some(left) => current = left,
                        None => break (current, Side::Left),
                    },
                    Ordering::Equal => return Some(node.replace_value(value)),
                    Ordering::Greater => match node.right() {
                        Some(right) => current = right,
                        None => break (current, Side::Right),
                    },
                }
            };

            let new_node = Node::new_leaked(key, value, Some(parent));
            node_mut(parent).set_child(side, Some(new_node));
            self.len += 1;

            let parent_node = node_mut(parent);
            if parent_node.balance() != 0 {
                // `parent` only had a child on the other side, so it just evened out and its
                // height didn't change.
                parent_node.set_balance(0);
            } else {
                parent_node.update_balance(side.diff());
                self.insert_fix(parent, new_node);
            }
        }
        self.assert_root();
        None
    }

    /// Removes the node containing the given key from the tree and returns its value. If the tree
    /// does not contain a node with the key, nothing happens.
    ///
    /// # Examples
    ///
    /// ```
    /// use avlbst::avl::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1, 2);
    ///
    /// assert_eq!(tree.remove(&1), Some(2));
    /// assert_eq!(tree.remove(&1), None);
    /// assert_eq!(tree.get(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V>
    where
        K: Ord,
    {
        let target = self.find_node(key)?;
        // SAFETY: `target` was just found in this tree and `&mut self` means nobody else is
        // looking at it.
        let value = unsafe { self.remove_node(target) };
        self.len -= 1;
        self.assert_root();
        Some(value)
    }

    /// In debug builds, checks what we can about the tree in constant time after a mutation.
    fn assert_root(&self) {
        if cfg!(debug_assertions) {
            let Some(root) = self.root else {
                assert_eq!(self.len, 0);
                return;
            };
            // SAFETY: `root` is a live node owned by `self`.
            let root = unsafe { node_ref(root) };
            assert!(root.parent().is_none());
            assert!(root.balance().abs() <= 1, "root balance {}", root.balance());
        }
    }

    fn find_node(&self, key: &K) -> Link<K, V>
    where
        K: Ord,
    {
        let mut current = self.root;
        while let Some(ptr) = current {
            // SAFETY: every pointer reachable from `root` is a live node owned by `self`.
            let node = unsafe { node_ref(ptr) };
            current = match key.cmp(node.key()) {
                Ordering::Less => node.left(),
                Ordering::Equal => return Some(ptr),
                Ordering::Greater => node.right(),
            };
        }
        None
    }

    /// Unlinks `target` from the tree, frees it, and rebalances.
    ///
    /// # Safety
    ///
    /// `target` must be a node of this tree and no references into the tree may be alive.
    unsafe fn remove_node(&mut self, target: NodePtr<K, V>) -> V {
        let node = node_ref(target);
        if node.left().is_some() && node.right().is_some() {
            // Trade places with the predecessor. It has no right child so afterwards `target`
            // has at most one child.
            let predecessor =
                node::predecessor(target).expect("A node with a left child has a predecessor");
            self.node_swap(predecessor, target);
        }

        let node = node_ref(target);
        let parent = node.parent();
        let child = node.left().or(node.right());
        if let Some(child) = child {
            node_mut(child).set_parent(parent);
        }

        let shrunk = match parent {
            Some(parent) => {
                let side = node_ref(parent).side_of(target);
                node_mut(parent).set_child(side, child);
                Some((parent, side))
            }
            None => {
                self.root = child;
                None
            }
        };

        let (_key, value) = Node::free(target);

        if let Some((parent, side)) = shrunk {
            self.remove_fix(parent, side);
        }
        value
    }

    /// Walks up from a freshly grown subtree updating balance factors until the growth is
    /// absorbed or fixed by a rotation. `parent` has already had its balance updated and is now
    /// one level taller on the side of `node`.
    ///
    /// # Safety
    ///
    /// `parent` and `node` must be nodes of this tree with `node` a child of `parent`, and no
    /// references into the tree may be alive.
    unsafe fn insert_fix(&mut self, mut parent: NodePtr<K, V>, mut node: NodePtr<K, V>) {
        while let Some(grandparent) = node_ref(parent).parent() {
            let side = node_ref(grandparent).side_of(parent);
            let grandparent_node = node_mut(grandparent);
            grandparent_node.update_balance(side.diff());

            match grandparent_node.balance() {
                0 => {
                    trace!("insert absorbed by ancestor");
                    return;
                }
                balance if balance == side.diff() => {
                    node = parent;
                    parent = grandparent;
                }
                _ => {
                    if node_ref(parent).side_of(node) == side {
                        // Zig-zig: `parent` moves up and both it and `grandparent` even out.
                        self.rotate(grandparent, side.opposite());
                        node_mut(parent).set_balance(0);
                        node_mut(grandparent).set_balance(0);
                        trace!(?side, "insert fixed by single rotation");
                    } else {
                        // Zig-zag: `node` moves up two levels with `parent` and `grandparent` as
                        // its children. Whichever of them inherits `node`'s shorter subtree
                        // leans away from it.
                        let node_balance = node_ref(node).balance();
                        self.rotate(parent, side);
                        self.rotate(grandparent, side.opposite());

                        let (parent_balance, grandparent_balance) = match node_balance {
                            0 => (0, 0),
                            balance if balance == side.diff() => (0, -side.diff()),
                            _ => (side.diff(), 0),
                        };
                        node_mut(parent).set_balance(parent_balance);
                        node_mut(grandparent).set_balance(grandparent_balance);
                        node_mut(node).set_balance(0);
                        trace!(?side, "insert fixed by double rotation");
                    }
                    return;
                }
            }
        }
    }

    /// Walks up from a subtree that lost a level on its `shrunk` side, updating balance factors
    /// and rotating until the loss is absorbed or reaches the root.
    ///
    /// # Safety
    ///
    /// `node` must be a node of this tree and no references into the tree may be alive.
    unsafe fn remove_fix(&mut self, mut node: NodePtr<K, V>, mut shrunk: Side) {
        loop {
            // Where the loss goes next has to be worked out before any rotation relinks `node`.
            // A rotation puts its pivot in `node`'s old slot, so the parent stays the same.
            let next = node_ref(node)
                .parent()
                .map(|parent| (parent, node_ref(parent).side_of(node)));

            let heavy = shrunk.opposite();
            match node_ref(node).balance() - shrunk.diff() {
                0 => {
                    // Both sides are now as short as the shrunk one so this subtree is shorter.
                    node_mut(node).set_balance(0);
                }
                balance @ (-1 | 1) => {
                    node_mut(node).set_balance(balance);
                    trace!("remove absorbed by ancestor");
                    return;
                }
                _ => {
                    let taller = node_ref(node)
                        .child(heavy)
                        .expect("A subtree two levels taller than its sibling is not empty");
                    let taller_balance = node_ref(taller).balance();

                    if taller_balance == heavy.diff() {
                        self.rotate(node, shrunk);
                        node_mut(node).set_balance(0);
                        node_mut(taller).set_balance(0);
                        trace!(side = ?heavy, "remove fixed by single rotation, height shrank");
                    } else if taller_balance == 0 {
                        self.rotate(node, shrunk);
                        node_mut(node).set_balance(heavy.diff());
                        node_mut(taller).set_balance(-heavy.diff());
                        trace!(side = ?heavy, "remove fixed by single rotation, height kept");
                        return;
                    } else {
                        let far = node_ref(taller)
                            .child(shrunk)
                            .expect("A child leaning inward has an inner child");
                        let far_balance = node_ref(far).balance();
                        self.rotate(taller, heavy);
                        self.rotate(node, shrunk);

                        let (node_balance, taller_balance) = match far_balance {
                            0 => (0, 0),
                            balance if balance == heavy.diff() => (-heavy.diff(), 0),
                            _ => (0, heavy.diff()),
                        };
                        node_mut(node).set_balance(node_balance);
                        node_mut(taller).set_balance(taller_balance);
                        node_mut(far).set_balance(0);
                        trace!(side = ?heavy, "remove fixed by double rotation, height shrank");
                    }
                }
            }

            let Some((parent, side)) = next else {
                return;
            };
            node = parent;
            shrunk = side;
        }
    }

    /// Rotates the subtree rooted at `node` toward `direction`.
    ///
    /// # Safety
    ///
    /// `node` must be a node of this tree and no references into the tree may be alive.
    unsafe fn rotate(&mut self, node: NodePtr<K, V>, direction: Side) {
        match direction {
            Side::Left => self.rotate_left(node),
            Side::Right => self.rotate_right(node),
        }
    }

    /// Rotate `node` to the right. This moves the left child up vertically and `node` down
    /// vertically. Balance factors are left for the caller to fix. Does nothing if `node` has no
    /// left child.
    ///
    /// # Diagram
    ///
    /// ```text
    ///    Option<parent>            Option<parent>
    ///      /                         /
    ///    node                      pivot
    ///    /  \                      /   \
    /// pivot  z     rotate ->      x    node
    ///  / \                             /  \
    /// x   y                           y    z
    /// ```
    ///
    /// # Safety
    ///
    /// `node` must be a node of this tree and no references into the tree may be alive.
    unsafe fn rotate_right(&mut self, node: NodePtr<K, V>) {
        let Some(pivot) = node_ref(node).left() else {
            return;
        };
        trace!("rotate right");

        let inner = node_ref(pivot).right();
        node_mut(node).set_left(inner);
        if let Some(inner) = inner {
            node_mut(inner).set_parent(Some(node));
        }

        let parent = node_ref(node).parent();
        self.replace_child(parent, node, pivot);
        node_mut(pivot).set_parent(parent);

        node_mut(pivot).set_right(Some(node));
        node_mut(node).set_parent(Some(pivot));
    }

    /// Mirror image of [`rotate_right`][Self::rotate_right]: moves the right child up.
    ///
    /// # Safety
    ///
    /// `node` must be a node of this tree and no references into the tree may be alive.
    unsafe fn rotate_left(&mut self, node: NodePtr<K, V>) {
        let Some(pivot) = node_ref(node).right() else {
            return;
        };
        trace!("rotate left");

        let inner = node_ref(pivot).left();
        node_mut(node).set_right(inner);
        if let Some(inner) = inner {
            node_mut(inner).set_parent(Some(node));
        }

        let parent = node_ref(node).parent();
        self.replace_child(parent, node, pivot);
        node_mut(pivot).set_parent(parent);

        node_mut(pivot).set_left(Some(node));
        node_mut(node).set_parent(Some(pivot));
    }

    /// Points whatever referenced `old` (its parent or the tree's root) at `new` instead.
    ///
    /// # Safety
    ///
    /// `parent`, if any, must be a node of this tree with `old` as a child.
    unsafe fn replace_child(&mut self, parent: Link<K, V>, old: NodePtr<K, V>, new: NodePtr<K, V>) {
        match parent {
            Some(parent) => {
                let side = node_ref(parent).side_of(old);
                node_mut(parent).set_child(side, Some(new));
            }
            None => self.root = Some(new),
        }
    }

    /// Exchanges the positions of two nodes in the tree, including their balance factors. Keys and
    /// values travel with their nodes, so this generally breaks the ordering until one of them is
    /// removed.
    ///
    /// # Safety
    ///
    /// `a` and `b` must be nodes of this tree and no references into the tree may be alive.
    unsafe fn node_swap(&mut self, a: NodePtr<K, V>, b: NodePtr<K, V>) {
        if a == b {
            return;
        }

        // Links between `a` and `b` themselves have to point the other way once they trade places.
        let swapped = |link: Link<K, V>| match link {
            Some(ptr) if ptr == a => Some(b),
            Some(ptr) if ptr == b => Some(a),
            other => other,
        };

        let (a_parent, a_left, a_right) = {
            let node = node_ref(a);
            (node.parent(), node.left(), node.right())
        };
        let (b_parent, b_left, b_right) = {
            let node = node_ref(b);
            (node.parent(), node.left(), node.right())
        };
        let a_side = a_parent.map(|parent| node_ref(parent).side_of(a));
        let b_side = b_parent.map(|parent| node_ref(parent).side_of(b));

        {
            let node = node_mut(a);
            node.set_parent(swapped(b_parent));
            node.set_left(swapped(b_left));
            node.set_right(swapped(b_right));
        }
        {
            let node = node_mut(b);
            node.set_parent(swapped(a_parent));
            node.set_left(swapped(a_left));
            node.set_right(swapped(a_right));
        }

        for ptr in [a, b] {
            let node = node_ref(ptr);
            for child in [node.left(), node.right()].into_iter().flatten() {
                node_mut(child).set_parent(Some(ptr));
            }
        }

        for (ptr, side) in [(a, b_side), (b, a_side)] {
            match (node_ref(ptr).parent(), side) {
                (None, _) => self.root = Some(ptr),
                (Some(parent), Some(side)) if parent != a && parent != b => {
                    node_mut(parent).set_child(side, Some(ptr));
                }
                // Adjacent nodes were already linked to each other above.
                _ => {}
            }
        }

        let a_balance = node_ref(a).balance();
        node_mut(a).set_balance(node_ref(b).balance());
        node_mut(b).set_balance(a_balance);
    }
}

impl<K, V> FromIterator<(K, V)> for AvlTree<K, V>
where
    K: Ord,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K, V> Extend<(K, V)> for AvlTree<K, V>
where
    K: Ord,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An in-order iterator over the entries of an [`AvlTree`]. Created by [`AvlTree::iter`].
pub struct Iter<'a, K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
    remaining: usize,
    marker: PhantomData<&'a Node<K, V>>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.front?;
        // SAFETY: the iterator borrows the tree for `'a` so every node stays alive and unmodified.
        let node: &'a Node<K, V> = unsafe { node_ref(ptr) };
        self.front = unsafe { node::successor(ptr) };
        self.remaining -= 1;
        Some((node.key(), node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.back?;
        // SAFETY: see `next`.
        let node = unsafe { node_ref(ptr) };
        self.back = unsafe { node::predecessor(ptr) };
        self.remaining -= 1;
        Some((node.key(), node.value()))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Deep copies the subtree at `ptr`, hanging the copy off of `parent`.
///
/// # Safety
///
/// `ptr` and every node below it must be live and not mutably borrowed.
unsafe fn clone_subtree<K, V>(ptr: NodePtr<K, V>, parent: Link<K, V>) -> NodePtr<K, V>
where
    K: Clone,
    V: Clone,
{
    let source = node_ref(ptr);
    let copy = Node::new_leaked(source.key().clone(), source.value().clone(), parent);
    node_mut(copy).set_balance(source.balance());
    if let Some(left) = source.left() {
        let left = clone_subtree(left, Some(copy));
        node_mut(copy).set_left(Some(left));
    }
    if let Some(right) = source.right() {
        let right = clone_subtree(right, Some(copy));
        node_mut(copy).set_right(Some(right));
    }
    copy
}

/// # Safety
///
/// `ptr` and every node below it must be live and not mutably borrowed.
unsafe fn write_subtree<K, V>(
    f: &mut fmt::Formatter<'_>,
    ptr: NodePtr<K, V>,
    depth: usize,
) -> fmt::Result
where
    K: fmt::Display,
{
    let node = node_ref(ptr);
    if let Some(right) = node.right() {
        write_subtree(f, right, depth + 1)?;
    }
    writeln!(
        f,
        "{:indent$}{} ({})",
        "",
        node.key(),
        node.balance(),
        indent = depth * 4
    )?;
    if let Some(left) = node.left() {
        write_subtree(f, left, depth + 1)?;
    }
    Ok(())
}

/// Returns the height of the subtree at `ptr`, or `None` if anything in it is out of place.
///
/// # Safety
///
/// `ptr` and every node below it must be live and not mutably borrowed.
unsafe fn checked_height<K, V>(ptr: NodePtr<K, V>) -> Option<usize>
where
    K: Ord,
{
    let node = node_ref(ptr);
    let mut heights = [0usize; 2];
    for (height, side) in heights.iter_mut().zip([Side::Left, Side::Right]) {
        let Some(child) = node.child(side) else {
            continue;
        };
        let child_node = node_ref(child);
        let ordered = match side {
            Side::Left => child_node.key() < node.key(),
            Side::Right => child_node.key() > node.key(),
        };
        if child_node.parent() != Some(ptr) || !ordered {
            return None;
        }
        *height = checked_height(child)?;
    }

    let [left, right] = heights;
    let actual = right as isize - left as isize;
    if actual.abs() > 1 || actual != node.balance() as isize {
        return None;
    }
    Some(left.max(right) + 1)
}
