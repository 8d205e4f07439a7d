//! This crate exposes an AVL tree built from parent-linked nodes, along with a small check for
//! whether all of the leaves of a binary tree are at the same depth.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to
//! insert, find, and delete stored records. BSTs are typically defined
//! recursively using the notion of a `Node`. A `Node` will typically store
//! some sort of value (the value that was inserted, for example) and will
//! sometimes have child `Node`s. The most important invariants of a BST are:
//!
//! 1. For every `Node` in a BST, all the `Node`s in its left subtree have a
//!    value less than its own value.
//! 2. For every `Node` in a BST, all the `Node`s in its right subtree have a
//!    value greater than its own value.
//!
//! > Note that some `Node`s have no children. These `Node`s are called "leaf nodes".
//!
//! Searching for values in the tree takes `O(height)` (where `height` is defined as the longest
//! path from the root `Node` to a leaf `Node`).
//!
//! ## AVL Tree
//!
//! An AVL tree additionally keeps, for every `Node`, the heights of its two subtrees within one
//! of each other. Each `Node` records the difference (its "balance factor") and any insert or
//! removal that pushes a balance factor to ±2 is repaired with one or two rotations. That keeps
//! the height below roughly `1.44 * lg(N + 2)`, so every operation is `O(lg N)`.
//!
//! See [`avl::AvlTree`] for the tree and [`equal_paths::equal_paths`] for the leaf depth check.

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod avl;
pub mod equal_paths;
mod error;
mod node;
mod util;

pub use error::KeyError;

#[cfg(test)]
mod test {
    pub(crate) mod quick;
}
