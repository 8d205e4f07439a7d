//! A check for whether every leaf of a binary tree sits at the same depth.
//!
//! This works on any plain binary tree. It doesn't care about key ordering or balance and has
//! nothing to do with [`AvlTree`][crate::avl::AvlTree].
//!
//! # Examples
//!
//! ```
//! use avlbst::equal_paths::{equal_paths, TreeNode};
//!
//! //   1
//! //  / \
//! // 2   3
//! let even = TreeNode::with_children(1, TreeNode::leaf(2), TreeNode::leaf(3));
//! assert!(equal_paths(Some(&even)));
//!
//! //   1
//! //  / \
//! // 2   3
//! //      \
//! //       4
//! let uneven = TreeNode::with_children(
//!     1,
//!     TreeNode::leaf(2),
//!     TreeNode::with_right(3, TreeNode::leaf(4)),
//! );
//! assert!(!equal_paths(Some(&uneven)));
//! ```

/// A node in a plain binary tree that owns its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<T> {
    /// Whatever the node holds. Ignored by [`equal_paths`].
    pub key: T,
    /// The left subtree.
    pub left: Option<Box<TreeNode<T>>>,
    /// The right subtree.
    pub right: Option<Box<TreeNode<T>>>,
}

impl<T> TreeNode<T> {
    /// A node with no children.
    pub fn leaf(key: T) -> Self {
        Self {
            key,
            left: None,
            right: None,
        }
    }

    /// A node with only a left child.
    pub fn with_left(key: T, left: Self) -> Self {
        Self {
            key,
            left: Some(Box::new(left)),
            right: None,
        }
    }

    /// A node with only a right child.
    pub fn with_right(key: T, right: Self) -> Self {
        Self {
            key,
            left: None,
            right: Some(Box::new(right)),
        }
    }

    /// A node with both children.
    pub fn with_children(key: T, left: Self, right: Self) -> Self {
        Self {
            key,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }
}

/// Whether every leaf in the tree rooted at `root` is at the same depth. An empty tree trivially
/// is.
///
/// Each subtree has to pass on its own. A node with two children additionally compares how far
/// down one leaf is on each side.
pub fn equal_paths<T>(root: Option<&TreeNode<T>>) -> bool {
    let Some(node) = root else {
        return true;
    };

    if !equal_paths(node.left.as_deref()) || !equal_paths(node.right.as_deref()) {
        return false;
    }

    match (node.left.as_deref(), node.right.as_deref()) {
        (Some(left), Some(right)) => leaf_depth(left) == leaf_depth(right),
        _ => true,
    }
}

/// The number of levels from `node` down to one of its leaves, taking the only child when there
/// is one and the left child when there are two.
///
/// This is not the height of the subtree. It only agrees with every other root-to-leaf path
/// once the subtree is known to pass [`equal_paths`], which is the only time it is called.
fn leaf_depth<T>(node: &TreeNode<T>) -> usize {
    let mut depth = 1;
    let mut current = node;
    while let Some(next) = current.left.as_deref().or(current.right.as_deref()) {
        depth += 1;
        current = next;
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_single_node() {
        assert!(equal_paths::<i32>(None));
        assert!(equal_paths(Some(&TreeNode::leaf(1))));
    }

    #[test]
    fn leaves_at_different_depths() {
        let tree = TreeNode::with_children(
            1,
            TreeNode::leaf(2),
            TreeNode::with_right(3, TreeNode::leaf(4)),
        );

        assert!(!equal_paths(Some(&tree)));
    }

    #[test]
    fn single_child_chains() {
        // A chain only ever has one leaf.
        let chain = TreeNode::with_left(1, TreeNode::with_right(2, TreeNode::leaf(3)));
        assert!(equal_paths(Some(&chain)));

        // Chains of the same length on either side.
        let tree = TreeNode::with_children(
            1,
            TreeNode::with_left(2, TreeNode::leaf(4)),
            TreeNode::with_right(3, TreeNode::leaf(5)),
        );
        assert!(equal_paths(Some(&tree)));
    }

    #[test]
    fn complete_tree() {
        let tree = TreeNode::with_children(
            4,
            TreeNode::with_children(2, TreeNode::leaf(1), TreeNode::leaf(3)),
            TreeNode::with_children(6, TreeNode::leaf(5), TreeNode::leaf(7)),
        );
        assert!(equal_paths(Some(&tree)));
    }

    #[test]
    fn mismatch_deep_inside_a_subtree() {
        //       1
        //      / \
        //     2   3
        //    / \   \
        //   4   5   6
        //  /       /
        // 7       8
        let tree = TreeNode::with_children(
            1,
            TreeNode::with_children(2, TreeNode::with_left(4, TreeNode::leaf(7)), TreeNode::leaf(5)),
            TreeNode::with_right(3, TreeNode::with_left(6, TreeNode::leaf(8))),
        );
        assert!(!equal_paths(Some(&tree)));
        assert!(equal_paths(tree.right.as_deref()));
    }

    #[test]
    fn depth_follows_the_left_child() {
        let tree = TreeNode::with_children(
            1,
            TreeNode::with_left(2, TreeNode::leaf(4)),
            TreeNode::leaf(3),
        );
        assert_eq!(leaf_depth(&tree), 3);
        assert_eq!(leaf_depth(&TreeNode::with_right(1, TreeNode::leaf(2))), 2);
    }
}
