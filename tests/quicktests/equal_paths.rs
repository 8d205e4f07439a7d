use avlbst::equal_paths::{equal_paths, TreeNode};

/// Every leaf at `depth` levels below the root.
fn perfect(depth: u8) -> TreeNode<u8> {
    if depth <= 1 {
        TreeNode::leaf(depth)
    } else {
        TreeNode::with_children(depth, perfect(depth - 1), perfect(depth - 1))
    }
}

/// Hangs a new leaf under the rightmost leaf.
fn extend_rightmost(node: &mut TreeNode<u8>) {
    match node.right.as_deref_mut() {
        Some(right) => extend_rightmost(right),
        None => node.right = Some(Box::new(TreeNode::leaf(0))),
    }
}

#[quickcheck]
fn perfect_trees_have_equal_paths(depth: u8) -> bool {
    equal_paths(Some(&perfect(depth % 10 + 1)))
}

#[quickcheck]
fn one_longer_path_breaks_it(depth: u8) -> bool {
    let mut tree = perfect(depth % 10 + 2);
    extend_rightmost(&mut tree);

    !equal_paths(Some(&tree))
}

#[test]
fn uneven_leaves() {
    let tree = TreeNode::with_children(
        1,
        TreeNode::leaf(2),
        TreeNode::with_right(3, TreeNode::leaf(4)),
    );

    assert!(!equal_paths(Some(&tree)));
}

#[test]
fn empty_and_single() {
    assert!(equal_paths::<u8>(None));
    assert!(equal_paths(Some(&TreeNode::leaf(1))));
}
