use avlbst::avl::AvlTree;

use std::collections::{BTreeMap, HashSet};

use crate::Op;

/// Applies a set of operations to a tree and a map.
/// This way we can ensure that after a random smattering of inserts
/// and deletes we have the same entries in both.
fn do_ops<K, V>(ops: &[Op<K, V>], tree: &mut AvlTree<K, V>, map: &mut BTreeMap<K, V>)
where
    K: Ord + Clone + std::fmt::Debug,
    V: std::fmt::Debug + PartialEq + Clone,
{
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                assert_eq!(tree.insert(k.clone(), v.clone()), map.insert(k.clone(), v.clone()));
            }
            Op::Remove(k) => {
                assert_eq!(tree.remove(k), map.remove(k));
            }
            Op::Iter => {
                assert!(tree.iter().eq(map.iter()));
            }
        }
        assert!(tree.is_balanced(), "{:?} left the tree unbalanced", op);
    }
}

#[quickcheck]
fn fuzz_multiple_operations_i8(ops: Vec<Op<i8, i8>>) -> bool {
    let mut tree = AvlTree::new();
    let mut map = BTreeMap::new();

    do_ops(&ops, &mut tree, &mut map);
    tree.len() == map.len() && map.keys().all(|key| tree.get(key) == map.get(key))
}

#[quickcheck]
fn contains(xs: Vec<i8>) -> bool {
    let mut tree = AvlTree::new();
    for x in &xs {
        tree.insert(*x, *x);
    }

    xs.iter().all(|x| tree.get(x) == Some(x))
}

#[quickcheck]
fn contains_not(xs: Vec<i8>, nots: Vec<i8>) -> bool {
    let mut tree = AvlTree::new();
    for x in &xs {
        tree.insert(*x, *x);
    }
    let added: HashSet<_> = xs.into_iter().collect();
    let nots: HashSet<_> = nots.into_iter().collect();
    let mut nots = nots.difference(&added);

    nots.all(|x| tree.get(x).is_none() && tree.try_get(x).is_err())
}

#[quickcheck]
fn with_deletions(xs: Vec<i8>, deletes: Vec<i8>) -> bool {
    let mut tree = AvlTree::new();
    for x in &xs {
        tree.insert(*x, *x);
    }
    for delete in &deletes {
        tree.remove(delete);
    }

    let mut still_present = xs;
    for delete in &deletes {
        // We may have inserted the same value multiple times - delete each one.
        while let Some(pos) = still_present.iter().position(|x| x == delete) {
            still_present.swap_remove(pos);
        }
    }

    tree.is_balanced()
        && deletes.iter().all(|x| tree.get(x).is_none())
        && still_present.iter().all(|x| tree.get(x).is_some())
}

#[quickcheck]
fn reinserting_leaves_shape_alone(xs: Vec<i8>) -> bool {
    let mut tree: AvlTree<_, _> = xs.iter().map(|x| (*x, 0)).collect();
    let before = tree.to_string();
    for x in &xs {
        tree.insert(*x, 1);
    }

    tree.to_string() == before && tree.iter().all(|(_, v)| *v == 1)
}

#[quickcheck]
fn removing_missing_keys_leaves_shape_alone(xs: Vec<i8>, missing: Vec<i8>) -> bool {
    let mut tree: AvlTree<_, _> = xs.iter().map(|x| (*x, *x)).collect();
    let before = tree.to_string();
    for m in missing.iter().filter(|m| !xs.contains(m)) {
        assert_eq!(tree.remove(m), None);
    }

    tree.to_string() == before
}

#[quickcheck]
fn height_is_logarithmic(xs: Vec<i32>) -> bool {
    let tree: AvlTree<_, _> = xs.into_iter().map(|x| (x, ())).collect();

    tree.height() as f64 <= 1.45 * ((tree.len() + 2) as f64).log2()
}

#[test]
fn sequential_inserts_build_a_complete_tree() {
    let tree: AvlTree<_, _> = (1..=7).map(|x| (x, x)).collect();

    assert_eq!(tree.height(), 3);
    assert_eq!(
        tree.to_string(),
        "        7 (0)\n    6 (0)\n        5 (0)\n4 (0)\n        3 (0)\n    2 (0)\n        1 (0)\n"
    );
}

#[test]
fn large_sequential_workload() {
    let mut tree = AvlTree::new();
    for x in 0..10_000 {
        tree.insert(x, x);
    }
    assert!(tree.is_balanced());
    assert!(tree.height() <= 14 * 145 / 100);

    for x in (0..10_000).filter(|x| x % 2 == 0) {
        assert_eq!(tree.remove(&x), Some(x));
    }
    assert!(tree.is_balanced());
    assert_eq!(tree.len(), 5_000);
    let odds: Vec<i32> = (0..10_000).filter(|x| x % 2 == 1).collect();
    assert!(tree.iter().map(|(k, _)| k).eq(odds.iter()));
}
