use std::{collections::BTreeMap, fmt::Debug};

use proptest::{
    prelude::{prop::collection::vec, *},
    sample::SizeRange,
};

use crate::collections::OrderedTree;

/// A single step of a randomized workload against an [`OrderedTree`].
#[derive(Debug, Clone)]
pub enum Op<K, V> {
    Insert(K, V),
    Delete(K),
    Search(K),
}

/// Random workloads, weighted towards inserts so that trees actually grow.
pub fn ops<K, V>(size: impl Into<SizeRange>) -> impl Strategy<Value = Vec<Op<K, V>>>
where
    K: Arbitrary + Clone + 'static,
    V: Arbitrary + Clone + 'static,
{
    let op = prop_oneof![
        50 => (any::<K>(), any::<V>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => any::<K>().prop_map(Op::Delete),
        25 => any::<K>().prop_map(Op::Search),
    ];

    vec(op, size)
}

/// Applies `ops` to both `tree` and a `BTreeMap` model with first-write-wins inserts, failing as
/// soon as the two disagree.
pub fn run_against_model<K, V>(
    tree: &mut OrderedTree<K, V>,
    ops: Vec<Op<K, V>>,
) -> Result<BTreeMap<K, V>, TestCaseError>
where
    K: Ord + Clone + Debug,
    V: Clone + PartialEq + Debug,
{
    let mut model = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let fresh = !model.contains_key(&key);
                model.entry(key.clone()).or_insert(value.clone());
                prop_assert_eq!(tree.insert(key, value), fresh);
            }
            Op::Delete(key) => {
                prop_assert_eq!(tree.delete(&key), model.remove(&key));
            }
            Op::Search(key) => {
                prop_assert_eq!(tree.search(&key), model.get(&key));
            }
        }
    }

    prop_assert_eq!(tree.len(), model.len());

    Ok(model)
}

/// Walks the whole tree and panics if any node breaks the search-tree ordering, or if the
/// number of reachable nodes differs from [`OrderedTree::len`].
pub fn validate_tree<K: Ord + Debug, V>(tree: &OrderedTree<K, V>) {
    let mut pending = Vec::new();
    let mut reachable = 0usize;

    if let Some(root) = tree.root() {
        pending.push((root, None, None));
    }

    while let Some((node, lower, upper)) = pending.pop() {
        reachable += 1;

        if let Some(lower) = lower {
            assert!(
                &node.key > lower,
                "{:?} is in the right subtree of {:?}",
                node.key,
                lower
            );
        }
        if let Some(upper) = upper {
            assert!(
                &node.key < upper,
                "{:?} is in the left subtree of {:?}",
                node.key,
                upper
            );
        }

        if let Some(left) = node.left.as_deref() {
            pending.push((left, lower, Some(&node.key)));
        }
        if let Some(right) = node.right.as_deref() {
            pending.push((right, Some(&node.key), upper));
        }
    }

    assert_eq!(
        reachable,
        tree.len(),
        "reachable node count must match OrderedTree::len"
    );
}

/// Fails unless every key is strictly greater than the one before it.
pub fn prop_assert_strictly_ascending<'a, K, I>(keys: I) -> Result<(), TestCaseError>
where
    K: Ord + Debug + 'a,
    I: IntoIterator<Item = &'a K>,
{
    let mut previous: Option<&K> = None;

    for key in keys {
        if let Some(previous) = previous {
            prop_assert!(previous < key, "{:?} is not below {:?}", previous, key);
        }
        previous = Some(key);
    }

    Ok(())
}
