use std::{borrow::Borrow, cmp::Ordering, fmt, iter::FusedIterator};

use proptest::{collection::vec, prelude::*};

type Link<K, V> = Option<Box<Node<K, V>>>;

/// A single vertex of an [`OrderedTree`].
///
/// Every node is owned by exactly one slot: either the tree's root or one of its parent's
/// children. There are no back references.
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
        }
    }

    /// Where `key` sits relative to this node's key.
    fn locate<Q>(&self, key: &Q) -> Ordering
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        key.cmp(self.key.borrow())
    }
}

/// An ordered map implemented as an unbalanced binary search tree.
///
/// Keys in the left subtree of a node always compare strictly less than the node's key, and keys
/// in the right subtree strictly greater. The tree never rebalances, so its height depends on
/// insertion order: inserting keys in sorted order produces a tree as deep as it is long.
///
/// Inserting a key that is already present is a no-op. The stored value is kept and the new one
/// is dropped; use [`OrderedTree::delete`] first to replace an entry.
///
/// All operations walk the tree iteratively, so even fully degenerate trees never exhaust the
/// call stack.
pub struct OrderedTree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Default for OrderedTree<K, V> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<K, V> OrderedTree<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes on the longest root-to-leaf path. Zero for an empty tree.
    pub fn height(&self) -> usize {
        let mut pending: Vec<(&Node<K, V>, usize)> =
            self.root.as_deref().map(|root| (root, 1)).into_iter().collect();
        let mut height = 0;

        while let Some((node, depth)) = pending.pop() {
            height = height.max(depth);
            pending.extend(node.left.as_deref().map(|child| (child, depth + 1)));
            pending.extend(node.right.as_deref().map(|child| (child, depth + 1)));
        }

        height
    }

    /// The entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// The entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    /// Visits every entry in ascending key order.
    ///
    /// The iterator is lazy and borrows the tree; calling `iter` again starts a fresh pass.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_deref(), self.len)
    }

    pub fn clear(&mut self) {
        release(self.root.take());
        self.len = 0;
    }

    pub(crate) fn root(&self) -> Option<&Node<K, V>> {
        self.root.as_deref()
    }
}

impl<K: Ord, V> OrderedTree<K, V> {
    /// Inserts `value` under `key`, returning whether a new node was created.
    ///
    /// When `key` is already present the tree is left untouched, including the existing value.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let slot = Self::slot(&mut self.root, &key);

        if slot.is_some() {
            return false;
        }

        *slot = Some(Box::new(Node::new(key, value)));
        self.len += 1;

        true
    }

    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();

        while let Some(node) = current {
            current = match node.locate(key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }

        None
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key).is_some()
    }

    /// Removes the entry stored under `key`, returning its value.
    ///
    /// A node with at most one child is replaced by that child. A node with two children takes
    /// over the key and value of its in-order successor (the leftmost node of its right subtree),
    /// and the successor is unlinked from the right subtree instead. Deleting an absent key
    /// leaves the tree unchanged.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let slot = Self::slot(&mut self.root, key);
        let node = slot.as_mut()?;

        let removed = if node.left.is_some() && node.right.is_some() {
            let successor = take_min(&mut node.right)?;
            let Node { key, value, .. } = *successor;

            node.key = key;
            std::mem::replace(&mut node.value, value)
        } else {
            let mut node = slot.take()?;
            *slot = node.left.take().or_else(|| node.right.take());
            node.value
        };

        self.len -= 1;

        Some(removed)
    }

    /// Walks down from `slot` to the slot holding `key`, or to the empty slot where it would be
    /// attached.
    fn slot<'a, Q>(mut slot: &'a mut Link<K, V>, key: &Q) -> &'a mut Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        loop {
            let direction = slot.as_deref().map(|node| node.locate(key));

            slot = match (direction, slot) {
                (Some(Ordering::Less), Some(node)) => &mut node.left,
                (Some(Ordering::Greater), Some(node)) => &mut node.right,
                (_, found) => return found,
            };
        }
    }
}

/// Detaches the leftmost node below `slot`, splicing its right child into its place.
fn take_min<K, V>(mut slot: &mut Link<K, V>) -> Option<Box<Node<K, V>>> {
    loop {
        let has_left = slot.as_deref().is_some_and(|node| node.left.is_some());

        slot = match (has_left, slot) {
            (true, Some(node)) => &mut node.left,
            (_, leftmost) => {
                let mut min = leftmost.take()?;
                *leftmost = min.right.take();

                return Some(min);
            }
        };
    }
}

/// Frees a subtree without recursing, so dropping a degenerate tree cannot overflow the stack.
fn release<K, V>(link: Link<K, V>) {
    let mut pending: Vec<Box<Node<K, V>>> = link.into_iter().collect();

    while let Some(mut node) = pending.pop() {
        pending.extend(node.left.take());
        pending.extend(node.right.take());
    }
}

impl<K, V> Drop for OrderedTree<K, V> {
    fn drop(&mut self) {
        release(self.root.take());
    }
}

impl<K: Clone, V: Clone> Clone for OrderedTree<K, V> {
    /// Copies node by node, so the copy has the exact shape of the source tree.
    fn clone(&self) -> Self {
        let mut root = None;
        let mut pending: Vec<(&Node<K, V>, &mut Link<K, V>)> = Vec::new();

        if let Some(node) = self.root.as_deref() {
            pending.push((node, &mut root));
        }

        while let Some((source, slot)) = pending.pop() {
            let copy = slot.insert(Box::new(Node::new(
                source.key.clone(),
                source.value.clone(),
            )));
            let Node { left, right, .. } = &mut **copy;

            if let Some(child) = source.left.as_deref() {
                pending.push((child, left));
            }
            if let Some(child) = source.right.as_deref() {
                pending.push((child, right));
            }
        }

        Self {
            root,
            len: self.len,
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for OrderedTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for OrderedTree<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for OrderedTree<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for OrderedTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Arbitrary for OrderedTree<K, V>
where
    K: Arbitrary + Ord + 'static,
    V: Arbitrary + 'static,
{
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        vec(any::<(K, V)>(), 0..64)
            .prop_map(|entries| entries.into_iter().collect())
            .boxed()
    }
}

/// In-order iterator over the entries of an [`OrderedTree`].
pub struct Iter<'a, K, V> {
    /// Nodes whose left subtree has been visited but which have not been yielded yet.
    stack: Vec<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn new(root: Option<&'a Node<K, V>>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: len,
        };
        iter.descend_left(root);
        iter
    }

    fn descend_left(&mut self, mut node: Option<&'a Node<K, V>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.as_deref());
        self.remaining -= 1;

        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_strategy::proptest;

    use super::*;
    use crate::testing::validate_tree;

    fn build(keys: &[u64]) -> OrderedTree<u64, String> {
        keys.iter().map(|k| (*k, format!("v{k}"))).collect()
    }

    fn keys(tree: &OrderedTree<u64, String>) -> Vec<u64> {
        tree.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = OrderedTree::<u64, String>::new();

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.search(&1), None);
        assert_eq!(tree.delete(&1), None);
        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.first(), None);
        assert_eq!(tree.last(), None);
    }

    #[test]
    fn test_first_key_becomes_root() {
        let tree = build(&[5]);

        assert_eq!(tree.root().map(|n| n.key), Some(5));
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_delete_single_node_empties_tree() {
        let mut tree = build(&[5]);

        assert_eq!(tree.delete(&5), Some("v5".to_string()));
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.root().is_none());
    }

    #[test]
    fn test_delete_root_with_two_children_promotes_successor() {
        let mut tree = build(&[5, 3, 8, 1, 4, 7, 9]);

        assert_eq!(tree.delete(&5), Some("v5".to_string()));

        let root = tree.root().expect("tree is not empty");
        assert_eq!(root.key, 7);
        assert_eq!(root.value, "v7");
        assert_eq!(root.left.as_ref().map(|n| n.key), Some(3));
        assert_eq!(root.right.as_ref().map(|n| n.key), Some(8));
        assert!(root.right.as_ref().is_some_and(|n| n.left.is_none()));

        assert_eq!(keys(&tree), vec![1, 3, 4, 7, 8, 9]);
        assert_eq!(tree.search(&5), None);
        assert_eq!(tree.search(&7).map(String::as_str), Some("v7"));
        validate_tree(&tree);
    }

    #[test]
    fn test_delete_successor_with_right_child() {
        // The successor of 5 is 6, which still has 7 hanging off its right.
        let mut tree = build(&[5, 2, 9, 6, 7]);

        tree.delete(&5);

        assert_eq!(tree.root().map(|n| n.key), Some(6));
        assert_eq!(keys(&tree), vec![2, 6, 7, 9]);
        validate_tree(&tree);
    }

    #[test]
    fn test_delete_node_with_one_child() {
        let mut tree = build(&[5, 3, 1]);

        tree.delete(&3);

        let root = tree.root().expect("tree is not empty");
        assert_eq!(root.left.as_ref().map(|n| n.key), Some(1));
        assert_eq!(keys(&tree), vec![1, 5]);
        validate_tree(&tree);
    }

    #[test]
    fn test_delete_leaf() {
        let mut tree = build(&[5, 3, 8]);

        tree.delete(&8);

        assert!(tree.root().is_some_and(|n| n.right.is_none()));
        assert_eq!(keys(&tree), vec![3, 5]);
    }

    #[test]
    fn test_delete_absent_key_is_noop() {
        let mut tree = build(&[5, 3, 8]);
        let before = tree.clone();

        assert_eq!(tree.delete(&4), None);
        assert_eq!(tree, before);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_insert_existing_key_keeps_first_value() {
        let mut tree = OrderedTree::new();

        assert!(tree.insert("a", 1));
        assert!(!tree.insert("a", 2));

        assert_eq!(tree.search("a"), Some(&1));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_search_by_borrowed_key() {
        let tree: OrderedTree<String, u8> = [("b".to_string(), 2), ("a".to_string(), 1)]
            .into_iter()
            .collect();

        assert_eq!(tree.search("a"), Some(&1));
        assert!(tree.contains("b"));
        assert!(!tree.contains("c"));
    }

    #[test]
    fn test_first_and_last() {
        let tree = build(&[5, 3, 8, 1, 4, 7, 9]);

        assert_eq!(tree.first().map(|(k, _)| *k), Some(1));
        assert_eq!(tree.last().map(|(k, _)| *k), Some(9));
    }

    #[test]
    fn test_sorted_insertion_degenerates_into_a_list() {
        const COUNT: u64 = 10_000;

        let mut tree: OrderedTree<u64, ()> = (0..COUNT).map(|k| (k, ())).collect();

        assert_eq!(tree.height(), COUNT as usize);
        assert_eq!(tree.iter().count(), COUNT as usize);
        assert_eq!(tree.search(&(COUNT - 1)), Some(&()));

        for key in 0..COUNT / 2 {
            tree.delete(&key);
        }

        assert_eq!(tree.len(), (COUNT / 2) as usize);
        assert_eq!(tree.first().map(|(k, _)| *k), Some(COUNT / 2));
    }

    #[test]
    fn test_clone_preserves_shape() {
        let tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        let copy = tree.clone();

        assert_eq!(copy, tree);
        assert_eq!(copy.height(), tree.height());
        assert_eq!(copy.root().map(|n| n.key), Some(5));
    }

    #[test]
    fn test_clone_of_degenerate_tree_keeps_its_shape() {
        const COUNT: u64 = 10_000;

        let tree: OrderedTree<u64, u64> = (0..COUNT).map(|k| (k, k * 2)).collect();
        let copy = tree.clone();

        assert_eq!(copy.len(), tree.len());
        assert_eq!(copy.height(), COUNT as usize);
        assert_eq!(copy.first(), Some((&0, &0)));
        assert_eq!(copy.last(), Some((&(COUNT - 1), &((COUNT - 1) * 2))));
        assert!(copy.iter().eq(tree.iter()));
    }

    #[test]
    fn test_delete_walks_to_deep_successor() {
        // 10 has two children and its successor 11 sits at the bottom of a left spine.
        let mut tree = build(&[10, 5, 20, 15, 12, 11, 13]);

        assert_eq!(tree.delete(&10), Some("v10".to_string()));

        assert_eq!(tree.root().map(|n| n.key), Some(11));
        assert_eq!(keys(&tree), vec![5, 11, 12, 13, 15, 20]);
        validate_tree(&tree);
    }

    #[test]
    fn test_clear() {
        let mut tree = build(&[2, 1, 3]);

        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.insert(1, "v1".to_string()));
    }

    #[test]
    fn test_debug_renders_as_ordered_map() {
        let tree = build(&[2, 1]);

        assert_eq!(format!("{tree:?}"), r#"{1: "v1", 2: "v2"}"#);
    }

    #[proptest(fork = false)]
    fn test_iter_is_exact_size(tree: OrderedTree<u16, u8>) {
        let iter = tree.iter();

        prop_assert_eq!(iter.len(), tree.len());
        prop_assert_eq!(iter.count(), tree.len());
    }

    #[proptest(fork = false)]
    fn test_iter_is_restartable(tree: OrderedTree<u16, u8>) {
        let first: Vec<_> = tree.iter().collect();
        let second: Vec<_> = (&tree).into_iter().collect();

        prop_assert_eq!(first, second);
    }

    #[proptest(fork = false)]
    fn test_height_is_bounded_by_len(tree: OrderedTree<u16, u8>) {
        prop_assert!(tree.height() <= tree.len());
        prop_assert_eq!(tree.height() == 0, tree.is_empty());
    }

    crate::test_ordered_tree_properties!(u8);
    crate::test_ordered_tree_properties!(u64);
    crate::test_ordered_tree_properties!(String);
    crate::test_ordered_tree_properties!(KeyDigest);
}
