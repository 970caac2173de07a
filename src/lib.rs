mod error;

pub mod collections;
pub mod prelude;
pub mod testing;
pub mod values;

#[doc(hidden)]
/// This is a hidden module to make the macros defined on this crate available for the users.
pub mod __dependencies {
    pub use paste;
    pub use proptest;
    pub use test_strategy;
}

/// Stamps out the property suite every [`OrderedTree`](crate::collections::OrderedTree) key type
/// must pass, with `u64` values.
#[macro_export]
macro_rules! test_ordered_tree_properties {
    ($key:ty) => {
        $crate::__dependencies::paste::paste! {
            mod [<test_ordered_tree_$key:snake>] {
                use $crate::__dependencies::{
                    proptest::prelude::*,
                    test_strategy,
                };
                use $crate::prelude::*;
                use $crate::testing::*;

                type Tree = OrderedTree<$key, u64>;

                #[cfg_attr(coverage_nightly, coverage(off))]
                #[test_strategy::proptest(fork = false)]
                fn test_matches_model(
                    #[strategy(ops::<$key, u64>(0..256))] ops: Vec<Op<$key, u64>>,
                ) {
                    let mut tree = Tree::new();
                    let model = run_against_model(&mut tree, ops)?;

                    validate_tree(&tree);
                    prop_assert!(tree.iter().eq(model.iter()));
                }

                #[cfg_attr(coverage_nightly, coverage(off))]
                #[test_strategy::proptest(fork = false)]
                fn test_traversal_is_strictly_ascending(tree: Tree) {
                    prop_assert_strictly_ascending(tree.iter().map(|(k, _)| k))?;
                }

                #[cfg_attr(coverage_nightly, coverage(off))]
                #[test_strategy::proptest(fork = false)]
                fn test_insert_then_search(mut tree: Tree, key: $key, value: u64) {
                    prop_assume!(!tree.contains(&key));

                    prop_assert!(tree.insert(key.clone(), value));
                    prop_assert_eq!(tree.search(&key), Some(&value));
                    validate_tree(&tree);
                }

                #[cfg_attr(coverage_nightly, coverage(off))]
                #[test_strategy::proptest(fork = false)]
                fn test_insert_does_not_overwrite(
                    mut tree: Tree,
                    key: $key,
                    first: u64,
                    second: u64,
                ) {
                    tree.insert(key.clone(), first);
                    let stored = tree.search(&key).copied();

                    $crate::prop_assert_does_not_change!(tree.insert(key.clone(), second), tree);
                    prop_assert_eq!(tree.search(&key).copied(), stored);
                }

                #[cfg_attr(coverage_nightly, coverage(off))]
                #[test_strategy::proptest(fork = false)]
                fn test_delete_then_search(mut tree: Tree, key: $key, value: u64) {
                    tree.insert(key.clone(), value);

                    $crate::prop_assert_changes!(tree.delete(&key), tree);
                    prop_assert_eq!(tree.search(&key), None);
                    validate_tree(&tree);
                }

                #[cfg_attr(coverage_nightly, coverage(off))]
                #[test_strategy::proptest(fork = false)]
                fn test_delete_absent_is_noop(mut tree: Tree, key: $key) {
                    prop_assume!(!tree.contains(&key));

                    $crate::prop_assert_does_not_change!(tree.delete(&key), tree);
                }

                #[cfg_attr(coverage_nightly, coverage(off))]
                #[test_strategy::proptest(fork = false)]
                fn test_len_counts_distinct_live_keys(
                    #[strategy(ops::<$key, u64>(0..128))] ops: Vec<Op<$key, u64>>,
                ) {
                    let mut tree = Tree::new();
                    let model = run_against_model(&mut tree, ops)?;

                    prop_assert_eq!(tree.iter().count(), model.len());
                    prop_assert_eq!(tree.is_empty(), model.is_empty());
                }
            }
        }
    };
}

#[macro_export]
macro_rules! prop_assert_changes {
    ($action: expr, $value: expr) => {
        let old_value = $value.clone();

        prop_assert_eq!(&$value, &old_value);

        $action;

        prop_assert_ne!(&$value, &old_value);
    };
}

#[macro_export]
macro_rules! prop_assert_does_not_change {
    ($action: expr, $value: expr) => {
        let old_value = $value.clone();

        $action;

        prop_assert_eq!(&$value, &old_value);
    };
}
