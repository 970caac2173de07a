mod index;
mod tree;

pub use {
    index::{Entries, Entry, HashedIndex},
    tree::{Iter, OrderedTree},
};
