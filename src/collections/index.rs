use std::{
    fmt::{self, Display},
    io::{self, Write},
    marker::PhantomData,
};

use digest::{consts::U32, Digest};
use proptest::{collection::vec, prelude::*};
use sha2::Sha256;
use tracing::{debug, trace};

use super::{Iter, OrderedTree};
use crate::values::KeyDigest;

/// A key/value index that stores every entry under the digest of its key.
///
/// Application keys are reduced to their canonical form (their [`Display`] rendering), hashed with
/// `D` (SHA-256 unless chosen otherwise) and the resulting [`KeyDigest`] is used as the key of an
/// [`OrderedTree`]. Enumeration therefore follows digest order, not the natural order of the
/// application keys.
///
/// Two keys whose digests collide are indistinguishable: the second insert is a silent no-op,
/// just like re-inserting the same key.
pub struct HashedIndex<V, D = Sha256> {
    tree: OrderedTree<KeyDigest, V>,
    _digest: PhantomData<fn() -> D>,
}

/// One row of an index report, rendered as `Key: <digest>, Value: <value>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a, V> {
    pub digest: KeyDigest,
    pub value: &'a V,
}

impl<V: Display> Display for Entry<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key: {}, Value: {}", self.digest, self.value)
    }
}

impl<V, D> Default for HashedIndex<V, D> {
    fn default() -> Self {
        Self {
            tree: OrderedTree::new(),
            _digest: PhantomData,
        }
    }
}

impl<V, D> HashedIndex<V, D>
where
    D: Digest<OutputSize = U32>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The tree key an application key is stored under.
    pub fn digest<K: Display + ?Sized>(key: &K) -> KeyDigest {
        KeyDigest::of::<D, K>(key)
    }

    /// Stores `value` under `key`, returning whether a new entry was created.
    ///
    /// If an entry with the same digest already exists it is left untouched and `value` is
    /// dropped.
    pub fn insert<K: Display + ?Sized>(&mut self, key: &K, value: V) -> bool {
        let digest = Self::digest(key);
        trace!(%digest, "inserting index entry");

        self.tree.insert(digest, value)
    }

    pub fn search<K: Display + ?Sized>(&self, key: &K) -> Option<&V> {
        self.tree.search(&Self::digest(key))
    }

    pub fn contains<K: Display + ?Sized>(&self, key: &K) -> bool {
        self.tree.contains(&Self::digest(key))
    }

    /// Removes the entry stored under `key`, if any.
    pub fn delete<K: Display + ?Sized>(&mut self, key: &K) -> Option<V> {
        let digest = Self::digest(key);
        let removed = self.tree.delete(&digest);
        trace!(%digest, removed = removed.is_some(), "deleted index entry");

        removed
    }
}

impl<V, D> HashedIndex<V, D> {
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &OrderedTree<KeyDigest, V> {
        &self.tree
    }

    /// All entries in ascending digest order.
    pub fn entries(&self) -> Entries<'_, V> {
        Entries {
            inner: self.tree.iter(),
        }
    }
}

impl<V: Display, D> HashedIndex<V, D> {
    /// Prints one `Key: <digest>, Value: <value>` line per entry to standard output.
    pub fn display(&self) -> io::Result<()> {
        self.display_to(&mut io::stdout().lock())
    }

    /// Writes one `Key: <digest>, Value: <value>` line per entry to `out`, in digest order.
    pub fn display_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for entry in self.entries() {
            writeln!(out, "{entry}")?;
        }
        out.flush()?;

        debug!(entries = self.len(), "wrote index report");

        Ok(())
    }
}

impl<V: Display, D> Display for HashedIndex<V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries() {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl<V: fmt::Debug, D> fmt::Debug for HashedIndex<V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedIndex")
            .field("entries", &self.tree)
            .finish()
    }
}

impl<V: Clone, D> Clone for HashedIndex<V, D> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            _digest: PhantomData,
        }
    }
}

impl<V: PartialEq, D> PartialEq for HashedIndex<V, D> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<V, D> Arbitrary for HashedIndex<V, D>
where
    V: Arbitrary + 'static,
    D: Digest<OutputSize = U32> + 'static,
{
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        vec(any::<(String, V)>(), 0..32)
            .prop_map(|entries| {
                let mut index = Self::new();
                for (key, value) in entries {
                    index.insert(&key, value);
                }
                index
            })
            .boxed()
    }
}

/// Iterator over the [`Entry`] rows of a [`HashedIndex`], in digest order.
pub struct Entries<'a, V> {
    inner: Iter<'a, KeyDigest, V>,
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = Entry<'a, V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(digest, value)| Entry {
                digest: *digest,
                value,
            })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Entries<'_, V> {}
