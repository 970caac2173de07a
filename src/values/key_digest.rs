use std::fmt::{Display, Formatter};

use digest::{consts::U32, Digest};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;

use crate::prelude::*;

/// The ordering key of a [`HashedIndex`](crate::collections::HashedIndex): a fixed-width digest
/// of an application key.
///
/// Digests compare byte by byte. Every digest has the same width, so this is the same order as
/// comparing their lowercase hexadecimal renderings as strings.
///
/// Digests print as lowercase hex, which is how they appear in index reports. [`FromHex`] parses
/// that form back, so a digest read from a report can be looked up directly in
/// [`HashedIndex::tree`](crate::collections::HashedIndex::tree).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct KeyDigest([u8; 32]);

impl Display for KeyDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for KeyDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Arbitrary for KeyDigest {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        any::<[u8; 32]>().prop_map(KeyDigest::new).boxed()
    }
}

impl KeyDigest {
    /// Width of a digest, in bytes.
    pub const LEN: usize = 32;

    /// Creates a new digest from any type that can be converted into [u8; 32].
    pub fn new<T: Into<[u8; 32]>>(data: T) -> Self {
        KeyDigest(data.into())
    }

    /// Hashes raw bytes with the digest algorithm `D`.
    pub fn digest<D: Digest<OutputSize = U32>>(data: &[u8]) -> Self {
        let mut hasher = D::new();
        hasher.update(data);
        KeyDigest(hasher.finalize().into())
    }

    /// Hashes the canonical form of an application key, which is its [`Display`] rendering
    /// encoded as UTF-8.
    pub fn of<D, K>(key: &K) -> Self
    where
        D: Digest<OutputSize = U32>,
        K: Display + ?Sized,
    {
        Self::digest::<D>(key.to_string().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for KeyDigest {
    fn from(array: [u8; 32]) -> Self {
        KeyDigest(array)
    }
}

impl From<KeyDigest> for [u8; 32] {
    fn from(val: KeyDigest) -> Self {
        val.0
    }
}

impl AsRef<[u8]> for KeyDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ToHex for KeyDigest {
    fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromHex for KeyDigest {
    fn from_hex(input: &str) -> Result<Self> {
        let bytes = hex::decode(input)?;

        let inner: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidDigestLength {
                expected: Self::LEN,
                actual: bytes.len(),
            })?;

        Ok(KeyDigest(inner))
    }
}
