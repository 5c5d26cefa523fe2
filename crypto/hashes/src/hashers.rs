use crate::Hash;
use sha2::{Digest, Sha256};

pub trait HasherBase {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;
}

pub trait Hasher: HasherBase + Clone + Default {
    fn finalize(self) -> Hash;

    fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline(always)]
    fn hash<A: AsRef<[u8]>>(data: A) -> Hash {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Bitcoin style `sha256(sha256(x))`, used for block ids, transaction ids and merkle branches.
#[derive(Clone, Default)]
pub struct DoubleSha256(Sha256);

impl HasherBase for DoubleSha256 {
    #[inline(always)]
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0.update(data);
        self
    }
}

impl Hasher for DoubleSha256 {
    #[inline(always)]
    fn finalize(self) -> Hash {
        let first = self.0.finalize();
        Hash::from_bytes(Sha256::digest(first).into())
    }
}

pub type BlockHash = DoubleSha256;
pub type TransactionHash = DoubleSha256;
pub type MerkleBranchHash = DoubleSha256;

/// Single round sha256 over the concatenation of two children. Parent node hash of the utxo forest.
#[derive(Clone, Default)]
pub struct ForestNodeHash(Sha256);

impl HasherBase for ForestNodeHash {
    #[inline(always)]
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
        self.0.update(data);
        self
    }
}

impl Hasher for ForestNodeHash {
    #[inline(always)]
    fn finalize(self) -> Hash {
        Hash::from_bytes(self.0.finalize().into())
    }
}

macro_rules! sha256_tagged_hasher {
    ($(struct $name:ident => $domain_sep:literal),+ $(,)? ) => {$(
        /// Domain separated sha256: the tag is fed before any caller data.
        #[derive(Clone)]
        pub struct $name(Sha256);

        impl $name {
            #[inline(always)]
            pub fn new() -> Self {
                let mut inner = Sha256::new();
                inner.update($domain_sep);
                Self(inner)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl HasherBase for $name {
            #[inline(always)]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.0.update(data);
                self
            }
        }

        impl Hasher for $name {
            #[inline(always)]
            fn finalize(self) -> Hash {
                Hash::from_bytes(self.0.finalize().into())
            }
        }
    )*};
}

sha256_tagged_hasher! {
    struct UtxoLeafHash => b"arbor/utxo-leaf",
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_double_sha256() {
        // sha256d("hello")
        let expected = Hash::from_str("503d8319a48348cdc610a582f7bf754b5833df65038606eb48510790dfc99595").unwrap();
        assert_eq!(DoubleSha256::hash(b"hello"), expected);

        let mut hasher = DoubleSha256::default();
        hasher.update(b"hel").update(b"lo");
        assert_eq!(hasher.finalize(), expected);
    }

    #[test]
    fn test_tagged_hasher_is_domain_separated() {
        let data = b"some leaf data";
        assert_ne!(UtxoLeafHash::hash(data), ForestNodeHash::hash(data));
        assert_eq!(UtxoLeafHash::hash(data), UtxoLeafHash::hash(data));

        let mut hasher = UtxoLeafHash::new();
        hasher.update(data);
        hasher.reset();
        hasher.update(b"other");
        assert_eq!(hasher.finalize(), UtxoLeafHash::hash(b"other"));
    }
}
