use crate::{config::genesis::GenesisBlock, hashing};
use arbor_hashes::Hash;
use serde::{Deserialize, Serialize};

/// A fixed size block header. The hash is cached and must be refreshed through
/// [`Header::finalize`] after any field mutation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
    /// Cached hash
    pub hash: Hash,
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl Header {
    pub fn new_finalized(version: i32, prev_block_hash: Hash, merkle_root: Hash, time: u32, bits: u32, nonce: u32) -> Self {
        let mut header = Self { hash: Default::default(), version, prev_block_hash, merkle_root, time, bits, nonce };
        header.finalize();
        header
    }

    /// Finalizes the header and recomputes the header hash
    pub fn finalize(&mut self) {
        self.hash = hashing::header::hash(self);
    }

    /// Whether the cached hash agrees with the header fields
    pub fn is_finalized(&self) -> bool {
        self.hash == hashing::header::hash(self)
    }
}

impl From<&GenesisBlock> for Header {
    fn from(genesis: &GenesisBlock) -> Self {
        Header::new_finalized(genesis.version, Hash::ZERO, genesis.merkle_root, genesis.time, genesis.bits, genesis.nonce)
    }
}
