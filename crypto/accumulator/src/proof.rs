use crate::{codec, error::ProofResult};
use arbor_hashes::Hash;
use serde::{Deserialize, Serialize};

/// Upper bound on the encoded size of a proof accepted for decoding
pub const MAX_PROOF_BYTES: u64 = 32 * 1024 * 1024;

/// A batch inclusion proof for a set of leaves.
///
/// `targets` are the strictly ascending leaf positions being proven. `hashes` are the
/// sibling nodes which cannot be computed from the targets themselves, ordered by row
/// (leaves first) and by position within each row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub targets: Vec<u64>,
    pub hashes: Vec<Hash>,
}

impl Proof {
    pub fn new(targets: Vec<u64>, hashes: Vec<Hash>) -> Self {
        Self { targets, hashes }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn serialize(&self) -> ProofResult<Vec<u8>> {
        codec::encode(self)
    }

    /// Decodes a proof, refusing inputs larger than [`MAX_PROOF_BYTES`]
    pub fn deserialize(bytes: &[u8]) -> ProofResult<Self> {
        codec::decode(bytes, MAX_PROOF_BYTES)
    }
}
