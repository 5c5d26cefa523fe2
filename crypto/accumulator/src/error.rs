use arbor_hashes::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("proof has {targets} targets but {hashes} deletion hashes were supplied")]
    TargetCountMismatch { targets: usize, hashes: usize },

    #[error("proof targets must be strictly ascending")]
    UnsortedTargets,

    #[error("proof target {target} is out of range for an accumulator with {leaves} leaves")]
    TargetOutOfRange { target: u64, leaves: u64 },

    #[error("deletion hash at proof position {0} is the empty leaf")]
    DeletedLeaf(u64),

    #[error("proof is missing sibling hashes")]
    MissingProofHashes,

    #[error("proof carries {0} unused sibling hashes")]
    ExcessProofHashes(usize),

    #[error("computed root for the tree of height {0} does not match the accumulator")]
    RootMismatch(u8),

    #[error("accumulator leaf count overflow")]
    LeafCountOverflow,

    #[error("leaf {0} is not in the forest")]
    LeafNotFound(Hash),

    #[error("malformed accumulator data: {0}")]
    Malformed(&'static str),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<bincode::Error> for ProofError {
    fn from(err: bincode::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

pub type ProofResult<T> = std::result::Result<T, ProofError>;
