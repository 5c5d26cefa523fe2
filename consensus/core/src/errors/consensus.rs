use arbor_hashes::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("block {0} hash does not meet its target")]
    InsufficientProofOfWork(Hash),

    #[error("header claims target bits {claimed:#010x} while {required:#010x} are required")]
    UnexpectedDifficulty { claimed: u32, required: u32 },

    #[error("target bits {0:#010x} are not a valid target")]
    InvalidTargetBits(u32),

    #[error("block {0} extends an orphaned or invalidated ancestor")]
    UnplaceableAncestor(Hash),

    #[error("coinbase pays {0} while at most {1} is allowed")]
    BadCoinbasePayout(u64, u64),

    #[error("block has no transactions")]
    EmptyBlock,
}

pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;
