use arbor_hashes::Hash;
use thiserror::Error;

/// Caller logic errors, never caused by network supplied data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencingError {
    #[error("block {0} is unknown")]
    UnknownBlock(Hash),

    #[error("block {0} does not extend the validated tip")]
    DoesNotExtendValidatedTip(Hash),

    #[error("block {hash} at height {height} submitted while height {expected} is expected")]
    OutOfOrder { hash: Hash, height: u32, expected: u32 },

    #[error("block {0} does not match the next header of the interval")]
    UnexpectedBlock(Hash),

    #[error("all blocks of the interval are already connected")]
    IntervalComplete,

    #[error("interval halted after a validation failure")]
    IntervalHalted,

    #[error("no block was delivered for height {0}")]
    MissingBlock(u32),

    #[error("interval does not start right after the validated tip")]
    IntervalNotContiguous,
}
