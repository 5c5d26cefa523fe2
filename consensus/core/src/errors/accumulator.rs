use arbor_accumulator::ProofError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorError {
    #[error("proof verification failed: {0}")]
    Proof(#[from] ProofError),

    #[error("deletion hashes do not match the outputs spent by the block")]
    DeletionHashMismatch,

    #[error("no accumulator snapshot stored for height {0}")]
    MissingSnapshot(u32),

    #[error("stored accumulator snapshot is corrupt")]
    CorruptSnapshot,

    #[error("interval final snapshot does not match the starting snapshot of the next interval")]
    IntervalMismatch,
}
