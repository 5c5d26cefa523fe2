use super::{accumulator::AccumulatorError, consensus::ConsensusError, sequencing::SequencingError, tx::TxRuleError};
use crate::tx::TransactionId;
use arbor_hashes::Hash;
use std::sync::Arc;
use thiserror::Error;

/// Errors in the shape of a block body: they do not depend on chain state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("expected merkle root {0} but found {1}")]
    BadMerkleRoot(Hash, Hash),

    #[error("the transaction list is mutated (duplicated merkle subtree)")]
    MutatedMerkleTree,

    #[error("witness commitment mismatch")]
    BadWitnessCommitment,

    #[error("witness commitment requires a single 32 byte coinbase witness item")]
    MissingWitnessReservedValue,

    #[error("block carries witness data without a witness commitment")]
    UnexpectedWitness,

    #[error("coinbase does not commit to height {0}")]
    BadHeightCommitment(u32),

    #[error("block weight {0} exceeds the limit of {1}")]
    BlockWeightTooHigh(u64, u64),

    #[error("first transaction is not a coinbase")]
    FirstTxNotCoinbase,

    #[error("transaction at index {0} is a second coinbase")]
    MultipleCoinbases(usize),

    #[error("block {0} does not match the stored header")]
    HeaderMismatch(Hash),
}

/// The error taxonomy of header acceptance and block connection. Nothing is retried
/// internally, the caller decides how each category is handled.
#[derive(Error, Debug, Clone)]
pub enum BlockProcessError {
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("transaction {txid} is invalid: {source}")]
    Transaction {
        txid: TransactionId,
        #[source]
        source: TxRuleError,
    },

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("accumulator error: {0}")]
    Accumulator(#[from] AccumulatorError),

    #[error("sequencing error: {0}")]
    Sequencing(#[from] SequencingError),

    #[error("storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),

    #[error("operation not supported: {0}")]
    UnsupportedOperation(&'static str),
}

impl BlockProcessError {
    pub fn storage<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Storage(Arc::new(err))
    }

    pub fn tx(txid: TransactionId, source: TxRuleError) -> Self {
        Self::Transaction { txid, source }
    }

    /// Whether the failure proves the block itself (and therefore its descendants) invalid.
    /// Structural and accumulator failures, as well as spent outputs the caller failed to
    /// supply, may stem from bad delivery of an honest block.
    pub fn invalidates_block(&self) -> bool {
        match self {
            Self::Transaction { source, .. } => !matches!(source, TxRuleError::MissingSpentOutput(_)),
            Self::Consensus(_) => true,
            _ => false,
        }
    }
}

pub type BlockProcessResult<T> = std::result::Result<T, BlockProcessError>;
