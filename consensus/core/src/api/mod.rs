use crate::{blockstatus::BlockStatus, chain_tip::ChainTip, errors::BlockProcessResult, header::Header};
use arbor_accumulator::Stump;
use arbor_hashes::Hash;
use std::sync::Arc;

pub mod counters;

/// Abstracts the read side of the consensus engine, as consumed by RPC and wallet layers
pub trait ConsensusApi: Send + Sync {
    fn best_block(&self) -> Hash;

    fn best_height(&self) -> u32;

    fn chain_tip(&self) -> ChainTip;

    fn validation_index(&self) -> Hash;

    fn get_header(&self, hash: Hash) -> BlockProcessResult<Option<Header>>;

    /// Header of the active chain at `height`
    fn get_header_by_height(&self, height: u32) -> BlockProcessResult<Option<Header>>;

    fn get_block_status(&self, hash: Hash) -> BlockProcessResult<Option<BlockStatus>>;

    fn is_known(&self, hash: Hash) -> BlockProcessResult<bool> {
        Ok(self.get_block_status(hash)?.is_some())
    }

    /// Whether the block body was validated on the active chain
    fn is_valid(&self, hash: Hash) -> BlockProcessResult<bool> {
        Ok(self.get_block_status(hash)?.is_some_and(|status| status.is_validated()))
    }

    fn accumulator_snapshot(&self) -> Stump;

    fn accumulator_roots(&self) -> Vec<Hash> {
        self.accumulator_snapshot().roots
    }
}

pub type DynConsensus = Arc<dyn ConsensusApi>;
