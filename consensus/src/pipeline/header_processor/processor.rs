use crate::{
    model::{chain_state::ChainState, stores::ChainStore},
    processes::difficulty::DifficultyManager,
};
use arbor_consensus_core::{
    api::counters::ProcessingCounters,
    blockstatus::BlockStatus,
    config::Config,
    errors::{BlockProcessResult, ConsensusError},
    header::Header,
    header_record::HeaderRecord,
};
use arbor_core::{debug, info, trace};
use arbor_hashes::Hash;
use std::sync::{atomic::Ordering, Arc};

/// Places headers in the header tree and maintains the best chain pointer.
/// Operates on the engine state handed in by the caller, who holds the write lock.
pub struct HeaderProcessor {
    pub(super) config: Arc<Config>,
    pub(super) difficulty_manager: DifficultyManager,
    pub(super) counters: Arc<ProcessingCounters>,
}

impl HeaderProcessor {
    pub fn new(config: Arc<Config>, counters: Arc<ProcessingCounters>) -> Self {
        Self { difficulty_manager: DifficultyManager::new(&config.params), config, counters }
    }

    pub fn accept_header<S: ChainStore>(&self, state: &mut ChainState<S>, mut header: Header) -> BlockProcessResult<BlockStatus> {
        header.finalize();
        let hash = header.hash;

        if let Some(record) = state.header(hash)? {
            trace!("header {} is already known with status {:?}", hash, record.status);
            if let BlockStatus::HeadersOnly(height) = record.status
                && !state.is_on_active_chain(&record)?
            {
                // Left behind by an interrupted best chain switch
                debug!("placing known header {} at height {} again", hash, height);
                if record.header.prev_block_hash == state.tip.best_block {
                    self.extend_best_chain(state, record.header, height)?;
                    return Ok(BlockStatus::HeadersOnly(height));
                }
                return self.resolve_fork(state, record.with_status(BlockStatus::InFork(height)));
            }
            return Ok(record.status);
        }

        let Some(parent) = state.header(header.prev_block_hash)? else {
            debug!("header {} has unknown parent {}, stored as orphan", hash, header.prev_block_hash);
            state.save_record(&HeaderRecord::new(header, BlockStatus::Orphan))?;
            return Ok(BlockStatus::Orphan);
        };
        let Some(parent_height) = parent.height() else {
            return Err(ConsensusError::UnplaceableAncestor(hash).into());
        };

        self.check_difficulty_and_pow(state, &header, &parent)?;
        self.counters.header_counts.fetch_add(1, Ordering::Relaxed);

        let height = parent_height + 1;
        if header.prev_block_hash == state.tip.best_block {
            self.extend_best_chain(state, header, height)?;
            return Ok(BlockStatus::HeadersOnly(height));
        }
        self.resolve_fork(state, HeaderRecord::new(header, BlockStatus::InFork(height)))
    }

    fn extend_best_chain<S: ChainStore>(&self, state: &mut ChainState<S>, header: Header, height: u32) -> BlockProcessResult<()> {
        let hash = header.hash;
        state.save_record(&HeaderRecord::new(header, BlockStatus::HeadersOnly(height)))?;
        state.save_height_index(height, hash)?;
        state.tip.best_block = hash;
        state.tip.depth = height;
        self.track_assume_valid(state, hash, height);
        state.save_tip()?;
        trace!("best chain extended to {} at height {}", hash, height);
        Ok(())
    }

    /// Records the height of the configured assume-valid block once it joins the best chain
    pub(super) fn track_assume_valid<S: ChainStore>(&self, state: &mut ChainState<S>, hash: Hash, height: u32) {
        if self.config.assume_valid == Some(hash) {
            info!("assume-valid block {} is on the best chain at height {}", hash, height);
            state.tip.assume_valid_index = Some(height);
        }
    }
}
