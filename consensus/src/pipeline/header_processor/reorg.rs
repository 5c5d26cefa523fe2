//!
//! Fork choice, best chain switches and block invalidation.
//!
//! The active chain is the height index up to the best block. Every other placeable
//! header hangs off it through a branch of `InFork` records. A branch only replaces the
//! active chain when it carries strictly more cumulative work, so ties keep the chain
//! that was seen first.
//!

use super::HeaderProcessor;
use crate::model::{chain_state::ChainState, stores::ChainStore};
use arbor_accumulator::Stump;
use arbor_consensus_core::{
    blockstatus::BlockStatus,
    errors::{AccumulatorError, BlockProcessError, BlockProcessResult, ConsensusError},
    header_record::HeaderRecord,
    pow::{add_work, calc_work},
};
use arbor_core::{debug, info, warn};
use arbor_hashes::Hash;
use arbor_math::Uint256;
use std::sync::atomic::Ordering;

/// A chain segment hanging off the active chain
pub(super) struct Branch {
    /// Height of the last block shared with the active chain
    pub fork_height: u32,
    /// Branch records in ascending height order
    pub records: Vec<HeaderRecord>,
}

impl Branch {
    fn work(&self) -> Uint256 {
        self.records.iter().fold(Uint256::ZERO, |acc, record| add_work(acc, calc_work(record.header.bits)))
    }
}

impl HeaderProcessor {
    /// Places a header which does not extend the best block. Returns `HeadersOnly` when its
    /// branch took over the best chain and `InFork` otherwise.
    pub(super) fn resolve_fork<S: ChainStore>(&self, state: &mut ChainState<S>, record: HeaderRecord) -> BlockProcessResult<BlockStatus> {
        let hash = record.hash();
        let status = record.status;
        let branch = self.find_branch(state, record.clone())?;
        let branch_work = branch.work();
        let active_work = self.active_work_above(state, branch.fork_height)?;

        if branch_work > active_work {
            let height = status.height().unwrap_or_default();
            self.switch_to_branch(state, branch)?;
            return Ok(BlockStatus::HeadersOnly(height));
        }

        state.save_record(&record)?;
        state.tip.remove_alternative_tip(&record.header.prev_block_hash);
        state.tip.insert_alternative_tip(hash);
        state.save_tip()?;
        debug!("header {} placed on a fork at {:?} with fork point at height {}", hash, status, branch.fork_height);
        Ok(status)
    }

    /// Walks back from `tip` until reaching the active chain
    pub(super) fn find_branch<S: ChainStore>(&self, state: &ChainState<S>, tip: HeaderRecord) -> BlockProcessResult<Branch> {
        let mut records = Vec::new();
        let mut current = tip;
        loop {
            if state.is_on_active_chain(&current)? {
                let fork_height = current.height().unwrap_or_default();
                records.reverse();
                return Ok(Branch { fork_height, records });
            }
            if !current.status.is_placeable() {
                return Err(ConsensusError::UnplaceableAncestor(current.hash()).into());
            }
            let parent = state.known_header(current.header.prev_block_hash)?;
            records.push(current);
            current = parent;
        }
    }

    fn active_work_above<S: ChainStore>(&self, state: &ChainState<S>, fork_height: u32) -> BlockProcessResult<Uint256> {
        let mut work = Uint256::ZERO;
        for height in fork_height + 1..=state.tip.depth {
            let record = state.known_header(state.known_active_hash_at(height)?)?;
            work = add_work(work, calc_work(record.header.bits));
        }
        Ok(work)
    }

    /// Height and snapshot the validation index rolls back to when the active chain is cut
    /// above `height`. Nothing rolls back while the validation index is at or below it. When
    /// the snapshot at `height` fell out of the retention window, validation restarts from
    /// the genesis snapshot and the blocks in between are connected again.
    pub(super) fn rollback_target<S: ChainStore>(&self, state: &ChainState<S>, height: u32) -> BlockProcessResult<Option<(u32, Stump)>> {
        if state.tip.validation_height <= height {
            return Ok(None);
        }
        match state.load_snapshot(height) {
            Ok(snapshot) => Ok(Some((height, snapshot))),
            Err(BlockProcessError::Accumulator(AccumulatorError::MissingSnapshot(missing))) => {
                warn!("no accumulator snapshot retained at height {}, blocks from height 1 need to be connected again", missing);
                Ok(Some((0, Stump::new())))
            }
            Err(err) => Err(err),
        }
    }

    /// Moves the validation index down to `height` on the active chain. Validated blocks
    /// between `height` and the previous validation index go back to headers only.
    fn apply_rollback<S: ChainStore>(&self, state: &mut ChainState<S>, height: u32, snapshot: Stump) -> BlockProcessResult<()> {
        let previous_height = state.tip.validation_height;
        for h in height + 1..=previous_height.min(state.tip.depth) {
            let record = state.known_header(state.known_active_hash_at(h)?)?;
            if record.status.is_validated() {
                state.set_status(record, BlockStatus::HeadersOnly(h))?;
            }
        }
        state.tip.validation_index = state.known_active_hash_at(height)?;
        state.tip.validation_height = height;
        state.save_snapshot(height, &snapshot)?;
        state.accumulator = snapshot;
        self.delete_snapshots_above(state, height, previous_height)?;
        info!("validation index rolled back from height {} to {} at height {}", previous_height, state.tip.validation_index, height);
        Ok(())
    }

    /// Deletes the snapshots stored for heights in `height + 1..=previous_height`. Only the
    /// retention window below `previous_height` can hold any.
    pub(super) fn delete_snapshots_above<S: ChainStore>(&self, state: &mut ChainState<S>, height: u32, previous_height: u32) -> BlockProcessResult<()> {
        let oldest_retained = self.config.snapshot_retention_depth.map_or(0, |depth| previous_height.saturating_sub(depth));
        for stale in (height + 1).max(oldest_retained)..=previous_height {
            state.delete_snapshot(stale)?;
        }
        Ok(())
    }

    /// Makes `branch` the active chain. The abandoned part of the active chain becomes
    /// a fork and the validation index rolls back to the fork point when needed.
    pub(super) fn switch_to_branch<S: ChainStore>(&self, state: &mut ChainState<S>, branch: Branch) -> BlockProcessResult<()> {
        let Some(new_tip) = branch.records.last().map(|record| (record.hash(), record.height().unwrap_or_default())) else {
            return Ok(());
        };
        let fork_height = branch.fork_height;
        let (old_best, old_depth) = (state.tip.best_block, state.tip.depth);

        // Load the rollback snapshot before touching anything
        let rollback = self.rollback_target(state, fork_height)?;

        for height in fork_height + 1..=old_depth {
            let record = state.known_header(state.known_active_hash_at(height)?)?;
            state.set_status(record, BlockStatus::InFork(height))?;
        }
        if old_depth > fork_height {
            state.tip.insert_alternative_tip(old_best);
        }
        if state.tip.assume_valid_index.is_some_and(|height| height > fork_height) {
            state.tip.assume_valid_index = None;
        }

        for record in branch.records {
            let hash = record.hash();
            let height = record.height().unwrap_or_default();
            state.set_status(record, BlockStatus::HeadersOnly(height))?;
            state.save_height_index(height, hash)?;
            state.tip.remove_alternative_tip(&hash);
            self.track_assume_valid(state, hash, height);
        }
        (state.tip.best_block, state.tip.depth) = new_tip;

        if let Some((height, snapshot)) = rollback {
            self.apply_rollback(state, height, snapshot)?;
        }
        state.save_tip()?;
        state.flush()?;

        self.counters.reorg_counts.fetch_add(1, Ordering::Relaxed);
        info!(
            "reorg: best chain switched from {} (height {}) to {} (height {}), fork point at height {}",
            old_best, old_depth, new_tip.0, new_tip.1, fork_height
        );
        Ok(())
    }

    /// Marks `hash` and, when it is on the active chain, all of its active descendants as
    /// invalid. The best block moves to the parent and the heaviest remaining fork takes over
    /// if it carries more work.
    pub fn invalidate_block<S: ChainStore>(&self, state: &mut ChainState<S>, hash: Hash) -> BlockProcessResult<()> {
        let record = state.known_header(hash)?;
        if record.status.is_invalid() {
            return Ok(());
        }

        if state.is_on_active_chain(&record)? {
            let height = record.height().unwrap_or_default();
            if height == 0 {
                return Err(BlockProcessError::UnsupportedOperation("invalidating the genesis block"));
            }
            let parent_height = height - 1;
            let rollback = self.rollback_target(state, parent_height)?;

            for h in height..=state.tip.depth {
                let record = state.known_header(state.known_active_hash_at(h)?)?;
                state.set_status(record, BlockStatus::InvalidChain)?;
            }
            state.tip.best_block = state.known_active_hash_at(parent_height)?;
            state.tip.depth = parent_height;
            if state.tip.assume_valid_index.is_some_and(|h| h > parent_height) {
                state.tip.assume_valid_index = None;
            }
            if let Some((height, snapshot)) = rollback {
                self.apply_rollback(state, height, snapshot)?;
            }
        } else {
            state.set_status(record, BlockStatus::InvalidChain)?;
            state.tip.remove_alternative_tip(&hash);
        }

        self.switch_to_best_alternative(state)?;
        state.save_tip()?;
        state.flush()?;
        self.counters.invalidated_counts.fetch_add(1, Ordering::Relaxed);
        warn!("block {} and its descendants were marked invalid, best block is now {}", hash, state.tip.best_block);
        Ok(())
    }

    /// Drops alternative tips which descend from an invalid block and switches to the
    /// heaviest remaining one if it carries more work than the active chain
    pub(super) fn switch_to_best_alternative<S: ChainStore>(&self, state: &mut ChainState<S>) -> BlockProcessResult<()> {
        let active_total = self.active_work_to(state, state.tip.depth)?;
        let mut best: Option<(Uint256, Branch)> = None;
        for tip in state.tip.alternative_tips.clone() {
            let record = state.known_header(tip)?;
            let branch = match self.find_branch(state, record) {
                Ok(branch) => branch,
                Err(BlockProcessError::Consensus(ConsensusError::UnplaceableAncestor(_))) => {
                    debug!("alternative tip {} descends from an invalid block and is dropped", tip);
                    state.tip.remove_alternative_tip(&tip);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let total = add_work(self.active_work_to(state, branch.fork_height)?, branch.work());
            if total > active_total && best.as_ref().is_none_or(|(best_total, _)| total > *best_total) {
                best = Some((total, branch));
            }
        }

        match best {
            Some((_, branch)) => self.switch_to_branch(state, branch),
            None => Ok(()),
        }
    }

    fn active_work_to<S: ChainStore>(&self, state: &ChainState<S>, height: u32) -> BlockProcessResult<Uint256> {
        let mut work = Uint256::ZERO;
        for h in 0..=height {
            let record = state.known_header(state.known_active_hash_at(h)?)?;
            work = add_work(work, calc_work(record.header.bits));
        }
        Ok(work)
    }
}
