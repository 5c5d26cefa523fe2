//!
//! Reconciliation of the chain tip with the store contents after a restart.
//!
//! Header records and height index entries are durable as soon as they are written, the
//! tip only once flushed. After an unclean shutdown the persisted tip may lag behind the
//! index, and a best chain switch may have been cut short after rewriting part of it. The
//! active chain is therefore rebuilt from the height index above the validation index, and
//! branches which fell off it are placed as forks before fork choice runs again.
//!

use super::HeaderProcessor;
use crate::model::{chain_state::ChainState, stores::ChainStore};
use arbor_consensus_core::{
    blockstatus::BlockStatus,
    errors::{BlockProcessResult, SequencingError},
};
use arbor_core::{debug, info};
use arbor_hashes::Hash;

impl HeaderProcessor {
    pub fn reconcile_active_chain<S: ChainStore>(&self, state: &mut ChainState<S>) -> BlockProcessResult<()> {
        let (persisted_best, persisted_depth) = (state.tip.best_block, state.tip.depth);

        self.reconcile_validation_index(state)?;
        let demoted = self.rebuild_from_index(state)?;

        let mut candidates = state.tip.alternative_tips.clone();
        candidates.push(persisted_best);
        for tip in candidates {
            let record = state.header(tip)?;
            let is_fork = match record {
                Some(record) if !state.is_on_active_chain(&record)? => self.mark_as_fork(state, tip)?,
                _ => false,
            };
            if is_fork {
                state.tip.insert_alternative_tip(tip);
            } else {
                state.tip.remove_alternative_tip(&tip);
            }
        }
        self.refresh_assume_valid(state)?;

        if (state.tip.best_block, state.tip.depth) != (persisted_best, persisted_depth) || demoted > 0 {
            info!(
                "reconciled best chain from {} (height {}) to {} (height {}), {} blocks back to headers only",
                persisted_best, persisted_depth, state.tip.best_block, state.tip.depth, demoted
            );
        }
        self.switch_to_best_alternative(state)?;
        state.save_tip()?;
        state.flush()
    }

    /// The validation index drops off the height index when a best chain switch rewrote the
    /// index above the fork point without persisting the rollback. Validation then resumes
    /// from the highest ancestor still indexed.
    fn reconcile_validation_index<S: ChainStore>(&self, state: &mut ChainState<S>) -> BlockProcessResult<()> {
        let (mut hash, mut height) = (state.tip.validation_index, state.tip.validation_height);
        while state.indexed_hash_at(height)? != Some(hash) {
            let Some(parent_height) = height.checked_sub(1) else {
                return Err(SequencingError::MissingBlock(0).into());
            };
            hash = state.known_header(hash)?.header.prev_block_hash;
            height = parent_height;
        }

        let Some((target, snapshot)) = self.rollback_target(state, height)? else {
            return Ok(());
        };
        let previous_height = state.tip.validation_height;
        state.tip.validation_index = state.indexed_hash_at(target)?.ok_or(SequencingError::MissingBlock(target))?;
        state.tip.validation_height = target;
        state.save_snapshot(target, &snapshot)?;
        state.accumulator = snapshot;
        self.delete_snapshots_above(state, target, previous_height)?;
        info!(
            "validation index moved from height {} down to {} at height {} after an interrupted reorg",
            previous_height, state.tip.validation_index, target
        );
        Ok(())
    }

    /// Follows the height index up from the validation index for as long as it forms a
    /// chain of placeable headers, and makes that chain the active one. Every block on it
    /// above the validation index ends up headers only. Returns the number of records changed.
    fn rebuild_from_index<S: ChainStore>(&self, state: &mut ChainState<S>) -> BlockProcessResult<u32> {
        let (mut best, mut depth) = (state.tip.validation_index, state.tip.validation_height);
        let mut changed = 0;
        while let Some(next) = state.indexed_hash_at(depth + 1)? {
            let Some(record) = state.header(next)? else {
                break;
            };
            if record.header.prev_block_hash != best || record.height() != Some(depth + 1) {
                break;
            }
            best = next;
            depth += 1;
            if record.status != BlockStatus::HeadersOnly(depth) {
                state.set_status(record, BlockStatus::HeadersOnly(depth))?;
                changed += 1;
            }
        }
        state.tip.best_block = best;
        state.tip.depth = depth;
        Ok(changed)
    }

    /// Gives every record between `tip` and the active chain the fork status. Returns false
    /// when the walk meets a header which cannot be placed.
    fn mark_as_fork<S: ChainStore>(&self, state: &mut ChainState<S>, tip: Hash) -> BlockProcessResult<bool> {
        let mut current = state.known_header(tip)?;
        while !state.is_on_active_chain(&current)? {
            let Some(height) = current.height() else {
                debug!("dropping alternative tip {} which descends from unplaceable header {}", tip, current.hash());
                return Ok(false);
            };
            let parent = current.header.prev_block_hash;
            if current.status != BlockStatus::InFork(height) {
                state.set_status(current, BlockStatus::InFork(height))?;
            }
            current = state.known_header(parent)?;
        }
        Ok(true)
    }

    fn refresh_assume_valid<S: ChainStore>(&self, state: &mut ChainState<S>) -> BlockProcessResult<()> {
        state.tip.assume_valid_index = match self.config.assume_valid {
            Some(hash) => match state.header(hash)? {
                Some(record) if state.is_on_active_chain(&record)? => record.height(),
                _ => None,
            },
            None => None,
        };
        Ok(())
    }
}
