//!
//! Out-of-order validation of bounded height ranges.
//!
//! An [`IntervalValidator`] owns a [`ValidationInterval`]: a pre-ordered list of headers and a
//! trusted starting accumulator snapshot. It connects blocks strictly in order and never
//! touches the shared chain state, so any number of intervals can run side by side. Once an
//! interval completes, its [`IntervalOutcome`] is chained against the next interval and
//! imported through `Consensus::import_interval`.
//!

mod worker;

pub use worker::{spawn_interval_worker, BlockBundle, BlockSource};

use crate::{
    pipeline::body_processor::{BlockBodyProcessor, BlockValidationInput},
    processes::transaction_validator::tx_validation_in_utxo_context::TxValidationFlags,
};
use arbor_accumulator::{Proof, Stump};
use arbor_consensus_core::{
    block::Block,
    config::Config,
    errors::{AccumulatorError, BlockProcessError, BlockProcessResult, SequencingError},
    header::Header,
    script::ScriptVerifier,
    utxo::UtxoMap,
};
use arbor_core::{debug, info, warn};
use arbor_hashes::Hash;
use std::sync::Arc;

/// State of one interval. Mutated only by its owning validator.
#[derive(Debug, Clone)]
pub struct ValidationInterval {
    pub initial_height: u32,
    /// Headers of `initial_height..=final_height`, in order
    pub headers: Vec<Header>,
    /// Height of the next block to connect
    pub current_height: u32,
    pub start_snapshot: Stump,
    /// Snapshot after each connected block, aligned with `headers`
    pub snapshots: Vec<Stump>,
    /// Skip script verification for every block of the interval
    pub assume_valid: bool,
    /// First fatal failure. Once set the interval is halted.
    pub error: Option<BlockProcessError>,
}

impl ValidationInterval {
    pub fn final_height(&self) -> u32 {
        self.initial_height + self.headers.len() as u32 - 1
    }

    pub fn is_complete(&self) -> bool {
        self.snapshots.len() == self.headers.len()
    }

    /// Snapshot after the last connected block, or the starting one
    pub fn snapshot(&self) -> &Stump {
        self.snapshots.last().unwrap_or(&self.start_snapshot)
    }
}

/// Connects the blocks of a single interval
pub struct IntervalValidator {
    body_processor: BlockBodyProcessor,
    interval: ValidationInterval,
    halted: bool,
}

impl IntervalValidator {
    pub fn new(
        config: Arc<Config>,
        script_verifier: Arc<dyn ScriptVerifier>,
        initial_height: u32,
        mut headers: Vec<Header>,
        start_snapshot: Stump,
        assume_valid: bool,
    ) -> BlockProcessResult<Self> {
        if initial_height == 0 {
            return Err(BlockProcessError::UnsupportedOperation("validating the genesis block in an interval"));
        }
        if headers.is_empty() {
            return Err(BlockProcessError::UnsupportedOperation("validating an empty interval"));
        }
        headers.iter_mut().for_each(Header::finalize);
        for (prev, header) in headers.iter().zip(headers.iter().skip(1)) {
            if header.prev_block_hash != prev.hash {
                return Err(SequencingError::UnexpectedBlock(header.hash).into());
            }
        }

        let interval = ValidationInterval {
            initial_height,
            current_height: initial_height,
            snapshots: Vec::with_capacity(headers.len()),
            headers,
            start_snapshot,
            assume_valid,
            error: None,
        };
        debug!("interval {}..={} created, assume valid: {}", interval.initial_height, interval.final_height(), assume_valid);
        Ok(Self { body_processor: BlockBodyProcessor::new(config, script_verifier), interval, halted: false })
    }

    /// Connects the next block of the interval and returns its height. Validation failures
    /// are recorded and halt the interval. Sequencing failures are returned without halting.
    pub fn connect_next(&mut self, block: &Block, proof: &Proof, spent_outputs: &UtxoMap, deletions: &[Hash]) -> BlockProcessResult<u32> {
        if self.halted {
            return Err(SequencingError::IntervalHalted.into());
        }
        if self.interval.is_complete() {
            return Err(SequencingError::IntervalComplete.into());
        }

        let height = self.interval.current_height;
        let expected = &self.interval.headers[self.interval.snapshots.len()];
        if !block.header.is_finalized() || block.header != *expected {
            return Err(SequencingError::UnexpectedBlock(block.hash()).into());
        }

        let flags = if self.interval.assume_valid { TxValidationFlags::SkipScriptChecks } else { TxValidationFlags::Full };
        let input = BlockValidationInput { block, height, proof, spent_outputs, deletions };
        match self.body_processor.validate_block(&input, self.interval.snapshot(), flags) {
            Ok(outcome) => {
                self.interval.snapshots.push(outcome.snapshot);
                self.interval.current_height += 1;
                if self.interval.is_complete() {
                    info!("interval {}..={} validated", self.interval.initial_height, self.interval.final_height());
                }
                Ok(height)
            }
            Err(err) => {
                warn!("interval {}..={} halted at height {}: {}", self.interval.initial_height, self.interval.final_height(), height, err);
                self.interval.error = Some(err.clone());
                self.halted = true;
                Err(err)
            }
        }
    }

    /// Records `err` as the terminal failure unless one is already recorded
    pub fn halt(&mut self, err: BlockProcessError) {
        if !self.halted {
            warn!("interval {}..={} halted: {}", self.interval.initial_height, self.interval.final_height(), err);
            self.interval.error = Some(err);
            self.halted = true;
        }
    }

    pub fn accept_header(&mut self, _header: Header) -> BlockProcessResult<()> {
        Err(BlockProcessError::UnsupportedOperation("accept_header on an interval validator"))
    }

    pub fn reorg(&mut self, _branch_tip: Hash) -> BlockProcessResult<()> {
        Err(BlockProcessError::UnsupportedOperation("reorg on an interval validator"))
    }

    pub fn invalidate_block(&mut self, _hash: Hash) -> BlockProcessResult<()> {
        Err(BlockProcessError::UnsupportedOperation("invalidate_block on an interval validator"))
    }

    pub fn has_error(&self) -> bool {
        self.interval.error.is_some()
    }

    /// Takes the recorded failure. The interval stays halted.
    pub fn take_error(&mut self) -> Option<BlockProcessError> {
        self.interval.error.take()
    }

    pub fn is_complete(&self) -> bool {
        self.interval.is_complete()
    }

    pub fn current_height(&self) -> u32 {
        self.interval.current_height
    }

    pub fn snapshot(&self) -> &Stump {
        self.interval.snapshot()
    }

    pub fn interval(&self) -> &ValidationInterval {
        &self.interval
    }

    pub fn into_outcome(self) -> IntervalOutcome {
        IntervalOutcome { interval: self.interval, halted: self.halted }
    }
}

/// Terminal state of an interval, handed to the coordinator
#[derive(Debug, Clone)]
pub struct IntervalOutcome {
    interval: ValidationInterval,
    halted: bool,
}

impl IntervalOutcome {
    pub fn initial_height(&self) -> u32 {
        self.interval.initial_height
    }

    pub fn final_height(&self) -> u32 {
        self.interval.final_height()
    }

    pub fn is_complete(&self) -> bool {
        !self.halted && self.interval.is_complete()
    }

    pub fn error(&self) -> Option<&BlockProcessError> {
        self.interval.error.as_ref()
    }

    pub fn assume_valid(&self) -> bool {
        self.interval.assume_valid
    }

    pub fn start_snapshot(&self) -> &Stump {
        &self.interval.start_snapshot
    }

    pub fn final_snapshot(&self) -> &Stump {
        self.interval.snapshot()
    }

    pub fn headers(&self) -> &[Header] {
        &self.interval.headers
    }

    /// Per-height snapshots of the connected blocks
    pub fn snapshots(&self) -> impl Iterator<Item = (u32, &Stump)> {
        (self.interval.initial_height..).zip(self.interval.snapshots.iter())
    }

    /// The interval only counts if its final snapshot is exactly where the next interval starts
    pub fn check_links_to(&self, next_start: &Stump) -> BlockProcessResult<()> {
        if self.final_snapshot() != next_start {
            warn!("interval {}..={} does not link to the next interval", self.initial_height(), self.final_height());
            return Err(AccumulatorError::IntervalMismatch.into());
        }
        Ok(())
    }
}
