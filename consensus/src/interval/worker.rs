use super::{IntervalOutcome, IntervalValidator};
use arbor_accumulator::Proof;
use arbor_consensus_core::{block::Block, errors::SequencingError, utxo::UtxoMap};
use arbor_core::{debug, warn};
use arbor_hashes::Hash;
use crossbeam_channel::Sender;
use std::thread::{self, JoinHandle};

/// A block with everything needed to connect it
#[derive(Debug, Clone)]
pub struct BlockBundle {
    pub block: Block,
    pub proof: Proof,
    pub spent_outputs: UtxoMap,
    pub deletions: Vec<Hash>,
}

/// Supplies the blocks of an interval, typically backed by a download queue
pub trait BlockSource: Send {
    /// The block at `height`, or `None` when it cannot be delivered
    fn next_block(&mut self, height: u32) -> Option<BlockBundle>;
}

impl<I: Iterator<Item = BlockBundle> + Send> BlockSource for I {
    fn next_block(&mut self, _height: u32) -> Option<BlockBundle> {
        self.next()
    }
}

/// Runs `validator` to completion on a dedicated thread and sends its outcome to `sender`.
/// A failed interval halts at the first invalid block; the failure is carried by the outcome.
pub fn spawn_interval_worker<B: BlockSource + 'static>(
    mut validator: IntervalValidator,
    mut source: B,
    sender: Sender<IntervalOutcome>,
) -> std::io::Result<JoinHandle<()>> {
    let name = format!("interval-worker-{}", validator.current_height());
    thread::Builder::new().name(name).spawn(move || {
        while !validator.is_complete() && !validator.has_error() {
            let height = validator.current_height();
            let Some(bundle) = source.next_block(height) else {
                validator.halt(SequencingError::MissingBlock(height).into());
                break;
            };
            if let Err(err) = validator.connect_next(&bundle.block, &bundle.proof, &bundle.spent_outputs, &bundle.deletions) {
                // Validation failures are already recorded, sequencing failures are not
                validator.halt(err);
            }
        }
        let outcome = validator.into_outcome();
        debug!("interval worker for {}..={} finished, complete: {}", outcome.initial_height(), outcome.final_height(), outcome.is_complete());
        if sender.send(outcome).is_err() {
            warn!("interval outcome receiver was dropped");
        }
    })
}
