use crate::processes::{
    accumulator::{apply_block_transition, block_added_leaves, check_deletion_hashes},
    coinbase::CoinbaseManager,
    transaction_validator::{tx_validation_in_utxo_context::TxValidationFlags, TransactionValidator},
};
use arbor_accumulator::{Proof, Stump};
use arbor_consensus_core::{
    block::Block,
    config::Config,
    errors::BlockProcessResult,
    hashing::leaf::utxo_leaf_hash,
    script::ScriptVerifier,
    utxo::UtxoMap,
};
use arbor_core::trace;
use arbor_hashes::Hash;
use std::sync::Arc;

/// A block together with the data its connection is validated against
pub struct BlockValidationInput<'a> {
    pub block: &'a Block,
    pub height: u32,
    /// Inclusion proof for the spent outputs against the current snapshot
    pub proof: &'a Proof,
    /// Every output the block spends from previous blocks
    pub spent_outputs: &'a UtxoMap,
    /// Leaf hashes of the spent outputs, aligned with the proof targets
    pub deletions: &'a [Hash],
}

#[derive(Debug, Clone)]
pub struct BodyValidationOutcome {
    /// Accumulator after applying the block
    pub snapshot: Stump,
    pub fees: u64,
}

/// Validates block bodies against an accumulator snapshot. Holds no chain state, so a
/// single instance is shared by the engine and by interval workers.
#[derive(Clone)]
pub struct BlockBodyProcessor {
    pub(super) config: Arc<Config>,
    pub(super) transaction_validator: TransactionValidator,
    pub(super) coinbase_manager: CoinbaseManager,
    pub(super) script_verifier: Arc<dyn ScriptVerifier>,
}

impl BlockBodyProcessor {
    pub fn new(config: Arc<Config>, script_verifier: Arc<dyn ScriptVerifier>) -> Self {
        Self {
            transaction_validator: TransactionValidator::new_for_params(&config.params),
            coinbase_manager: CoinbaseManager::new(&config.params),
            config,
            script_verifier,
        }
    }

    /// Runs every body rule and the accumulator transition.
    /// Pure with respect to chain state: on failure nothing needs to be undone.
    ///
    /// The spent outputs are supplied by the caller, so they are proven against `snapshot`
    /// before any contextual rule reads them. Bad delivery therefore surfaces as an
    /// accumulator error and never as a rule violation of the block.
    pub fn validate_block(
        &self,
        input: &BlockValidationInput,
        snapshot: &Stump,
        flags: TxValidationFlags,
    ) -> BlockProcessResult<BodyValidationOutcome> {
        let block = input.block;
        self.validate_body_in_isolation(block, input.height)?;
        let resolved = self.resolve_spent_outputs(block, input.height, input.spent_outputs)?;

        check_deletion_hashes(resolved.external.iter().map(|(outpoint, entry)| utxo_leaf_hash(outpoint, entry)), input.deletions)?;
        let added = block_added_leaves(block, input.height, &resolved.spent_in_block);
        let snapshot = apply_block_transition(snapshot, &added, input.deletions, input.proof)?;

        let fees = self.validate_body_in_context(block, input.height, &resolved, flags)?;

        trace!(
            "block {} at height {} passed body validation: {} additions, {} deletions",
            block.hash(),
            input.height,
            added.len(),
            input.deletions.len()
        );
        Ok(BodyValidationOutcome { snapshot, fees })
    }
}
