use super::BlockBodyProcessor;
use crate::processes::{script_flags::script_flags_for_block, transaction_validator::tx_validation_in_utxo_context::TxValidationFlags};
use arbor_consensus_core::{
    block::Block,
    errors::{BlockProcessError, BlockProcessResult, TxRuleError},
    tx::{PopulatedTransaction, TransactionOutpoint},
    utxo::{UtxoEntry, UtxoMap},
};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// The outputs spent by each transaction of a block, resolved either from the
/// caller supplied map or from outputs created earlier in the same block
pub(super) struct ResolvedSpends {
    /// Spent outputs per transaction, aligned with the transaction inputs. Empty for the coinbase.
    pub entries: Vec<Vec<UtxoEntry>>,
    /// Outputs spent from previous blocks, in input order
    pub external: Vec<(TransactionOutpoint, UtxoEntry)>,
    /// Outputs both created and spent within the block
    pub spent_in_block: HashSet<TransactionOutpoint>,
}

impl BlockBodyProcessor {
    pub(super) fn resolve_spent_outputs(&self, block: &Block, height: u32, spent_outputs: &UtxoMap) -> BlockProcessResult<ResolvedSpends> {
        let block_hash = block.hash();
        let mut created: HashMap<TransactionOutpoint, UtxoEntry> = HashMap::new();
        let mut resolved = ResolvedSpends {
            entries: Vec::with_capacity(block.transactions.len()),
            external: Vec::new(),
            spent_in_block: HashSet::new(),
        };

        for (tx_index, tx) in block.transactions.iter().enumerate() {
            let txid = tx.id();
            let is_coinbase = tx_index == 0;
            if is_coinbase {
                resolved.entries.push(Vec::new());
            } else {
                let mut entries = Vec::with_capacity(tx.inputs.len());
                for input in tx.inputs.iter() {
                    let outpoint = input.previous_outpoint;
                    // Only outputs of earlier transactions are visible here
                    let entry = match created.get(&outpoint) {
                        Some(entry) => {
                            resolved.spent_in_block.insert(outpoint);
                            entry.clone()
                        }
                        None => {
                            let entry = spent_outputs
                                .get(&outpoint)
                                .cloned()
                                .ok_or_else(|| BlockProcessError::tx(txid, TxRuleError::MissingSpentOutput(outpoint)))?;
                            resolved.external.push((outpoint, entry.clone()));
                            entry
                        }
                    };
                    entries.push(entry);
                }
                resolved.entries.push(entries);
            }

            for (index, output) in tx.outputs.iter().enumerate() {
                let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), height, block_hash, is_coinbase);
                created.insert(TransactionOutpoint::new(txid, index as u32), entry);
            }
        }
        Ok(resolved)
    }

    /// Validates every transaction against the outputs it spends and the coinbase payout.
    /// Returns the total fees of the block.
    pub(super) fn validate_body_in_context(
        &self,
        block: &Block,
        height: u32,
        resolved: &ResolvedSpends,
        flags: TxValidationFlags,
    ) -> BlockProcessResult<u64> {
        let fees = self.check_transaction_values(block, height, resolved)?;
        if flags == TxValidationFlags::Full {
            self.check_block_scripts(block, height, resolved)?;
        }
        self.coinbase_manager.validate_payout(&block.transactions[0], height, fees)?;
        Ok(fees)
    }

    fn check_transaction_values(&self, block: &Block, height: u32, resolved: &ResolvedSpends) -> BlockProcessResult<u64> {
        let mut fees: u64 = 0;
        for (tx, entries) in block.transactions.iter().zip(resolved.entries.iter()).skip(1) {
            let populated = PopulatedTransaction::new(tx, entries.clone());
            let fee = self
                .transaction_validator
                .validate_populated_transaction_values(&populated, height)
                .map_err(|err| BlockProcessError::tx(tx.id(), err))?;
            fees = fees.saturating_add(fee);
        }
        Ok(fees)
    }

    /// Script checks run in parallel. When several transactions fail, the one with the
    /// lowest index is reported so the outcome does not depend on scheduling.
    fn check_block_scripts(&self, block: &Block, height: u32, resolved: &ResolvedSpends) -> BlockProcessResult<()> {
        let script_flags = script_flags_for_block(&self.config.params, height, block.hash());
        let verifier = self.script_verifier.as_ref();
        let failure = block
            .transactions
            .par_iter()
            .zip(resolved.entries.par_iter())
            .enumerate()
            .skip(1)
            .filter_map(|(index, (tx, entries))| {
                let populated = PopulatedTransaction::new(tx, entries.clone());
                self.transaction_validator.check_scripts(&populated, verifier, script_flags).err().map(|err| (index, tx.id(), err))
            })
            .min_by_key(|(index, _, _)| *index);

        match failure {
            Some((_, txid, err)) => Err(BlockProcessError::tx(txid, err)),
            None => Ok(()),
        }
    }
}
