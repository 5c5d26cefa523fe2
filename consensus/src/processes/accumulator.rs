use arbor_accumulator::{Proof, Stump, verify_and_update};
use arbor_consensus_core::{
    block::Block,
    errors::AccumulatorError,
    hashing::leaf::utxo_leaf_hash,
    script::is_unspendable,
    tx::TransactionOutpoint,
    utxo::UtxoEntry,
};
use arbor_hashes::Hash;
use itertools::Itertools;
use std::collections::HashSet;

/// Leaves a block adds to the accumulator: every created output except the provably
/// unspendable ones and the ones already spent later in the same block
pub fn block_added_leaves(block: &Block, height: u32, spent_in_block: &HashSet<TransactionOutpoint>) -> Vec<Hash> {
    let block_hash = block.hash();
    block
        .transactions
        .iter()
        .enumerate()
        .flat_map(|(tx_index, tx)| {
            let txid = tx.id();
            tx.outputs.iter().enumerate().filter_map(move |(index, output)| {
                let outpoint = TransactionOutpoint::new(txid, index as u32);
                if is_unspendable(&output.script_public_key) || spent_in_block.contains(&outpoint) {
                    return None;
                }
                let entry = UtxoEntry::new(output.value, output.script_public_key.clone(), height, block_hash, tx_index == 0);
                Some(utxo_leaf_hash(&outpoint, &entry))
            })
        })
        .collect()
}

/// The caller supplied deletion hashes must be exactly the leaves of the outputs the block
/// spends from previous blocks, in any order and with multiplicity
pub fn check_deletion_hashes(expected: impl IntoIterator<Item = Hash>, provided: &[Hash]) -> Result<(), AccumulatorError> {
    let expected = expected.into_iter().sorted_unstable().collect_vec();
    let provided = provided.iter().copied().sorted_unstable().collect_vec();
    if expected != provided {
        return Err(AccumulatorError::DeletionHashMismatch);
    }
    Ok(())
}

/// Verifies the deletions against `snapshot` and returns the snapshot after the block
pub fn apply_block_transition(snapshot: &Stump, added: &[Hash], deletions: &[Hash], proof: &Proof) -> Result<Stump, AccumulatorError> {
    Ok(verify_and_update(snapshot, added, deletions, proof)?)
}
