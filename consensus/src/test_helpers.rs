//! Block and header builders for regtest chains, plus a full-forest UTXO tracker
//! producing the proof data `connect_block` expects.

use crate::processes::{accumulator::block_added_leaves, coinbase::serialize_height};
use arbor_accumulator::{MemForest, Proof, ProofResult, Stump};
use arbor_consensus_core::{
    block::Block,
    config::{params::REGTEST_PARAMS, Config, ConfigBuilder},
    hashing::leaf::utxo_leaf_hash,
    header::Header,
    merkle::calc_tx_merkle_root,
    pow::check_proof_of_work,
    script::is_unspendable,
    testutils::op_true_script::op_true_script,
    tx::{Transaction, TransactionInput, TransactionOutpoint, TransactionOutput},
    utxo::{UtxoEntry, UtxoMap},
};
use arbor_hashes::Hash;
use arbor_math::Uint256;
use std::collections::{HashMap, HashSet};

pub const TEST_BLOCK_VERSION: i32 = 4;

/// Spacing used between test block timestamps, well below the min-difficulty gap
pub const TEST_BLOCK_SPACING: u32 = 60;

pub fn regtest_config() -> Config {
    ConfigBuilder::new(REGTEST_PARAMS).build()
}

pub fn genesis_header() -> Header {
    Header::from(&REGTEST_PARAMS.genesis)
}

/// Grinds the nonce until the header meets its own target. Regtest targets accept
/// about every second hash.
pub fn mine_header(prev: &Header, merkle_root: Hash, time: u32, bits: u32) -> Header {
    let target = Uint256::from_compact_target_bits(bits).unwrap_or(Uint256::MAX);
    let mut header = Header::new_finalized(TEST_BLOCK_VERSION, prev.hash, merkle_root, time, bits, 0);
    while !check_proof_of_work(header.hash, target) {
        header.nonce += 1;
        header.finalize();
    }
    header
}

/// A header which fails its own proof of work target
pub fn unmined_header(prev: &Header, merkle_root: Hash, time: u32, bits: u32) -> Header {
    let target = Uint256::from_compact_target_bits(bits).unwrap_or(Uint256::MAX);
    let mut header = Header::new_finalized(TEST_BLOCK_VERSION, prev.hash, merkle_root, time, bits, 0);
    while check_proof_of_work(header.hash, target) {
        header.nonce += 1;
        header.finalize();
    }
    header
}

/// A coinbase committing to `height`, paying `value` to an anyone-can-spend output.
/// `tag` distinguishes coinbases of competing blocks at the same height.
pub fn coinbase_tx(height: u32, value: u64, tag: u8) -> Transaction {
    let mut script = serialize_height(height);
    script.push(tag);
    Transaction::new(
        1,
        vec![TransactionInput::new(TransactionOutpoint::null(), script, u32::MAX)],
        vec![TransactionOutput::new(value, op_true_script())],
        0,
    )
}

/// Spends `inputs` with empty signature scripts into anyone-can-spend outputs of `values`
pub fn spend_tx(inputs: &[TransactionOutpoint], values: &[u64]) -> Transaction {
    Transaction::new(
        2,
        inputs.iter().map(|outpoint| TransactionInput::new(*outpoint, vec![], u32::MAX)).collect(),
        values.iter().map(|&value| TransactionOutput::new(value, op_true_script())).collect(),
        0,
    )
}

/// Builds and mines a block over `txs`, the first of which must be the coinbase
pub fn build_block(prev: &Header, txs: Vec<Transaction>) -> Block {
    let (merkle_root, _) = calc_tx_merkle_root(txs.iter());
    let header = mine_header(prev, merkle_root, prev.time + TEST_BLOCK_SPACING, prev.bits);
    Block::new(header, txs)
}

/// A block holding only a coinbase claiming the full subsidy at `height`
pub fn build_empty_block(prev: &Header, height: u32, tag: u8) -> Block {
    let subsidy = REGTEST_PARAMS.block_subsidy(height);
    build_block(prev, vec![coinbase_tx(height, subsidy, tag)])
}

/// Everything `connect_block` needs besides the block itself
#[derive(Debug, Clone)]
pub struct ConnectData {
    pub proof: Proof,
    pub spent_outputs: UtxoMap,
    pub deletions: Vec<Hash>,
}

/// Tracks the full UTXO set of a single chain together with a [`MemForest`] mirroring
/// the accumulator, so tests can produce proofs for the blocks they build
#[derive(Default, Clone)]
pub struct UtxoTracker {
    forest: MemForest,
    utxos: HashMap<TransactionOutpoint, UtxoEntry>,
}

impl UtxoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stump(&self) -> Stump {
        self.forest.to_stump()
    }

    pub fn get(&self, outpoint: &TransactionOutpoint) -> Option<&UtxoEntry> {
        self.utxos.get(outpoint)
    }

    /// Spent outputs, proof and deletion hashes for connecting `block` on top of the
    /// tracked state. Outputs missing from the tracked set are left out.
    pub fn connect_data(&self, block: &Block) -> ProofResult<ConnectData> {
        let (spent_outputs, _) = self.split_spends(block);
        let leaves: Vec<Hash> = spent_outputs.iter().map(|(outpoint, entry)| utxo_leaf_hash(outpoint, entry)).collect();
        let (proof, deletions) = self.forest.prove(&leaves)?;
        Ok(ConnectData { proof, spent_outputs, deletions })
    }

    /// Moves the tracked state past `block`
    pub fn apply(&mut self, block: &Block, height: u32) -> ProofResult<()> {
        let (spent_outputs, spent_in_block) = self.split_spends(block);
        let deletions: Vec<Hash> = spent_outputs.iter().map(|(outpoint, entry)| utxo_leaf_hash(outpoint, entry)).collect();
        let added = block_added_leaves(block, height, &spent_in_block);
        self.forest.modify(&added, &deletions)?;

        for outpoint in spent_outputs.keys() {
            self.utxos.remove(outpoint);
        }
        let block_hash = block.hash();
        for (tx_index, tx) in block.transactions.iter().enumerate() {
            for (index, output) in tx.outputs.iter().enumerate() {
                let outpoint = TransactionOutpoint::new(tx.id(), index as u32);
                if spent_in_block.contains(&outpoint) || is_unspendable(&output.script_public_key) {
                    continue;
                }
                self.utxos.insert(outpoint, UtxoEntry::new(output.value, output.script_public_key.clone(), height, block_hash, tx_index == 0));
            }
        }
        Ok(())
    }

    /// Splits the inputs of `block` into outputs spent from the tracked set and outputs
    /// created and spent within the block
    fn split_spends(&self, block: &Block) -> (UtxoMap, HashSet<TransactionOutpoint>) {
        let mut created = HashSet::new();
        let mut spent_outputs = UtxoMap::new();
        let mut spent_in_block = HashSet::new();
        for tx in block.transactions.iter() {
            if !tx.is_coinbase() {
                for input in tx.inputs.iter() {
                    if created.contains(&input.previous_outpoint) {
                        spent_in_block.insert(input.previous_outpoint);
                    } else if let Some(entry) = self.utxos.get(&input.previous_outpoint) {
                        spent_outputs.insert(input.previous_outpoint, entry.clone());
                    }
                }
            }
            created.extend((0..tx.outputs.len() as u32).map(|index| TransactionOutpoint::new(tx.id(), index)));
        }
        (spent_outputs, spent_in_block)
    }
}
