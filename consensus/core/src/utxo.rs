use crate::tx::{ScriptVec, TransactionOutpoint};
use arbor_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata of a spent output as supplied by the caller of block connection. Besides the
/// output itself it records the context the output was created in, which is what the
/// accumulator leaf commits to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UtxoEntry {
    pub amount: u64,
    pub script_public_key: ScriptVec,
    pub block_height: u32,
    pub block_hash: Hash,
    pub is_coinbase: bool,
}

impl UtxoEntry {
    pub fn new(amount: u64, script_public_key: ScriptVec, block_height: u32, block_hash: Hash, is_coinbase: bool) -> Self {
        Self { amount, script_public_key, block_height, block_hash, is_coinbase }
    }
}

/// Spent outputs keyed by the outpoint referencing them
pub type UtxoMap = HashMap<TransactionOutpoint, UtxoEntry>;
