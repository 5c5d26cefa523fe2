use super::HasherExtensions;
use crate::{tx::TransactionOutpoint, utxo::UtxoEntry};
use arbor_hashes::{Hash, Hasher, HasherBase, UtxoLeafHash};

/// Accumulator leaf committing to an unspent output together with its creation context
pub fn utxo_leaf_hash(outpoint: &TransactionOutpoint, entry: &UtxoEntry) -> Hash {
    let header_code = (entry.block_height << 1) | entry.is_coinbase as u32;
    let mut hasher = UtxoLeafHash::new();
    hasher
        .update(entry.block_hash)
        .update(outpoint.transaction_id)
        .update(outpoint.index.to_le_bytes())
        .update(header_code.to_le_bytes())
        .update(entry.amount.to_le_bytes())
        .write_var_bytes(&entry.script_public_key);
    hasher.finalize()
}
