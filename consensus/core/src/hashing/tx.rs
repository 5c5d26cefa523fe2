use super::{HasherExtensions, SizeCounter};
use crate::tx::{Transaction, TransactionId};
use arbor_hashes::{Hash, Hasher, HasherBase, TransactionHash};

/// Feeds the wire serialization of `tx` into `hasher`. The segwit marker, flag and
/// witness stacks are included only when `include_witness` is set and the transaction
/// carries witness data.
pub fn write_transaction<H: HasherBase>(hasher: &mut H, tx: &Transaction, include_witness: bool) {
    let with_witness = include_witness && tx.has_witness();
    hasher.update(tx.version.to_le_bytes());
    if with_witness {
        hasher.update([0x00, 0x01]);
    }

    hasher.write_compact_size(tx.inputs.len() as u64);
    for input in tx.inputs.iter() {
        hasher
            .update(input.previous_outpoint.transaction_id)
            .update(input.previous_outpoint.index.to_le_bytes())
            .write_var_bytes(&input.signature_script)
            .update(input.sequence.to_le_bytes());
    }

    hasher.write_compact_size(tx.outputs.len() as u64);
    for output in tx.outputs.iter() {
        hasher.update(output.value.to_le_bytes()).write_var_bytes(&output.script_public_key);
    }

    if with_witness {
        for input in tx.inputs.iter() {
            hasher.write_compact_size(input.witness.len() as u64);
            for item in input.witness.iter() {
                hasher.write_var_bytes(item);
            }
        }
    }

    hasher.update(tx.lock_time.to_le_bytes());
}

/// Transaction id, which commits to everything but the witness data
pub fn id(tx: &Transaction) -> TransactionId {
    let mut hasher = TransactionHash::default();
    write_transaction(&mut hasher, tx, false);
    hasher.finalize()
}

/// Witness transaction id. Equal to the id for transactions without witness data.
pub fn wtxid(tx: &Transaction) -> Hash {
    let mut hasher = TransactionHash::default();
    write_transaction(&mut hasher, tx, true);
    hasher.finalize()
}

/// Serialized size without witness data
pub fn base_size(tx: &Transaction) -> usize {
    let mut counter = SizeCounter::default();
    write_transaction(&mut counter, tx, false);
    counter.0
}

/// Serialized size including witness data
pub fn total_size(tx: &Transaction) -> usize {
    let mut counter = SizeCounter::default();
    write_transaction(&mut counter, tx, true);
    counter.0
}
