use crate::{hashing, utxo::UtxoEntry};
use arbor_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub type TransactionId = Hash;

/// Signature and locking scripts are raw byte vectors
pub type ScriptVec = Vec<u8>;

/// Represents a transaction outpoint
#[derive(Eq, Hash, PartialEq, Debug, Copy, Clone, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TransactionOutpoint {
    pub transaction_id: TransactionId,
    pub index: u32,
}

impl TransactionOutpoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self { transaction_id, index }
    }

    /// The outpoint referenced by coinbase inputs
    pub const fn null() -> Self {
        Self { transaction_id: Hash::ZERO, index: u32::MAX }
    }

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX && self.transaction_id.is_zero()
    }
}

impl Display for TransactionOutpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.transaction_id, self.index)
    }
}

/// Represents a transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub previous_outpoint: TransactionOutpoint,
    pub signature_script: ScriptVec,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>,
}

impl TransactionInput {
    pub fn new(previous_outpoint: TransactionOutpoint, signature_script: ScriptVec, sequence: u32) -> Self {
        Self { previous_outpoint, signature_script, sequence, witness: Vec::new() }
    }

    pub fn with_witness(mut self, witness: Vec<Vec<u8>>) -> Self {
        self.witness = witness;
        self
    }
}

/// Represents a transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: u64,
    pub script_public_key: ScriptVec,
}

impl TransactionOutput {
    pub fn new(value: u64, script_public_key: ScriptVec) -> Self {
        Self { value, script_public_key }
    }
}

/// Represents a transaction. The id is cached and must be refreshed through
/// [`Transaction::finalize`] after any field mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,

    // A field that is used to cache the transaction ID.
    // Always use the corresponding self.id() instead of accessing this field directly
    id: TransactionId,
}

impl Transaction {
    pub fn new(version: i32, inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>, lock_time: u32) -> Self {
        let mut tx = Self { version, inputs, outputs, lock_time, id: Default::default() };
        tx.finalize();
        tx
    }

    /// Recomputes and caches the transaction id
    pub fn finalize(&mut self) {
        self.id = hashing::tx::id(self);
    }

    #[inline(always)]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn wtxid(&self) -> Hash {
        hashing::tx::wtxid(self)
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_outpoint.is_null()
    }

    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    /// BIP141 weight: base size counted four times, witness bytes once
    pub fn weight(&self) -> u64 {
        (hashing::tx::base_size(self) * 3 + hashing::tx::total_size(self)) as u64
    }
}

/// A transaction together with the outputs its inputs spend, aligned by input index
pub struct PopulatedTransaction<'a> {
    pub tx: &'a Transaction,
    pub entries: Vec<UtxoEntry>,
}

impl<'a> PopulatedTransaction<'a> {
    pub fn new(tx: &'a Transaction, entries: Vec<UtxoEntry>) -> Self {
        assert_eq!(tx.inputs.len(), entries.len());
        Self { tx, entries }
    }

    pub fn populated_inputs(&self) -> impl ExactSizeIterator<Item = (&TransactionInput, &UtxoEntry)> {
        self.tx.inputs.iter().zip(self.entries.iter())
    }

    pub fn id(&self) -> TransactionId {
        self.tx.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    /// The only transaction of the mainnet genesis block
    fn genesis_coinbase() -> Transaction {
        let mut script_sig = vec![0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04, 0x45];
        script_sig.extend_from_slice(b"The Times 03/Jan/2009 Chancellor on brink of second bailout for banks");
        let mut script_pubkey = vec![0x41];
        let pubkey = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";
        let mut key = [0u8; 65];
        decode_hex(pubkey, &mut key);
        script_pubkey.extend_from_slice(&key);
        script_pubkey.push(0xac);
        Transaction::new(
            1,
            vec![TransactionInput::new(TransactionOutpoint::null(), script_sig, u32::MAX)],
            vec![TransactionOutput::new(50 * 100_000_000, script_pubkey)],
            0,
        )
    }

    fn decode_hex(hex: &str, out: &mut [u8]) {
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            out[i] = u8::from_str_radix(std::str::from_utf8(chunk).unwrap(), 16).unwrap();
        }
    }

    #[test]
    fn test_genesis_coinbase_id() {
        let tx = genesis_coinbase();
        assert!(tx.is_coinbase());
        assert!(!tx.has_witness());
        assert_eq!(tx.id(), Hash::from_str("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b").unwrap());
        assert_eq!(tx.wtxid(), tx.id());
        assert_eq!(hashing::tx::base_size(&tx), 204);
        assert_eq!(tx.weight(), 816);
    }

    #[test]
    fn test_witness_changes_wtxid_only() {
        let input = TransactionInput::new(TransactionOutpoint::new(1.into(), 0), vec![], 0);
        let tx = Transaction::new(2, vec![input.clone()], vec![TransactionOutput::new(1, vec![0x51])], 0);
        let witness_tx = Transaction::new(2, vec![input.with_witness(vec![vec![1, 2, 3]])], vec![TransactionOutput::new(1, vec![0x51])], 0);
        assert_eq!(tx.id(), witness_tx.id());
        assert_ne!(tx.wtxid(), witness_tx.wtxid());
        // marker + flag + one stack with a single 3 byte item
        assert_eq!(hashing::tx::total_size(&witness_tx), hashing::tx::base_size(&tx) + 2 + 1 + 1 + 3);
        assert_eq!(witness_tx.weight(), tx.weight() + 7);
    }
}
