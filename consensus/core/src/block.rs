use crate::{hashing, header::Header, tx::Transaction};
use arbor_hashes::Hash;
use std::sync::Arc;

/// Scale factor between base bytes and weight units
pub const WITNESS_SCALE_FACTOR: u64 = 4;

#[derive(Debug, Clone)]
pub struct Block {
    pub header: Header,
    pub transactions: Arc<Vec<Transaction>>,
}

impl Block {
    pub fn new(header: Header, txs: Vec<Transaction>) -> Self {
        Self { header, transactions: Arc::new(txs) }
    }

    pub fn from_arcs(header: Header, transactions: Arc<Vec<Transaction>>) -> Self {
        Self { header, transactions }
    }

    pub fn from_header(header: Header) -> Self {
        Self { header, transactions: Arc::new(Vec::new()) }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    /// BIP141 block weight
    pub fn weight(&self) -> u64 {
        let framing = (hashing::header::HEADER_SIZE + hashing::compact_size_len(self.transactions.len() as u64)) as u64;
        framing * WITNESS_SCALE_FACTOR + self.transactions.iter().map(|tx| tx.weight()).sum::<u64>()
    }
}
