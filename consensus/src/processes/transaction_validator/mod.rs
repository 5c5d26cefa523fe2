pub mod tx_validation_in_isolation;
pub mod tx_validation_in_utxo_context;

use arbor_consensus_core::config::params::Params;

#[derive(Clone)]
pub struct TransactionValidator {
    max_signature_script_len: usize,
    max_script_public_key_len: usize,
    max_money: u64,
    coinbase_maturity: u32,
}

impl TransactionValidator {
    pub fn new(max_signature_script_len: usize, max_script_public_key_len: usize, max_money: u64, coinbase_maturity: u32) -> Self {
        Self { max_signature_script_len, max_script_public_key_len, max_money, coinbase_maturity }
    }

    pub fn new_for_params(params: &Params) -> Self {
        Self::new(params.max_script_size, params.max_script_size, params.max_money, params.coinbase_maturity)
    }
}
