use arbor_consensus_core::{
    config::{
        constants::consensus::{MAX_COINBASE_SCRIPT_LEN, MIN_COINBASE_SCRIPT_LEN},
        params::Params,
    },
    errors::{ConsensusError, StructuralError, TxRuleError},
    tx::{ScriptVec, Transaction},
};

#[derive(Clone)]
pub struct CoinbaseManager {
    bip34_height: u32,
    subsidy_halving_interval: u32,
    initial_subsidy: u64,
    min_script_len: usize,
    max_script_len: usize,
}

impl CoinbaseManager {
    pub fn new(params: &Params) -> Self {
        Self {
            bip34_height: params.bip34_height,
            subsidy_halving_interval: params.subsidy_halving_interval,
            initial_subsidy: params.block_subsidy(0),
            min_script_len: MIN_COINBASE_SCRIPT_LEN,
            max_script_len: MAX_COINBASE_SCRIPT_LEN,
        }
    }

    pub fn calc_block_subsidy(&self, height: u32) -> u64 {
        let halvings = height / self.subsidy_halving_interval;
        if halvings >= 64 { 0 } else { self.initial_subsidy >> halvings }
    }

    pub fn validate_coinbase_script_length(&self, coinbase: &Transaction) -> Result<(), TxRuleError> {
        let len = coinbase.inputs[0].signature_script.len();
        if len < self.min_script_len || len > self.max_script_len {
            return Err(TxRuleError::CoinbaseScriptLength(len, self.min_script_len, self.max_script_len));
        }
        Ok(())
    }

    /// Once BIP34 is active the coinbase script must open with a minimal push of the block height
    pub fn validate_height_commitment(&self, coinbase: &Transaction, height: u32) -> Result<(), StructuralError> {
        if height < self.bip34_height {
            return Ok(());
        }
        let expected = serialize_height(height);
        if !coinbase.inputs[0].signature_script.starts_with(&expected) {
            return Err(StructuralError::BadHeightCommitment(height));
        }
        Ok(())
    }

    /// The coinbase may claim at most the subsidy plus all fees paid in the block
    pub fn validate_payout(&self, coinbase: &Transaction, height: u32, fees: u64) -> Result<(), ConsensusError> {
        let allowed = self.calc_block_subsidy(height).saturating_add(fees);
        let payout = coinbase.outputs.iter().try_fold(0u64, |acc, output| acc.checked_add(output.value)).unwrap_or(u64::MAX);
        if payout > allowed {
            return Err(ConsensusError::BadCoinbasePayout(payout, allowed));
        }
        Ok(())
    }
}

/// Script encoding of `height` as pushed by `<height> OP_...`: small integers use the
/// dedicated opcodes, larger ones a minimal little endian number push
pub fn serialize_height(height: u32) -> ScriptVec {
    match height {
        0 => vec![0x00],
        1..=16 => vec![0x50 + height as u8],
        _ => {
            let mut num: Vec<u8> = height.to_le_bytes().into_iter().collect();
            while num.last() == Some(&0) {
                num.pop();
            }
            if num.last().is_some_and(|b| b & 0x80 != 0) {
                num.push(0x00);
            }
            let mut script = Vec::with_capacity(num.len() + 1);
            script.push(num.len() as u8);
            script.extend(num);
            script
        }
    }
}
