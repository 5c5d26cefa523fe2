use super::TransactionValidator;
use arbor_consensus_core::{
    errors::{TxResult, TxRuleError},
    tx::Transaction,
};
use std::collections::HashSet;

impl TransactionValidator {
    /// Checks which only depend on the transaction itself
    pub fn validate_tx_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        self.check_transaction_inputs_in_isolation(tx)?;
        self.check_transaction_outputs_in_isolation(tx)?;
        check_duplicate_transaction_inputs(tx)
    }

    fn check_transaction_inputs_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        if tx.inputs.is_empty() {
            return Err(TxRuleError::NoTxInputs);
        }
        self.check_transaction_signature_scripts(tx)
    }

    fn check_transaction_outputs_in_isolation(&self, tx: &Transaction) -> TxResult<()> {
        if tx.outputs.is_empty() {
            return Err(TxRuleError::NoTxOutputs);
        }
        self.check_transaction_script_public_keys(tx)?;
        self.check_transaction_output_value_ranges(tx)
    }

    fn check_transaction_script_public_keys(&self, tx: &Transaction) -> TxResult<()> {
        if let Some((i, output)) =
            tx.outputs.iter().enumerate().find(|(_, output)| output.script_public_key.len() > self.max_script_public_key_len)
        {
            return Err(TxRuleError::ScriptPublicKeyTooLong(i, output.script_public_key.len(), self.max_script_public_key_len));
        }
        Ok(())
    }

    fn check_transaction_signature_scripts(&self, tx: &Transaction) -> TxResult<()> {
        // The coinbase script has its own length rule
        if tx.is_coinbase() {
            return Ok(());
        }
        if let Some((i, input)) =
            tx.inputs.iter().enumerate().find(|(_, input)| input.signature_script.len() > self.max_signature_script_len)
        {
            return Err(TxRuleError::SignatureScriptTooLong(i, input.signature_script.len(), self.max_signature_script_len));
        }
        Ok(())
    }

    fn check_transaction_output_value_ranges(&self, tx: &Transaction) -> TxResult<()> {
        let mut total: u64 = 0;
        for output in tx.outputs.iter() {
            total = match total.checked_add(output.value) {
                Some(total) if total <= self.max_money && output.value <= self.max_money => total,
                _ => return Err(TxRuleError::OutputsAboveMaxMoney(total.saturating_add(output.value), self.max_money)),
            };
        }
        Ok(())
    }
}

fn check_duplicate_transaction_inputs(tx: &Transaction) -> TxResult<()> {
    let mut existing = HashSet::with_capacity(tx.inputs.len());
    for input in tx.inputs.iter() {
        if !existing.insert(input.previous_outpoint) {
            return Err(TxRuleError::DuplicateInput(input.previous_outpoint));
        }
    }
    Ok(())
}
