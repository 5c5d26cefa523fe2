use super::TransactionValidator;
use arbor_consensus_core::{
    errors::{TxResult, TxRuleError},
    script::{ScriptFlags, ScriptVerifier},
    tx::PopulatedTransaction,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TxValidationFlags {
    /// Perform full validation including script verification
    Full,

    /// Perform value and maturity validations but skip script checks, used when
    /// an assume-valid policy covers the block
    SkipScriptChecks,
}

impl TransactionValidator {
    /// Maturity and value checks only
    pub fn validate_populated_transaction_values(&self, tx: &PopulatedTransaction, pov_height: u32) -> TxResult<u64> {
        self.check_transaction_coinbase_maturity(tx, pov_height)?;
        let total_in = self.check_transaction_input_amounts(tx)?;
        let total_out = Self::check_transaction_output_values(tx, total_in)?;
        Ok(total_in - total_out)
    }

    pub fn check_scripts(&self, tx: &PopulatedTransaction, script_verifier: &dyn ScriptVerifier, flags: ScriptFlags) -> TxResult<()> {
        script_verifier.verify(tx, flags)?;
        Ok(())
    }

    fn check_transaction_coinbase_maturity(&self, tx: &PopulatedTransaction, pov_height: u32) -> TxResult<()> {
        if let Some((index, (_, entry))) = tx
            .populated_inputs()
            .enumerate()
            .find(|(_, (_, entry))| entry.is_coinbase && entry.block_height.saturating_add(self.coinbase_maturity) > pov_height)
        {
            return Err(TxRuleError::ImmatureCoinbaseSpend(
                index,
                entry.block_height,
                entry.block_height.saturating_add(self.coinbase_maturity),
            ));
        }
        Ok(())
    }

    fn check_transaction_input_amounts(&self, tx: &PopulatedTransaction) -> TxResult<u64> {
        let mut total: u64 = 0;
        for (_, entry) in tx.populated_inputs() {
            match total.checked_add(entry.amount) {
                Some(new_total) if new_total <= self.max_money => total = new_total,
                _ => return Err(TxRuleError::InputAmountOverflow),
            }
        }
        Ok(total)
    }

    fn check_transaction_output_values(tx: &PopulatedTransaction, total_in: u64) -> TxResult<u64> {
        // Output ranges were checked in isolation, so the sum cannot overflow
        let total_out: u64 = tx.tx.outputs.iter().map(|out| out.value).sum();
        if total_in < total_out {
            return Err(TxRuleError::SpendTooHigh(total_out, total_in));
        }
        Ok(total_out)
    }
}
