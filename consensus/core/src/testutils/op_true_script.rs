use crate::{
    script::{ScriptError, ScriptFlags, ScriptVerifier, OP_TRUE},
    tx::{PopulatedTransaction, ScriptVec},
};
use std::sync::atomic::{AtomicU64, Ordering};

/// A locking script anyone can spend with an empty signature script
pub fn op_true_script() -> ScriptVec {
    vec![OP_TRUE]
}

/// Script verifier accepting exactly the spends of [`op_true_script`] outputs with an empty
/// signature script. Counts the transactions it was asked to verify.
#[derive(Default)]
pub struct OpTrueVerifier {
    verified: AtomicU64,
}

impl OpTrueVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verified_count(&self) -> u64 {
        self.verified.load(Ordering::Relaxed)
    }
}

impl ScriptVerifier for OpTrueVerifier {
    fn verify(&self, tx: &PopulatedTransaction, _flags: ScriptFlags) -> Result<(), ScriptError> {
        self.verified.fetch_add(1, Ordering::Relaxed);
        for (i, (input, entry)) in tx.populated_inputs().enumerate() {
            if entry.script_public_key != [OP_TRUE] || !input.signature_script.is_empty() {
                return Err(ScriptError::EvalFalse(i, "stack top is false".to_string()));
            }
        }
        Ok(())
    }
}
