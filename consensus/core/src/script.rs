use crate::tx::PopulatedTransaction;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OP_TRUE: u8 = 0x51;
pub const OP_RETURN: u8 = 0x6a;

/// Scripts above this size can never be executed
pub const MAX_SCRIPT_SIZE: usize = 10_000;

bitflags! {
    /// Ruleset flags handed to the script verifier. Bit positions follow the reference client.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ScriptFlags: u32 {
        /// BIP16 pay-to-script-hash
        const P2SH = 1 << 0;
        /// BIP66 strict DER signatures
        const DERSIG = 1 << 2;
        /// BIP147 null dummy for CHECKMULTISIG
        const NULLDUMMY = 1 << 4;
        /// BIP65 CHECKLOCKTIMEVERIFY
        const CHECKLOCKTIMEVERIFY = 1 << 9;
        /// BIP112 CHECKSEQUENCEVERIFY
        const CHECKSEQUENCEVERIFY = 1 << 10;
        /// BIP141 segregated witness
        const WITNESS = 1 << 11;
        /// BIP341/342 taproot
        const TAPROOT = 1 << 17;
    }
}

/// Outputs which can never be spent are kept out of the accumulator. Oversized output
/// scripts never reach this point since transaction validation rejects them.
pub fn is_unspendable(script_public_key: &[u8]) -> bool {
    script_public_key.first() == Some(&OP_RETURN)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script of input {0} failed evaluation: {1}")]
    EvalFalse(usize, String),

    #[error("input {0} has an invalid signature")]
    InvalidSignature(usize),

    #[error("input {0} violates flags {1:?}")]
    FlagViolation(usize, ScriptFlags),
}

/// Verifies the unlocking scripts of a transaction against the outputs it spends.
/// Script interpretation lives outside the consensus engine and is plugged in here.
pub trait ScriptVerifier: Send + Sync {
    fn verify(&self, tx: &PopulatedTransaction, flags: ScriptFlags) -> Result<(), ScriptError>;
}
