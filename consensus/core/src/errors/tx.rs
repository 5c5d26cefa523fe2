use crate::{script::ScriptError, tx::TransactionOutpoint};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxRuleError {
    #[error("transaction has no inputs")]
    NoTxInputs,

    #[error("transaction has no outputs")]
    NoTxOutputs,

    #[error("outpoint {0} is spent more than once in the block")]
    DuplicateInput(TransactionOutpoint),

    #[error("coinbase signature script length {0} is out of the range {1}..={2}")]
    CoinbaseScriptLength(usize, usize, usize),

    #[error("signature script of input {0} has length {1} above the limit of {2}")]
    SignatureScriptTooLong(usize, usize, usize),

    #[error("script public key of output {0} has length {1} above the limit of {2}")]
    ScriptPublicKeyTooLong(usize, usize, usize),

    #[error("input {0} spends a coinbase output of height {1} before maturity at height {2}")]
    ImmatureCoinbaseSpend(usize, u32, u32),

    #[error("no spent output record for outpoint {0}")]
    MissingSpentOutput(TransactionOutpoint),

    #[error("input values overflow")]
    InputAmountOverflow,

    #[error("output values sum to {0} which exceeds the maximum of {1}")]
    OutputsAboveMaxMoney(u64, u64),

    #[error("outputs total {0} exceed inputs total {1}")]
    SpendTooHigh(u64, u64),

    #[error("script verification failed: {0}")]
    ScriptFailure(#[from] ScriptError),
}

pub type TxResult<T> = std::result::Result<T, TxRuleError>;
