pub mod accumulator;
pub mod coinbase;
pub mod difficulty;
pub mod script_flags;
pub mod transaction_validator;
