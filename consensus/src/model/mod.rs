pub mod chain_state;
pub mod stores;
