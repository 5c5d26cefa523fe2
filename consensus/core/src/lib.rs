//! Data model, consensus parameters and error taxonomy shared by the arbor consensus engine
//! and its consumers.

pub mod api;
pub mod block;
pub mod blockstatus;
pub mod chain_tip;
pub mod config;
pub mod errors;
pub mod hashing;
pub mod header;
pub mod header_record;
pub mod merkle;
pub mod network;
pub mod pow;
pub mod script;
pub mod testutils;
pub mod tx;
pub mod utxo;

pub use arbor_accumulator as accumulator;
pub use arbor_hashes::Hash;
