//! Binary encoding of accumulator types. Fixed width little endian integers and u64
//! length prefixes, so every stored snapshot has a single encoding.

use crate::error::ProofResult;
use bincode::Options;
use serde::{Serialize, de::DeserializeOwned};

pub(crate) fn encode<T: Serialize>(value: &T) -> ProofResult<Vec<u8>> {
    Ok(bincode::DefaultOptions::new().with_fixint_encoding().serialize(value)?)
}

/// Decodes exactly one value from `bytes`, reading at most `limit` bytes so corrupt length
/// prefixes can not force large allocations
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8], limit: u64) -> ProofResult<T> {
    Ok(bincode::DefaultOptions::new().with_fixint_encoding().with_limit(limit).reject_trailing_bytes().deserialize(bytes)?)
}
