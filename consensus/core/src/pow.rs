//!
//! Proof-of-work arithmetic over compact ("nBits") targets.
//!

use arbor_hashes::Hash;
use arbor_math::Uint256;

/// Interprets a block hash as a little endian 256 bit number
pub fn hash_to_uint(hash: Hash) -> Uint256 {
    Uint256::from_le_bytes(hash.as_bytes())
}

/// Whether `hash` meets `target`
pub fn check_proof_of_work(hash: Hash, target: Uint256) -> bool {
    hash_to_uint(hash) <= target
}

/// Expected number of hashes needed to find a block at the given target, `2^256 / (target + 1)`.
/// Undecodable and zero targets carry no work.
pub fn calc_work(bits: u32) -> Uint256 {
    let target = match Uint256::from_compact_target_bits(bits) {
        Some(target) if !target.is_zero() => target,
        _ => return Uint256::ZERO,
    };
    // 2^256 / (t + 1) == ~t / (t + 1) + 1, which avoids the 257 bit numerator
    let (denominator, overflow) = target.overflowing_add_u64(1);
    if overflow {
        return Uint256::from_u64(1);
    }
    match (!target).checked_div_rem(denominator) {
        Some((quotient, _)) => quotient + 1,
        None => Uint256::ZERO,
    }
}

/// Sums work, saturating at the maximum representable value
pub fn add_work(a: Uint256, b: Uint256) -> Uint256 {
    a.checked_add(b).unwrap_or(Uint256::MAX)
}
