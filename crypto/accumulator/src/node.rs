//! Forest geometry.
//!
//! Leaves are numbered globally in insertion order. A node is addressed by its row
//! (0 for leaves) and its index inside that row, so node `(row, k)` covers the leaves
//! `[k << row, (k + 1) << row)`. The forest holds one perfect tree per set bit of the
//! leaf count, largest tree first.

use arbor_hashes::{ForestNodeHash, Hash, Hasher, HasherBase};

/// Hash of a deleted leaf
pub const EMPTY_LEAF: Hash = Hash::ZERO;

pub fn parent_hash(left: Hash, right: Hash) -> Hash {
    let mut hasher = ForestNodeHash::default();
    hasher.update(left).update(right);
    hasher.finalize()
}

/// Returns the root slot of `(row, index)` when that node is the root of one of the
/// trees of a forest with `leaves` leaves.
#[inline]
pub fn root_slot(leaves: u64, row: u8, index: u64) -> Option<usize> {
    if row >= 64 || (leaves >> row) & 1 == 0 {
        return None;
    }
    let higher = leaves.checked_shr(row as u32 + 1).unwrap_or(0);
    let tree_offset = higher.checked_shl(row as u32 + 1).unwrap_or(0);
    if index.checked_shl(row as u32)? != tree_offset {
        return None;
    }
    Some(higher.count_ones() as usize)
}

/// Number of trees (and hence roots) in a forest with `leaves` leaves
#[inline]
pub fn num_roots(leaves: u64) -> usize {
    leaves.count_ones() as usize
}
