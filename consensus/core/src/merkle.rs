use crate::tx::Transaction;
use arbor_hashes::{Hash, Hasher, HasherBase, MerkleBranchHash};

pub fn merkle_hash(left: Hash, right: Hash) -> Hash {
    let mut hasher = MerkleBranchHash::default();
    hasher.update(left).update(right);
    hasher.finalize()
}

/// Computes the bitcoin merkle root, duplicating the last node of every odd level.
/// The returned flag reports whether two identical siblings were hashed together,
/// which allows a different transaction list to produce the same root.
pub fn calc_merkle_root_with_mutation(hashes: impl ExactSizeIterator<Item = Hash>) -> (Hash, bool) {
    if hashes.len() == 0 {
        return (Hash::ZERO, false);
    }
    let mut level: Vec<Hash> = hashes.collect();
    let mut mutated = false;
    while level.len() > 1 {
        mutated |= level.chunks_exact(2).any(|pair| pair[0] == pair[1]);
        if level.len() % 2 == 1 {
            level.push(level[level.len() - 1]);
        }
        level = level.chunks_exact(2).map(|pair| merkle_hash(pair[0], pair[1])).collect();
    }
    (level[0], mutated)
}

pub fn calc_merkle_root(hashes: impl ExactSizeIterator<Item = Hash>) -> Hash {
    calc_merkle_root_with_mutation(hashes).0
}

pub fn calc_tx_merkle_root<'a>(txs: impl ExactSizeIterator<Item = &'a Transaction>) -> (Hash, bool) {
    calc_merkle_root_with_mutation(txs.map(|tx| tx.id()))
}

/// Witness merkle root. The coinbase contributes the zero hash in place of its wtxid.
pub fn calc_witness_merkle_root<'a>(txs: impl ExactSizeIterator<Item = &'a Transaction>) -> Hash {
    calc_merkle_root(txs.enumerate().map(|(i, tx)| if i == 0 { Hash::ZERO } else { tx.wtxid() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merkle_root_shapes() {
        let (a, b, c) = (Hash::from(1), Hash::from(2), Hash::from(3));
        assert_eq!(calc_merkle_root(std::iter::empty()), Hash::ZERO);
        assert_eq!(calc_merkle_root([a].into_iter()), a);
        assert_eq!(calc_merkle_root([a, b].into_iter()), merkle_hash(a, b));
        assert_eq!(calc_merkle_root([a, b, c].into_iter()), merkle_hash(merkle_hash(a, b), merkle_hash(c, c)));
    }

    #[test]
    fn test_duplicated_tail_is_flagged() {
        let (a, b, c) = (Hash::from(1), Hash::from(2), Hash::from(3));
        let (root, mutated) = calc_merkle_root_with_mutation([a, b, c].into_iter());
        assert!(!mutated);
        // Repeating the odd tail yields the same root but is detected
        let (mutated_root, mutated) = calc_merkle_root_with_mutation([a, b, c, c].into_iter());
        assert_eq!(mutated_root, root);
        assert!(mutated);
    }
}
