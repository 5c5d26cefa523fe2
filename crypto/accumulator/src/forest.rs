use crate::{
    error::{ProofError, ProofResult},
    node::{EMPTY_LEAF, parent_hash, root_slot},
    proof::Proof,
    stump::Stump,
};
use arbor_hashes::Hash;
use std::collections::HashMap;

/// A fully materialized forest able to produce proofs for any live leaf.
///
/// `rows[r][k]` holds node `(r, k)` for every complete subtree, so appending or
/// emptying a leaf only touches one node per row. Used by bridge tooling and tests
/// to feed proofs to accumulator-only validators.
#[derive(Debug, Clone, Default)]
pub struct MemForest {
    rows: Vec<Vec<Hash>>,
    positions: HashMap<Hash, u64>,
}

impl MemForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaves(&self) -> u64 {
        self.rows.first().map_or(0, |row| row.len() as u64)
    }

    pub fn roots(&self) -> Vec<Hash> {
        let leaves = self.leaves();
        (0..self.rows.len())
            .rev()
            .filter(|&row| (leaves >> row) & 1 == 1)
            .map(|row| {
                let index = (leaves >> (row + 1)) << 1;
                self.rows[row][index as usize]
            })
            .collect()
    }

    pub fn to_stump(&self) -> Stump {
        Stump { roots: self.roots(), leaves: self.leaves() }
    }

    pub fn contains(&self, leaf: &Hash) -> bool {
        self.positions.contains_key(leaf)
    }

    pub fn add(&mut self, leaves: &[Hash]) {
        for &leaf in leaves {
            let position = self.leaves();
            self.positions.insert(leaf, position);
            self.push_node(0, leaf);
        }
    }

    fn push_node(&mut self, row: usize, hash: Hash) {
        if self.rows.len() == row {
            self.rows.push(Vec::new());
        }
        self.rows[row].push(hash);
        let len = self.rows[row].len();
        if len % 2 == 0 {
            let parent = parent_hash(self.rows[row][len - 2], self.rows[row][len - 1]);
            self.push_node(row + 1, parent);
        }
    }

    pub fn delete(&mut self, leaves: &[Hash]) -> ProofResult<()> {
        for leaf in leaves {
            let position = self.positions.remove(leaf).ok_or(ProofError::LeafNotFound(*leaf))?;
            self.rows[0][position as usize] = EMPTY_LEAF;
            let mut index = position as usize;
            for row in 0..self.rows.len() - 1 {
                let parent = index >> 1;
                if parent >= self.rows[row + 1].len() {
                    break;
                }
                self.rows[row + 1][parent] = parent_hash(self.rows[row][parent << 1], self.rows[row][(parent << 1) | 1]);
                index = parent;
            }
        }
        Ok(())
    }

    /// Proves `leaves`, returning the proof together with the leaves reordered to
    /// match the ascending proof targets
    pub fn prove(&self, leaves: &[Hash]) -> ProofResult<(Proof, Vec<Hash>)> {
        let mut targets = leaves
            .iter()
            .map(|leaf| self.positions.get(leaf).map(|&pos| (pos, *leaf)).ok_or(ProofError::LeafNotFound(*leaf)))
            .collect::<ProofResult<Vec<_>>>()?;
        targets.sort_unstable();
        targets.dedup();

        let num_leaves = self.leaves();
        let mut hashes = Vec::new();
        let mut nodes: Vec<u64> = targets.iter().map(|(pos, _)| *pos).collect();
        let mut row = 0u8;
        while !nodes.is_empty() {
            let mut parents = Vec::with_capacity(nodes.len());
            let mut i = 0;
            while i < nodes.len() {
                let index = nodes[i];
                if root_slot(num_leaves, row, index).is_some() {
                    i += 1;
                    continue;
                }
                if index & 1 == 0 && nodes.get(i + 1) == Some(&(index + 1)) {
                    i += 2;
                } else {
                    hashes.push(self.rows[row as usize][(index ^ 1) as usize]);
                    i += 1;
                }
                parents.push(index >> 1);
            }
            nodes = parents;
            row += 1;
        }

        let (positions, ordered): (Vec<u64>, Vec<Hash>) = targets.into_iter().unzip();
        Ok((Proof::new(positions, hashes), ordered))
    }

    /// Applies one block worth of changes: the deletions go first, then the additions
    pub fn modify(&mut self, adds: &[Hash], dels: &[Hash]) -> ProofResult<()> {
        self.delete(dels)?;
        self.add(adds);
        Ok(())
    }
}
