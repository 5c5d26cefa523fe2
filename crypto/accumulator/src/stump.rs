use crate::{
    codec,
    error::{ProofError, ProofResult},
    node::{EMPTY_LEAF, num_roots, parent_hash, root_slot},
    proof::Proof,
};
use arbor_hashes::Hash;
use serde::{Deserialize, Serialize};

/// Encoded size of a stump with a root for each of the 64 possible trees, plus length prefixes
const MAX_STUMP_BYTES: u64 = 64 * 32 + 16;

/// The compact form of the accumulator: one root per tree plus the total number of
/// leaves ever added. Deleted leaves keep their position and hash to [`EMPTY_LEAF`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stump {
    pub roots: Vec<Hash>,
    pub leaves: u64,
}

/// A node on the path from a proven leaf to its root, before and after the deletion
struct PathNode {
    index: u64,
    current: Hash,
    updated: Hash,
}

impl Stump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that `del_hashes` sit at `proof.targets` under the current roots
    pub fn verify(&self, proof: &Proof, del_hashes: &[Hash]) -> ProofResult<()> {
        self.remove(proof, del_hashes).map(|_| ())
    }

    /// Verifies the proof, deletes the proven leaves and appends `adds`, returning the
    /// resulting accumulator. `self` is left untouched on failure.
    pub fn modify(&self, adds: &[Hash], del_hashes: &[Hash], proof: &Proof) -> ProofResult<Stump> {
        let roots = self.remove(proof, del_hashes)?;
        let mut next = Stump { roots, leaves: self.leaves };
        for &leaf in adds {
            next.add(leaf)?;
        }
        Ok(next)
    }

    fn add(&mut self, leaf: Hash) -> ProofResult<()> {
        let mut node = leaf;
        let mut row = 0;
        while (self.leaves >> row) & 1 == 1 {
            let root = self.roots.pop().ok_or(ProofError::Malformed("missing root"))?;
            node = parent_hash(root, node);
            row += 1;
        }
        self.roots.push(node);
        self.leaves = self.leaves.checked_add(1).ok_or(ProofError::LeafCountOverflow)?;
        Ok(())
    }

    fn check_targets(&self, proof: &Proof, del_hashes: &[Hash]) -> ProofResult<()> {
        if proof.targets.len() != del_hashes.len() {
            return Err(ProofError::TargetCountMismatch { targets: proof.targets.len(), hashes: del_hashes.len() });
        }
        if self.roots.len() != num_roots(self.leaves) {
            return Err(ProofError::Malformed("root count does not match leaf count"));
        }
        if proof.targets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ProofError::UnsortedTargets);
        }
        if let Some(&target) = proof.targets.iter().find(|&&t| t >= self.leaves) {
            return Err(ProofError::TargetOutOfRange { target, leaves: self.leaves });
        }
        if let Some(i) = del_hashes.iter().position(|h| *h == EMPTY_LEAF) {
            return Err(ProofError::DeletedLeaf(proof.targets[i]));
        }
        Ok(())
    }

    /// Walks all target paths up to their roots, row by row, checking the computed roots
    /// against the current ones and returning the roots with the targets emptied.
    fn remove(&self, proof: &Proof, del_hashes: &[Hash]) -> ProofResult<Vec<Hash>> {
        self.check_targets(proof, del_hashes)?;

        let mut roots = self.roots.clone();
        let mut siblings = proof.hashes.iter().copied();
        let mut nodes: Vec<PathNode> = proof
            .targets
            .iter()
            .zip(del_hashes)
            .map(|(&index, &hash)| PathNode { index, current: hash, updated: EMPTY_LEAF })
            .collect();

        let mut row = 0u8;
        while !nodes.is_empty() {
            let mut parents = Vec::with_capacity(nodes.len());
            let mut i = 0;
            while i < nodes.len() {
                let node = &nodes[i];
                if let Some(slot) = root_slot(self.leaves, row, node.index) {
                    if self.roots[slot] != node.current {
                        return Err(ProofError::RootMismatch(row));
                    }
                    roots[slot] = node.updated;
                    i += 1;
                    continue;
                }

                let (left, right, consumed) = match nodes.get(i + 1) {
                    Some(next) if node.index & 1 == 0 && next.index == node.index + 1 => {
                        ((node.current, node.updated), (next.current, next.updated), 2)
                    }
                    _ => {
                        let sibling = siblings.next().ok_or(ProofError::MissingProofHashes)?;
                        if node.index & 1 == 0 {
                            ((node.current, node.updated), (sibling, sibling), 1)
                        } else {
                            ((sibling, sibling), (node.current, node.updated), 1)
                        }
                    }
                };
                parents.push(PathNode {
                    index: node.index >> 1,
                    current: parent_hash(left.0, right.0),
                    updated: parent_hash(left.1, right.1),
                });
                i += consumed;
            }
            nodes = parents;
            row += 1;
        }

        let unused = siblings.count();
        if unused > 0 {
            return Err(ProofError::ExcessProofHashes(unused));
        }
        Ok(roots)
    }

    pub fn serialize(&self) -> ProofResult<Vec<u8>> {
        codec::encode(self)
    }

    /// Decodes a stump and checks that it holds one root per tree
    pub fn deserialize(bytes: &[u8]) -> ProofResult<Self> {
        let stump: Self = codec::decode(bytes, MAX_STUMP_BYTES)?;
        if stump.roots.len() != num_roots(stump.leaves) {
            return Err(ProofError::Malformed("root count does not match leaf count"));
        }
        Ok(stump)
    }
}
