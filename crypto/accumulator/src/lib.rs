//! A merkle forest accumulator over unspent outputs.
//!
//! Validators keep only a [`Stump`] (the forest roots) and check spends against
//! per-block batch [`Proof`]s. A [`MemForest`] keeps every node and is able to
//! produce those proofs.

mod codec;
mod error;
mod forest;
mod node;
mod proof;
mod stump;

pub use error::{ProofError, ProofResult};
pub use forest::MemForest;
pub use node::{EMPTY_LEAF, parent_hash};
pub use proof::{MAX_PROOF_BYTES, Proof};
pub use stump::Stump;

use arbor_hashes::Hash;

/// Verifies that `deletions` are proven by `proof` against `snapshot` and returns the
/// snapshot after removing them and appending `added`. Pure and deterministic.
pub fn verify_and_update(snapshot: &Stump, added: &[Hash], deletions: &[Hash], proof: &Proof) -> ProofResult<Stump> {
    snapshot.modify(added, deletions, proof)
}
