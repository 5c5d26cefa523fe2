use super::HeaderProcessor;
use crate::model::{chain_state::ChainState, stores::ChainStore};
use arbor_consensus_core::{
    errors::{BlockProcessResult, ConsensusError},
    header::Header,
    header_record::HeaderRecord,
    pow::check_proof_of_work,
};
use arbor_math::Uint256;

impl HeaderProcessor {
    /// The header must claim a target no easier than the one required by its chain,
    /// and its hash must meet the claimed target
    pub(super) fn check_difficulty_and_pow<S: ChainStore>(
        &self,
        state: &ChainState<S>,
        header: &Header,
        parent: &HeaderRecord,
    ) -> BlockProcessResult<()> {
        if self.config.skip_proof_of_work {
            return Ok(());
        }

        let claimed = Uint256::from_compact_target_bits(header.bits)
            .filter(|target| !target.is_zero() && *target <= self.config.pow_limit)
            .ok_or(ConsensusError::InvalidTargetBits(header.bits))?;

        let required_bits = self.difficulty_manager.required_bits(state, parent, header.time)?;
        let required = Uint256::from_compact_target_bits(required_bits).ok_or(ConsensusError::InvalidTargetBits(required_bits))?;
        if claimed > required {
            return Err(ConsensusError::UnexpectedDifficulty { claimed: header.bits, required: required_bits }.into());
        }

        if !check_proof_of_work(header.hash, claimed) {
            return Err(ConsensusError::InsufficientProofOfWork(header.hash).into());
        }
        Ok(())
    }
}
