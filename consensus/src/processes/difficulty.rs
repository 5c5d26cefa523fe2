use crate::model::{chain_state::ChainState, stores::ChainStore};
use arbor_consensus_core::{
    config::params::Params,
    errors::{BlockProcessResult, ConsensusError},
    header_record::HeaderRecord,
};
use arbor_math::{Uint256, Uint320};

/// Computes the compact target a header must commit to, following the
/// 2016 block retarget windows of the chain the header extends
#[derive(Clone)]
pub struct DifficultyManager {
    pow_limit: Uint256,
    pow_limit_bits: u32,
    pow_target_spacing: u64,
    pow_target_timespan: u64,
    adjustment_interval: u32,
    allow_min_difficulty_blocks: bool,
    no_retargeting: bool,
}

impl DifficultyManager {
    pub fn new(params: &Params) -> Self {
        Self {
            pow_limit: params.pow_limit,
            pow_limit_bits: params.pow_limit_bits,
            pow_target_spacing: params.pow_target_spacing,
            pow_target_timespan: params.pow_target_timespan,
            adjustment_interval: params.difficulty_adjustment_interval(),
            allow_min_difficulty_blocks: params.pow_allow_min_difficulty_blocks,
            no_retargeting: params.pow_no_retargeting,
        }
    }

    /// Bits required for a child of `parent` carrying timestamp `time`
    pub fn required_bits<S: ChainStore>(&self, state: &ChainState<S>, parent: &HeaderRecord, time: u32) -> BlockProcessResult<u32> {
        let parent_height = parent.height().ok_or(ConsensusError::UnplaceableAncestor(parent.hash()))?;
        let next_height = parent_height + 1;

        if next_height % self.adjustment_interval != 0 {
            if self.allow_min_difficulty_blocks {
                // A block arriving more than twice the spacing after its parent may use the limit
                if time as u64 > parent.header.time as u64 + self.pow_target_spacing * 2 {
                    return Ok(self.pow_limit_bits);
                }
                return self.last_non_min_difficulty_bits(state, parent, parent_height);
            }
            return Ok(parent.header.bits);
        }

        if self.no_retargeting {
            return Ok(parent.header.bits);
        }

        let first = self.ancestor(state, parent, self.adjustment_interval - 1)?;
        self.calc_next_bits(parent.header.bits, parent.header.time, first.header.time)
    }

    /// Retargets `last_bits` by the ratio of the observed window timespan to the target
    /// timespan, clamped to a factor of four in either direction
    pub fn calc_next_bits(&self, last_bits: u32, last_time: u32, first_time: u32) -> BlockProcessResult<u32> {
        let timespan = self.pow_target_timespan as i64;
        let actual = (last_time as i64 - first_time as i64).clamp(timespan / 4, timespan * 4);

        let last_target = Uint256::from_compact_target_bits(last_bits).ok_or(ConsensusError::InvalidTargetBits(last_bits))?;
        let new_target = Uint320::from(last_target) * actual as u64 / self.pow_target_timespan;
        let new_target = if new_target > Uint320::from(self.pow_limit) {
            self.pow_limit
        } else {
            Uint256::try_from(new_target).map_err(|_| ConsensusError::InvalidTargetBits(last_bits))?
        };
        Ok(new_target.compact_target_bits())
    }

    fn last_non_min_difficulty_bits<S: ChainStore>(
        &self,
        state: &ChainState<S>,
        parent: &HeaderRecord,
        parent_height: u32,
    ) -> BlockProcessResult<u32> {
        let mut current = parent.clone();
        let mut height = parent_height;
        while height > 0 && height % self.adjustment_interval != 0 && current.header.bits == self.pow_limit_bits {
            current = state.known_header(current.header.prev_block_hash)?;
            height -= 1;
        }
        Ok(current.header.bits)
    }

    fn ancestor<S: ChainStore>(&self, state: &ChainState<S>, from: &HeaderRecord, distance: u32) -> BlockProcessResult<HeaderRecord> {
        let mut current = from.clone();
        for _ in 0..distance {
            current = state.known_header(current.header.prev_block_hash)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_consensus_core::config::params::{MAINNET_PARAMS, REGTEST_PARAMS};

    #[test]
    fn test_retarget_on_schedule_keeps_bits() {
        let manager = DifficultyManager::new(&MAINNET_PARAMS);
        let timespan = MAINNET_PARAMS.pow_target_timespan as u32;
        assert_eq!(manager.calc_next_bits(0x1d00ffff, 1_000_000 + timespan, 1_000_000).unwrap(), 0x1d00ffff);
    }

    #[test]
    fn test_retarget_is_clamped() {
        let manager = DifficultyManager::new(&MAINNET_PARAMS);
        let timespan = MAINNET_PARAMS.pow_target_timespan as u32;
        let base = 0x1c0fffff;
        let base_target = Uint256::from_compact_target_bits(base).unwrap();

        // Blocks came way too fast: the target shrinks by at most 4x
        let fast = manager.calc_next_bits(base, 1_000_000 + 1, 1_000_000).unwrap();
        assert_eq!(Uint256::from_compact_target_bits(fast).unwrap(), (base_target / 4).compact_target_bits_roundtrip());

        // Blocks came way too slow: the target grows by at most 4x
        let slow = manager.calc_next_bits(base, 1_000_000 + timespan * 10, 1_000_000).unwrap();
        assert_eq!(Uint256::from_compact_target_bits(slow).unwrap(), (base_target * 4).compact_target_bits_roundtrip());
    }

    #[test]
    fn test_retarget_never_exceeds_pow_limit() {
        let manager = DifficultyManager::new(&MAINNET_PARAMS);
        let timespan = MAINNET_PARAMS.pow_target_timespan as u32;
        assert_eq!(manager.calc_next_bits(0x1d00ffff, 1_000_000 + timespan * 4, 1_000_000).unwrap(), MAINNET_PARAMS.pow_limit_bits);
        assert_eq!(manager.calc_next_bits(0x1d00ffff, u32::MAX, 0).unwrap(), MAINNET_PARAMS.pow_limit_bits);
    }

    #[test]
    fn test_retarget_matches_historical_adjustment() {
        // First mainnet retarget at height 32256
        let manager = DifficultyManager::new(&MAINNET_PARAMS);
        assert_eq!(manager.calc_next_bits(0x1d00ffff, 1262152739, 1261130161).unwrap(), 0x1d00d86a);
    }

    #[test]
    fn test_invalid_bits_are_rejected() {
        let manager = DifficultyManager::new(&REGTEST_PARAMS);
        assert!(manager.calc_next_bits(0x01fedcba, 1, 0).is_err());
    }

    trait CompactRoundtrip {
        fn compact_target_bits_roundtrip(self) -> Uint256;
    }

    impl CompactRoundtrip for Uint256 {
        fn compact_target_bits_roundtrip(self) -> Uint256 {
            Uint256::from_compact_target_bits(self.compact_target_bits()).unwrap()
        }
    }
}
