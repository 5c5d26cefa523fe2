pub use super::{
    constants::consensus::*,
    genesis::{GenesisBlock, GENESIS, REGTEST_GENESIS, SIGNET_GENESIS},
};
use crate::{network::NetworkType, script::ScriptFlags};
use arbor_hashes::Hash;
use arbor_math::Uint256;

/// Consensus parameters. Contains settings and configurations which are consensus-sensitive.
/// Changing one of these on a network node would exclude and prevent it from reaching consensus
/// with the other unmodified nodes.
#[derive(Clone, Debug)]
pub struct Params {
    pub network: NetworkType,
    pub genesis: GenesisBlock,

    //
    // Proof of work
    //
    /// Easiest allowed target
    pub pow_limit: Uint256,
    pub pow_limit_bits: u32,
    pub pow_target_spacing: u64,
    pub pow_target_timespan: u64,
    /// Allow the limit target once twice the target spacing passed without a block
    pub pow_allow_min_difficulty_blocks: bool,
    pub pow_no_retargeting: bool,
    /// Disables header proof of work checks entirely. Test networks only.
    pub skip_proof_of_work: bool,

    //
    // Rule activation heights
    //
    pub bip16_height: u32,
    pub bip34_height: u32,
    pub bip65_height: u32,
    pub bip66_height: u32,
    pub csv_height: u32,
    pub segwit_height: u32,
    pub taproot_height: u32,
    /// Historical blocks validated with flags other than the ones their height implies
    pub script_flag_exceptions: &'static [(Hash, ScriptFlags)],

    //
    // Block body
    //
    pub coinbase_maturity: u32,
    pub max_block_weight: u64,
    pub max_money: u64,
    pub subsidy_halving_interval: u32,
    pub max_script_size: usize,
}

impl Params {
    /// Number of blocks between two difficulty retargets
    #[inline]
    pub fn difficulty_adjustment_interval(&self) -> u32 {
        (self.pow_target_timespan / self.pow_target_spacing) as u32
    }

    /// Block subsidy at `height`, halving every `subsidy_halving_interval` blocks
    pub fn block_subsidy(&self, height: u32) -> u64 {
        let halvings = height / self.subsidy_halving_interval;
        if halvings >= 64 { 0 } else { INITIAL_SUBSIDY >> halvings }
    }
}

impl From<NetworkType> for Params {
    fn from(value: NetworkType) -> Self {
        match value {
            NetworkType::Mainnet => MAINNET_PARAMS,
            NetworkType::Signet => SIGNET_PARAMS,
            NetworkType::Regtest => REGTEST_PARAMS,
        }
    }
}

/// Block 00000000000002dc756eebf4f49723ed8d30cc28a5f108eb94b1ba88ac4f9c22 violates P2SH
const BIP16_EXCEPTION: Hash = Hash::from_bytes([
    0x22, 0x9c, 0x4f, 0xac, 0x88, 0xba, 0xb1, 0x94, 0xeb, 0x08, 0xf1, 0xa5, 0x28, 0xcc, 0x30, 0x8d, 0xed, 0x23, 0x97, 0xf4, 0xf4, 0xeb,
    0x6e, 0x75, 0xdc, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
]);

/// Block 0000000000000000000f14c35b2d841e986ab5441de8c585d5ffe55ea1e395ad violates taproot
const TAPROOT_EXCEPTION: Hash = Hash::from_bytes([
    0xad, 0x95, 0xe3, 0xa1, 0x5e, 0xe5, 0xff, 0xd5, 0x85, 0xc5, 0xe8, 0x1d, 0x44, 0xb5, 0x6a, 0x98, 0x1e, 0x84, 0x2d, 0x5b, 0xc3, 0x14,
    0x0f, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
]);

const MAINNET_SCRIPT_FLAG_EXCEPTIONS: &[(Hash, ScriptFlags)] =
    &[(BIP16_EXCEPTION, ScriptFlags::empty()), (TAPROOT_EXCEPTION, ScriptFlags::P2SH.union(ScriptFlags::WITNESS))];

pub const MAINNET_PARAMS: Params = Params {
    network: NetworkType::Mainnet,
    genesis: GENESIS,
    pow_limit: Uint256([u64::MAX, u64::MAX, u64::MAX, 0x0000_0000_ffff_ffff]),
    pow_limit_bits: 0x1d00ffff,
    pow_target_spacing: POW_TARGET_SPACING,
    pow_target_timespan: POW_TARGET_TIMESPAN,
    pow_allow_min_difficulty_blocks: false,
    pow_no_retargeting: false,
    skip_proof_of_work: false,

    bip16_height: 173805,
    bip34_height: 227931,
    bip65_height: 388381,
    bip66_height: 363725,
    csv_height: 419328,
    segwit_height: 481824,
    taproot_height: 709632,
    script_flag_exceptions: MAINNET_SCRIPT_FLAG_EXCEPTIONS,

    coinbase_maturity: COINBASE_MATURITY,
    max_block_weight: MAX_BLOCK_WEIGHT,
    max_money: MAX_MONEY,
    subsidy_halving_interval: 210_000,
    max_script_size: MAX_SCRIPT_SIZE,
};

pub const SIGNET_PARAMS: Params = Params {
    network: NetworkType::Signet,
    genesis: SIGNET_GENESIS,
    pow_limit: Uint256([0, 0, 0, 0x0000_0377_ae00_0000]),
    pow_limit_bits: 0x1e0377ae,
    pow_target_spacing: POW_TARGET_SPACING,
    pow_target_timespan: POW_TARGET_TIMESPAN,
    pow_allow_min_difficulty_blocks: false,
    pow_no_retargeting: false,
    skip_proof_of_work: false,

    bip16_height: 1,
    bip34_height: 1,
    bip65_height: 1,
    bip66_height: 1,
    csv_height: 1,
    segwit_height: 1,
    taproot_height: 1,
    script_flag_exceptions: &[],

    coinbase_maturity: COINBASE_MATURITY,
    max_block_weight: MAX_BLOCK_WEIGHT,
    max_money: MAX_MONEY,
    subsidy_halving_interval: 210_000,
    max_script_size: MAX_SCRIPT_SIZE,
};

pub const REGTEST_PARAMS: Params = Params {
    network: NetworkType::Regtest,
    genesis: REGTEST_GENESIS,
    pow_limit: Uint256([u64::MAX, u64::MAX, u64::MAX, 0x7fff_ffff_ffff_ffff]),
    pow_limit_bits: 0x207fffff,
    pow_target_spacing: POW_TARGET_SPACING,
    pow_target_timespan: POW_TARGET_TIMESPAN,
    pow_allow_min_difficulty_blocks: true,
    pow_no_retargeting: true,
    skip_proof_of_work: false,

    bip16_height: 0,
    bip34_height: 1,
    bip65_height: 1,
    bip66_height: 1,
    csv_height: 1,
    segwit_height: 0,
    taproot_height: 0,
    script_flag_exceptions: &[],

    coinbase_maturity: COINBASE_MATURITY,
    max_block_weight: MAX_BLOCK_WEIGHT,
    max_money: MAX_MONEY,
    subsidy_halving_interval: 150,
    max_script_size: MAX_SCRIPT_SIZE,
};
