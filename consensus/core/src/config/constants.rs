pub mod consensus {
    //!
    //! A module for constants which directly impact consensus.
    //!

    /// Number of base units in one coin
    pub const COIN: u64 = 100_000_000;

    /// Sanity bound on any amount, equal to the total supply
    pub const MAX_MONEY: u64 = 21_000_000 * COIN;

    /// Subsidy of the first halving epoch
    pub const INITIAL_SUBSIDY: u64 = 50 * COIN;

    /// Confirmations required before a coinbase output may be spent
    pub const COINBASE_MATURITY: u32 = 100;

    /// BIP141 block weight limit
    pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

    /// Coinbase signature script length bounds (inclusive)
    pub const MIN_COINBASE_SCRIPT_LEN: usize = 2;
    pub const MAX_COINBASE_SCRIPT_LEN: usize = 100;

    /// Maximum size of a signature script, as enforced on non coinbase inputs
    pub const MAX_SCRIPT_SIZE: usize = crate::script::MAX_SCRIPT_SIZE;

    /// `OP_RETURN OP_PUSHBYTES_36 0xaa21a9ed`, the prefix of a witness commitment output
    pub const WITNESS_COMMITMENT_HEADER: [u8; 6] = [0x6a, 0x24, 0xaa, 0x21, 0xa9, 0xed];

    /// Length of a witness commitment output script without trailing data
    pub const MIN_WITNESS_COMMITMENT_LEN: usize = 38;

    /// Target block spacing in seconds
    pub const POW_TARGET_SPACING: u64 = 600;

    /// Duration of a retarget window in seconds (two weeks)
    pub const POW_TARGET_TIMESPAN: u64 = 14 * 24 * 60 * 60;
}

pub mod perf {
    //!
    //! A module for performance critical constants which do not affect consensus.
    //!

    /// Blocks connected between flushes while the validated tip lags the best header
    pub const DEFAULT_FLUSH_INTERVAL: u32 = 2_000;

    #[derive(Clone, Debug)]
    pub struct PerfParams {
        /// Preferred cache size for header records
        pub header_cache_size: usize,

        /// Number of blocks connected between two flushes while catching up. Once the
        /// validated tip reaches the best header every block is flushed.
        pub flush_interval: u32,
    }

    pub const PERF_PARAMS: PerfParams = PerfParams { header_cache_size: 10_000, flush_interval: DEFAULT_FLUSH_INTERVAL };
}
