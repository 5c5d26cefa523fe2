pub mod constants;
pub mod genesis;
pub mod params;

use arbor_hashes::Hash;
use std::ops::Deref;

use {
    constants::perf::{PerfParams, PERF_PARAMS},
    params::Params,
};

/// Various consensus configurations all bundled up under a single struct. Use `Config::new` for directly building from
/// a `Params` instance. For anything more complex it is recommended to use `ConfigBuilder`. NOTE: this struct can be
/// implicitly de-refed into `Params`
#[derive(Clone, Debug)]
pub struct Config {
    /// Consensus params
    pub params: Params,
    /// Performance params
    pub perf: PerfParams,

    //
    // Additional consensus configuration arguments which are not consensus sensitive
    //
    /// Scripts of this block and its ancestors are assumed valid
    pub assume_valid: Option<Hash>,

    /// Number of historical accumulator snapshots kept below the validated tip.
    /// `None` keeps every snapshot, which allows rolling back to any height.
    pub snapshot_retention_depth: Option<u32>,
}

impl Config {
    pub fn new(params: Params) -> Self {
        Self { params, perf: PERF_PARAMS, assume_valid: None, snapshot_retention_depth: None }
    }

    pub fn to_builder(&self) -> ConfigBuilder {
        ConfigBuilder { config: self.clone() }
    }
}

impl AsRef<Params> for Config {
    fn as_ref(&self) -> &Params {
        &self.params
    }
}

impl Deref for Config {
    type Target = Params;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(params: Params) -> Self {
        Self { config: Config::new(params) }
    }

    pub fn set_perf_params(mut self, perf: PerfParams) -> Self {
        self.config.perf = perf;
        self
    }

    pub fn edit_consensus_params<F>(mut self, edit_func: F) -> Self
    where
        F: Fn(&mut Params),
    {
        edit_func(&mut self.config.params);
        self
    }

    pub fn set_assume_valid(mut self, hash: Hash) -> Self {
        self.config.assume_valid = Some(hash);
        self
    }

    pub fn set_snapshot_retention_depth(mut self, depth: u32) -> Self {
        self.config.snapshot_retention_depth = Some(depth);
        self
    }

    pub fn set_flush_interval(mut self, interval: u32) -> Self {
        self.config.perf.flush_interval = interval.max(1);
        self
    }

    pub fn skip_proof_of_work(mut self) -> Self {
        self.config.params.skip_proof_of_work = true;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
