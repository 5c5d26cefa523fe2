pub mod db;
pub mod memory;

use arbor_consensus_core::{
    chain_tip::ChainTip,
    errors::{BlockProcessError, BlockProcessResult},
    header_record::HeaderRecord,
};
use arbor_core::error;
use arbor_hashes::Hash;
use std::error::Error;

pub use db::DbChainStore;
pub use memory::MemoryChainStore;

/// Persistence interface of the chain engine.
///
/// Header and height index writes are durable once the call returns. Snapshot and tip
/// writes may be staged by the implementation and only become durable on [`ChainStore::flush`].
/// Reads always observe staged writes.
pub trait ChainStore: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    fn save_header(&mut self, record: &HeaderRecord) -> Result<(), Self::Error>;

    fn get_header(&self, hash: Hash) -> Result<Option<HeaderRecord>, Self::Error>;

    fn save_height_index(&mut self, height: u32, hash: Hash) -> Result<(), Self::Error>;

    fn get_height_index(&self, height: u32) -> Result<Option<Hash>, Self::Error>;

    fn save_snapshot_for_height(&mut self, height: u32, snapshot: Vec<u8>) -> Result<(), Self::Error>;

    fn load_snapshot_for_height(&self, height: u32) -> Result<Option<Vec<u8>>, Self::Error>;

    fn delete_snapshot_for_height(&mut self, height: u32) -> Result<(), Self::Error>;

    fn save_chain_tip(&mut self, tip: &ChainTip) -> Result<(), Self::Error>;

    fn load_chain_tip(&self) -> Result<Option<ChainTip>, Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Verifies that the persisted tip references persisted headers. The height index may
    /// run ahead of the tip after an unclean shutdown and is reconciled by the engine.
    fn check_integrity(&self) -> Result<(), Self::Error>;
}

/// Big endian height used as a database key so heights iterate in order
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct HeightKey([u8; 4]);

impl From<u32> for HeightKey {
    fn from(height: u32) -> Self {
        Self(height.to_be_bytes())
    }
}

impl AsRef<[u8]> for HeightKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

pub(crate) trait StorageResultExt<T> {
    fn storage_err(self) -> BlockProcessResult<T>;
}

impl<T, E: Error + Send + Sync + 'static> StorageResultExt<T> for Result<T, E> {
    fn storage_err(self) -> BlockProcessResult<T> {
        self.map_err(|err| {
            error!("chain store failure: {}", err);
            BlockProcessError::storage(err)
        })
    }
}
