use super::stores::{ChainStore, StorageResultExt};
use arbor_consensus_core::{
    blockstatus::BlockStatus,
    chain_tip::ChainTip,
    errors::{AccumulatorError, BlockProcessResult, SequencingError},
    header_record::HeaderRecord,
};
use arbor_core::{debug, trace, warn};
use arbor_hashes::Hash;
use arbor_accumulator::Stump;

/// Everything guarded by the engine lock: the store, the tip pointer and the
/// accumulator state at the validation index
pub struct ChainState<S: ChainStore> {
    pub store: S,
    pub tip: ChainTip,
    /// Accumulator after connecting the block at the validation index
    pub accumulator: Stump,
    pub blocks_since_flush: u32,
}

impl<S: ChainStore> ChainState<S> {
    pub fn new(store: S, tip: ChainTip, accumulator: Stump) -> Self {
        Self { store, tip, accumulator, blocks_since_flush: 0 }
    }

    pub fn header(&self, hash: Hash) -> BlockProcessResult<Option<HeaderRecord>> {
        self.store.get_header(hash).storage_err()
    }

    /// Like [`Self::header`] but a missing record is an error
    pub fn known_header(&self, hash: Hash) -> BlockProcessResult<HeaderRecord> {
        self.header(hash)?.ok_or(SequencingError::UnknownBlock(hash).into())
    }

    pub fn status(&self, hash: Hash) -> BlockProcessResult<Option<BlockStatus>> {
        Ok(self.header(hash)?.map(|record| record.status))
    }

    /// Hash of the active chain block at `height`. Index entries above the best block are stale.
    pub fn active_hash_at(&self, height: u32) -> BlockProcessResult<Option<Hash>> {
        if height > self.tip.depth {
            return Ok(None);
        }
        self.store.get_height_index(height).storage_err()
    }

    /// Raw height index lookup, including entries above the best block
    pub fn indexed_hash_at(&self, height: u32) -> BlockProcessResult<Option<Hash>> {
        self.store.get_height_index(height).storage_err()
    }

    pub fn known_active_hash_at(&self, height: u32) -> BlockProcessResult<Hash> {
        self.active_hash_at(height)?.ok_or(SequencingError::MissingBlock(height).into())
    }

    /// Whether `record` lies on the active chain
    pub fn is_on_active_chain(&self, record: &HeaderRecord) -> BlockProcessResult<bool> {
        match record.height() {
            Some(height) if record.status.is_active_chain() => Ok(self.active_hash_at(height)? == Some(record.hash())),
            _ => Ok(false),
        }
    }

    pub fn save_record(&mut self, record: &HeaderRecord) -> BlockProcessResult<()> {
        trace!("saving header {} with status {:?}", record.hash(), record.status);
        self.store.save_header(record).storage_err()
    }

    pub fn set_status(&mut self, record: HeaderRecord, status: BlockStatus) -> BlockProcessResult<HeaderRecord> {
        let record = record.with_status(status);
        self.save_record(&record)?;
        Ok(record)
    }

    pub fn save_height_index(&mut self, height: u32, hash: Hash) -> BlockProcessResult<()> {
        self.store.save_height_index(height, hash).storage_err()
    }

    pub fn save_tip(&mut self) -> BlockProcessResult<()> {
        self.store.save_chain_tip(&self.tip).storage_err()
    }

    pub fn save_snapshot(&mut self, height: u32, snapshot: &Stump) -> BlockProcessResult<()> {
        let bytes = snapshot.serialize().map_err(AccumulatorError::from)?;
        self.store.save_snapshot_for_height(height, bytes).storage_err()
    }

    pub fn load_snapshot(&self, height: u32) -> BlockProcessResult<Stump> {
        let bytes = self.store.load_snapshot_for_height(height).storage_err()?.ok_or(AccumulatorError::MissingSnapshot(height))?;
        Stump::deserialize(&bytes).map_err(|err| {
            warn!("accumulator snapshot at height {} failed to decode: {}", height, err);
            AccumulatorError::CorruptSnapshot.into()
        })
    }

    pub fn delete_snapshot(&mut self, height: u32) -> BlockProcessResult<()> {
        self.store.delete_snapshot_for_height(height).storage_err()
    }

    pub fn flush(&mut self) -> BlockProcessResult<()> {
        debug!("flushing chain store at validation height {}", self.tip.validation_height);
        self.store.flush().storage_err()?;
        self.blocks_since_flush = 0;
        Ok(())
    }
}
