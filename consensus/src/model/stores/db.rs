use super::{ChainStore, HeightKey};
use arbor_consensus_core::{chain_tip::ChainTip, header_record::HeaderRecord};
use arbor_database::{
    prelude::{BatchDbWriter, CachePolicy, CachedDbAccess, CachedDbItem, DirectDbWriter, StoreError, StoreResultExtensions, DB},
    registry::DatabaseStorePrefixes,
};
use arbor_hashes::Hash;
use std::{collections::BTreeMap, sync::Arc};

/// A RocksDB backed `ChainStore`.
///
/// Headers and the height index go straight to the DB through cached accessors. Snapshot
/// and tip writes are held in memory and committed in a single write batch on `flush`.
#[derive(Clone)]
pub struct DbChainStore {
    db: Arc<DB>,
    headers: CachedDbAccess<Hash, HeaderRecord>,
    height_index: CachedDbAccess<HeightKey, Hash>,
    snapshots: CachedDbAccess<HeightKey, Vec<u8>>,
    tip: CachedDbItem<ChainTip>,

    // `None` marks a pending deletion
    pending_snapshots: BTreeMap<u32, Option<Vec<u8>>>,
    pending_tip: Option<ChainTip>,
}

impl DbChainStore {
    pub fn new(db: Arc<DB>, header_cache_size: usize) -> Self {
        Self {
            db: db.clone(),
            headers: CachedDbAccess::new(db.clone(), CachePolicy::Count(header_cache_size), DatabaseStorePrefixes::Headers.into()),
            height_index: CachedDbAccess::new(
                db.clone(),
                CachePolicy::Count(header_cache_size),
                DatabaseStorePrefixes::HeightIndex.into(),
            ),
            snapshots: CachedDbAccess::new(db.clone(), CachePolicy::Count(16), DatabaseStorePrefixes::AccumulatorSnapshots.into()),
            tip: CachedDbItem::new(db, DatabaseStorePrefixes::ChainTip.into()),
            pending_snapshots: Default::default(),
            pending_tip: None,
        }
    }

    pub fn db(&self) -> &Arc<DB> {
        &self.db
    }
}

impl ChainStore for DbChainStore {
    type Error = StoreError;

    fn save_header(&mut self, record: &HeaderRecord) -> Result<(), Self::Error> {
        self.headers.write(DirectDbWriter::new(&self.db), record.hash(), record.clone())
    }

    fn get_header(&self, hash: Hash) -> Result<Option<HeaderRecord>, Self::Error> {
        self.headers.read(hash).optional()
    }

    fn save_height_index(&mut self, height: u32, hash: Hash) -> Result<(), Self::Error> {
        self.height_index.write(DirectDbWriter::new(&self.db), height.into(), hash)
    }

    fn get_height_index(&self, height: u32) -> Result<Option<Hash>, Self::Error> {
        self.height_index.read(height.into()).optional()
    }

    fn save_snapshot_for_height(&mut self, height: u32, snapshot: Vec<u8>) -> Result<(), Self::Error> {
        self.pending_snapshots.insert(height, Some(snapshot));
        Ok(())
    }

    fn load_snapshot_for_height(&self, height: u32) -> Result<Option<Vec<u8>>, Self::Error> {
        match self.pending_snapshots.get(&height) {
            Some(pending) => Ok(pending.clone()),
            None => self.snapshots.read(height.into()).optional(),
        }
    }

    fn delete_snapshot_for_height(&mut self, height: u32) -> Result<(), Self::Error> {
        self.pending_snapshots.insert(height, None);
        Ok(())
    }

    fn save_chain_tip(&mut self, tip: &ChainTip) -> Result<(), Self::Error> {
        self.pending_tip = Some(tip.clone());
        Ok(())
    }

    fn load_chain_tip(&self) -> Result<Option<ChainTip>, Self::Error> {
        match self.pending_tip.as_ref() {
            Some(tip) => Ok(Some(tip.clone())),
            None => self.tip.read().optional(),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let mut writer = BatchDbWriter::new(&self.db);
        for (height, entry) in self.pending_snapshots.iter() {
            match entry {
                Some(snapshot) => self.snapshots.write(&mut writer, (*height).into(), snapshot.clone())?,
                None => self.snapshots.delete(&mut writer, (*height).into())?,
            }
        }
        if let Some(tip) = self.pending_tip.as_ref() {
            self.tip.write(&mut writer, tip)?;
        }
        writer.commit(true)?;
        self.pending_snapshots.clear();
        self.pending_tip = None;
        Ok(())
    }

    fn check_integrity(&self) -> Result<(), Self::Error> {
        let Some(tip) = self.load_chain_tip()? else {
            return Ok(());
        };
        for hash in [tip.best_block, tip.validation_index] {
            if self.get_header(hash)?.is_none() {
                return Err(StoreError::DataInconsistency(format!("chain tip references missing header {}", hash)));
            }
        }
        if tip.validation_height > tip.depth {
            let msg = format!("validation height {} is above depth {}", tip.validation_height, tip.depth);
            return Err(StoreError::DataInconsistency(msg));
        }
        Ok(())
    }
}
