use super::ChainStore;
use arbor_consensus_core::{chain_tip::ChainTip, header_record::HeaderRecord};
use arbor_hashes::Hash;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    #[error("integrity check failed: {0}")]
    Integrity(String),
}

/// In-memory `ChainStore` for tests and short lived tooling.
///
/// Headers and the height index are written through. Snapshot and tip writes are staged
/// until `flush`, so [`MemoryChainStore::crash_copy`] yields exactly what a crash would leave behind.
#[derive(Clone, Default)]
pub struct MemoryChainStore {
    headers: HashMap<Hash, HeaderRecord>,
    height_index: HashMap<u32, Hash>,
    snapshots: BTreeMap<u32, Vec<u8>>,
    tip: Option<ChainTip>,

    // `None` marks a staged deletion
    staged_snapshots: BTreeMap<u32, Option<Vec<u8>>>,
    staged_tip: Option<ChainTip>,
}

impl MemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The durable state only, as observed after a crash
    pub fn crash_copy(&self) -> Self {
        Self {
            headers: self.headers.clone(),
            height_index: self.height_index.clone(),
            snapshots: self.snapshots.clone(),
            tip: self.tip.clone(),
            staged_snapshots: Default::default(),
            staged_tip: None,
        }
    }

    pub fn has_staged_writes(&self) -> bool {
        !self.staged_snapshots.is_empty() || self.staged_tip.is_some()
    }

    pub fn snapshot_heights(&self) -> Vec<u32> {
        let mut heights: Vec<u32> = self.snapshots.keys().copied().collect();
        for (height, entry) in self.staged_snapshots.iter() {
            match entry {
                Some(_) if !heights.contains(height) => heights.push(*height),
                None => heights.retain(|h| h != height),
                _ => {}
            }
        }
        heights.sort_unstable();
        heights
    }
}

impl ChainStore for MemoryChainStore {
    type Error = MemoryStoreError;

    fn save_header(&mut self, record: &HeaderRecord) -> Result<(), Self::Error> {
        self.headers.insert(record.hash(), record.clone());
        Ok(())
    }

    fn get_header(&self, hash: Hash) -> Result<Option<HeaderRecord>, Self::Error> {
        Ok(self.headers.get(&hash).cloned())
    }

    fn save_height_index(&mut self, height: u32, hash: Hash) -> Result<(), Self::Error> {
        self.height_index.insert(height, hash);
        Ok(())
    }

    fn get_height_index(&self, height: u32) -> Result<Option<Hash>, Self::Error> {
        Ok(self.height_index.get(&height).copied())
    }

    fn save_snapshot_for_height(&mut self, height: u32, snapshot: Vec<u8>) -> Result<(), Self::Error> {
        self.staged_snapshots.insert(height, Some(snapshot));
        Ok(())
    }

    fn load_snapshot_for_height(&self, height: u32) -> Result<Option<Vec<u8>>, Self::Error> {
        match self.staged_snapshots.get(&height) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.snapshots.get(&height).cloned()),
        }
    }

    fn delete_snapshot_for_height(&mut self, height: u32) -> Result<(), Self::Error> {
        self.staged_snapshots.insert(height, None);
        Ok(())
    }

    fn save_chain_tip(&mut self, tip: &ChainTip) -> Result<(), Self::Error> {
        self.staged_tip = Some(tip.clone());
        Ok(())
    }

    fn load_chain_tip(&self) -> Result<Option<ChainTip>, Self::Error> {
        Ok(self.staged_tip.clone().or_else(|| self.tip.clone()))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        for (height, entry) in std::mem::take(&mut self.staged_snapshots) {
            match entry {
                Some(snapshot) => self.snapshots.insert(height, snapshot),
                None => self.snapshots.remove(&height),
            };
        }
        if let Some(tip) = self.staged_tip.take() {
            self.tip = Some(tip);
        }
        Ok(())
    }

    fn check_integrity(&self) -> Result<(), Self::Error> {
        let Some(tip) = self.load_chain_tip()? else {
            return Ok(());
        };
        for (hash, what) in [(tip.best_block, "best block"), (tip.validation_index, "validation index")] {
            if !self.headers.contains_key(&hash) {
                return Err(MemoryStoreError::Integrity(format!("{} {} has no header", what, hash)));
            }
        }
        if tip.validation_height > tip.depth {
            let msg = format!("validation height {} is above depth {}", tip.validation_height, tip.depth);
            return Err(MemoryStoreError::Integrity(msg));
        }
        Ok(())
    }
}
