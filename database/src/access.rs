use crate::{cache::CachePolicy, db::DB, errors::StoreError};

use super::prelude::{Cache, DbKey, DbWriter};
use serde::{de::DeserializeOwned, Serialize};
use std::{hash::Hash, sync::Arc};

/// Typed, cached access to the entries stored under a single key prefix.
///
/// Values are bincode encoded. Writes update the cache right away, so with a batch
/// writer the cache may run ahead of the DB until the batch is committed.
#[derive(Clone)]
pub struct CachedDbAccess<TKey, TData>
where
    TKey: Clone + Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    db: Arc<DB>,
    cache: Cache<TKey, TData>,
    prefix: Vec<u8>,
}

impl<TKey, TData> CachedDbAccess<TKey, TData>
where
    TKey: Clone + Hash + Eq + Send + Sync + AsRef<[u8]>,
    TData: Clone + Send + Sync,
{
    pub fn new(db: Arc<DB>, cache_policy: CachePolicy, prefix: Vec<u8>) -> Self {
        Self { db, cache: Cache::new(cache_policy), prefix }
    }

    pub fn read(&self, key: TKey) -> Result<TData, StoreError>
    where
        TData: DeserializeOwned,
    {
        if let Some(data) = self.cache.get(&key) {
            return Ok(data);
        }
        let db_key = DbKey::new(&self.prefix, key.clone());
        match self.db.get_pinned(&db_key)? {
            Some(slice) => {
                let data: TData = bincode::deserialize(&slice)?;
                self.cache.insert(key, data.clone());
                Ok(data)
            }
            None => Err(StoreError::KeyNotFound(db_key)),
        }
    }

    pub fn write(&self, mut writer: impl DbWriter, key: TKey, data: TData) -> Result<(), StoreError>
    where
        TData: Serialize,
    {
        let bin_data = bincode::serialize(&data)?;
        writer.put(DbKey::new(&self.prefix, key.clone()), bin_data)?;
        self.cache.insert(key, data);
        Ok(())
    }

    pub fn delete(&self, mut writer: impl DbWriter, key: TKey) -> Result<(), StoreError> {
        writer.delete(DbKey::new(&self.prefix, key.clone()))?;
        self.cache.remove(&key);
        Ok(())
    }
}
