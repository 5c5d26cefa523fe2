use crate::{db::DB, errors::StoreError};

use super::prelude::{DbKey, DbWriter};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// A cached DB item with concurrency support
#[derive(Clone)]
pub struct CachedDbItem<T> {
    db: Arc<DB>,
    key: Vec<u8>,
    cached_item: Arc<RwLock<Option<T>>>,
}

impl<T> CachedDbItem<T> {
    pub fn new(db: Arc<DB>, key: Vec<u8>) -> Self {
        Self { db, key, cached_item: Arc::new(RwLock::new(None)) }
    }

    pub fn read(&self) -> Result<T, StoreError>
    where
        T: Clone + DeserializeOwned,
    {
        if let Some(item) = self.cached_item.read().clone() {
            return Ok(item);
        }
        if let Some(slice) = self.db.get_pinned(&self.key)? {
            let item: T = bincode::deserialize(&slice)?;
            *self.cached_item.write() = Some(item.clone());
            Ok(item)
        } else {
            Err(StoreError::KeyNotFound(DbKey::prefix_only(&self.key)))
        }
    }

    pub fn write(&mut self, mut writer: impl DbWriter, item: &T) -> Result<(), StoreError>
    where
        T: Clone + Serialize,
    {
        *self.cached_item.write() = Some(item.clone());
        let bin_data = bincode::serialize(item)?;
        writer.put(&self.key, bin_data)?;
        Ok(())
    }

    pub fn remove(&mut self, mut writer: impl DbWriter) -> Result<(), StoreError> {
        *self.cached_item.write() = None;
        writer.delete(&self.key)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_temp_db, prelude::{ConnBuilder, DirectDbWriter, StoreResultExtensions}};

    #[test]
    fn test_item_survives_reopen_of_cache() {
        let (_lifetime, db) = create_temp_db!(ConnBuilder::default());
        let mut item = CachedDbItem::<(u32, String)>::new(db.clone(), vec![9]);
        assert!(item.read().optional().unwrap().is_none());

        item.write(DirectDbWriter::new(&db), &(5, "tip".to_string())).unwrap();
        let fresh = CachedDbItem::<(u32, String)>::new(db.clone(), vec![9]);
        assert_eq!(fresh.read().unwrap(), (5, "tip".to_string()));

        item.remove(DirectDbWriter::new(&db)).unwrap();
        assert!(item.read().optional().unwrap().is_none());
    }
}
