use crate::{errors::StoreResult, prelude::DB};
use log::trace;
use rocksdb::WriteBatch;

/// Destination of store writes: straight to the DB, or staged in a batch
pub trait DbWriter {
    /// Writes only become visible once the batch is committed
    const IS_BATCH: bool;

    fn put<K, V>(&mut self, key: K, value: V) -> Result<(), rocksdb::Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>;
    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> Result<(), rocksdb::Error>;
}

pub struct DirectDbWriter<'a> {
    db: &'a DB,
}

impl<'a> DirectDbWriter<'a> {
    pub fn new(db: &'a DB) -> Self {
        Self { db }
    }
}

impl DbWriter for DirectDbWriter<'_> {
    const IS_BATCH: bool = false;

    fn put<K, V>(&mut self, key: K, value: V) -> Result<(), rocksdb::Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.db.put(key, value)
    }

    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> Result<(), rocksdb::Error> {
        self.db.delete(key)
    }
}

/// Stages writes in a [`WriteBatch`] applied atomically by [`BatchDbWriter::commit`].
/// Dropping the writer without committing discards the staged writes.
pub struct BatchDbWriter<'a> {
    db: &'a DB,
    batch: WriteBatch,
}

impl<'a> BatchDbWriter<'a> {
    pub fn new(db: &'a DB) -> Self {
        Self { db, batch: WriteBatch::default() }
    }

    /// Number of staged operations
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Applies the staged writes. With `sync` set the write-ahead log is synced to disk
    /// before returning.
    pub fn commit(self, sync: bool) -> StoreResult<()> {
        let ops = self.batch.len();
        self.db.write(self.batch)?;
        if sync {
            self.db.flush_wal(true)?;
        }
        trace!("committed write batch of {} operations (synced: {})", ops, sync);
        Ok(())
    }
}

impl DbWriter for BatchDbWriter<'_> {
    const IS_BATCH: bool = true;

    fn put<K, V>(&mut self, key: K, value: V) -> Result<(), rocksdb::Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.batch.put(key, value);
        Ok(())
    }

    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> Result<(), rocksdb::Error> {
        self.batch.delete(key);
        Ok(())
    }
}

impl<T: DbWriter> DbWriter for &mut T {
    const IS_BATCH: bool = T::IS_BATCH;

    #[inline]
    fn put<K, V>(&mut self, key: K, value: V) -> Result<(), rocksdb::Error>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        (*self).put(key, value)
    }

    #[inline]
    fn delete<K: AsRef<[u8]>>(&mut self, key: K) -> Result<(), rocksdb::Error> {
        (*self).delete(key)
    }
}
