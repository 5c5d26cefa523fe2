use rocksdb::{DBWithThreadMode, MultiThreaded};
use std::{path::PathBuf, sync::Arc};

/// The DB type used for arbor stores
pub type DB = DBWithThreadMode<MultiThreaded>;

const MB: usize = 1024 * 1024;

/// Deletes an existing DB if it exists
pub fn delete_db(db_dir: PathBuf) -> Result<(), rocksdb::Error> {
    if !db_dir.exists() {
        return Ok(());
    }
    let options = rocksdb::Options::default();
    DB::destroy(&options, db_dir)
}

#[derive(Debug, Clone)]
pub struct ConnBuilder {
    db_path: Option<PathBuf>,
    create_if_missing: bool,
    parallelism: usize,
    mem_budget: usize,
}

impl Default for ConnBuilder {
    fn default() -> Self {
        ConnBuilder { db_path: None, create_if_missing: true, parallelism: 1, mem_budget: 64 * MB }
    }
}

impl ConnBuilder {
    pub fn with_db_path(self, db_path: PathBuf) -> Self {
        ConnBuilder { db_path: Some(db_path), ..self }
    }

    pub fn with_create_if_missing(self, create_if_missing: bool) -> Self {
        ConnBuilder { create_if_missing, ..self }
    }

    pub fn with_parallelism(self, parallelism: impl Into<usize>) -> Self {
        ConnBuilder { parallelism: parallelism.into(), ..self }
    }

    pub fn with_mem_budget(self, mem_budget: impl Into<usize>) -> Self {
        ConnBuilder { mem_budget: mem_budget.into(), ..self }
    }

    pub fn build(self) -> Result<Arc<DB>, rocksdb::Error> {
        let mut opts = rocksdb::Options::default();
        if self.parallelism > 1 {
            opts.increase_parallelism(self.parallelism as i32);
        }
        opts.optimize_level_style_compaction(self.mem_budget);
        opts.create_if_missing(self.create_if_missing);
        let path = self.db_path.unwrap_or_else(|| PathBuf::from("arbor-db"));
        Ok(Arc::new(DB::open(&opts, path)?))
    }
}
