use crate::prelude::DB;
use std::sync::Weak;
use tempfile::TempDir;

/// Keeps a temporary db directory alive and destroys the db once all references to it are dropped
#[derive(Default)]
pub struct DbLifetime {
    weak_db_ref: Weak<DB>,
    optional_tempdir: Option<TempDir>,
}

impl DbLifetime {
    pub fn new(tempdir: TempDir, weak_db_ref: Weak<DB>) -> Self {
        Self { optional_tempdir: Some(tempdir), weak_db_ref }
    }

    /// Tracks the db without owning its directory
    pub fn without_destroy(weak_db_ref: Weak<DB>) -> Self {
        Self { optional_tempdir: None, weak_db_ref }
    }
}

impl Drop for DbLifetime {
    fn drop(&mut self) {
        for _ in 0..16 {
            if self.weak_db_ref.strong_count() > 0 {
                // Another thread may still be releasing its reference
                std::thread::sleep(std::time::Duration::from_millis(50));
            } else {
                break;
            }
        }
        if self.weak_db_ref.strong_count() > 0 {
            return;
        }
        if let Some(dir) = self.optional_tempdir.take() {
            let options = rocksdb::Options::default();
            let _ = DB::destroy(&options, dir.path());
        }
    }
}

pub fn get_arbor_tempdir() -> std::io::Result<TempDir> {
    let global_tempdir = std::env::temp_dir();
    let arbor_tempdir = global_tempdir.join("arbor-rust");
    std::fs::create_dir_all(arbor_tempdir.as_path())?;
    tempfile::tempdir_in(arbor_tempdir.as_path())
}

/// Creates a DB within a temp directory under `<OS SPECIFIC TEMP DIR>/arbor-rust`
/// Callers must keep the `DbLifetime` guard for as long as they wish the DB to exist.
#[macro_export]
macro_rules! create_temp_db {
    ($conn_builder: expr) => {{
        let db_tempdir = $crate::utils::get_arbor_tempdir().unwrap();
        let db_path = db_tempdir.path().to_owned();
        let db = $conn_builder.with_db_path(db_path).build().unwrap();
        ($crate::utils::DbLifetime::new(db_tempdir, std::sync::Arc::downgrade(&db)), db)
    }};
}

/// Opens a DB at a caller owned path, used to reopen a db across simulated restarts
#[macro_export]
macro_rules! open_db {
    ($conn_builder: expr, $db_path: expr) => {{
        let db = $conn_builder.with_db_path($db_path).build().unwrap();
        ($crate::utils::DbLifetime::without_destroy(std::sync::Arc::downgrade(&db)), db)
    }};
}
