use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;
use warden_db::Database;

/// File-backed database under the temp dir, removed on drop.
pub struct TempDb {
    pub path: PathBuf,
    pub db: Arc<Database>,
}

impl TempDb {
    pub fn new(readers: usize) -> Self {
        let path = std::env::temp_dir().join(format!("warden_test_{}.db", Uuid::new_v4()));
        let db = Arc::new(Database::open(&path, readers).unwrap());
        Self { path, db }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
