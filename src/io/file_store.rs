use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::io::lock::StoreLock;
use crate::io::store::{StoreError, Tables};

/// File inside the store directory holding all three tables
const STORE_FILE: &str = "store.json";

/// A store persisted as one JSON document in a `.slate/` directory.
///
/// Transactions hold the directory's `StoreLock` while they load, mutate,
/// and write back the tables. Writes go through a temp file and rename, so
/// readers that skip the lock still see a whole document.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    pub fn open(dir: &Path, lock_timeout: Duration) -> Self {
        FileStore {
            dir: dir.to_path_buf(),
            lock_timeout,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }

    /// Read the committed tables. A missing store file reads as empty.
    pub fn load(&self) -> Result<Tables, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Tables::default()),
            Err(e) => return Err(StoreError::ReadError { path, source: e }),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Run `f` atomically against the store. Nothing is written if `f`
    /// fails or leaves the tables unchanged.
    pub fn transaction<T, E>(&self, f: impl FnOnce(&mut Tables) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _lock = StoreLock::acquire(&self.dir, self.lock_timeout).map_err(StoreError::from)?;
        let mut tables = self.load()?;
        let before = tables.clone();
        let out = f(&mut tables)?;
        if tables != before {
            self.save(&tables)?;
            tracing::debug!(
                todos = tables.todos.len(),
                projects = tables.projects.len(),
                areas = tables.areas.len(),
                "committed store"
            );
        }
        Ok(out)
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        let path = self.path();
        let mut content = serde_json::to_string_pretty(tables)?;
        content.push('\n');
        atomic_write(&path, content.as_bytes())
            .map_err(|e| StoreError::WriteError { path, source: e })
    }
}

/// Write `content` to `path` via a temp file in the same directory.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
