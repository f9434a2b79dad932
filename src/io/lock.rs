use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory lock on a store directory.
///
/// Held for the whole read-modify-write cycle of a `FileStore` transaction,
/// so two `slate` processes never interleave writes. Uses flock on Unix and
/// is released when the handle drops. The lock file stays on disk so every
/// waiter locks the same inode.
pub struct StoreLock {
    _file: File,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another slate process is writing")]
    Timeout { path: PathBuf },
}

impl StoreLock {
    /// Acquire the lock for `store_dir`, polling until `timeout` elapses.
    pub fn acquire(store_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = store_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::CreateError {
                path: path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    tracing::trace!(lock = %path.display(), "acquired store lock");
                    return Ok(StoreLock { _file: file });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => return Err(LockError::Timeout { path }),
            }
        }
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_released_on_drop() {
        let tmp = TempDir::new().unwrap();
        let lock = StoreLock::acquire(tmp.path(), Duration::from_secs(1));
        assert!(lock.is_ok());
        drop(lock);
        assert!(StoreLock::acquire(tmp.path(), Duration::from_secs(1)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_second_lock_times_out() {
        let tmp = TempDir::new().unwrap();
        let _held = StoreLock::acquire(tmp.path(), Duration::from_secs(1)).unwrap();
        let second = StoreLock::acquire(tmp.path(), Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));
    }
}
