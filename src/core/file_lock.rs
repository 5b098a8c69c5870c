//! Directory-level advisory locking using flock(2).
//!
//! The lock is taken on the provisioning directory itself, so no lock file
//! is added next to the artifacts.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// An exclusive lock on a directory. Released on drop (closing the fd releases flock).
#[derive(Debug)]
pub struct DirLock {
    _file: File,
    path: PathBuf,
}

impl DirLock {
    /// Acquire an exclusive lock, blocking until available.
    pub fn exclusive(dir: &Path) -> Result<Self> {
        let file = open_dir(dir)?;
        file.lock_exclusive()
            .with_context(|| format!("acquire lock on {}", dir.display()))?;
        Ok(Self {
            _file: file,
            path: dir.to_path_buf(),
        })
    }

    /// Try to acquire an exclusive lock without blocking.
    /// Returns `Ok(Some(lock))` if acquired, `Ok(None)` if already held.
    pub fn try_exclusive(dir: &Path) -> Result<Option<Self>> {
        let file = open_dir(dir)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                _file: file,
                path: dir.to_path_buf(),
            })),
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            // fs2 on Linux may return Other instead of WouldBlock
            Err(ref e) if e.raw_os_error() == Some(11) => Ok(None), // EAGAIN
            Err(e) => Err(e).with_context(|| format!("try lock {}", dir.display())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_dir(dir: &Path) -> Result<File> {
    File::open(dir).with_context(|| format!("open directory {} for locking", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exclusive_lock_acquired() {
        let dir = TempDir::new().unwrap();
        let lock = DirLock::exclusive(dir.path()).unwrap();
        assert_eq!(lock.path(), dir.path());
        // no lock file is created
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_try_exclusive_returns_none_when_held() {
        let dir = TempDir::new().unwrap();
        let _lock = DirLock::exclusive(dir.path()).unwrap();
        let result = DirLock::try_exclusive(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let _lock = DirLock::exclusive(dir.path()).unwrap();
        }
        let lock = DirLock::try_exclusive(dir.path()).unwrap();
        assert!(lock.is_some());
    }

    #[test]
    fn test_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(DirLock::try_exclusive(&dir.path().join("absent")).is_err());
    }
}
