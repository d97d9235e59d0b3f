//! Advisory project lock.
//!
//! Every mutation holds the lock from the moment it loads the outline until its
//! last file operation. Acquisition never waits: if another process holds the
//! lock the mutation fails with [`BinderError::Locked`] immediately.
//!
//! Read-only work (loading, checking, planning with `apply = false`) does not
//! take the lock.

use crate::error::{BinderError, Result};
use fs2::FileExt;
use std::cell::{Cell, RefCell};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

pub trait Locker {
    /// Non-blocking; `Err(BinderError::Locked)` when someone else holds it.
    fn try_lock(&self) -> Result<()>;

    fn unlock(&self) -> Result<()>;
}

/// Releases the lock when dropped, so early returns and panics cannot leak it.
pub struct LockGuard<'a> {
    locker: &'a dyn Locker,
}

impl<'a> LockGuard<'a> {
    pub fn acquire(locker: &'a dyn Locker) -> Result<Self> {
        locker.try_lock()?;
        Ok(Self { locker })
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.locker.unlock() {
            warn!(error = %e, "failed to release project lock");
        }
    }
}

/// OS-level exclusive lock on a file inside the project directory.
#[derive(Debug)]
pub struct FileLocker {
    path: PathBuf,
    file: RefCell<Option<File>>,
}

impl FileLocker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: RefCell::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.file.borrow().is_some()
    }
}

impl Locker for FileLocker {
    fn try_lock(&self) -> Result<()> {
        if self.is_held() {
            return Err(BinderError::Locked);
        }
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| BinderError::Lock(format!("cannot create {}: {}", dir.display(), e)))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| {
                BinderError::Lock(format!("cannot open {}: {}", self.path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %self.path.display(), "acquired project lock");
                *self.file.borrow_mut() = Some(file);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(BinderError::Locked),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(BinderError::Locked)
            }
            Err(e) => Err(BinderError::Lock(e.to_string())),
        }
    }

    fn unlock(&self) -> Result<()> {
        if let Some(file) = self.file.borrow_mut().take() {
            file.unlock()
                .map_err(|e| BinderError::Lock(format!("failed to release lock: {}", e)))?;
            debug!(path = %self.path.display(), "released project lock");
        }
        Ok(())
    }
}

impl Drop for FileLocker {
    fn drop(&mut self) {
        let _ = self.unlock();
    }
}

/// In-process lock for tests. Clones share state, so one clone can stand in
/// for "another process" holding the lock.
#[derive(Debug, Default, Clone)]
pub struct MemLocker {
    held: Rc<Cell<bool>>,
}

impl MemLocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

impl Locker for MemLocker {
    fn try_lock(&self) -> Result<()> {
        if self.held.replace(true) {
            return Err(BinderError::Locked);
        }
        Ok(())
    }

    fn unlock(&self) -> Result<()> {
        self.held.set(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_lock_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".binder.lock");
        let first = FileLocker::new(&path);
        let second = FileLocker::new(&path);

        first.try_lock().unwrap();
        assert!(first.is_held());
        assert!(matches!(second.try_lock(), Err(BinderError::Locked)));

        first.unlock().unwrap();
        second.try_lock().unwrap();
        second.unlock().unwrap();
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let locker = MemLocker::new();
        {
            let _guard = LockGuard::acquire(&locker).unwrap();
            assert!(locker.is_held());
            assert!(matches!(
                LockGuard::acquire(&locker),
                Err(BinderError::Locked)
            ));
        }
        assert!(!locker.is_held());
    }

    #[test]
    fn test_mem_locker_clones_share_state() {
        let locker = MemLocker::new();
        let other = locker.clone();
        other.try_lock().unwrap();
        assert!(matches!(locker.try_lock(), Err(BinderError::Locked)));
    }
}
