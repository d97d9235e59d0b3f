use super::{ensure_flat_name, is_listed_name, Deleter, Reader, Renamer, Writer};
use crate::error::{BinderError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// A project directory on disk.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        ensure_flat_name(name)?;
        Ok(self.root.join(name))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(BinderError::Io)?;
        }
        Ok(())
    }
}

impl Reader for FsBackend {
    fn list_files(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(BinderError::Io)? {
            let entry = entry.map_err(BinderError::Io)?;
            if !entry.file_type().map_err(BinderError::Io)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_listed_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn read_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BinderError::Io(e)),
        }
    }
}

impl Writer for FsBackend {
    fn write_file(&self, name: &str, content: &str) -> Result<()> {
        let target = self.path_for(name)?;
        self.ensure_dir()?;

        // Atomic write
        let tmp = self.root.join(format!(".write-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).map_err(BinderError::Io)?;
        fs::rename(&tmp, &target).map_err(BinderError::Io)?;
        debug!(file = name, "wrote file");
        Ok(())
    }
}

impl Deleter for FsBackend {
    fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(file = name, "deleted file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BinderError::Io(e)),
        }
    }
}

impl Renamer for FsBackend {
    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        let source = self.path_for(from)?;
        let target = self.path_for(to)?;
        if target.exists() {
            return Err(BinderError::Io(std::io::Error::new(
                ErrorKind::AlreadyExists,
                format!("refusing to overwrite {}", to),
            )));
        }
        fs::rename(&source, &target).map_err(BinderError::Io)?;
        debug!(from, to, "renamed file");
        Ok(())
    }
}
