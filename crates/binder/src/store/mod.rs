//! # Storage Collaborators
//!
//! The outline engine never touches the filesystem directly. Everything it
//! needs from the outside world is one of these small traits:
//!
//! - [`Reader`]: list the project's document filenames, read one file.
//! - [`Writer`]: create or overwrite a file.
//! - [`Deleter`] / [`Renamer`]: remove or rename a file.
//! - [`lock::Locker`]: the single advisory lock that serializes mutations.
//! - [`reserve::IdReserver`]: hands out stable ids that nobody else holds.
//!
//! ## Files Are The Database
//!
//! There is no index. The directory listing *is* the outline, so a crash in the
//! middle of a multi-file operation can leave a half-applied rename set behind.
//! The checker ([`crate::check`]) is designed to detect what such a crash leaves
//! and repair it on the next run.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`], [`lock::FileLocker`], [`reserve::FileReserver`]:
//!   a real project directory.
//! - [`mem_backend::MemBackend`], [`lock::MemLocker`], [`reserve::MemReserver`]:
//!   for testing logic without filesystem I/O.
//!
//! ## Project Layout
//!
//! ```text
//! my-novel/
//! ├── binder.toml                      # Optional configuration
//! ├── .binder.lock                     # Advisory lock file
//! ├── .binder-sids.json                # Reserved stable ids
//! ├── 100_k3j9x0a2mq_draft_part-one.md
//! ├── 100_k3j9x0a2mq_notes.md
//! └── 100-100_p0q8w7e6r5_draft_arrival.md
//! ```
//!
//! Only visible `*.md` files are listed by a [`Reader`]; dot-files and other
//! extensions are never part of the outline.

use crate::error::{BinderError, Result};
use serde::Serialize;
use tracing::debug;

pub mod fs_backend;
pub mod lock;
pub mod mem_backend;
pub mod reserve;

pub trait Reader {
    /// Visible `*.md` filenames, in no particular order.
    fn list_files(&self) -> Result<Vec<String>>;

    /// `Ok(None)` when the file does not exist.
    fn read_bytes(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Like [`Reader::read_bytes`], but fails with [`BinderError::Encoding`]
    /// when the content is not UTF-8.
    fn read_file(&self, name: &str) -> Result<Option<String>> {
        match self.read_bytes(name)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| BinderError::Encoding(name.to_string())),
            None => Ok(None),
        }
    }
}

pub trait Writer {
    fn write_file(&self, name: &str, content: &str) -> Result<()>;
}

pub trait Deleter {
    fn delete_file(&self, name: &str) -> Result<()>;
}

pub trait Renamer {
    fn rename_file(&self, from: &str, to: &str) -> Result<()>;
}

/// Everything a mutation needs from the directory.
pub trait Backend: Reader + Writer + Deleter + Renamer {}

impl<T: Reader + Writer + Deleter + Renamer> Backend for T {}

/// One step of a mutation plan.
///
/// Plans are computed purely and applied last, in order, as independent calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum FileOp {
    Write {
        name: String,
        #[serde(skip_serializing)]
        content: String,
    },
    Rename {
        from: String,
        to: String,
    },
    Delete {
        name: String,
    },
}

impl FileOp {
    /// The file this step leaves behind (or removes).
    pub fn target(&self) -> &str {
        match self {
            FileOp::Write { name, .. } => name,
            FileOp::Rename { to, .. } => to,
            FileOp::Delete { name } => name,
        }
    }

    pub fn apply(&self, backend: &dyn Backend) -> Result<()> {
        debug!(?self, "applying file op");
        match self {
            FileOp::Write { name, content } => backend.write_file(name, content),
            FileOp::Rename { from, to } => backend.rename_file(from, to),
            FileOp::Delete { name } => backend.delete_file(name),
        }
    }
}

/// Names reaching a backend must stay inside the project directory.
pub(crate) fn ensure_flat_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(BinderError::InvalidFilename {
            name: name.to_string(),
            reason: "not a plain file name inside the project directory".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn is_listed_name(name: &str) -> bool {
    !name.starts_with('.') && name.ends_with(crate::filename::EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_flat_name() {
        assert!(ensure_flat_name("100_abcd1234_draft.md").is_ok());
        assert!(ensure_flat_name("../escape.md").is_err());
        assert!(ensure_flat_name("a\\b.md").is_err());
        assert!(ensure_flat_name("").is_err());
        assert!(ensure_flat_name("..").is_err());
    }

    #[test]
    fn test_file_ops_apply_in_order() {
        let backend = mem_backend::MemBackend::new();
        let ops = vec![
            FileOp::Write {
                name: "a.md".to_string(),
                content: "A".to_string(),
            },
            FileOp::Rename {
                from: "a.md".to_string(),
                to: "b.md".to_string(),
            },
            FileOp::Write {
                name: "c.md".to_string(),
                content: "C".to_string(),
            },
            FileOp::Delete {
                name: "c.md".to_string(),
            },
        ];
        for op in &ops {
            op.apply(&backend).unwrap();
        }
        assert_eq!(backend.list_files().unwrap(), vec!["b.md"]);
        assert_eq!(ops[1].target(), "b.md");
    }

    #[test]
    fn test_listed_names() {
        assert!(is_listed_name("100_abcd1234_draft.md"));
        assert!(is_listed_name("readme.md"));
        assert!(!is_listed_name(".hidden.md"));
        assert!(!is_listed_name("binder.toml"));
    }
}
