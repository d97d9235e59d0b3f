use super::{ensure_flat_name, is_listed_name, Deleter, Reader, Renamer, Writer};
use crate::error::{BinderError, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// In-memory project directory for testing.
///
/// Uses `RefCell` for interior mutability since the engine is single-threaded,
/// which lets every collaborator trait take `&self`. Clones share the same
/// files, so a test can keep a handle after giving the backend to a project.
#[derive(Default, Clone)]
pub struct MemBackend {
    files: Rc<RefCell<BTreeMap<String, Vec<u8>>>>,
    fail_after: Rc<RefCell<Option<usize>>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, N, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let backend = Self::new();
        backend.files.borrow_mut().extend(
            files
                .into_iter()
                .map(|(name, content)| (name.into(), Into::<String>::into(content).into_bytes())),
        );
        backend
    }

    /// Stores raw bytes, bypassing the `&str` writer.
    pub fn put_bytes(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(name.to_string(), bytes.into());
    }

    /// Lets the next `n` mutating calls succeed, then fails every one after.
    pub fn fail_after(&self, n: usize) {
        *self.fail_after.borrow_mut() = Some(n);
    }

    /// Every stored name, hidden ones included, sorted.
    pub fn all_names(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    fn check_write(&self) -> Result<()> {
        let mut remaining = self.fail_after.borrow_mut();
        match remaining.as_mut() {
            Some(0) => Err(BinderError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write error",
            ))),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Reader for MemBackend {
    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|name| is_listed_name(name))
            .cloned()
            .collect())
    }

    fn read_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        ensure_flat_name(name)?;
        Ok(self.files.borrow().get(name).cloned())
    }
}

impl Writer for MemBackend {
    fn write_file(&self, name: &str, content: &str) -> Result<()> {
        ensure_flat_name(name)?;
        self.check_write()?;
        self.files
            .borrow_mut()
            .insert(name.to_string(), content.as_bytes().to_vec());
        Ok(())
    }
}

impl Deleter for MemBackend {
    fn delete_file(&self, name: &str) -> Result<()> {
        ensure_flat_name(name)?;
        self.check_write()?;
        self.files.borrow_mut().remove(name);
        Ok(())
    }
}

impl Renamer for MemBackend {
    fn rename_file(&self, from: &str, to: &str) -> Result<()> {
        ensure_flat_name(from)?;
        ensure_flat_name(to)?;
        self.check_write()?;
        let mut files = self.files.borrow_mut();
        if files.contains_key(to) {
            return Err(BinderError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("refusing to overwrite {}", to),
            )));
        }
        let content = files.remove(from).ok_or_else(|| {
            BinderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file {}", from),
            ))
        })?;
        files.insert(to.to_string(), content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_moves_content() {
        let backend = MemBackend::with_files([("a.md", "A")]);
        backend.rename_file("a.md", "b.md").unwrap();
        assert_eq!(backend.read_file("a.md").unwrap(), None);
        assert_eq!(backend.read_file("b.md").unwrap(), Some("A".to_string()));
        assert!(backend.rename_file("missing.md", "c.md").is_err());
    }

    #[test]
    fn test_list_hides_dotfiles() {
        let backend = MemBackend::with_files([("a.md", ""), (".hidden.md", ""), ("x.txt", "")]);
        assert_eq!(backend.list_files().unwrap(), vec!["a.md"]);
        assert_eq!(backend.all_names().len(), 3);
    }

    #[test]
    fn test_clones_share_files() {
        let backend = MemBackend::new();
        let handle = backend.clone();
        backend.write_file("a.md", "A").unwrap();
        assert_eq!(handle.read_file("a.md").unwrap(), Some("A".to_string()));
    }

    #[test]
    fn test_raw_bytes_fail_text_reads() {
        let backend = MemBackend::new();
        backend.put_bytes("a.md", vec![0xff, 0xfe]);
        assert_eq!(backend.read_bytes("a.md").unwrap(), Some(vec![0xff, 0xfe]));
        assert!(matches!(backend.read_file("a.md"), Err(BinderError::Encoding(_))));
    }

    #[test]
    fn test_simulated_failure() {
        let backend = MemBackend::new();
        backend.fail_after(1);
        backend.write_file("a.md", "").unwrap();
        assert!(backend.write_file("b.md", "").is_err());
        assert!(backend.delete_file("a.md").is_err());
    }
}
