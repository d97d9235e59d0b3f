//! Stable id reservations.
//!
//! A SID is reserved before any file carrying it is written, so two processes
//! (or a crashed run and a fresh one) can never hand out the same id. The
//! checker reports reservations with no files as `orphaned_reservation`.
//!
//! [`IdReserver::generate`] only proposes an unused id; nothing is persisted
//! until [`IdReserver::reserve`] is called. Planning uses the former, applying
//! uses both.

use crate::error::{BinderError, Result};
use crate::model::{Sid, SID_MAX_LEN, SID_MIN_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_SID_LEN: usize = 10;
const MAX_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub sid: Sid,
    pub reserved_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(sid: Sid) -> Self {
        Self {
            sid,
            reserved_at: Utc::now(),
        }
    }
}

pub trait IdReserver {
    fn reservations(&self) -> Result<Vec<Reservation>>;

    fn reserve(&self, sid: &Sid) -> Result<()>;

    fn release(&self, sid: &Sid) -> Result<()>;

    fn sid_length(&self) -> usize {
        DEFAULT_SID_LEN
    }

    fn reserved(&self) -> Result<Vec<Sid>> {
        Ok(self.reservations()?.into_iter().map(|r| r.sid).collect())
    }

    /// A fresh SID not present in the reservation store.
    fn generate(&self) -> Result<Sid> {
        self.generate_excluding(&HashSet::new())
    }

    /// A fresh SID in neither the store nor `taken`.
    fn generate_excluding(&self, taken: &HashSet<Sid>) -> Result<Sid> {
        let reserved: HashSet<Sid> = self.reserved()?.into_iter().collect();
        let len = self.sid_length().clamp(SID_MIN_LEN, SID_MAX_LEN);
        for _ in 0..MAX_ATTEMPTS {
            let candidate = random_sid(len)?;
            if !reserved.contains(&candidate) && !taken.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(BinderError::SidExhausted(MAX_ATTEMPTS))
    }
}

fn random_sid(len: usize) -> Result<Sid> {
    // A v4 UUID's simple form is 32 lowercase hex characters.
    let raw = Uuid::new_v4().simple().to_string();
    Sid::parse(&raw[..len])
}

/// Reservations stored as a JSON file inside the project directory.
pub struct FileReserver {
    path: PathBuf,
    sid_length: usize,
}

impl FileReserver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sid_length: DEFAULT_SID_LEN,
        }
    }

    pub fn with_sid_length(mut self, len: usize) -> Self {
        self.sid_length = len;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, reservations: &[Reservation]) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(BinderError::Io)?;
        }
        let content = serde_json::to_string_pretty(reservations)?;

        // Atomic write
        let tmp = dir.join(format!(".sids-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).map_err(BinderError::Io)?;
        fs::rename(&tmp, &self.path).map_err(BinderError::Io)?;
        Ok(())
    }
}

impl IdReserver for FileReserver {
    fn reservations(&self) -> Result<Vec<Reservation>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(BinderError::Io)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn reserve(&self, sid: &Sid) -> Result<()> {
        let mut reservations = self.reservations()?;
        if reservations.iter().any(|r| &r.sid == sid) {
            return Ok(());
        }
        reservations.push(Reservation::new(sid.clone()));
        self.save(&reservations)?;
        debug!(%sid, "reserved sid");
        Ok(())
    }

    fn release(&self, sid: &Sid) -> Result<()> {
        let mut reservations = self.reservations()?;
        let before = reservations.len();
        reservations.retain(|r| &r.sid != sid);
        if reservations.len() != before {
            self.save(&reservations)?;
            debug!(%sid, "released sid");
        }
        Ok(())
    }

    fn sid_length(&self) -> usize {
        self.sid_length
    }
}

/// In-memory reservations for tests. Clones share state.
#[derive(Debug, Default, Clone)]
pub struct MemReserver {
    reservations: Rc<RefCell<Vec<Reservation>>>,
}

impl MemReserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reserved<'a>(sids: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let reserver = Self::new();
        for sid in sids {
            reserver.reserve(&Sid::parse(sid)?)?;
        }
        Ok(reserver)
    }
}

impl IdReserver for MemReserver {
    fn reservations(&self) -> Result<Vec<Reservation>> {
        Ok(self.reservations.borrow().clone())
    }

    fn reserve(&self, sid: &Sid) -> Result<()> {
        let mut reservations = self.reservations.borrow_mut();
        if !reservations.iter().any(|r| &r.sid == sid) {
            reservations.push(Reservation::new(sid.clone()));
        }
        Ok(())
    }

    fn release(&self, sid: &Sid) -> Result<()> {
        self.reservations.borrow_mut().retain(|r| &r.sid != sid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_sids_are_valid_and_unreserved() {
        let reserver = MemReserver::new();
        let sid = reserver.generate().unwrap();
        assert_eq!(sid.as_str().len(), DEFAULT_SID_LEN);
        assert!(Sid::is_valid(sid.as_str()));
        // Generating does not reserve.
        assert!(reserver.reserved().unwrap().is_empty());
    }

    #[test]
    fn test_reserve_and_release() {
        let reserver = MemReserver::with_reserved(["abcd1234"]).unwrap();
        let sid = Sid::parse("abcd1234").unwrap();
        reserver.reserve(&sid).unwrap();
        assert_eq!(reserver.reserved().unwrap(), vec![sid.clone()]);
        reserver.release(&sid).unwrap();
        assert!(reserver.reserved().unwrap().is_empty());
    }

    #[test]
    fn test_file_reserver_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".binder-sids.json");
        let sid = Sid::parse("k3j9x0a2mq").unwrap();

        FileReserver::new(&path).reserve(&sid).unwrap();
        let reopened = FileReserver::new(&path);
        assert_eq!(reopened.reserved().unwrap(), vec![sid.clone()]);

        reopened.release(&sid).unwrap();
        assert!(FileReserver::new(&path).reserved().unwrap().is_empty());
    }

    #[test]
    fn test_file_reserver_sid_length() {
        let dir = TempDir::new().unwrap();
        let reserver = FileReserver::new(dir.path().join("sids.json")).with_sid_length(12);
        assert_eq!(reserver.generate().unwrap().as_str().len(), 12);
    }

    #[test]
    fn test_missing_file_means_no_reservations() {
        let dir = TempDir::new().unwrap();
        let reserver = FileReserver::new(dir.path().join("nope.json"));
        assert!(reserver.reserved().unwrap().is_empty());
    }
}
