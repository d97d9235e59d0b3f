//! # Project
//!
//! A [`Project`] bundles the collaborators one project directory needs: the
//! file backend, the advisory lock, the SID reservation store, the slugifier
//! and the front matter handler. Commands receive a `&Project` and never reach
//! past it.
//!
//! [`Project::open`] wires the filesystem implementations for a directory;
//! [`Project::new`] accepts any implementations, which is how tests run the
//! same commands against in-memory doubles.

use crate::config::BinderConfig;
use crate::error::{BinderError, Result};
use crate::filename::{parse_filename, ParsedFilename};
use crate::frontmatter::{Frontmatter, FrontmatterHandler, YamlFrontmatter};
use crate::model::{Finding, FindingKind, Severity};
use crate::outline::{build_outline, Outline};
use crate::slug::{DefaultSlugifier, Slugifier};
use crate::store::fs_backend::FsBackend;
use crate::store::lock::{FileLocker, LockGuard, Locker};
use crate::store::reserve::{FileReserver, IdReserver};
use crate::store::{Backend, FileOp};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub struct Project {
    backend: Box<dyn Backend>,
    locker: Box<dyn Locker>,
    reserver: Box<dyn IdReserver>,
    slugifier: Box<dyn Slugifier>,
    frontmatter: Box<dyn FrontmatterHandler>,
    config: BinderConfig,
}

/// One read of the project directory.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Every listed filename, sorted.
    pub files: Vec<String>,
    pub records: Vec<ParsedFilename>,
    pub outline: Outline,
    /// `invalid_filename` findings followed by the builder's `duplicate_sid` ones.
    pub findings: Vec<Finding>,
}

impl Project {
    pub fn new(
        backend: impl Backend + 'static,
        locker: impl Locker + 'static,
        reserver: impl IdReserver + 'static,
    ) -> Self {
        Self {
            backend: Box::new(backend),
            locker: Box::new(locker),
            reserver: Box::new(reserver),
            slugifier: Box::new(DefaultSlugifier),
            frontmatter: Box::new(YamlFrontmatter),
            config: BinderConfig::default(),
        }
    }

    /// Opens a project directory, reading `binder.toml` if present.
    pub fn open(dir: &Path) -> Result<Self> {
        let config = BinderConfig::load(dir)?;
        Ok(Self::open_with_config(dir, config))
    }

    pub fn open_with_config(dir: &Path, config: BinderConfig) -> Self {
        let locker = FileLocker::new(dir.join(&config.lock_file));
        let reserver =
            FileReserver::new(dir.join(&config.reservations_file)).with_sid_length(config.sid_length);
        Self::new(FsBackend::new(dir), locker, reserver).with_config(config)
    }

    pub fn with_slugifier(mut self, slugifier: impl Slugifier + 'static) -> Self {
        self.slugifier = Box::new(slugifier);
        self
    }

    pub fn with_frontmatter(mut self, handler: impl FrontmatterHandler + 'static) -> Self {
        self.frontmatter = Box::new(handler);
        self
    }

    pub fn with_config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn reserver(&self) -> &dyn IdReserver {
        self.reserver.as_ref()
    }

    pub fn slugifier(&self) -> &dyn Slugifier {
        self.slugifier.as_ref()
    }

    pub fn frontmatter(&self) -> &dyn FrontmatterHandler {
        self.frontmatter.as_ref()
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Fails immediately with [`BinderError::Locked`] if the lock is held.
    pub fn lock(&self) -> Result<LockGuard<'_>> {
        LockGuard::acquire(self.locker.as_ref())
    }

    /// Lists and decodes the directory, then rebuilds the outline.
    ///
    /// Names are sorted before grouping so "first seen" does not depend on
    /// the order the backend happens to list them in.
    pub fn load(&self) -> Result<Snapshot> {
        let mut files = self.backend.list_files()?;
        files.sort();

        let mut records = Vec::with_capacity(files.len());
        let mut findings = Vec::new();
        for name in &files {
            match parse_filename(name) {
                Ok(record) => records.push(record),
                Err(e) => findings.push(Finding::new(
                    FindingKind::InvalidFilename,
                    Severity::Error,
                    e.to_string(),
                    name.clone(),
                )),
            }
        }

        let (outline, duplicates) = build_outline(&records);
        findings.extend(duplicates);
        debug!(
            files = files.len(),
            nodes = outline.len(),
            findings = findings.len(),
            "loaded outline"
        );

        Ok(Snapshot {
            files,
            records,
            outline,
            findings,
        })
    }

    pub fn load_outline(&self) -> Result<Outline> {
        Ok(self.load()?.outline)
    }

    /// Fails with [`BinderError::Encoding`] when the file is not UTF-8 text.
    pub fn read(&self, name: &str) -> Result<String> {
        self.backend.read_file(name)?.ok_or_else(|| vanished(name))
    }

    pub fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
        self.backend.read_bytes(name)?.ok_or_else(|| vanished(name))
    }

    /// Content of a fresh document: a header carrying the title, then `body`.
    pub fn document_content(&self, title: &str, body: &str) -> Result<String> {
        self.frontmatter
            .serialize(&Frontmatter::with_title(title, body))
    }

    /// Replays `ops` against the current listing without touching it.
    ///
    /// Every rename source must exist at that point of the plan and no rename
    /// may land on a name that is still taken. Writes may overwrite.
    pub fn verify_plan(&self, ops: &[FileOp]) -> Result<()> {
        let mut names: HashSet<String> = self.backend.list_files()?.into_iter().collect();
        for op in ops {
            match op {
                FileOp::Write { name, .. } => {
                    names.insert(name.clone());
                }
                FileOp::Rename { from, to } => {
                    if !names.remove(from) {
                        return Err(BinderError::PlanConflict(format!(
                            "{} is not there to rename",
                            from
                        )));
                    }
                    if !names.insert(to.clone()) {
                        return Err(BinderError::PlanConflict(format!(
                            "renaming {} would overwrite {}",
                            from, to
                        )));
                    }
                }
                FileOp::Delete { name } => {
                    names.remove(name);
                }
            }
        }
        Ok(())
    }

    /// Verifies the plan, then applies it in order.
    ///
    /// Nothing is written when verification fails. A backend failure midway
    /// stops the plan and leaves the rest for the checker.
    pub fn apply(&self, ops: &[FileOp]) -> Result<()> {
        self.verify_plan(ops)?;
        for op in ops {
            op.apply(self.backend.as_ref())?;
        }
        Ok(())
    }
}

fn vanished(name: &str) -> BinderError {
    BinderError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} disappeared while reading", name),
    ))
}
