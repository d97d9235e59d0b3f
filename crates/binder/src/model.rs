//! # Domain Model
//!
//! A writing project is a tree of [`Node`]s. Each node has:
//!
//! - a [`MaterializedPath`]: where it currently sits in the tree,
//! - a [`Sid`]: its stable identity, assigned at creation and never changed,
//! - a title, derived from the slug of its `draft` document,
//! - a set of [`Document`]s, one file each (`draft`, `notes`, or any other
//!   lowercase [`DocType`]).
//!
//! None of this is stored anywhere except in filenames. A document's filename is
//! always computed from its node's path and SID plus its own type and slug (see
//! [`crate::filename`]), never kept as a separate string.
//!
//! [`Finding`]s describe inconsistencies discovered by the checker. They are
//! recomputed on every check and never persisted.

use crate::error::{BinderError, Result};
use crate::filename::generate_filename;
use crate::path::MaterializedPath;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SID_MIN_LEN: usize = 8;
pub const SID_MAX_LEN: usize = 12;

/// A node's stable identity: 8-12 ASCII alphanumeric characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sid(String);

impl Sid {
    pub fn parse(input: &str) -> Result<Self> {
        if Self::is_valid(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(BinderError::InvalidSid(input.to_string()))
        }
    }

    pub fn is_valid(input: &str) -> bool {
        (SID_MIN_LEN..=SID_MAX_LEN).contains(&input.len())
            && input.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Sid {
    type Error = BinderError;

    fn try_from(value: String) -> Result<Self> {
        Sid::parse(&value)
    }
}

impl From<Sid> for String {
    fn from(sid: Sid) -> Self {
        sid.0
    }
}

/// The kind of a document: a non-empty lowercase ASCII word.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocType(String);

impl DocType {
    pub const DRAFT: &'static str = "draft";
    pub const NOTES: &'static str = "notes";

    pub fn parse(input: &str) -> Result<Self> {
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_lowercase()) {
            Ok(Self(input.to_string()))
        } else {
            Err(BinderError::InvalidDocType(input.to_string()))
        }
    }

    pub fn draft() -> Self {
        Self(Self::DRAFT.to_string())
    }

    pub fn notes() -> Self {
        Self(Self::NOTES.to_string())
    }

    pub fn is_draft(&self) -> bool {
        self.0 == Self::DRAFT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One file belonging to a node.
///
/// Content is loaded on demand through the project's reader; it is not part of
/// the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub doc_type: DocType,
    /// Empty when the filename carries no slug.
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub mp: MaterializedPath,
    pub sid: Sid,
    pub title: String,
    /// Sorted by document type, then slug.
    pub documents: Vec<Document>,
}

impl Node {
    pub fn document(&self, doc_type: &str) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.doc_type.as_str() == doc_type)
    }

    pub fn has_document(&self, doc_type: &str) -> bool {
        self.document(doc_type).is_some()
    }

    /// The filename of one of this node's documents at the node's current path.
    pub fn filename(&self, doc: &Document) -> Result<String> {
        generate_filename(&self.mp, &self.sid, &doc.doc_type, &doc.slug)
    }

    /// Every filename of this node, in document order.
    pub fn filenames(&self) -> Result<Vec<String>> {
        self.documents.iter().map(|d| self.filename(d)).collect()
    }
}

/// Titles are recovered from draft slugs by turning hyphens back into spaces.
pub fn title_from_slug(slug: &str) -> String {
    slug.replace('-', " ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    InvalidFilename,
    DuplicateSid,
    SlugDrift,
    MissingDraft,
    MissingNotes,
    MalformedFrontmatter,
    OrphanedReservation,
}

impl FindingKind {
    /// Kinds that need a human: their correct resolution is ambiguous.
    pub fn is_auto_repairable(&self) -> bool {
        !matches!(self, FindingKind::InvalidFilename | FindingKind::DuplicateSid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::InvalidFilename => "invalid_filename",
            FindingKind::DuplicateSid => "duplicate_sid",
            FindingKind::SlugDrift => "slug_drift",
            FindingKind::MissingDraft => "missing_draft",
            FindingKind::MissingNotes => "missing_notes",
            FindingKind::MalformedFrontmatter => "malformed_frontmatter",
            FindingKind::OrphanedReservation => "orphaned_reservation",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    /// The offending filename, or the SID for reservation findings.
    pub path: String,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            path: path.into(),
        }
    }
}
