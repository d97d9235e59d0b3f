//! # Filename Codec
//!
//! The only bridge between the in-memory outline and the flat directory.
//!
//! ```text
//! <mp>_<sid>_<doctype>[_<slug>].md
//!
//! 100-200_k3j9x0a2mq_draft_the-long-night.md
//! 100-200_k3j9x0a2mq_notes.md
//! ```
//!
//! The slug segment (and its leading underscore) is omitted when the slug is
//! empty. For every name [`parse_filename`] accepts,
//! `generate_filename(parse_filename(name)) == name`.
//!
//! Slugs end up inside filesystem paths, so both directions reject slugs
//! containing `/`, `\`, NUL or line breaks.

use crate::error::{BinderError, Result};
use crate::model::{DocType, Sid};
use crate::path::MaterializedPath;
use once_cell::sync::Lazy;
use regex::Regex;

pub const EXTENSION: &str = ".md";

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{3}(?:-\d{3})*)_([A-Za-z0-9]{8,12})_([a-z]+)(?:_(.+))?\.md$")
        .expect("filename pattern is valid")
});

/// The identity encoded in one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub mp: MaterializedPath,
    pub sid: Sid,
    pub doc_type: DocType,
    pub slug: String,
}

impl ParsedFilename {
    pub fn filename(&self) -> Result<String> {
        generate_filename(&self.mp, &self.sid, &self.doc_type, &self.slug)
    }
}

pub fn generate_filename(
    mp: &MaterializedPath,
    sid: &Sid,
    doc_type: &DocType,
    slug: &str,
) -> Result<String> {
    validate_slug(slug)?;
    if slug.is_empty() {
        Ok(format!("{}_{}_{}{}", mp, sid, doc_type, EXTENSION))
    } else {
        Ok(format!("{}_{}_{}_{}{}", mp, sid, doc_type, slug, EXTENSION))
    }
}

pub fn parse_filename(name: &str) -> Result<ParsedFilename> {
    let invalid = |reason: &str| BinderError::InvalidFilename {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let caps = FILENAME_RE
        .captures(name)
        .ok_or_else(|| invalid("does not match <path>_<sid>_<type>[_<slug>].md"))?;

    let mp = MaterializedPath::parse(&caps[1]).map_err(|e| invalid(&e.to_string()))?;
    let sid = Sid::parse(&caps[2]).map_err(|e| invalid(&e.to_string()))?;
    let doc_type = DocType::parse(&caps[3]).map_err(|e| invalid(&e.to_string()))?;
    let slug = caps.get(4).map(|m| m.as_str()).unwrap_or_default();
    if has_forbidden_chars(slug) {
        return Err(invalid("slug contains a path separator or control character"));
    }

    Ok(ParsedFilename {
        mp,
        sid,
        doc_type,
        slug: slug.to_string(),
    })
}

fn validate_slug(slug: &str) -> Result<()> {
    if has_forbidden_chars(slug) {
        return Err(BinderError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

fn has_forbidden_chars(slug: &str) -> bool {
    slug.contains(['/', '\\', '\0', '\n', '\r'])
}
