//! # Front Matter
//!
//! Documents start with an optional YAML header:
//!
//! ```text
//! ---
//! title: The Long Night
//! ---
//! Body text...
//! ```
//!
//! Content without a leading `---` line simply has no front matter. A header
//! that never closes, or whose YAML is not a mapping, is malformed: the checker
//! reports it and repair rewrites it from the node's title.

use crate::error::{BinderError, Result};
use serde_yaml::{Mapping, Value};

const DELIMITER: &str = "---";
const TITLE_KEY: &str = "title";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub fields: Mapping,
    pub body: String,
}

impl Frontmatter {
    pub fn with_title(title: &str, body: impl Into<String>) -> Self {
        let mut fm = Self {
            fields: Mapping::new(),
            body: body.into(),
        };
        fm.set_title(title);
        fm
    }

    pub fn title(&self) -> Option<&str> {
        self.fields
            .get(TITLE_KEY)
            .and_then(Value::as_str)
    }

    pub fn has_title(&self) -> bool {
        self.fields.contains_key(TITLE_KEY)
    }

    pub fn set_title(&mut self, title: &str) {
        self.fields.insert(
            Value::String(TITLE_KEY.to_string()),
            Value::String(title.to_string()),
        );
    }
}

pub trait FrontmatterHandler {
    /// Splits content into header fields and body.
    fn parse(&self, content: &str) -> Result<Frontmatter>;

    fn serialize(&self, fm: &Frontmatter) -> Result<String>;

    /// Best-effort body of content whose header is malformed.
    fn salvage_body(&self, content: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlFrontmatter;

struct Split<'a> {
    header: &'a str,
    body: &'a str,
}

/// `None` when there is no opening delimiter; `Some(Err)` when it never closes.
fn split(content: &str) -> Option<std::result::Result<Split<'_>, ()>> {
    let rest = strip_delimiter_line(content)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return Some(Ok(Split {
                header: &rest[..offset],
                body: &rest[offset + line.len()..],
            }));
        }
        offset += line.len();
    }
    Some(Err(()))
}

fn strip_delimiter_line(content: &str) -> Option<&str> {
    content
        .strip_prefix("---\r\n")
        .or_else(|| content.strip_prefix("---\n"))
}

impl FrontmatterHandler for YamlFrontmatter {
    fn parse(&self, content: &str) -> Result<Frontmatter> {
        let Some(split) = split(content) else {
            return Ok(Frontmatter {
                fields: Mapping::new(),
                body: content.to_string(),
            });
        };
        let split = split
            .map_err(|_| BinderError::Frontmatter("front matter is never closed".to_string()))?;

        let fields = match serde_yaml::from_str::<Value>(split.header)
            .map_err(|e| BinderError::Frontmatter(e.to_string()))?
        {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            _ => {
                return Err(BinderError::Frontmatter(
                    "front matter is not a mapping".to_string(),
                ))
            }
        };

        Ok(Frontmatter {
            fields,
            body: split.body.to_string(),
        })
    }

    fn serialize(&self, fm: &Frontmatter) -> Result<String> {
        if fm.fields.is_empty() {
            return Ok(fm.body.clone());
        }
        let header = serde_yaml::to_string(&fm.fields)
            .map_err(|e| BinderError::Frontmatter(e.to_string()))?;
        Ok(format!("{}\n{}{}\n{}", DELIMITER, header, DELIMITER, fm.body))
    }

    fn salvage_body(&self, content: &str) -> String {
        match split(content) {
            Some(Ok(split)) => split.body.to_string(),
            Some(Err(())) => strip_delimiter_line(content).unwrap_or(content).to_string(),
            None => content.to_string(),
        }
    }
}
