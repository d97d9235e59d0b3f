//! # Materialized Paths
//!
//! Every node's position in the outline is stored directly in its filenames as a
//! materialized path: a dash-joined sequence of 3-digit segments.
//!
//! ```text
//! 100          top-level node
//! 100-200      second child of 100
//! 100-200-010  a grandchild squeezed in before a round-numbered sibling
//! ```
//!
//! ## Ordering
//!
//! Segments are always rendered with exactly three digits, so comparing two
//! canonical strings byte by byte yields hierarchical pre-order: a parent sorts
//! immediately before its descendants, and siblings sort by number. The outline
//! relies on this to traverse the tree without a separate sort key.
//!
//! `Ord` for [`MaterializedPath`] is defined to agree with string comparison of
//! the canonical form.
//!
//! ## Segment Range
//!
//! Valid segments are `1..=999`. Zero is reserved as a sentinel (it is what the
//! allocator uses as the implicit "before the first sibling" bound), so `000`
//! never appears in a valid path.

use crate::error::{BinderError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const MIN_SEGMENT: u16 = 1;
pub const MAX_SEGMENT: u16 = 999;
pub const SEGMENT_WIDTH: usize = 3;

/// A node's absolute position in the outline.
///
/// Never empty; every segment is in `MIN_SEGMENT..=MAX_SEGMENT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterializedPath {
    segments: Vec<u16>,
}

impl MaterializedPath {
    /// Parses the canonical `NNN(-NNN)*` form.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| BinderError::InvalidPath {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in input.split('-') {
            if part.len() != SEGMENT_WIDTH {
                return Err(invalid("each segment must be exactly 3 digits"));
            }
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("segments must contain only digits"));
            }
            if part == "000" {
                return Err(invalid("segment 000 is reserved"));
            }
            // Three ASCII digits always fit.
            let value: u16 = part
                .parse()
                .map_err(|_| invalid("segment is not a number"))?;
            segments.push(value);
        }

        Ok(Self { segments })
    }

    /// A depth-1 path.
    pub fn root(segment: u16) -> Result<Self> {
        validate_segment(segment.into())?;
        Ok(Self {
            segments: vec![segment],
        })
    }

    pub fn from_segments(segments: Vec<u16>) -> Result<Self> {
        if segments.is_empty() {
            return Err(BinderError::InvalidPath {
                input: String::new(),
                reason: "path is empty".to_string(),
            });
        }
        for segment in &segments {
            validate_segment((*segment).into())?;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[u16] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The final segment: this node's number among its siblings.
    pub fn last(&self) -> u16 {
        // Non-empty by construction.
        self.segments[self.segments.len() - 1]
    }

    /// All but the last segment, or `None` for a top-level path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn child(&self, segment: u32) -> Result<Self> {
        let segment = validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Same parent, different final segment.
    pub fn with_last(&self, segment: u16) -> Result<Self> {
        validate_segment(segment.into())?;
        let mut segments = self.segments.clone();
        let last = segments.len() - 1;
        segments[last] = segment;
        Ok(Self { segments })
    }

    /// Strict ancestry: a path is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &MaterializedPath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    pub fn is_descendant_of(&self, other: &MaterializedPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// Replaces the `from` prefix of this path with `to`.
    ///
    /// `from` must equal or be an ancestor of `self`; the relative shape below
    /// the prefix is preserved.
    pub fn rebase(&self, from: &MaterializedPath, to: &MaterializedPath) -> Option<Self> {
        if self != from && !from.is_ancestor_of(self) {
            return None;
        }
        let mut segments = to.segments.clone();
        segments.extend_from_slice(&self.segments[from.segments.len()..]);
        Some(Self { segments })
    }
}

fn validate_segment(segment: u32) -> Result<u16> {
    if segment < u32::from(MIN_SEGMENT) || segment > u32::from(MAX_SEGMENT) {
        return Err(BinderError::InvalidSegment(segment));
    }
    Ok(segment as u16)
}

impl fmt::Display for MaterializedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{:03}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for MaterializedPath {
    type Err = BinderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// Segment-wise comparison with shorter-prefix-first is exactly what byte
// comparison of the fixed-width canonical strings produces.
impl Ord for MaterializedPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for MaterializedPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for MaterializedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MaterializedPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MaterializedPath::parse(&s).map_err(serde::de::Error::custom)
    }
}
