use thiserror::Error;

/// Exhaustion signals from the sibling allocator.
///
/// Both are recoverable: the caller can compact the sibling set or pick a
/// different parent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    #[error("maximum number of siblings reached")]
    MaxSiblingsReached,

    #[error("no free sibling number in range ({low}, {high}); run compact")]
    NoSlotAvailable { low: u16, high: u16 },
}

#[derive(Error, Debug)]
pub enum BinderError {
    #[error("Invalid selector: {0:?}")]
    InvalidSelector(String),

    #[error("Invalid path {input:?}: {reason}")]
    InvalidPath { input: String, reason: String },

    #[error("Invalid path segment {0}: must be between 1 and 999")]
    InvalidSegment(u32),

    #[error("Invalid stable id {0:?}: expected 8-12 alphanumeric characters")]
    InvalidSid(String),

    #[error("Invalid document type {0:?}: expected lowercase ASCII letters")]
    InvalidDocType(String),

    #[error("Invalid filename {name:?}: {reason}")]
    InvalidFilename { name: String, reason: String },

    #[error("Invalid slug {0:?}: contains a path separator or control character")]
    InvalidSlug(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node {0} has children; delete recursively or promote them")]
    HasChildren(String),

    #[error("Cannot allocate a position under {parent}: {source}")]
    Allocation {
        parent: String,
        #[source]
        source: AllocError,
    },

    #[error("Could not generate an unused stable id after {0} attempts")]
    SidExhausted(usize),

    #[error("Project is locked by another process")]
    Locked,

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Plan conflict: {0}")]
    PlanConflict(String),

    #[error("{0} is not valid UTF-8 text")]
    Encoding(String),

    #[error("Front matter error: {0}")]
    Frontmatter(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BinderError {
    pub(crate) fn allocation(parent: impl Into<String>, source: AllocError) -> Self {
        BinderError::Allocation {
            parent: parent.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BinderError>;
