//! # binder
//!
//! An outline engine for long-form writing projects kept as a flat directory
//! of Markdown files. There is no index: every file name encodes where its
//! node sits in the tree, and the tree is rebuilt from the listing on each
//! load.
//!
//! ```text
//! 100-200_k3j9x0a2mq_draft_the-long-night.md
//! └─┬───┘ └───┬────┘ └─┬─┘ └──────┬─────┘
//!   path     SID     type       slug
//! ```
//!
//! - The **path** (materialized path) is a `-`-joined list of three-digit
//!   sibling numbers. Sorting paths as strings yields tree pre-order.
//! - The **SID** is a stable id that survives moves and renames.
//! - The **type** tells a node's documents apart (`draft`, `notes`, ...).
//! - The **slug** is derived from the node's title.
//!
//! ## Layers
//!
//! - Pure core: [`path`], [`selector`], [`filename`], [`allocator`], [`outline`],
//!   [`slug`], [`frontmatter`].
//! - Collaborators: [`store`] (file access, lock, SID reservations).
//! - [`project::Project`] bundles one directory's collaborators.
//! - [`check`] finds and plans fixes for inconsistencies.
//! - [`commands`] implements add, delete, move, rename, compact, list and doctor.
//! - [`api::BinderApi`] takes raw strings and dispatches to commands.
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod allocator;
pub mod api;
pub mod check;
pub mod commands;
pub mod config;
pub mod error;
pub mod filename;
pub mod frontmatter;
pub mod model;
pub mod outline;
pub mod path;
pub mod project;
pub mod selector;
pub mod slug;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use api::{BinderApi, PlacementArgs};
pub use commands::delete::DeleteMode;
pub use error::{AllocError, BinderError, Result};
pub use path::MaterializedPath;
pub use project::Project;
pub use selector::Selector;
