//! # Command Layer
//!
//! Each operation on a project lives in its own submodule as a plain function
//! taking a [`Project`](crate::project::Project) and typed arguments.
//!
//! ## Shape Of A Mutation
//!
//! Every mutation runs the same sequence:
//!
//! 1. **Resolve**: load the outline, turn selectors into nodes.
//! 2. **Validate**: reject impossible requests before touching anything.
//! 3. **Compute**: allocate numbers and build an ordered list of [`FileOp`]s.
//! 4. **Apply** (only when `apply` is true): perform the plan.
//!
//! Steps 1-3 are pure with respect to the directory. With `apply = true` the
//! project lock is held from step 1 to the end of step 4, and a failure before
//! step 4 leaves the directory untouched. With `apply = false` the lock is not
//! taken and the planned operations are returned as-is.
//!
//! ## Structured Returns
//!
//! Commands return [`CmdResult`], never strings. Callers decide how to render
//! the affected nodes, the plan and the messages.
//!
//! ## Command Modules
//!
//! - [`add`]: create a node
//! - [`delete`]: remove a node, its subtree, or promote its children
//! - [`move_node`]: re-parent or reorder a subtree
//! - [`rename`]: change a node's title and slugs
//! - [`compact`]: renumber siblings back to 100-spacing
//! - [`doctor`]: check and repair consistency
//! - [`list`]: the outline as a tree
//! - [`helpers`]: selector resolution and shared planning

use crate::check::Repair;
use crate::model::{Finding, Node, Sid};
use crate::outline::OutlineEntry;
use crate::store::FileOp;
use serde::Serialize;

pub mod add;
pub mod compact;
pub mod delete;
pub mod doctor;
pub mod helpers;
pub mod list;
pub mod move_node;
pub mod rename;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CmdResult {
    /// Nodes as they are (or would be) after the operation.
    pub affected_nodes: Vec<Node>,
    pub listed_nodes: Vec<OutlineEntry>,
    /// The plan, in application order.
    pub operations: Vec<FileOp>,
    pub findings: Vec<Finding>,
    pub repairs: Vec<Repair>,
    pub unrepaired: Vec<Finding>,
    /// SIDs that no longer have files after a delete.
    pub removed_sids: Vec<Sid>,
    /// False for a dry run.
    pub applied: bool,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.affected_nodes = nodes;
        self
    }

    pub fn with_listed_nodes(mut self, nodes: Vec<OutlineEntry>) -> Self {
        self.listed_nodes = nodes;
        self
    }

    pub fn with_operations(mut self, operations: Vec<FileOp>) -> Self {
        self.operations = operations;
        self
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Warning)
    }
}
