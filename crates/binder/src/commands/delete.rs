//! Deleting nodes.
//!
//! - [`DeleteMode::Default`] refuses a node that has children.
//! - [`DeleteMode::Recursive`] removes the node and its whole subtree.
//! - [`DeleteMode::Promote`] removes the node and moves its children up one
//!   level. The first child takes the deleted node's number; each following
//!   child is allocated directly after the one before it, so sibling order is
//!   kept and the grandparent's other children never move. When there is no
//!   room left after the previous child, the rest are appended after the last
//!   sibling instead.
//!
//! Reservations of removed SIDs are released; promoted SIDs are untouched.

use super::helpers::{child_path, lock_if, parent_label, relocate, resolve};
use super::{CmdMessage, CmdResult};
use crate::allocator::{next_sibling_number, sibling_number_directly_after};
use crate::error::{AllocError, BinderError, Result};
use crate::model::{Node, Sid};
use crate::outline::Outline;
use crate::project::Project;
use crate::selector::Selector;
use crate::store::FileOp;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    #[default]
    Default,
    Recursive,
    Promote,
}

pub fn run(project: &Project, selector: &Selector, mode: DeleteMode, apply: bool) -> Result<CmdResult> {
    let _guard = lock_if(project, apply)?;
    let outline = project.load_outline()?;
    let node = resolve(&outline, selector)?;

    let (ops, removed, affected) = match mode {
        DeleteMode::Default => {
            if outline.has_children(&node.mp) {
                return Err(BinderError::HasChildren(node.mp.to_string()));
            }
            (delete_ops(&[node])?, vec![node.sid.clone()], vec![node.clone()])
        }
        DeleteMode::Recursive => {
            let subtree = outline.subtree(&node.mp);
            let removed = subtree.iter().map(|n| n.sid.clone()).collect();
            let affected = subtree.iter().map(|n| (*n).clone()).collect();
            (delete_ops(&subtree)?, removed, affected)
        }
        DeleteMode::Promote => {
            let mut ops = delete_ops(&[node])?;
            let (renames, promoted) = promote_children(&outline, node)?;
            ops.extend(renames);
            (ops, vec![node.sid.clone()], promoted)
        }
    };

    let mut result = CmdResult::default();
    if apply {
        project.apply(&ops)?;
        for sid in &removed {
            project.reserver().release(sid)?;
        }
        info!(mp = %node.mp, ?mode, removed = removed.len(), "deleted node");
        result.add_message(CmdMessage::success(describe(node, mode, &removed, false)));
    } else {
        result.add_message(CmdMessage::info(describe(node, mode, &removed, true)));
    }
    result.applied = apply;
    result.removed_sids = removed;
    Ok(result.with_affected_nodes(affected).with_operations(ops))
}

fn delete_ops(nodes: &[&Node]) -> Result<Vec<FileOp>> {
    let mut ops = Vec::new();
    for node in nodes {
        for name in node.filenames()? {
            ops.push(FileOp::Delete { name });
        }
    }
    Ok(ops)
}

fn promote_children(outline: &Outline, node: &Node) -> Result<(Vec<FileOp>, Vec<Node>)> {
    let grandparent = node.mp.parent();
    let mut occupied: Vec<u16> = outline
        .occupied_numbers(grandparent.as_ref())
        .into_iter()
        .filter(|n| *n != node.mp.last())
        .collect();

    let mut ops = Vec::new();
    let mut promoted = Vec::new();
    let mut previous: Option<u16> = None;
    for child in top_descendants(outline, node) {
        let number = match previous {
            None => node.mp.last(),
            Some(prev) => match sibling_number_directly_after(&occupied, prev) {
                Ok(number) => number,
                Err(AllocError::NoSlotAvailable { .. }) => {
                    let number = next_sibling_number(&occupied).map_err(|e| {
                        BinderError::allocation(parent_label(grandparent.as_ref()), e)
                    })?;
                    warn!(child = %child.mp, number, "no room after previous child, appending");
                    number
                }
                Err(e) => return Err(BinderError::allocation(parent_label(grandparent.as_ref()), e)),
            },
        };
        occupied.push(number);
        previous = Some(number);

        let target = child_path(grandparent.as_ref(), number)?;
        let (renames, moved) = relocate(outline, &child.mp, &target)?;
        ops.extend(renames);
        promoted.extend(moved);
    }
    Ok((ops, promoted))
}

/// Descendants of `node` with no other descendant above them.
///
/// Normally the direct children; a descendant whose own parent node is missing
/// is promoted along with them rather than left under a deleted path.
fn top_descendants<'o>(outline: &'o Outline, node: &Node) -> Vec<&'o Node> {
    let mut tops: Vec<&Node> = Vec::new();
    for candidate in outline.descendants_of(&node.mp) {
        if !tops.iter().any(|t| t.mp.is_ancestor_of(&candidate.mp)) {
            tops.push(candidate);
        }
    }
    tops
}

fn describe(node: &Node, mode: DeleteMode, removed: &[Sid], dry_run: bool) -> String {
    let verb = if dry_run { "Would delete" } else { "Deleted" };
    match mode {
        DeleteMode::Promote => format!("{} {} and promoted its children", verb, node.mp),
        _ if removed.len() > 1 => format!("{} {} and {} descendants", verb, node.mp, removed.len() - 1),
        _ => format!("{} {}", verb, node.mp),
    }
}
