use super::helpers::{allocate, lock_if, relocate, resolve, resolve_placement, Anchor, Placement, Position};
use super::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::outline::Outline;
use crate::path::MaterializedPath;
use crate::project::Project;
use crate::selector::Selector;
use tracing::info;

/// Moves a node and its whole subtree to a new place.
///
/// Every descendant keeps its SID, documents and position relative to the
/// moved node; only the path prefix of its files changes. When the node stays
/// under the same parent its own number is treated as free, so reordering
/// never collides with itself.
pub fn run(project: &Project, source: &Selector, placement: &Placement, apply: bool) -> Result<CmdResult> {
    let _guard = lock_if(project, apply)?;
    let outline = project.load_outline()?;
    let node = resolve(&outline, source)?;

    for target in placement_targets(placement) {
        reject_inside(&outline, &node.mp, target)?;
    }

    let slot = resolve_placement(&outline, placement)?;
    let vacating = (slot.parent == node.mp.parent()).then(|| node.mp.last());
    let new_mp = allocate(&outline, &slot, vacating)?;

    let mut result = CmdResult::default();
    result.applied = apply;
    if new_mp == node.mp {
        result.add_message(CmdMessage::info(format!("{} is already in place", node.mp)));
        return Ok(result.with_affected_nodes(vec![node.clone()]));
    }

    let (ops, moved) = relocate(&outline, &node.mp, &new_mp)?;
    if apply {
        project.apply(&ops)?;
        info!(from = %node.mp, to = %new_mp, files = ops.len(), "moved node");
        result.add_message(CmdMessage::success(format!(
            "Moved {} to {}",
            node.mp, new_mp
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Would move {} to {} ({} files)",
            node.mp,
            new_mp,
            ops.len()
        )));
    }
    Ok(result.with_affected_nodes(moved).with_operations(ops))
}

fn placement_targets(placement: &Placement) -> Vec<&Selector> {
    let mut targets = Vec::new();
    match &placement.anchor {
        Anchor::ChildOf(sel) | Anchor::SiblingOf(sel) => targets.push(sel),
        Anchor::Root | Anchor::Unspecified => {}
    }
    match &placement.position {
        Some(Position::Before(sel) | Position::After(sel)) => targets.push(sel),
        None => {}
    }
    targets
}

/// A node cannot be placed relative to itself or anything beneath it.
fn reject_inside(outline: &Outline, moving: &MaterializedPath, target: &Selector) -> Result<()> {
    let node = resolve(outline, target)?;
    if &node.mp == moving || moving.is_ancestor_of(&node.mp) {
        return Err(BinderError::InvalidMove(format!(
            "{} is inside the subtree being moved ({})",
            target, moving
        )));
    }
    Ok(())
}
