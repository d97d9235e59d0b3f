use super::helpers::{child_path, lock_if, parent_label, resolve};
use super::{CmdMessage, CmdResult};
use crate::allocator::compact_numbers;
use crate::error::{BinderError, Result};
use crate::filename::generate_filename;
use crate::model::Node;
use crate::outline::OutlineEntry;
use crate::path::MaterializedPath;
use crate::project::Project;
use crate::selector::Selector;
use crate::store::FileOp;
use tracing::{info, warn};

/// Renumbers sibling sets back to 100, 200, 300...
///
/// With a selector, every level below that node is compacted and the node
/// itself keeps its number. Without one, the whole outline is. A node whose
/// parent path has no node of its own is renumbered under its nearest existing
/// ancestor.
pub fn run(project: &Project, selector: Option<&Selector>, apply: bool) -> Result<CmdResult> {
    let _guard = lock_if(project, apply)?;
    let outline = project.load_outline()?;
    let tree = outline.tree();

    let mut moves: Vec<(&Node, MaterializedPath)> = Vec::new();
    match selector {
        Some(sel) => {
            let node = resolve(&outline, sel)?;
            let entry = find_entry(&tree, &node.mp).ok_or_else(|| BinderError::NodeNotFound(sel.to_string()))?;
            renumber(&entry.children, Some(&node.mp), &mut moves)?;
        }
        None => renumber(&tree, None, &mut moves)?,
    }

    let mut ops = Vec::new();
    let mut affected = Vec::new();
    for (node, new_mp) in moves {
        if new_mp == node.mp {
            continue;
        }
        for doc in &node.documents {
            ops.push(FileOp::Rename {
                from: node.filename(doc)?,
                to: generate_filename(&new_mp, &node.sid, &doc.doc_type, &doc.slug)?,
            });
        }
        let mut moved = node.clone();
        moved.mp = new_mp;
        affected.push(moved);
    }

    let mut result = CmdResult::default();
    result.applied = apply;
    let threshold = project.config().compact_warn_threshold;
    if ops.len() > threshold {
        warn!(files = ops.len(), threshold, "large compaction");
        result.add_message(CmdMessage::warning(format!(
            "Compaction renames {} files (more than {}); review it with a dry run first",
            ops.len(),
            threshold
        )));
    }

    if ops.is_empty() {
        result.add_message(CmdMessage::info("Nothing to compact"));
    } else if apply {
        project.apply(&ops)?;
        info!(nodes = affected.len(), files = ops.len(), "compacted outline");
        result.add_message(CmdMessage::success(format!(
            "Compacted {} nodes ({} files)",
            affected.len(),
            ops.len()
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Would compact {} nodes ({} files)",
            affected.len(),
            ops.len()
        )));
    }
    Ok(result.with_affected_nodes(affected).with_operations(ops))
}

fn find_entry<'t>(entries: &'t [OutlineEntry], mp: &MaterializedPath) -> Option<&'t OutlineEntry> {
    for entry in entries {
        if &entry.node.mp == mp {
            return Some(entry);
        }
        if entry.node.mp.is_ancestor_of(mp) {
            return find_entry(&entry.children, mp);
        }
    }
    None
}

/// Assigns compacted paths to `entries` (children of `new_parent`) and below.
fn renumber<'t>(
    entries: &'t [OutlineEntry],
    new_parent: Option<&MaterializedPath>,
    moves: &mut Vec<(&'t Node, MaterializedPath)>,
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let numbers = compact_numbers(entries.len())
        .map_err(|e| BinderError::allocation(parent_label(new_parent), e))?;
    for (entry, number) in entries.iter().zip(numbers) {
        let new_mp = child_path(new_parent, number)?;
        moves.push((&entry.node, new_mp.clone()));
        renumber(&entry.children, Some(&new_mp), moves)?;
    }
    Ok(())
}
