use super::helpers::resolve;
use super::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::outline::Outline;
use crate::project::Project;
use crate::selector::Selector;

/// The outline as a tree, optionally limited to one node's subtree.
pub fn run(project: &Project, selector: Option<&Selector>) -> Result<CmdResult> {
    let outline = project.load_outline()?;
    let entries = match selector {
        Some(sel) => {
            let root = resolve(&outline, sel)?.mp.clone();
            let subtree = outline.subtree(&root).into_iter().cloned().collect();
            Outline::from_nodes(subtree).tree()
        }
        None => outline.tree(),
    };

    let mut result = CmdResult::default();
    if entries.is_empty() {
        result.add_message(CmdMessage::info("No nodes yet."));
    }
    Ok(result.with_listed_nodes(entries))
}
