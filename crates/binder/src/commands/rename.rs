use super::helpers::{lock_if, resolve};
use super::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::filename::generate_filename;
use crate::project::Project;
use crate::selector::Selector;
use crate::store::FileOp;
use tracing::{info, warn};

/// Retitles a node.
///
/// The draft and every other slugged document are renamed to the new slug;
/// path, SID and document types stay as they are. The draft's front matter
/// title is rewritten, as is the title of any other document that already has
/// one. A document whose front matter cannot be parsed keeps its content.
pub fn run(project: &Project, selector: &Selector, new_title: &str, apply: bool) -> Result<CmdResult> {
    let title = new_title.trim();
    let slug = project.slugifier().slugify(title);
    if slug.is_empty() {
        return Err(BinderError::InvalidTitle(format!(
            "{:?} has no characters usable in a filename",
            title
        )));
    }

    let _guard = lock_if(project, apply)?;
    let outline = project.load_outline()?;
    let node = resolve(&outline, selector)?;

    let mut renamed = node.clone();
    renamed.title = title.to_string();

    let mut ops = Vec::new();
    for (doc, updated) in node.documents.iter().zip(renamed.documents.iter_mut()) {
        let old_name = node.filename(doc)?;
        let new_name = if doc.doc_type.is_draft() || !doc.slug.is_empty() {
            updated.slug = slug.clone();
            generate_filename(&node.mp, &node.sid, &doc.doc_type, &slug)?
        } else {
            old_name.clone()
        };
        if new_name != old_name {
            ops.push(FileOp::Rename {
                from: old_name.clone(),
                to: new_name.clone(),
            });
        }

        let raw = match project.read(&old_name) {
            Ok(raw) => raw,
            Err(BinderError::Encoding(_)) => {
                warn!(file = %old_name, "leaving non-UTF-8 document as is");
                continue;
            }
            Err(e) => return Err(e),
        };
        let mut header = match project.frontmatter().parse(&raw) {
            Ok(header) => header,
            Err(e) => {
                warn!(file = %old_name, error = %e, "leaving unreadable front matter as is");
                continue;
            }
        };
        if !doc.doc_type.is_draft() && !header.has_title() {
            continue;
        }
        header.set_title(title);
        let content = project.frontmatter().serialize(&header)?;
        if content != raw {
            ops.push(FileOp::Write {
                name: new_name,
                content,
            });
        }
    }

    let mut result = CmdResult::default();
    result.applied = apply;
    if ops.is_empty() {
        result.add_message(CmdMessage::info(format!("{} is already titled {:?}", node.mp, title)));
    } else if apply {
        project.apply(&ops)?;
        info!(mp = %node.mp, %slug, "renamed node");
        result.add_message(CmdMessage::success(format!(
            "Renamed {} to {:?}",
            node.mp, title
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Would rename {} to {:?}",
            node.mp, title
        )));
    }
    Ok(result.with_affected_nodes(vec![renamed]).with_operations(ops))
}
