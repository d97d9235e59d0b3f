use super::helpers::{allocate, lock_if, resolve_placement, Placement};
use super::{CmdMessage, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::{DocType, Document, Node, Sid};
use crate::project::Project;
use crate::store::FileOp;
use std::collections::HashSet;
use tracing::info;

/// Creates a node with a draft and a notes document.
///
/// The SID is reserved before any file is written, so a crash in between
/// leaves an orphaned reservation rather than an unreserved node.
pub fn run(project: &Project, title: &str, placement: &Placement, apply: bool) -> Result<CmdResult> {
    let title = title.trim();
    let slug = project.slugifier().slugify(title);
    if slug.is_empty() {
        return Err(BinderError::InvalidTitle(format!(
            "{:?} has no characters usable in a filename",
            title
        )));
    }

    let _guard = lock_if(project, apply)?;
    let snapshot = project.load()?;
    let outline = &snapshot.outline;

    let slot = resolve_placement(outline, placement)?;
    let mp = allocate(outline, &slot, None)?;
    let taken: HashSet<Sid> = snapshot.records.iter().map(|r| r.sid.clone()).collect();
    let sid = project.reserver().generate_excluding(&taken)?;

    let node = Node {
        mp,
        sid,
        title: title.to_string(),
        documents: vec![
            Document {
                doc_type: DocType::draft(),
                slug,
            },
            Document {
                doc_type: DocType::notes(),
                slug: String::new(),
            },
        ],
    };

    let content = project.document_content(title, "")?;
    let ops = node
        .filenames()?
        .into_iter()
        .map(|name| FileOp::Write {
            name,
            content: content.clone(),
        })
        .collect::<Vec<_>>();

    let mut result = CmdResult::default();
    if apply {
        project.verify_plan(&ops)?;
        project.reserver().reserve(&node.sid)?;
        project.apply(&ops)?;
        info!(mp = %node.mp, sid = %node.sid, "added node");
        result.add_message(CmdMessage::success(format!(
            "Added {:?} at {}",
            node.title, node.mp
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Would add {:?} at {}",
            node.title, node.mp
        )));
    }
    result.applied = apply;
    Ok(result.with_affected_nodes(vec![node]).with_operations(ops))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use crate::store::lock::{Locker, MemLocker};
    use crate::store::mem_backend::MemBackend;
    use crate::store::reserve::{IdReserver, MemReserver};
    use crate::store::Reader;

    fn setup() -> (Project, MemBackend, MemReserver, MemLocker) {
        let backend = MemBackend::new();
        let reserver = MemReserver::new();
        let locker = MemLocker::new();
        let project = Project::new(backend.clone(), locker.clone(), reserver.clone());
        (project, backend, reserver, locker)
    }

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn test_add_first_node() {
        let (project, backend, reserver, locker) = setup();
        let result = run(&project, "Part One", &Placement::root(), true).unwrap();

        let node = &result.affected_nodes[0];
        assert_eq!(node.mp.to_string(), "100");
        assert!(result.applied);
        assert!(!locker.is_held());
        assert_eq!(reserver.reserved().unwrap(), vec![node.sid.clone()]);

        let files = backend.list_files().unwrap();
        assert_eq!(
            files,
            vec![
                format!("100_{}_draft_part-one.md", node.sid),
                format!("100_{}_notes.md", node.sid),
            ]
        );
        let draft = backend.read_file(&files[0]).unwrap().unwrap();
        assert!(draft.starts_with("---\ntitle: Part One\n---\n"));
    }

    #[test]
    fn test_add_child_and_before() {
        let (project, _, _, _) = setup();
        run(&project, "Part One", &Placement::root(), true).unwrap();
        run(&project, "Arrival", &Placement::child_of(sel("100")), true).unwrap();
        let result = run(&project, "Prologue", &Placement::before(sel("100")), true).unwrap();
        assert_eq!(result.affected_nodes[0].mp.to_string(), "010");

        let result = run(&project, "Departure", &Placement::sibling_of(sel("100-100")), true).unwrap();
        assert_eq!(result.affected_nodes[0].mp.to_string(), "100-200");

        let outline = project.load_outline().unwrap();
        let paths: Vec<String> = outline.iter().map(|n| n.mp.to_string()).collect();
        assert_eq!(paths, vec!["010", "100", "100-100", "100-200"]);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (project, backend, reserver, locker) = setup();
        let held = locker.clone();
        held.try_lock().unwrap();

        let result = run(&project, "Part One", &Placement::root(), false).unwrap();
        assert!(!result.applied);
        assert_eq!(result.operations.len(), 2);
        assert!(backend.list_files().unwrap().is_empty());
        assert!(reserver.reserved().unwrap().is_empty());
    }

    #[test]
    fn test_add_fails_when_locked() {
        let (project, backend, _, locker) = setup();
        let held = locker.clone();
        held.try_lock().unwrap();
        assert!(matches!(
            run(&project, "Part One", &Placement::root(), true),
            Err(BinderError::Locked)
        ));
        assert!(backend.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_unusable_title() {
        let (project, _, _, _) = setup();
        assert!(matches!(
            run(&project, " ?! ", &Placement::root(), true),
            Err(BinderError::InvalidTitle(_))
        ));
    }

    #[test]
    fn test_add_under_missing_parent() {
        let (project, backend, _, _) = setup();
        assert!(matches!(
            run(&project, "Arrival", &Placement::child_of(sel("300")), true),
            Err(BinderError::NodeNotFound(_))
        ));
        assert!(backend.list_files().unwrap().is_empty());
    }
}
