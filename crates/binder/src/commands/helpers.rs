use crate::allocator::{next_sibling_number, sibling_number_before, sibling_number_directly_after};
use crate::error::{BinderError, Result};
use crate::filename::generate_filename;
use crate::model::Node;
use crate::outline::Outline;
use crate::path::MaterializedPath;
use crate::project::Project;
use crate::selector::Selector;
use crate::store::lock::LockGuard;
use crate::store::FileOp;

/// Where a node goes, relative to existing nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Root,
    ChildOf(Selector),
    SiblingOf(Selector),
    /// Parent comes from the position target, or the top level without one.
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Before(Selector),
    After(Selector),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub anchor: Anchor,
    pub position: Option<Position>,
}

impl Placement {
    pub fn root() -> Self {
        Self {
            anchor: Anchor::Root,
            position: None,
        }
    }

    pub fn child_of(selector: Selector) -> Self {
        Self {
            anchor: Anchor::ChildOf(selector),
            position: None,
        }
    }

    pub fn sibling_of(selector: Selector) -> Self {
        Self {
            anchor: Anchor::SiblingOf(selector),
            position: None,
        }
    }

    pub fn before(selector: Selector) -> Self {
        Self {
            anchor: Anchor::Unspecified,
            position: Some(Position::Before(selector)),
        }
    }

    pub fn after(selector: Selector) -> Self {
        Self {
            anchor: Anchor::Unspecified,
            position: Some(Position::After(selector)),
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// A resolved placement: the parent and, optionally, the sibling to sit next to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub parent: Option<MaterializedPath>,
    pub reference: Option<(Side, MaterializedPath)>,
}

pub fn lock_if(project: &Project, apply: bool) -> Result<Option<LockGuard<'_>>> {
    if apply {
        project.lock().map(Some)
    } else {
        Ok(None)
    }
}

pub fn resolve<'o>(outline: &'o Outline, selector: &Selector) -> Result<&'o Node> {
    outline
        .resolve(selector)
        .ok_or_else(|| BinderError::NodeNotFound(selector.to_string()))
}

pub fn parent_label(parent: Option<&MaterializedPath>) -> String {
    match parent {
        Some(mp) => mp.to_string(),
        None => "the top level".to_string(),
    }
}

pub fn resolve_placement(outline: &Outline, placement: &Placement) -> Result<Slot> {
    let mut reference = None;
    let parent = match &placement.anchor {
        Anchor::Root => None,
        Anchor::ChildOf(sel) => Some(resolve(outline, sel)?.mp.clone()),
        Anchor::SiblingOf(sel) => {
            let node = resolve(outline, sel)?;
            reference = Some((Side::After, node.mp.clone()));
            node.mp.parent()
        }
        Anchor::Unspecified => match &placement.position {
            Some(Position::Before(sel) | Position::After(sel)) => resolve(outline, sel)?.mp.parent(),
            None => None,
        },
    };

    if let Some(position) = &placement.position {
        let (side, sel) = match position {
            Position::Before(sel) => (Side::Before, sel),
            Position::After(sel) => (Side::After, sel),
        };
        let target = resolve(outline, sel)?;
        if target.mp.parent() != parent {
            return Err(BinderError::InvalidPlacement(format!(
                "{} is not a child of {}",
                sel,
                parent_label(parent.as_ref())
            )));
        }
        reference = Some((side, target.mp.clone()));
    }

    Ok(Slot { parent, reference })
}

/// Picks a free path in `slot`, ignoring the sibling number `vacating`.
pub fn allocate(outline: &Outline, slot: &Slot, vacating: Option<u16>) -> Result<MaterializedPath> {
    let occupied: Vec<u16> = outline
        .occupied_numbers(slot.parent.as_ref())
        .into_iter()
        .filter(|n| Some(*n) != vacating)
        .collect();

    let number = match &slot.reference {
        None => next_sibling_number(&occupied),
        Some((Side::Before, mp)) => sibling_number_before(&occupied, mp.last()),
        Some((Side::After, mp)) => sibling_number_directly_after(&occupied, mp.last()),
    }
    .map_err(|e| BinderError::allocation(parent_label(slot.parent.as_ref()), e))?;

    child_path(slot.parent.as_ref(), number)
}

pub fn child_path(parent: Option<&MaterializedPath>, number: u16) -> Result<MaterializedPath> {
    match parent {
        Some(mp) => mp.child(u32::from(number)),
        None => MaterializedPath::root(number),
    }
}

/// Renames every file of the subtree at `from` so it lives at `to`.
///
/// Returns the plan and the relocated nodes. SIDs, document types and slugs
/// are untouched; only the path prefix changes.
pub fn relocate(
    outline: &Outline,
    from: &MaterializedPath,
    to: &MaterializedPath,
) -> Result<(Vec<FileOp>, Vec<Node>)> {
    let mut ops = Vec::new();
    let mut moved = Vec::new();
    for node in outline.subtree(from) {
        let new_mp = node.mp.rebase(from, to).ok_or_else(|| {
            BinderError::InvalidMove(format!("{} cannot be rebased onto {}", node.mp, to))
        })?;
        if new_mp == node.mp {
            continue;
        }
        for doc in &node.documents {
            ops.push(FileOp::Rename {
                from: node.filename(doc)?,
                to: generate_filename(&new_mp, &node.sid, &doc.doc_type, &doc.slug)?,
            });
        }
        let mut relocated = node.clone();
        relocated.mp = new_mp;
        moved.push(relocated);
    }
    Ok((ops, moved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filename::parse_filename;
    use crate::outline::build_outline;

    fn outline(names: &[&str]) -> Outline {
        let records: Vec<_> = names.iter().map(|n| parse_filename(n).unwrap()).collect();
        build_outline(&records).0
    }

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    fn sample() -> Outline {
        outline(&[
            "100_aaaa1111_draft_one.md",
            "100-100_bbbb2222_draft_one-a.md",
            "100-200_cccc3333_draft_one-b.md",
            "200_dddd4444_draft_two.md",
        ])
    }

    #[test]
    fn test_resolve_missing_node() {
        let err = resolve(&sample(), &sel("900")).unwrap_err();
        assert!(matches!(err, BinderError::NodeNotFound(s) if s == "900"));
    }

    #[test]
    fn test_placements() {
        let o = sample();
        let slot = resolve_placement(&o, &Placement::root()).unwrap();
        assert_eq!(allocate(&o, &slot, None).unwrap().to_string(), "300");

        let slot = resolve_placement(&o, &Placement::child_of(sel("100"))).unwrap();
        assert_eq!(allocate(&o, &slot, None).unwrap().to_string(), "100-300");

        let slot = resolve_placement(&o, &Placement::sibling_of(sel("100-100"))).unwrap();
        assert_eq!(allocate(&o, &slot, None).unwrap().to_string(), "100-110");

        let slot = resolve_placement(&o, &Placement::before(sel("bbbb2222"))).unwrap();
        assert_eq!(allocate(&o, &slot, None).unwrap().to_string(), "100-010");

        let slot = resolve_placement(&o, &Placement::after(sel("200"))).unwrap();
        assert_eq!(allocate(&o, &slot, None).unwrap().to_string(), "300");
    }

    #[test]
    fn test_position_must_share_parent() {
        let o = sample();
        let placement = Placement::child_of(sel("100")).with_position(Position::Before(sel("200")));
        assert!(matches!(
            resolve_placement(&o, &placement),
            Err(BinderError::InvalidPlacement(_))
        ));

        let placement =
            Placement::child_of(sel("100")).with_position(Position::After(sel("100-100")));
        let slot = resolve_placement(&o, &placement).unwrap();
        assert_eq!(allocate(&o, &slot, None).unwrap().to_string(), "100-110");
    }

    #[test]
    fn test_allocate_ignores_vacating_number() {
        let o = sample();
        let slot = Slot {
            parent: None,
            reference: Some((Side::Before, MaterializedPath::parse("100").unwrap())),
        };
        assert_eq!(allocate(&o, &slot, Some(200)).unwrap().to_string(), "010");
        let slot = Slot {
            parent: None,
            reference: None,
        };
        assert_eq!(allocate(&o, &slot, Some(200)).unwrap().to_string(), "200");
    }

    #[test]
    fn test_relocate_subtree() {
        let o = sample();
        let from = MaterializedPath::parse("100").unwrap();
        let to = MaterializedPath::parse("200-100").unwrap();
        let (ops, moved) = relocate(&o, &from, &to).unwrap();
        assert_eq!(moved.len(), 3);
        assert_eq!(
            ops[1],
            FileOp::Rename {
                from: "100-100_bbbb2222_draft_one-a.md".to_string(),
                to: "200-100-100_bbbb2222_draft_one-a.md".to_string(),
            }
        );
    }
}
