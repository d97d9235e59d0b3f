//! # Outline Reconstruction
//!
//! There is no index file. The outline is rebuilt from the directory listing on
//! every load:
//!
//! 1. Each filename is decoded by [`crate::filename::parse_filename`].
//! 2. Records are grouped by SID, in the order they were first seen.
//! 3. A group's path is the path of its first file. Any later file with the
//!    same SID but a different path is reported as a `duplicate_sid` finding and
//!    left out of the node (its name could not be regenerated from the node).
//! 4. Documents are sorted by type, and the title comes from the draft's slug.
//! 5. Nodes are sorted by path, which is also tree pre-order.
//!
//! Records already carry a validated [`MaterializedPath`], so a structurally
//! invalid path can never reach the builder; the only anomalies it reports are
//! findings.

use crate::filename::ParsedFilename;
use crate::model::{title_from_slug, DocType, Document, Finding, FindingKind, Node, Severity, Sid};
use crate::path::MaterializedPath;
use crate::selector::{Selector, Target};
use serde::Serialize;
use std::collections::HashMap;

/// All nodes of a project, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    nodes: Vec<Node>,
}

/// A node with its children, for tree-shaped views.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineEntry {
    pub node: Node,
    pub children: Vec<OutlineEntry>,
}

impl Outline {
    pub fn from_nodes(mut nodes: Vec<Node>) -> Self {
        nodes.sort_by(|a, b| a.mp.cmp(&b.mp));
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn find_by_path(&self, mp: &MaterializedPath) -> Option<&Node> {
        self.nodes
            .binary_search_by(|n| n.mp.cmp(mp))
            .ok()
            .map(|i| &self.nodes[i])
    }

    pub fn find_by_sid(&self, sid: &Sid) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.sid == sid)
    }

    pub fn resolve(&self, selector: &Selector) -> Option<&Node> {
        match &selector.target {
            Target::Path(mp) => self.find_by_path(mp),
            Target::Sid(sid) => self.find_by_sid(sid),
        }
    }

    pub fn contains_sid(&self, sid: &Sid) -> bool {
        self.find_by_sid(sid).is_some()
    }

    /// Direct children of `parent` (`None` for the top level), in order.
    pub fn children_of(&self, parent: Option<&MaterializedPath>) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.mp.parent().as_ref() == parent)
            .collect()
    }

    /// Sibling numbers in use under `parent`.
    pub fn occupied_numbers(&self, parent: Option<&MaterializedPath>) -> Vec<u16> {
        self.children_of(parent).iter().map(|n| n.mp.last()).collect()
    }

    /// Strict descendants of `mp`, in pre-order.
    pub fn descendants_of(&self, mp: &MaterializedPath) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| mp.is_ancestor_of(&n.mp))
            .collect()
    }

    /// `mp` itself (if present) followed by its descendants.
    pub fn subtree(&self, mp: &MaterializedPath) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| &n.mp == mp || mp.is_ancestor_of(&n.mp))
            .collect()
    }

    pub fn has_children(&self, mp: &MaterializedPath) -> bool {
        self.nodes.iter().any(|n| mp.is_ancestor_of(&n.mp))
    }

    /// Nests the flat list into a tree.
    ///
    /// A node whose parent path has no node of its own is attached to its
    /// nearest existing ancestor, or to the top level.
    pub fn tree(&self) -> Vec<OutlineEntry> {
        let mut roots: Vec<OutlineEntry> = Vec::new();
        for node in &self.nodes {
            insert_entry(&mut roots, node.clone());
        }
        roots
    }
}

fn insert_entry(level: &mut Vec<OutlineEntry>, node: Node) {
    // Pre-order input means the only possible ancestor is the last entry.
    if let Some(last) = level.last_mut() {
        if last.node.mp.is_ancestor_of(&node.mp) {
            insert_entry(&mut last.children, node);
            return;
        }
    }
    level.push(OutlineEntry {
        node,
        children: Vec::new(),
    });
}

struct Group {
    mp: MaterializedPath,
    sid: Sid,
    documents: Vec<Document>,
}

/// Rebuilds the outline from parsed filenames.
pub fn build_outline(files: &[ParsedFilename]) -> (Outline, Vec<Finding>) {
    let mut groups: Vec<Group> = Vec::new();
    let mut by_sid: HashMap<Sid, usize> = HashMap::new();
    let mut findings = Vec::new();

    for file in files {
        match by_sid.get(&file.sid) {
            Some(&idx) => {
                let group = &mut groups[idx];
                if group.mp != file.mp {
                    let name = file.filename().unwrap_or_else(|_| file.sid.to_string());
                    findings.push(Finding::new(
                        FindingKind::DuplicateSid,
                        Severity::Warning,
                        format!(
                            "SID {} is used at {} and {}; keeping {}",
                            file.sid, group.mp, file.mp, group.mp
                        ),
                        name,
                    ));
                    continue;
                }
                group.documents.push(Document {
                    doc_type: file.doc_type.clone(),
                    slug: file.slug.clone(),
                });
            }
            None => {
                by_sid.insert(file.sid.clone(), groups.len());
                groups.push(Group {
                    mp: file.mp.clone(),
                    sid: file.sid.clone(),
                    documents: vec![Document {
                        doc_type: file.doc_type.clone(),
                        slug: file.slug.clone(),
                    }],
                });
            }
        }
    }

    let nodes = groups
        .into_iter()
        .map(|mut group| {
            group
                .documents
                .sort_by(|a, b| a.doc_type.cmp(&b.doc_type).then_with(|| a.slug.cmp(&b.slug)));
            let title = group
                .documents
                .iter()
                .find(|d| d.doc_type.as_str() == DocType::DRAFT)
                .map(|d| title_from_slug(&d.slug))
                .unwrap_or_default();
            Node {
                mp: group.mp,
                sid: group.sid,
                title,
                documents: group.documents,
            }
        })
        .collect();

    (Outline::from_nodes(nodes), findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filename::parse_filename;

    fn parse_all(names: &[&str]) -> Vec<ParsedFilename> {
        names.iter().map(|n| parse_filename(n).unwrap()).collect()
    }

    fn mp(s: &str) -> MaterializedPath {
        MaterializedPath::parse(s).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let (outline, findings) = build_outline(&[]);
        assert!(outline.is_empty());
        assert!(findings.is_empty());
        assert!(outline.tree().is_empty());
    }

    #[test]
    fn test_groups_documents_and_sorts_by_path() {
        let files = parse_all(&[
            "200_bbbbbbbb_notes.md",
            "100-100_cccccccc_draft_chapter-one.md",
            "100_aaaaaaaa_draft_part-one.md",
            "200_bbbbbbbb_draft_part-two.md",
            "100_aaaaaaaa_notes.md",
        ]);
        let (outline, findings) = build_outline(&files);
        assert!(findings.is_empty());

        let paths: Vec<String> = outline.iter().map(|n| n.mp.to_string()).collect();
        assert_eq!(paths, vec!["100", "100-100", "200"]);

        let part_two = outline.find_by_path(&mp("200")).unwrap();
        assert_eq!(part_two.title, "part two");
        let types: Vec<&str> = part_two.documents.iter().map(|d| d.doc_type.as_str()).collect();
        assert_eq!(types, vec!["draft", "notes"]);
    }

    #[test]
    fn test_title_empty_without_draft() {
        let (outline, _) = build_outline(&parse_all(&["100_aaaaaaaa_notes_ideas.md"]));
        assert_eq!(outline.nodes()[0].title, "");
    }

    #[test]
    fn test_duplicate_sid_keeps_first_path() {
        let files = parse_all(&[
            "300_aaaaaaaa_draft_first.md",
            "100_aaaaaaaa_draft_second.md",
        ]);
        let (outline, findings) = build_outline(&files);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DuplicateSid);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].path, "100_aaaaaaaa_draft_second.md");

        assert_eq!(outline.len(), 1);
        let node = &outline.nodes()[0];
        assert_eq!(node.mp, mp("300"));
        assert_eq!(node.documents.len(), 1);
    }

    #[test]
    fn test_structural_queries() {
        let files = parse_all(&[
            "100_aaaaaaaa_draft.md",
            "100-100_bbbbbbbb_draft.md",
            "100-100-500_cccccccc_draft.md",
            "100-200_dddddddd_draft.md",
            "200_eeeeeeee_draft.md",
        ]);
        let (outline, _) = build_outline(&files);

        assert_eq!(outline.occupied_numbers(None), vec![100, 200]);
        assert_eq!(outline.occupied_numbers(Some(&mp("100"))), vec![100, 200]);
        assert_eq!(outline.descendants_of(&mp("100")).len(), 3);
        assert_eq!(outline.subtree(&mp("100-100")).len(), 2);
        assert!(outline.has_children(&mp("100-100")));
        assert!(!outline.has_children(&mp("200")));

        let sel = Selector::parse("cccccccc").unwrap();
        assert_eq!(outline.resolve(&sel).unwrap().mp, mp("100-100-500"));
    }

    #[test]
    fn test_tree_nests_in_preorder() {
        let files = parse_all(&[
            "100_aaaaaaaa_draft.md",
            "100-100_bbbbbbbb_draft.md",
            "100-100-500_cccccccc_draft.md",
            "100-200_dddddddd_draft.md",
            "200_eeeeeeee_draft.md",
            // Parent 300 has no node; attach to the top level.
            "300-100_ffffffff_draft.md",
        ]);
        let (outline, _) = build_outline(&files);
        let tree = outline.tree();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children.len(), 1);
        assert_eq!(tree[2].node.mp, mp("300-100"));
    }
}
