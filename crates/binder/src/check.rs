//! # Consistency Checker
//!
//! The directory is the database, so anything can happen to it between runs:
//! a crash halfway through a rename set, a file edited by hand, a reservation
//! whose files were never written. [`inspect`] runs every detector over a fresh
//! load and plans a [`Repair`] for each finding it knows how to fix.
//!
//! | Finding | Severity | Repair |
//! |---|---|---|
//! | `invalid_filename` | error | none, needs a human |
//! | `duplicate_sid` | warning | none, needs a human |
//! | `slug_drift` | warning | rename to the slug of the current title |
//! | `missing_draft` | error | create it with the node title |
//! | `missing_notes` | warning | create it with the node title |
//! | `malformed_frontmatter` | error | rewrite the header, keep the body; none when the file is not UTF-8 |
//! | `orphaned_reservation` | warning | release the SID |
//!
//! A node's *current title* is the `title` of its draft's front matter, falling
//! back to the title recovered from the draft slug. Repairs derive every name
//! and header from that title, so a second inspection right after applying the
//! plan finds nothing.
//!
//! Outline SIDs missing from the reservation store get a `reserve` repair
//! without a finding of their own.
//!
//! Planned repairs are ordered renames first, then writes, then reservation
//! changes, so a rewrite always targets a file's final name.

use crate::error::{BinderError, Result};
use crate::filename::generate_filename;
use crate::frontmatter::Frontmatter;
use crate::model::{DocType, Document, Finding, FindingKind, Node, Severity, Sid};
use crate::outline::Outline;
use crate::project::Project;
use crate::store::FileOp;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Remedy {
    File(FileOp),
    Release(Sid),
    Reserve(Sid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    /// `None` for bookkeeping that fixes no reported finding.
    pub finding: Option<FindingKind>,
    pub remedy: Remedy,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct Inspection {
    pub outline: Outline,
    pub findings: Vec<Finding>,
    pub repairs: Vec<Repair>,
    /// Findings no planned repair addresses.
    pub unrepaired: Vec<Finding>,
}

impl Inspection {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.repairs.is_empty()
    }
}

pub fn inspect(project: &Project) -> Result<Inspection> {
    let snapshot = project.load()?;
    let mut inspector = Inspector {
        project,
        claimed: snapshot.files.iter().cloned().collect(),
        findings: Vec::new(),
        unrepaired: Vec::new(),
        renames: Vec::new(),
        writes: Vec::new(),
        reservations: Vec::new(),
    };

    for finding in snapshot.findings {
        inspector.report(finding, None);
    }
    for node in snapshot.outline.iter() {
        inspector.inspect_node(node)?;
    }

    let reserved = project.reserver().reserved()?;
    let in_files: HashSet<&Sid> = snapshot.records.iter().map(|r| &r.sid).collect();
    for sid in &reserved {
        if !in_files.contains(sid) {
            let finding = Finding::new(
                FindingKind::OrphanedReservation,
                Severity::Warning,
                format!("SID {} is reserved but no file carries it", sid),
                sid.to_string(),
            );
            let repair = Repair {
                finding: Some(FindingKind::OrphanedReservation),
                remedy: Remedy::Release(sid.clone()),
                description: format!("release {}", sid),
            };
            inspector.report(finding, Some(repair));
        }
    }
    let reserved: HashSet<Sid> = reserved.into_iter().collect();
    for node in snapshot.outline.iter() {
        if !reserved.contains(&node.sid) {
            inspector.reservations.push(Repair {
                finding: None,
                remedy: Remedy::Reserve(node.sid.clone()),
                description: format!("reserve {}", node.sid),
            });
        }
    }

    let Inspector {
        findings,
        unrepaired,
        renames,
        writes,
        reservations,
        ..
    } = inspector;
    let mut repairs = renames;
    repairs.extend(writes);
    repairs.extend(reservations);

    debug!(
        findings = findings.len(),
        repairs = repairs.len(),
        unrepaired = unrepaired.len(),
        "inspection finished"
    );
    Ok(Inspection {
        outline: snapshot.outline,
        findings,
        repairs,
        unrepaired,
    })
}

/// Carries out a plan produced by [`inspect`]. The caller holds the lock.
///
/// File steps are verified against the directory before anything changes.
pub fn apply_repairs(project: &Project, repairs: &[Repair]) -> Result<()> {
    let file_ops: Vec<FileOp> = repairs
        .iter()
        .filter_map(|r| match &r.remedy {
            Remedy::File(op) => Some(op.clone()),
            _ => None,
        })
        .collect();
    project.verify_plan(&file_ops)?;
    for repair in repairs {
        match &repair.remedy {
            Remedy::File(op) => op.apply(project.backend())?,
            Remedy::Release(sid) => project.reserver().release(sid)?,
            Remedy::Reserve(sid) => project.reserver().reserve(sid)?,
        }
        info!(repair = %repair.description, "repaired");
    }
    Ok(())
}

struct Loaded<'n> {
    doc: &'n Document,
    name: String,
    raw: String,
    header: Result<Frontmatter>,
}

struct Inspector<'a> {
    project: &'a Project,
    /// Names that exist or that a planned repair will create.
    claimed: HashSet<String>,
    findings: Vec<Finding>,
    unrepaired: Vec<Finding>,
    renames: Vec<Repair>,
    writes: Vec<Repair>,
    reservations: Vec<Repair>,
}

impl Inspector<'_> {
    /// Records a finding and files its repair (if any) with the rest of the plan.
    fn report(&mut self, finding: Finding, repair: Option<Repair>) {
        match repair {
            Some(repair) => match &repair.remedy {
                Remedy::File(FileOp::Rename { .. }) => self.renames.push(repair),
                Remedy::File(_) => self.writes.push(repair),
                Remedy::Release(_) | Remedy::Reserve(_) => self.reservations.push(repair),
            },
            None => self.unrepaired.push(finding.clone()),
        }
        self.findings.push(finding);
    }

    fn claim(&mut self, name: &str) -> bool {
        self.claimed.insert(name.to_string())
    }

    fn inspect_node(&mut self, node: &Node) -> Result<()> {
        let mut loaded = Vec::with_capacity(node.documents.len());
        for doc in &node.documents {
            let name = node.filename(doc)?;
            let (raw, header) = match String::from_utf8(self.project.read_bytes(&name)?) {
                Ok(raw) => {
                    let header = self.project.frontmatter().parse(&raw);
                    (raw, header)
                }
                Err(_) => (String::new(), Err(BinderError::Encoding(name.clone()))),
            };
            loaded.push(Loaded {
                doc,
                name,
                raw,
                header,
            });
        }

        let title = loaded
            .iter()
            .filter(|l| l.doc.doc_type.is_draft())
            .find_map(|l| l.header.as_ref().ok().and_then(|fm| fm.title()))
            .map(str::to_string)
            .unwrap_or_else(|| node.title.clone());
        let expected = self.project.slugifier().slugify(&title);

        for item in &loaded {
            let final_name = self.check_slug(node, item, &title, &expected);
            if let Err(e) = &item.header {
                let finding = Finding::new(
                    FindingKind::MalformedFrontmatter,
                    Severity::Error,
                    format!("front matter cannot be read: {}", e),
                    item.name.clone(),
                );
                // Rewriting would lose the undecodable bytes.
                if matches!(e, BinderError::Encoding(_)) {
                    self.report(finding, None);
                    continue;
                }
                let body = self.project.frontmatter().salvage_body(&item.raw);
                let content = self.project.document_content(&title, &body)?;
                let repair = Repair {
                    finding: Some(FindingKind::MalformedFrontmatter),
                    description: format!("rewrite front matter of {}", final_name),
                    remedy: Remedy::File(FileOp::Write {
                        name: final_name,
                        content,
                    }),
                };
                self.report(finding, Some(repair));
            }
        }

        self.check_missing(node, &DocType::draft(), &title, &expected)?;
        self.check_missing(node, &DocType::notes(), &title, "")?;
        Ok(())
    }

    /// Reports drift and returns the name the document will have after repair.
    fn check_slug(&mut self, node: &Node, item: &Loaded<'_>, title: &str, expected: &str) -> String {
        let slugged = item.doc.doc_type.is_draft() || !item.doc.slug.is_empty();
        if !slugged || item.doc.slug == expected {
            return item.name.clone();
        }

        let finding = Finding::new(
            FindingKind::SlugDrift,
            Severity::Warning,
            format!(
                "slug {:?} does not match title {:?} (expected {:?})",
                item.doc.slug, title, expected
            ),
            item.name.clone(),
        );
        match generate_filename(&node.mp, &node.sid, &item.doc.doc_type, expected) {
            Ok(target) if self.claim(&target) => {
                let repair = Repair {
                    finding: Some(FindingKind::SlugDrift),
                    description: format!("rename {} to {}", item.name, target),
                    remedy: Remedy::File(FileOp::Rename {
                        from: item.name.clone(),
                        to: target.clone(),
                    }),
                };
                self.report(finding, Some(repair));
                target
            }
            _ => {
                self.report(finding, None);
                item.name.clone()
            }
        }
    }

    fn check_missing(
        &mut self,
        node: &Node,
        doc_type: &DocType,
        title: &str,
        slug: &str,
    ) -> Result<()> {
        if node.has_document(doc_type.as_str()) {
            return Ok(());
        }
        let (kind, severity) = if doc_type.is_draft() {
            (FindingKind::MissingDraft, Severity::Error)
        } else {
            (FindingKind::MissingNotes, Severity::Warning)
        };
        let finding = Finding::new(
            kind,
            severity,
            format!("node {} ({}) has no {} document", node.mp, node.sid, doc_type),
            node.mp.to_string(),
        );

        let name = generate_filename(&node.mp, &node.sid, doc_type, slug)?;
        if !self.claim(&name) {
            self.report(finding, None);
            return Ok(());
        }
        let content = self.project.document_content(title, "")?;
        let repair = Repair {
            finding: Some(kind),
            description: format!("create {}", name),
            remedy: Remedy::File(FileOp::Write { name, content }),
        };
        self.report(finding, Some(repair));
        Ok(())
    }
}
