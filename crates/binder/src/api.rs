//! # API Facade
//!
//! [`BinderApi`] is a thin facade over the command layer and the single entry
//! point for callers that start from user input.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Parses inputs**: selector strings become [`Selector`]s, placement flags
//!   become a [`Placement`]
//! - **Validates flag combinations** before anything is loaded
//! - **Dispatches** to the matching function in [`crate::commands`]
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It holds no logic of its own beyond that, and it never prints.
//!
//! ## Placement Flags
//!
//! [`PlacementArgs`] mirrors what a command line would offer:
//!
//! - `root`: top level
//! - `child_of X` / `sibling_of X`: pick the parent (mutually exclusive)
//! - `before Y` / `after Y`: position among that parent's children (mutually
//!   exclusive); on their own they also pick the parent, as Y's parent
//!
//! `child_of` and `sibling_of` each combine with `before`/`after`. `root`
//! combines with `before`/`after` but not with either parent flag.
//!
//! ## Dry Runs
//!
//! Every mutation takes `apply`. With `apply = false` nothing is written and
//! the lock is not taken; the returned [`CmdResult`] carries the same plan a
//! real run would execute.

use crate::commands::delete::DeleteMode;
use crate::commands::helpers::{Anchor, Placement, Position};
use crate::commands::{self, CmdResult};
use crate::error::{BinderError, Result};
use crate::model::Node;
use crate::project::Project;
use crate::selector::Selector;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementArgs {
    pub root: bool,
    pub child_of: Option<String>,
    pub sibling_of: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl PlacementArgs {
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::default()
        }
    }

    pub fn child_of(selector: impl Into<String>) -> Self {
        Self {
            child_of: Some(selector.into()),
            ..Self::default()
        }
    }

    pub fn sibling_of(selector: impl Into<String>) -> Self {
        Self {
            sibling_of: Some(selector.into()),
            ..Self::default()
        }
    }

    pub fn before(mut self, selector: impl Into<String>) -> Self {
        self.before = Some(selector.into());
        self
    }

    pub fn after(mut self, selector: impl Into<String>) -> Self {
        self.after = Some(selector.into());
        self
    }

    pub fn to_placement(&self) -> Result<Placement> {
        let anchor = match (&self.child_of, &self.sibling_of) {
            (Some(_), Some(_)) => {
                return Err(BinderError::InvalidPlacement(
                    "child-of and sibling-of cannot be combined".to_string(),
                ))
            }
            (Some(sel), None) => Anchor::ChildOf(Selector::parse(sel)?),
            (None, Some(sel)) => Anchor::SiblingOf(Selector::parse(sel)?),
            (None, None) if self.root => Anchor::Root,
            (None, None) => Anchor::Unspecified,
        };
        if self.root && !matches!(anchor, Anchor::Root) {
            return Err(BinderError::InvalidPlacement(
                "root cannot be combined with child-of or sibling-of".to_string(),
            ));
        }

        let position = match (&self.before, &self.after) {
            (Some(_), Some(_)) => {
                return Err(BinderError::InvalidPlacement(
                    "before and after cannot be combined".to_string(),
                ))
            }
            (Some(sel), None) => Some(Position::Before(Selector::parse(sel)?)),
            (None, Some(sel)) => Some(Position::After(Selector::parse(sel)?)),
            (None, None) => None,
        };

        Ok(Placement { anchor, position })
    }
}

pub struct BinderApi {
    project: Project,
}

impl BinderApi {
    pub fn new(project: Project) -> Self {
        Self { project }
    }

    pub fn open(dir: &Path) -> Result<Self> {
        Ok(Self::new(Project::open(dir)?))
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn add(&self, title: &str, placement: &PlacementArgs, apply: bool) -> Result<CmdResult> {
        commands::add::run(&self.project, title, &placement.to_placement()?, apply)
    }

    pub fn delete(&self, selector: &str, mode: DeleteMode, apply: bool) -> Result<CmdResult> {
        commands::delete::run(&self.project, &Selector::parse(selector)?, mode, apply)
    }

    pub fn move_node(&self, source: &str, placement: &PlacementArgs, apply: bool) -> Result<CmdResult> {
        let source = Selector::parse(source)?;
        commands::move_node::run(&self.project, &source, &placement.to_placement()?, apply)
    }

    pub fn rename(&self, selector: &str, title: &str, apply: bool) -> Result<CmdResult> {
        commands::rename::run(&self.project, &Selector::parse(selector)?, title, apply)
    }

    pub fn compact(&self, selector: Option<&str>, apply: bool) -> Result<CmdResult> {
        let selector = selector.map(Selector::parse).transpose()?;
        commands::compact::run(&self.project, selector.as_ref(), apply)
    }

    pub fn list(&self, selector: Option<&str>) -> Result<CmdResult> {
        let selector = selector.map(Selector::parse).transpose()?;
        commands::list::run(&self.project, selector.as_ref())
    }

    pub fn resolve(&self, selector: &str) -> Result<Node> {
        let selector = Selector::parse(selector)?;
        let outline = self.project.load_outline()?;
        commands::helpers::resolve(&outline, &selector).cloned()
    }

    pub fn check(&self) -> Result<CmdResult> {
        commands::doctor::check(&self.project)
    }

    pub fn repair(&self, apply: bool) -> Result<CmdResult> {
        commands::doctor::repair(&self.project, apply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::lock::MemLocker;
    use crate::store::mem_backend::MemBackend;
    use crate::store::reserve::MemReserver;

    fn api() -> BinderApi {
        BinderApi::new(Project::new(
            MemBackend::new(),
            MemLocker::new(),
            MemReserver::new(),
        ))
    }

    #[test]
    fn test_placement_flag_exclusivity() {
        let both = PlacementArgs {
            child_of: Some("100".to_string()),
            sibling_of: Some("200".to_string()),
            ..PlacementArgs::default()
        };
        assert!(matches!(
            both.to_placement(),
            Err(BinderError::InvalidPlacement(_))
        ));

        let both = PlacementArgs::child_of("100").before("100-100").after("100-200");
        assert!(matches!(
            both.to_placement(),
            Err(BinderError::InvalidPlacement(_))
        ));

        let root = PlacementArgs {
            root: true,
            sibling_of: Some("100".to_string()),
            ..PlacementArgs::default()
        };
        assert!(matches!(
            root.to_placement(),
            Err(BinderError::InvalidPlacement(_))
        ));
    }

    #[test]
    fn test_placement_combines_parent_and_position() {
        let placement = PlacementArgs::child_of("100").before("sid:abcd1234").to_placement().unwrap();
        assert!(matches!(placement.anchor, Anchor::ChildOf(_)));
        assert!(matches!(placement.position, Some(Position::Before(_))));
    }

    #[test]
    fn test_bad_selector_fails_before_io() {
        let api = api();
        assert!(matches!(
            api.delete("not a selector", DeleteMode::Default, true),
            Err(BinderError::InvalidSelector(_))
        ));
        assert!(matches!(
            api.add("Arrival", &PlacementArgs::child_of("000"), true),
            Err(BinderError::InvalidSelector(_)) | Err(BinderError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_add_resolve_rename_flow() {
        let api = api();
        api.add("Part One", &PlacementArgs::root(), true).unwrap();
        let added = api
            .add("Arrival", &PlacementArgs::child_of("100"), true)
            .unwrap();
        let sid = added.affected_nodes[0].sid.to_string();

        let node = api.resolve(&format!("sid:{}", sid)).unwrap();
        assert_eq!(node.mp.to_string(), "100-100");

        api.rename(&sid, "The Arrival", true).unwrap();
        assert_eq!(api.resolve("100-100").unwrap().title, "the arrival");

        let listed = api.list(None).unwrap();
        assert_eq!(listed.listed_nodes[0].children.len(), 1);
        assert!(api.check().unwrap().findings.is_empty());
    }
}
