use super::helpers::lock_if;
use super::{CmdMessage, CmdResult};
use crate::check::{apply_repairs, inspect};
use crate::error::Result;
use crate::model::Severity;
use crate::project::Project;
use tracing::info;

/// Reports findings without planning anything. Takes no lock.
pub fn check(project: &Project) -> Result<CmdResult> {
    let inspection = inspect(project)?;
    let mut result = CmdResult::default();

    if inspection.findings.is_empty() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
    } else {
        for finding in &inspection.findings {
            let message = format!("{} [{}]: {}", finding.path, finding.kind, finding.message);
            result.add_message(match finding.severity {
                Severity::Error => CmdMessage::error(message),
                Severity::Warning => CmdMessage::warning(message),
            });
        }
    }
    result.findings = inspection.findings;
    result.unrepaired = inspection.unrepaired;
    Ok(result)
}

/// Fixes every auto-repairable finding.
///
/// `duplicate_sid`, `invalid_filename` and documents that are not UTF-8 are
/// never touched and come back in `unrepaired`. Running it twice in a row reports nothing the second time.
pub fn repair(project: &Project, apply: bool) -> Result<CmdResult> {
    let _guard = lock_if(project, apply)?;
    let inspection = inspect(project)?;

    let mut result = CmdResult::default();
    if apply {
        apply_repairs(project, &inspection.repairs)?;
        info!(
            repairs = inspection.repairs.len(),
            unrepaired = inspection.unrepaired.len(),
            "repair finished"
        );
    }

    if inspection.repairs.is_empty() && inspection.unrepaired.is_empty() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
    } else {
        let verb = if apply { "Repaired" } else { "Would repair" };
        for repair in &inspection.repairs {
            result.add_message(CmdMessage::info(format!("{}: {}", verb, repair.description)));
        }
        for finding in &inspection.unrepaired {
            result.add_message(CmdMessage::warning(format!(
                "Needs manual attention: {} [{}]: {}",
                finding.path, finding.kind, finding.message
            )));
        }
    }

    result.applied = apply;
    result.findings = inspection.findings;
    result.repairs = inspection.repairs;
    result.unrepaired = inspection.unrepaired;
    Ok(result)
}
