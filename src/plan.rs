//! Rebuild planning: decide what to do with each installed binary.
use crate::inventory::BinaryRecord;
use std::fmt;

/// Version spec passed to `go install` in upgrade mode.
pub const LATEST: &str = "latest";

/// Decision for one binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// Built with the active toolchain; nothing to do.
    Skip,
    /// Needs a rebuild but has no tagged module version to pin to.
    SkipUnrebuildable,
    /// Reinstall at the recorded module version.
    RebuildPinned(String),
    /// Reinstall at `@latest`.
    RebuildLatest,
}

impl PlanAction {
    /// Version to request from `go install`, if this action rebuilds.
    pub fn target_version_spec(&self) -> Option<&str> {
        match self {
            PlanAction::RebuildPinned(version) => Some(version.as_str()),
            PlanAction::RebuildLatest => Some(LATEST),
            PlanAction::Skip | PlanAction::SkipUnrebuildable => None,
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanAction::Skip => write!(f, "skip"),
            PlanAction::SkipUnrebuildable => write!(f, "skip_unrebuildable"),
            PlanAction::RebuildPinned(version) => write!(f, "rebuild@{version}"),
            PlanAction::RebuildLatest => write!(f, "rebuild@{LATEST}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    /// Package path of the originating record.
    pub path: String,
    pub action: PlanAction,
}

/// Classify a single record against the active Go version.
///
/// Without `upgrade`, a byte-equal Go version short-circuits to
/// [`PlanAction::Skip`]. With `upgrade`, every record with a usable module
/// version is rebuilt at `@latest`, even if its Go version already matches.
pub fn plan_record(record: &BinaryRecord, active_version: &str, upgrade: bool) -> PlanItem {
    let action = if !upgrade && record.build_toolchain_version == active_version {
        PlanAction::Skip
    } else if record.is_devel() {
        PlanAction::SkipUnrebuildable
    } else if upgrade {
        PlanAction::RebuildLatest
    } else {
        PlanAction::RebuildPinned(record.module_version.clone())
    };
    PlanItem {
        path: record.path.clone(),
        action,
    }
}

/// Plan every record, preserving order.
pub fn plan_rebuilds(
    records: &[BinaryRecord],
    active_version: &str,
    upgrade: bool,
) -> Vec<PlanItem> {
    records
        .iter()
        .map(|record| {
            let item = plan_record(record, active_version, upgrade);
            tracing::debug!(%record, action = %item.action, "planned");
            item
        })
        .collect()
}
