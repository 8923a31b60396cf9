//! Execution of a rebuild plan.
//!
//! Items run one after another. A failed install is recorded and the batch
//! moves on; only failing to create the scratch directory stops the run.
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::path::Path;
use tempfile::TempDir;

use crate::plan::{PlanAction, PlanItem};
use crate::report::BatchOutcome;
use crate::toolchain::Toolchain;

const SCRATCH_PREFIX: &str = "rebuild-gobin-";

/// A `path@version` argument for `go install`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSpec(String);

impl RebuildSpec {
    pub fn new(path: &str, version: &str) -> Result<Self> {
        Self::parse(&format!("{path}@{version}"))
    }

    /// Accept only a non-empty spec with exactly one `@`.
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.is_empty() || spec.matches('@').count() != 1 {
            return Err(anyhow!("invalid path@version spec: {spec:?}"));
        }
        Ok(Self(spec.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RebuildSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Working directory shared by every install in a run.
///
/// Created on first use, removed when dropped.
#[derive(Debug, Default)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_created(&self) -> bool {
        self.dir.is_some()
    }

    pub fn path(&mut self) -> Result<&Path> {
        let dir = match self.dir.take() {
            Some(dir) => dir,
            None => {
                let dir = tempfile::Builder::new()
                    .prefix(SCRATCH_PREFIX)
                    .tempdir()
                    .context("create scratch directory")?;
                tracing::debug!(dir = %dir.path().display(), "created scratch directory");
                dir
            }
        };
        Ok(self.dir.insert(dir).path())
    }
}

/// Run every item of `plan`, accumulating the outcome.
pub fn execute_plan<T: Toolchain + ?Sized>(
    plan: &[PlanItem],
    toolchain: &T,
    scratch: &mut ScratchDir,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    for item in plan {
        let Some(version) = item.action.target_version_spec() else {
            if item.action == PlanAction::SkipUnrebuildable {
                outcome.skipped_unrebuildable.push(item.path.clone());
            }
            continue;
        };
        let cwd = scratch.path()?;
        match rebuild_one(toolchain, &item.path, version, cwd) {
            Ok(()) => outcome.rebuilt += 1,
            Err(err) => {
                tracing::warn!(path = %item.path, error = %format!("{err:#}"), "rebuild failed");
                outcome.failed.push(item.path.clone());
            }
        }
    }
    Ok(outcome)
}

fn rebuild_one<T: Toolchain + ?Sized>(
    toolchain: &T,
    path: &str,
    version: &str,
    cwd: &Path,
) -> Result<()> {
    let spec = RebuildSpec::new(path, version)?;
    tracing::info!(%spec, "rebuilding");
    toolchain.install(&spec, cwd)
}
