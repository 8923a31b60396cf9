//! End-to-end rebuild run: discover, parse, plan, execute, report.
use anyhow::{anyhow, Context, Result};

use crate::cli::RootArgs;
use crate::inventory::parse_inventory;
use crate::plan::plan_rebuilds;
use crate::rebuild::{execute_plan, ScratchDir};
use crate::report::{render_report, BatchOutcome};
use crate::toolchain::{GoCommand, GoToolchain, Toolchain};

pub fn run(args: RootArgs) -> Result<()> {
    let go = GoCommand::resolve(args.go.as_deref())?;
    let toolchain = GoToolchain::new(go);
    let outcome = rebuild_installed(&toolchain, args.upgrade)?;
    if let Some(report) = render_report(&outcome) {
        eprint!("{report}");
    }
    Ok(())
}

/// Rebuild every outdated binary in the install directory.
///
/// Discovery errors abort the run. Per-binary problems end up in the
/// returned outcome instead.
pub fn rebuild_installed<T: Toolchain + ?Sized>(
    toolchain: &T,
    upgrade: bool,
) -> Result<BatchOutcome> {
    let dir = toolchain
        .install_dir()
        .context("resolve binary install directory")?;
    let dir_text = dir
        .to_str()
        .filter(|text| !text.is_empty())
        .ok_or_else(|| anyhow!("install directory {dir:?} is not usable"))?;
    let text = toolchain
        .inventory(&dir)
        .with_context(|| format!("inspect binaries in {}", dir.display()))?;
    let records = parse_inventory(dir_text, &text);
    let active = toolchain
        .active_version()
        .context("determine active go version")?;
    tracing::info!(
        dir = %dir.display(),
        binaries = records.len(),
        active = %active,
        upgrade,
        "inventory parsed"
    );

    let plan = plan_rebuilds(&records, &active, upgrade);
    let mut scratch = ScratchDir::new();
    let outcome = execute_plan(&plan, toolchain, &mut scratch)?;
    tracing::info!(
        rebuilt = outcome.rebuilt,
        skipped = outcome.skipped_unrebuildable.len(),
        failed = outcome.failed.len(),
        scratch_used = scratch.is_created(),
        "rebuild complete"
    );
    Ok(outcome)
}
