//! Add command

use anyhow::{Result, bail};
use graft_core::sync::apply;
use graft_core::{Reporter, SyncAction, SyncMode, SyncReport};
use tokio_util::sync::CancellationToken;

use crate::GlobalOpts;
use crate::ops::Context;
use crate::ops::pipeline::{Prepared, prepare};
use crate::ui::TerminalReporter;
use crate::ui::theme::plural;

/// Resolve `names`, write their files and update `graft.lock`
pub async fn add(
    opts: &GlobalOpts,
    cancel: CancellationToken,
    names: &[String],
    force: bool,
) -> Result<()> {
    let ctx = Context::load(opts, cancel).await?;
    let Prepared {
        plan,
        mut lock,
        results,
    } = prepare(&ctx, names).await?;

    let mode = if ctx.dry_run {
        SyncMode::DryRun
    } else if force {
        SyncMode::Force
    } else {
        SyncMode::Safe
    };

    if plan.is_empty() {
        ctx.reporter.info("Nothing to add: the requested items have no files.");
    }

    let report = apply(&ctx.root, &plan, &results, mode, &*ctx.reporter).await;

    if !report.dry_run {
        let changed = lock.apply_report(&report);
        if changed > 0 {
            lock.save(&ctx.lock_path()).await?;
            tracing::debug!(changed, "graft.lock updated");
        }
    }

    print_summary(&ctx.reporter, &report);

    if report.has_failures() {
        bail!(
            "{} could not be synced",
            plural(report.failures().count(), "file")
        );
    }

    Ok(())
}

fn print_summary(reporter: &TerminalReporter, report: &SyncReport) {
    let written = report.written().count();
    let unchanged = report
        .outcomes
        .iter()
        .filter(|o| o.action == SyncAction::Unchanged)
        .count();
    let conflicts = report.conflicts().count();

    if !reporter.is_quiet() && !report.outcomes.is_empty() {
        println!();
        let verb = if report.dry_run { "would write" } else { "written" };
        reporter.success(&format!(
            "{} {verb}, {} unchanged",
            plural(written, "file"),
            unchanged
        ));
    }

    if conflicts > 0 {
        reporter.warning(&format!(
            "{} with local changes kept. Re-run with --force to overwrite.",
            plural(conflicts, "file")
        ));
    }

    if !report.packages.is_empty() {
        reporter.info(&format!("Packages to install: {}", report.packages.join(" ")));
    }

    if report.dry_run {
        reporter.info("Dry run: no files were written.");
    }
}
