//! Diff command

use anyhow::Result;
use crossterm::style::Stylize;
use graft_core::{DiffStatus, DiffSummary, FileDiffResult};
use tokio_util::sync::CancellationToken;

use crate::GlobalOpts;
use crate::ops::Context;
use crate::ops::pipeline::{Prepared, prepare};
use crate::ui::output::diff_line;
use crate::ui::theme::plural;

/// Show what `add` would do for `names` without touching the project
pub async fn diff(
    opts: &GlobalOpts,
    cancel: CancellationToken,
    names: &[String],
    force: bool,
) -> Result<()> {
    let ctx = Context::load(opts, cancel).await?;
    let Prepared { results, plan, .. } = prepare(&ctx, names).await?;
    let theme = ctx.reporter.theme();

    println!();
    for result in &results {
        println!("{}", diff_line(theme, result, force));
    }

    let summary = DiffSummary::from_results(&results);
    println!();
    println!("{}", format!("  {}", summary_text(&summary)).dark_grey());

    if force {
        let overwritten = overwritable(&results);
        if overwritten > 0 {
            println!(
                "  {} `graft add --force` would overwrite {}",
                theme.icons.warning.with(theme.colors.warning),
                plural(overwritten, "locally modified file")
            );
        }
    } else if summary.conflict > 0 && !opts.quiet {
        println!("  Use --force to see which files `graft add --force` would overwrite.");
    }

    if !plan.packages.is_empty() && !opts.quiet {
        println!("  Packages: {}", plan.packages.join(" "));
    }

    Ok(())
}

fn summary_text(summary: &DiffSummary) -> String {
    if summary.total() == 0 {
        return "no files".to_string();
    }
    if summary.is_clean() {
        return format!("{} up to date", plural(summary.identical, "file"));
    }
    format!(
        "{} to create, {} to update, {} identical, {}",
        summary.create,
        summary.update,
        summary.identical,
        plural(summary.conflict, "conflict")
    )
}

/// Conflicts `add --force` would overwrite (unreadable files are never written)
fn overwritable(results: &[FileDiffResult]) -> usize {
    results
        .iter()
        .filter(|r| r.status == DiffStatus::Conflict && r.read_error.is_none())
        .count()
}
