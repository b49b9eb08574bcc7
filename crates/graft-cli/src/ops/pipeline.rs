//! Fetch, resolve, inspect and diff: the part of the pipeline that `add`
//! and `diff` share. Nothing here writes to the project.

use anyhow::{Context as _, Result};
use graft_core::diff::diff;
use graft_core::inspect::inspect;
use graft_core::resolver::resolve;
use graft_core::{FileDiffResult, ResolutionPlan, SyncLock};
use graft_schema::RegistryIndex;

use super::context::Context;
use super::suggest::explain;

/// Everything known about a request before anything is applied.
#[derive(Debug)]
pub struct Prepared {
    pub plan: ResolutionPlan,
    pub lock: SyncLock,
    pub results: Vec<FileDiffResult>,
}

/// Fetch the registry index, reporting the client's last error on failure.
pub async fn fetch_index(ctx: &Context) -> Result<RegistryIndex> {
    match ctx.client.fetch_index().await {
        Ok(index) => Ok(index),
        Err(e) => {
            let message = ctx.client.last_error().unwrap_or_else(|| e.to_string());
            Err(anyhow::anyhow!(message)).with_context(|| {
                format!(
                    "Failed to fetch registry index from {}",
                    ctx.client.source()
                )
            })
        }
    }
}

/// Run every read-only stage for `names`.
pub async fn prepare(ctx: &Context, names: &[String]) -> Result<Prepared> {
    let index = fetch_index(ctx).await?;

    let plan = resolve(names, &index, &*ctx.client, ctx.implementation())
        .await
        .map_err(|e| explain(e, &index))?;

    tracing::debug!(
        items = ?plan.item_names(),
        files = plan.len(),
        "resolved plan"
    );

    let lock = SyncLock::load(&ctx.lock_path()).await?;
    let local = inspect(
        &ctx.root,
        plan.file_targets.iter().map(|target| target.path.as_path()),
    )
    .await;
    let results = diff(&plan, &local, &lock);

    Ok(Prepared {
        plan,
        lock,
        results,
    })
}
