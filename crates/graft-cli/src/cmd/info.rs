//! Info command

use anyhow::Result;
use crossterm::style::Stylize;
use graft_core::paths::sanitize_path;
use graft_core::{ResolveError, SyncLock};
use graft_schema::ItemName;
use tokio_util::sync::CancellationToken;

use crate::GlobalOpts;
use crate::ops::Context;
use crate::ops::pipeline::fetch_index;
use crate::ops::suggest::explain;

/// Show metadata for one registry item
pub async fn info(opts: &GlobalOpts, cancel: CancellationToken, name: &str) -> Result<()> {
    let ctx = Context::load(opts, cancel).await?;
    let index = fetch_index(&ctx).await?;

    let Some(item) = index.find(name) else {
        let err = ResolveError::UnknownItem {
            name: ItemName::new(name),
            required_by: None,
        };
        return Err(explain(err, &index));
    };

    let lock = SyncLock::load(&ctx.lock_path()).await?;
    let synced = item
        .files
        .iter()
        .filter_map(|file| sanitize_path(file).ok())
        .filter(|path| lock.fingerprint(path).is_some())
        .count();

    let lw = 14;
    let theme = ctx.reporter.theme();

    println!();
    println!(
        "  {} {}",
        item.name.as_str().with(theme.colors.item_name).bold(),
        item.kind.as_str().with(theme.colors.secondary)
    );
    if !item.title.is_empty() {
        println!("  {}", item.title);
    }
    if !item.description.is_empty() {
        println!("  {}", item.description);
    }
    println!();

    if item.files.is_empty() {
        println!("  {:<lw$}{}", "files", "none (groups dependencies)".dark_grey());
    }
    for (i, file) in item.files.iter().enumerate() {
        let label = if i == 0 { "files" } else { "" };
        println!(
            "  {:<lw$}{} {}",
            label,
            file,
            format!("<- {}", item.source_path(file, ctx.implementation())).dark_grey()
        );
    }
    if !item.dependencies.is_empty() {
        let deps: Vec<&str> = item.dependencies.iter().map(ItemName::as_str).collect();
        println!("  {:<lw$}{}", "requires", deps.join(", "));
    }
    if !item.package_dependencies.is_empty() {
        println!("  {:<lw$}{}", "packages", item.package_dependencies.join(" "));
    }
    if !item.docs_path.is_empty() {
        println!("  {:<lw$}{}", "docs", item.docs_path);
    }
    for (key, value) in &item.install {
        println!("  {:<lw$}{}", format!("install.{key}"), value);
    }
    if !item.files.is_empty() {
        println!(
            "  {:<lw$}{}/{} files tracked in graft.lock",
            "synced",
            synced,
            item.files.len()
        );
    }

    Ok(())
}
