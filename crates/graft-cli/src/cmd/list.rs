//! List command

use anyhow::Result;
use crossterm::style::Stylize;
use tokio_util::sync::CancellationToken;

use crate::GlobalOpts;
use crate::ops::Context;
use crate::ops::pipeline::fetch_index;
use crate::ui::list::item_table;
use crate::ui::theme::plural;

/// List registry items sorted by name, optionally filtered by `query`
pub async fn list(opts: &GlobalOpts, cancel: CancellationToken, query: Option<&str>) -> Result<()> {
    let ctx = Context::load(opts, cancel).await?;
    let index = fetch_index(&ctx).await?;

    if index.is_empty() {
        println!();
        println!("  No items in registry {}.", ctx.client.source());
        return Ok(());
    }

    let items = match query {
        Some(query) => index.search(query),
        None => index.sorted(),
    };

    if items.is_empty() {
        println!();
        println!("  No items match '{}'.", query.unwrap_or_default());
        return Ok(());
    }

    println!();
    println!("{}", item_table(&items));

    if !opts.quiet {
        println!();
        println!(
            "{}",
            format!("  {} from {}", plural(items.len(), "item"), ctx.client.source()).dark_grey()
        );
    }

    Ok(())
}
