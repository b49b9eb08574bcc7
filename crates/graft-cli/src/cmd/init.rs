//! Init command

use anyhow::{Context, Result, bail};
use crossterm::style::Stylize;
use graft_core::paths::config_path;
use graft_core::{ProjectConfig, RegistrySource};

use crate::GlobalOpts;
use crate::ops::context::start_dir;

/// Write `graft.toml` in the start directory
pub async fn init(opts: &GlobalOpts, implementation: Option<&str>, force: bool) -> Result<()> {
    let dir = start_dir(opts)?;
    let path = config_path(&dir);

    if tokio::fs::try_exists(&path).await.unwrap_or(false) && !force {
        bail!(
            "{} already exists. Use --force to replace it.",
            path.display()
        );
    }

    let mut config = ProjectConfig::default();
    if let Some(registry) = &opts.registry {
        RegistrySource::parse(registry).context("Invalid registry source")?;
        registry.trim().clone_into(&mut config.registry);
    }
    if let Some(implementation) = implementation {
        let implementation = implementation.trim();
        if implementation.is_empty() {
            bail!("Implementation name must not be empty");
        }
        implementation.clone_into(&mut config.implementation);
    }

    if opts.dry_run {
        println!("  Would write {}", path.display());
        return Ok(());
    }

    config.save(&path).await?;

    if !opts.quiet {
        println!(
            "  {} Wrote {} (registry {}, implementation {})",
            "✓".green(),
            path.display(),
            config.registry.as_str().cyan(),
            config.implementation.as_str().cyan(),
        );
    }

    Ok(())
}
