//! Shared command context.
//!
//! Resolves the project root, loads `graft.toml` and builds the registry
//! client once, so commands receive everything explicitly instead of reading
//! process state themselves.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use graft_core::paths::{config_path, find_project_root, lock_path};
use graft_core::{IndexClient, ProjectConfig, RegistrySource};
use tokio_util::sync::CancellationToken;

use crate::GlobalOpts;
use crate::ui::TerminalReporter;

/// Groups the state every registry-backed command needs.
#[derive(Clone)]
pub struct Context {
    pub root: PathBuf,
    pub config: ProjectConfig,
    pub client: Arc<IndexClient>,
    pub reporter: Arc<TerminalReporter>,
    pub dry_run: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("source", self.client.source())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build the context for the directory selected by `--cwd`.
    ///
    /// The project root is the nearest ancestor holding `graft.toml`, or the
    /// start directory itself when there is none. A `--registry` path is
    /// relative to the start directory; a `graft.toml` path is relative to
    /// the project root.
    pub async fn load(opts: &GlobalOpts, cancel: CancellationToken) -> Result<Self> {
        let start = start_dir(opts)?;
        let root = find_project_root(&start).unwrap_or_else(|| start.clone());

        let config = ProjectConfig::load_or_default(&config_path(&root)).await?;

        let source = match &opts.registry {
            Some(registry) => RegistrySource::parse_relative_to(registry, &start),
            None => RegistrySource::parse_relative_to(&config.registry, &root),
        }
        .context("Invalid registry source")?;

        tracing::debug!(root = %root.display(), source = %source, "project context");

        let mut client = IndexClient::new(source)?.with_cancellation(cancel);
        if let Some(secs) = opts.timeout {
            client = client.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            root,
            config,
            client: Arc::new(client),
            reporter: Arc::new(TerminalReporter::new(opts.quiet)),
            dry_run: opts.dry_run,
        })
    }

    pub fn lock_path(&self) -> PathBuf {
        lock_path(&self.root)
    }

    pub fn implementation(&self) -> &str {
        &self.config.implementation
    }
}

/// Directory the command runs in: `--cwd`, or the process working directory.
pub fn start_dir(opts: &GlobalOpts) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(match &opts.cwd {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => cwd.join(dir),
        None => cwd,
    })
}
