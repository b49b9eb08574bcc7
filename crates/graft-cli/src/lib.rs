//! graft - copy registry components into your project
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! graft fetches a registry index, resolves the requested items and their
//! dependencies, and writes the item files into the project as owned source.
//! Local edits are detected against `graft.lock` and never overwritten
//! without `--force`.
//!
//! # Project Layout
//!
//! ```text
//! project/
//! ├── graft.toml   # registry + implementation
//! ├── graft.lock   # last-synced fingerprints
//! └── components/  # files written by `graft add`
//! ```

pub mod cmd;
pub mod ops;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "graft")]
#[command(author, version, about = "graft - copy registry components into your project")]
pub struct Cli {
    /// Run as if started in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Registry source (URL or directory), overrides graft.toml
    #[arg(long, global = true, env = "GRAFT_REGISTRY", value_name = "SRC")]
    pub registry: Option<String>,

    /// Abort registry requests after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create graft.toml in the current directory (records `--registry` if given)
    Init {
        /// Implementation directory for primitive items
        #[arg(long, value_name = "NAME")]
        implementation: Option<String>,
        /// Replace an existing graft.toml
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// List registry items
    List {
        /// Only show items whose name, title or description matches
        query: Option<String>,
    },
    /// Add items (and their dependencies) to the project
    Add {
        /// Item name(s)
        #[arg(required = true)]
        names: Vec<String>,
        /// Overwrite locally modified files
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Show what `add` would change
    Diff {
        /// Item name(s)
        #[arg(required = true)]
        names: Vec<String>,
        /// Also show which conflicts `add --force` would overwrite
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Show item info
    Info {
        /// Item name
        name: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub cwd: Option<PathBuf>,
    pub registry: Option<String>,
    pub timeout: Option<u64>,
    pub dry_run: bool,
    pub quiet: bool,
}

impl From<&Cli> for GlobalOpts {
    fn from(cli: &Cli) -> Self {
        Self {
            cwd: cli.cwd.clone(),
            registry: cli.registry.clone(),
            timeout: cli.timeout,
            dry_run: cli.dry_run,
            quiet: cli.quiet,
        }
    }
}
