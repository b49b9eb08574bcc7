//! graft-core - registry resolution and sync engine
//!
//! The engine runs once per command, strictly in sequence:
//!
//! ```text
//! client (fetch index) -> resolver (plan) -> inspect (local state)
//!     -> diff (classify) -> sync (apply) -> lock (baseline)
//! ```
//!
//! Nothing in this crate reads ambient process state; the CLI threads the
//! project root, registry source and implementation in explicitly.

pub mod client;
pub mod config;
pub mod diff;
pub mod inspect;
pub mod lock;
pub mod paths;
pub mod reporter;
pub mod resolver;
pub mod sync;

pub use client::{ContentFetcher, FetchError, IndexClient, RegistrySource};
pub use config::ProjectConfig;
pub use diff::{DiffStatus, DiffSummary, FileDiffResult};
pub use inspect::{LocalFile, LocalState, ReadError};
pub use lock::SyncLock;
pub use reporter::{NullReporter, Reporter};
pub use resolver::{FileTarget, ResolutionPlan, ResolveError};
pub use sync::{SyncAction, SyncMode, SyncOutcome, SyncReport, WriteError};

/// User Agent string for registry requests
pub const USER_AGENT: &str = concat!("graft/", env!("CARGO_PKG_VERSION"));
