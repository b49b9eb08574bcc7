//! Sync executor.
//!
//! Applies a diff to the project. Writes happen one file at a time in plan
//! order, so dependency files land before the files that import them. Each
//! write goes to a temp file in the destination directory and is renamed
//! into place, so a destination is either untouched or fully replaced.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use graft_schema::{Fingerprint, ItemName};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::Reporter;
use crate::diff::{DiffStatus, FileDiffResult};
use crate::inspect::ReadError;
use crate::resolver::{FileTarget, ResolutionPlan};

/// How conflicts and writes are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Compute the `Safe` outcome without touching the file system.
    DryRun,
    /// Write creates and updates, skip conflicts.
    #[default]
    Safe,
    /// Like `Safe`, but overwrite conflicts too.
    Force,
}

/// A destination file could not be written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot write {}: {message}", .path.display())]
pub struct WriteError {
    /// Project-relative path.
    pub path: PathBuf,
    /// Underlying I/O error message.
    pub message: String,
}

/// Why a file was not synced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    /// The local file could not be read, so it was left alone.
    #[error(transparent)]
    Read(ReadError),
    /// Writing the new content failed.
    #[error(transparent)]
    Write(WriteError),
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Newly written.
    Created,
    /// Replaced with a clean registry update.
    Updated,
    /// Already identical.
    Unchanged,
    /// Local edits replaced (force mode).
    Overwritten,
    /// Local edits kept; the registry version was not applied.
    SkippedConflict,
    /// The file could not be synced.
    Failed(SyncFailure),
}

impl SyncAction {
    /// Returns true if the file now matches the registry.
    pub fn is_in_sync(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Updated | Self::Unchanged | Self::Overwritten
        )
    }

    /// Returns true if the file content was (or would be) replaced.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Overwritten)
    }

    /// Short label used in output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Overwritten => "overwritten",
            Self::SkippedConflict => "conflict",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(failure) => write!(f, "failed: {failure}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Result of syncing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Project-relative path.
    pub path: PathBuf,
    /// Item providing the file.
    pub owner: ItemName,
    /// Diff status the action was derived from.
    pub status: DiffStatus,
    /// Registry fingerprint of the file.
    pub fingerprint: Fingerprint,
    /// What was done.
    pub action: SyncAction,
}

/// Result of a whole sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// One outcome per file, in plan order.
    pub outcomes: Vec<SyncOutcome>,
    /// Package dependencies the caller should install.
    pub packages: Vec<String>,
    /// True if nothing was written.
    pub dry_run: bool,
}

impl SyncReport {
    /// Files whose local edits were kept.
    pub fn conflicts(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.action == SyncAction::SkippedConflict)
    }

    /// Files that could not be synced.
    pub fn failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.action, SyncAction::Failed(_)))
    }

    /// Files that were (or, in a dry run, would be) written.
    pub fn written(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|o| o.action.is_write())
    }

    /// Returns true if any file failed.
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Apply `diff` to the project at `root`.
///
/// A failure on one file is recorded in its outcome and the remaining files
/// are still processed.
pub async fn apply(
    root: &Path,
    plan: &ResolutionPlan,
    diff: &[FileDiffResult],
    mode: SyncMode,
    reporter: &dyn Reporter,
) -> SyncReport {
    let targets: HashMap<&Path, &FileTarget> = plan
        .file_targets
        .iter()
        .map(|target| (target.path.as_path(), target))
        .collect();

    if mode == SyncMode::DryRun {
        reporter.section("Planning (dry run)");
    } else {
        reporter.section("Syncing");
    }

    let mut outcomes = Vec::with_capacity(diff.len());
    for result in diff {
        let action = match targets.get(result.path.as_path()) {
            Some(target) => apply_one(root, result, target, mode).await,
            None => SyncAction::Failed(SyncFailure::Write(WriteError {
                path: result.path.clone(),
                message: "no planned content for this path".into(),
            })),
        };

        if let SyncAction::Failed(failure) = &action {
            tracing::warn!(path = %result.path.display(), error = %failure, "file not synced");
        }

        let outcome = SyncOutcome {
            path: result.path.clone(),
            owner: result.owner.clone(),
            status: result.status,
            fingerprint: result.remote_fingerprint.clone(),
            action,
        };
        reporter.file_outcome(&outcome);
        outcomes.push(outcome);
    }

    SyncReport {
        outcomes,
        packages: plan.packages.clone(),
        dry_run: mode == SyncMode::DryRun,
    }
}

async fn apply_one(
    root: &Path,
    result: &FileDiffResult,
    target: &FileTarget,
    mode: SyncMode,
) -> SyncAction {
    if let Some(error) = &result.read_error {
        return SyncAction::Failed(SyncFailure::Read(error.clone()));
    }

    let action = match (result.status, mode) {
        (DiffStatus::Identical, _) => return SyncAction::Unchanged,
        (DiffStatus::Conflict, SyncMode::Force) => SyncAction::Overwritten,
        (DiffStatus::Conflict, _) => return SyncAction::SkippedConflict,
        (DiffStatus::Create, _) => SyncAction::Created,
        (DiffStatus::Update, _) => SyncAction::Updated,
    };

    if mode == SyncMode::DryRun {
        return action;
    }

    let root = root.to_path_buf();
    let dest = root.join(&target.path);
    let content = target.content.clone();
    let written = tokio::task::spawn_blocking(move || {
        ensure_within(&root, &dest)?;
        write_atomic(&dest, &content)
    })
    .await
    .map_err(|e| io::Error::other(e.to_string()))
    .and_then(|r| r);

    match written {
        Ok(()) => {
            tracing::debug!(path = %target.path.display(), action = action.label(), "wrote file");
            action
        }
        Err(e) => SyncAction::Failed(SyncFailure::Write(WriteError {
            path: target.path.clone(),
            message: e.to_string(),
        })),
    }
}

/// Fail unless `dest` stays inside `root` once existing symlinks are resolved.
fn ensure_within(root: &Path, dest: &Path) -> io::Result<()> {
    let root = root.canonicalize()?;
    let Some(existing) = dest
        .ancestors()
        .skip(1)
        .find(|dir| dir.symlink_metadata().is_ok())
    else {
        return Err(io::Error::other("destination has no existing parent"));
    };

    if existing.canonicalize()?.starts_with(&root) {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "{} resolves outside the project root",
            dest.display()
        )))
    }
}

/// Replace `dest` with `content` atomically, creating parent directories.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be created or the temp file
/// cannot be written or renamed into place.
pub fn write_atomic(dest: &Path, content: &[u8]) -> io::Result<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(dest).map_err(|e| e.error)?;

    Ok(())
}
