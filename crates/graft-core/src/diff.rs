//! Diff and conflict classification.
//!
//! | local            | baseline         | status      |
//! |------------------|------------------|-------------|
//! | missing          | any              | `create`    |
//! | == remote        | any              | `identical` |
//! | == baseline      | != remote        | `update`    |
//! | anything else    |                  | `conflict`  |
//!
//! A file with no baseline that differs from the remote is a conflict: the
//! engine cannot tell a local edit from an older registry copy.

use std::fmt;
use std::path::PathBuf;

use graft_schema::{Fingerprint, ItemName};

use crate::inspect::{LocalFile, LocalState, ReadError};
use crate::lock::SyncLock;
use crate::resolver::ResolutionPlan;

/// Classification of one destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    /// The file does not exist locally.
    Create,
    /// Local content already matches the registry.
    Identical,
    /// Only the registry changed since the last sync.
    Update,
    /// The local file diverged and would be overwritten.
    Conflict,
}

impl DiffStatus {
    /// Lowercase label used in output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Identical => "identical",
            Self::Update => "update",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diff of one file target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiffResult {
    /// Project-relative destination.
    pub path: PathBuf,
    /// Item providing the file.
    pub owner: ItemName,
    /// Classification.
    pub status: DiffStatus,
    /// Fingerprint of the local file, if it exists and is readable.
    pub local_fingerprint: Option<Fingerprint>,
    /// Fingerprint of the registry content.
    pub remote_fingerprint: Fingerprint,
    /// Last-synced fingerprint, if the path is tracked.
    pub baseline: Option<Fingerprint>,
    /// Set when the local file exists but could not be read.
    pub read_error: Option<ReadError>,
}

/// Classify a single file from its local, remote and baseline fingerprints.
pub fn classify(
    local: Option<&Fingerprint>,
    remote: &Fingerprint,
    baseline: Option<&Fingerprint>,
) -> DiffStatus {
    match (local, baseline) {
        (None, _) => DiffStatus::Create,
        (Some(local), _) if local == remote => DiffStatus::Identical,
        (Some(local), Some(baseline)) if local == baseline => DiffStatus::Update,
        _ => DiffStatus::Conflict,
    }
}

/// Diff every target of `plan` against the local state, in plan order.
///
/// Paths absent from `local` are treated as missing.
pub fn diff(plan: &ResolutionPlan, local: &LocalState, lock: &SyncLock) -> Vec<FileDiffResult> {
    plan.file_targets
        .iter()
        .map(|target| {
            let baseline = lock.fingerprint(&target.path).cloned();
            let base = FileDiffResult {
                path: target.path.clone(),
                owner: target.owner.clone(),
                status: DiffStatus::Create,
                local_fingerprint: None,
                remote_fingerprint: target.fingerprint.clone(),
                baseline,
                read_error: None,
            };

            match local.get(&target.path).unwrap_or(&LocalFile::Missing) {
                LocalFile::Missing => base,
                LocalFile::Unreadable { error } => FileDiffResult {
                    status: DiffStatus::Conflict,
                    read_error: Some(error.clone()),
                    ..base
                },
                LocalFile::Present { fingerprint } => FileDiffResult {
                    status: classify(
                        Some(fingerprint),
                        &target.fingerprint,
                        base.baseline.as_ref(),
                    ),
                    local_fingerprint: Some(fingerprint.clone()),
                    ..base
                },
            }
        })
        .collect()
}

/// Count of each status in a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Files to create.
    pub create: usize,
    /// Files already in sync.
    pub identical: usize,
    /// Files with a clean registry update.
    pub update: usize,
    /// Files that diverged locally.
    pub conflict: usize,
}

impl DiffSummary {
    /// Tally `results`.
    pub fn from_results(results: &[FileDiffResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.status {
                DiffStatus::Create => acc.create += 1,
                DiffStatus::Identical => acc.identical += 1,
                DiffStatus::Update => acc.update += 1,
                DiffStatus::Conflict => acc.conflict += 1,
            }
            acc
        })
    }

    /// Returns true if nothing would change.
    pub fn is_clean(&self) -> bool {
        self.create == 0 && self.update == 0 && self.conflict == 0
    }

    /// Total number of files.
    pub fn total(&self) -> usize {
        self.create + self.identical + self.update + self.conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FileTarget;
    use chrono::Utc;
    use std::path::Path;

    fn fp(s: &str) -> Fingerprint {
        Fingerprint::compute(s.as_bytes())
    }

    fn plan(files: &[(&str, &str)]) -> ResolutionPlan {
        ResolutionPlan {
            items: Vec::new(),
            file_targets: files
                .iter()
                .map(|(path, content)| FileTarget {
                    path: PathBuf::from(path),
                    source_path: format!("default/{path}"),
                    owner: ItemName::new("button"),
                    content: content.as_bytes().to_vec(),
                    fingerprint: fp(content),
                })
                .collect(),
            packages: Vec::new(),
        }
    }

    #[test]
    fn classify_table() {
        let remote = fp("remote");
        let old = fp("old");
        let edited = fp("edited");

        assert_eq!(classify(None, &remote, None), DiffStatus::Create);
        assert_eq!(classify(None, &remote, Some(&old)), DiffStatus::Create);
        assert_eq!(classify(Some(&remote), &remote, None), DiffStatus::Identical);
        assert_eq!(classify(Some(&old), &remote, Some(&old)), DiffStatus::Update);
        assert_eq!(classify(Some(&edited), &remote, Some(&old)), DiffStatus::Conflict);
        // First sync over differing content
        assert_eq!(classify(Some(&old), &remote, None), DiffStatus::Conflict);
    }

    #[test]
    fn diff_follows_plan_order() {
        let plan = plan(&[("b.ts", "b"), ("a.ts", "a"), ("c.ts", "c")]);

        let mut local = LocalState::new();
        local.insert("a.ts".into(), LocalFile::Present { fingerprint: fp("a") });
        local.insert("c.ts".into(), LocalFile::Present { fingerprint: fp("c-edited") });

        let results = diff(&plan, &local, &SyncLock::default());
        let statuses: Vec<(&Path, DiffStatus)> = results
            .iter()
            .map(|r| (r.path.as_path(), r.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                (Path::new("b.ts"), DiffStatus::Create),
                (Path::new("a.ts"), DiffStatus::Identical),
                (Path::new("c.ts"), DiffStatus::Conflict),
            ]
        );

        let summary = DiffSummary::from_results(&results);
        assert_eq!(summary.create, 1);
        assert_eq!(summary.identical, 1);
        assert_eq!(summary.conflict, 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_clean());
    }

    #[test]
    fn baseline_turns_divergence_into_update() {
        let plan = plan(&[("a.ts", "v2")]);
        let mut local = LocalState::new();
        local.insert("a.ts".into(), LocalFile::Present { fingerprint: fp("v1") });

        let mut lock = SyncLock::default();
        lock.record(Path::new("a.ts"), &ItemName::new("button"), &fp("v1"), Utc::now());

        let results = diff(&plan, &local, &lock);
        assert_eq!(results[0].status, DiffStatus::Update);
        assert_eq!(results[0].baseline, Some(fp("v1")));
        assert_eq!(results[0].local_fingerprint, Some(fp("v1")));
        assert_eq!(results[0].remote_fingerprint, fp("v2"));
    }

    #[test]
    fn unreadable_file_is_conflict_with_error() {
        let plan = plan(&[("a.ts", "a")]);
        let error = ReadError {
            path: "a.ts".into(),
            message: "Permission denied".into(),
        };
        let mut local = LocalState::new();
        local.insert("a.ts".into(), LocalFile::Unreadable { error: error.clone() });

        let results = diff(&plan, &local, &SyncLock::default());
        assert_eq!(results[0].status, DiffStatus::Conflict);
        assert_eq!(results[0].read_error, Some(error));
        assert!(results[0].local_fingerprint.is_none());
    }
}
