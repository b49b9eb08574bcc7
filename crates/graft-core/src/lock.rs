//! Sync lock (`graft.lock`).
//!
//! The lock records, per destination path, the remote fingerprint that was
//! last written to (or found identical in) the project. It is the baseline
//! the diff engine uses to tell "remote changed" apart from "user edited".

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use graft_schema::{Fingerprint, ItemName};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::paths::path_key;
use crate::sync::SyncReport;

/// Last-synced state of a project, persisted as TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLock {
    /// Entries sorted by path.
    #[serde(default)]
    pub file: Vec<LockedFile>,
}

/// One synced destination file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedFile {
    /// Project-relative path, `/` separated.
    pub path: String,
    /// Item that owns the file.
    pub item: ItemName,
    /// Remote fingerprint at the time of the sync.
    pub fingerprint: Fingerprint,
    /// When the fingerprint was recorded.
    pub synced_at: DateTime<Utc>,
}

impl SyncLock {
    /// Load the lock at `path`.
    ///
    /// A missing file is an empty lock, so a first sync is handled the same
    /// way as later ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .context("Failed to read graft.lock")?;

        let mut lock: SyncLock = toml::from_str(&content).context("Failed to parse graft.lock")?;
        lock.file.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(lock)
    }

    /// Atomically persist the lock to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the write or the rename fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize graft.lock")?;

        // Write to a sibling temp file, then rename over the real one
        let temp_path = path.with_extension("lock.tmp");
        fs::write(&temp_path, &content)
            .await
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }

    /// Baseline fingerprint for a project-relative path, if tracked.
    pub fn fingerprint(&self, path: &Path) -> Option<&Fingerprint> {
        self.get(&path_key(path)).map(|entry| &entry.fingerprint)
    }

    /// Entry for a `/` separated path key.
    pub fn get(&self, key: &str) -> Option<&LockedFile> {
        self.file
            .binary_search_by(|entry| entry.path.as_str().cmp(key))
            .ok()
            .map(|pos| &self.file[pos])
    }

    /// Record `fingerprint` as the baseline for `path`.
    ///
    /// The timestamp of an existing entry is kept when neither the
    /// fingerprint nor the owner changed. Returns true if the lock changed.
    pub fn record(
        &mut self,
        path: &Path,
        item: &ItemName,
        fingerprint: &Fingerprint,
        at: DateTime<Utc>,
    ) -> bool {
        let key = path_key(path);
        match self
            .file
            .binary_search_by(|entry| entry.path.as_str().cmp(&key))
        {
            Ok(pos) => {
                let entry = &mut self.file[pos];
                if entry.fingerprint == *fingerprint && entry.item == *item {
                    return false;
                }
                entry.item = item.clone();
                entry.fingerprint = fingerprint.clone();
                entry.synced_at = at;
                true
            }
            Err(pos) => {
                self.file.insert(
                    pos,
                    LockedFile {
                        path: key,
                        item: item.clone(),
                        fingerprint: fingerprint.clone(),
                        synced_at: at,
                    },
                );
                true
            }
        }
    }

    /// Record every path a sync left in agreement with the registry.
    ///
    /// Conflicted and failed paths keep their previous entry. Dry runs are
    /// ignored. Returns the number of entries that changed.
    pub fn apply_report(&mut self, report: &SyncReport) -> usize {
        if report.dry_run {
            return 0;
        }

        let now = Utc::now();
        report
            .outcomes
            .iter()
            .filter(|outcome| outcome.action.is_in_sync())
            .filter(|outcome| self.record(&outcome.path, &outcome.owner, &outcome.fingerprint, now))
            .count()
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.file.len()
    }

    /// Returns true if no file is tracked.
    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffStatus;
    use crate::inspect::ReadError;
    use crate::sync::{SyncAction, SyncFailure, SyncOutcome};
    use std::path::PathBuf;

    fn outcome(path: &str, content: &[u8], action: SyncAction) -> SyncOutcome {
        SyncOutcome {
            path: PathBuf::from(path),
            owner: ItemName::new("button"),
            status: DiffStatus::Create,
            fingerprint: Fingerprint::compute(content),
            action,
        }
    }

    #[tokio::test]
    async fn missing_lock_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SyncLock::load(&dir.path().join("graft.lock")).await.unwrap();
        assert!(lock.is_empty());
    }

    #[tokio::test]
    async fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graft.lock");

        let mut lock = SyncLock::default();
        lock.record(
            Path::new("components/ui/button.tsx"),
            &ItemName::new("button"),
            &Fingerprint::compute(b"button"),
            Utc::now(),
        );
        lock.save(&path).await.unwrap();

        assert!(!dir.path().join("graft.lock.tmp").exists());
        let loaded = SyncLock::load(&path).await.unwrap();
        assert_eq!(loaded, lock);
        assert_eq!(
            loaded.fingerprint(Path::new("components/ui/button.tsx")),
            Some(&Fingerprint::compute(b"button"))
        );
    }

    #[test]
    fn entries_stay_sorted() {
        let mut lock = SyncLock::default();
        let name = ItemName::new("x");
        let fp = Fingerprint::compute(b"x");
        for path in ["z.ts", "a.ts", "m/b.ts"] {
            lock.record(Path::new(path), &name, &fp, Utc::now());
        }
        let paths: Vec<&str> = lock.file.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.ts", "m/b.ts", "z.ts"]);
    }

    #[test]
    fn record_same_fingerprint_keeps_timestamp() {
        let mut lock = SyncLock::default();
        let path = Path::new("a.ts");
        let name = ItemName::new("a");
        let fp = Fingerprint::compute(b"a");
        let first = Utc::now();

        assert!(lock.record(path, &name, &fp, first));
        assert!(!lock.record(path, &name, &fp, first + chrono::Duration::seconds(5)));
        assert_eq!(lock.file[0].synced_at, first);

        assert!(lock.record(path, &name, &Fingerprint::compute(b"b"), Utc::now()));
    }

    #[test]
    fn apply_report_skips_conflicts_and_failures() {
        let report = SyncReport {
            outcomes: vec![
                outcome("created.ts", b"1", SyncAction::Created),
                outcome("same.ts", b"2", SyncAction::Unchanged),
                outcome("conflict.ts", b"3", SyncAction::SkippedConflict),
                outcome(
                    "broken.ts",
                    b"4",
                    SyncAction::Failed(SyncFailure::Read(ReadError {
                        path: PathBuf::from("broken.ts"),
                        message: "permission denied".into(),
                    })),
                ),
            ],
            packages: Vec::new(),
            dry_run: false,
        };

        let mut lock = SyncLock::default();
        assert_eq!(lock.apply_report(&report), 2);
        assert!(lock.get("created.ts").is_some());
        assert!(lock.get("same.ts").is_some());
        assert!(lock.get("conflict.ts").is_none());
        assert!(lock.get("broken.ts").is_none());
    }

    #[test]
    fn dry_run_report_changes_nothing() {
        let report = SyncReport {
            outcomes: vec![outcome("created.ts", b"1", SyncAction::Created)],
            packages: Vec::new(),
            dry_run: true,
        };
        let mut lock = SyncLock::default();
        assert_eq!(lock.apply_report(&report), 0);
        assert!(lock.is_empty());
    }
}
