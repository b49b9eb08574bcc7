//! Local project inspection.
//!
//! Reads the files a plan would touch and fingerprints them. Inspection is
//! best effort per path: one unreadable file never hides the state of the
//! others.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::{StreamExt, stream};
use graft_schema::Fingerprint;
use thiserror::Error;

/// Maximum number of local files read at once.
const READ_CONCURRENCY: usize = 16;

/// A local file exists but could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot read {}: {message}", .path.display())]
pub struct ReadError {
    /// Project-relative path.
    pub path: PathBuf,
    /// Underlying I/O error message.
    pub message: String,
}

/// State of one destination path in the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalFile {
    /// Nothing exists at the path.
    Missing,
    /// A readable regular file.
    Present {
        /// Fingerprint of the file's content.
        fingerprint: Fingerprint,
    },
    /// Something exists at the path but its content is unavailable.
    Unreadable {
        /// What went wrong.
        error: ReadError,
    },
}

impl LocalFile {
    /// Fingerprint of a readable file.
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            Self::Present { fingerprint } => Some(fingerprint),
            _ => None,
        }
    }
}

/// Local state keyed by project-relative path.
pub type LocalState = BTreeMap<PathBuf, LocalFile>;

/// Inspect `paths` (relative to `root`) concurrently.
pub async fn inspect<'a, I>(root: &Path, paths: I) -> LocalState
where
    I: IntoIterator<Item = &'a Path>,
{
    stream::iter(paths)
        .map(|relative| async move {
            let state = inspect_one(root, relative).await;
            (relative.to_path_buf(), state)
        })
        .buffer_unordered(READ_CONCURRENCY)
        .collect()
        .await
}

async fn inspect_one(root: &Path, relative: &Path) -> LocalFile {
    let full = root.join(relative);
    let unreadable = |message: String| LocalFile::Unreadable {
        error: ReadError {
            path: relative.to_path_buf(),
            message,
        },
    };

    match tokio::fs::read(&full).await {
        Ok(content) => LocalFile::Present {
            fingerprint: Fingerprint::compute(&content),
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // A dangling symlink reports NotFound but still occupies the path
            match tokio::fs::symlink_metadata(&full).await {
                Ok(meta) if meta.file_type().is_symlink() => {
                    unreadable("broken symbolic link".to_string())
                }
                _ => LocalFile::Missing,
            }
        }
        Err(e) => {
            tracing::debug!(path = %full.display(), error = %e, "local file unreadable");
            unreadable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classifies_missing_present_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.ts"), "a\r\nb\r\n").unwrap();
        std::fs::create_dir(dir.path().join("folder.ts")).unwrap();

        let paths = [
            Path::new("present.ts"),
            Path::new("missing.ts"),
            Path::new("folder.ts"),
        ];
        let state = inspect(dir.path(), paths).await;

        assert_eq!(state.len(), 3);
        assert_eq!(
            state[Path::new("present.ts")].fingerprint(),
            Some(&Fingerprint::compute(b"a\nb\n"))
        );
        assert_eq!(state[Path::new("missing.ts")], LocalFile::Missing);
        assert!(matches!(
            &state[Path::new("folder.ts")],
            LocalFile::Unreadable { error } if error.path == Path::new("folder.ts")
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("link.ts"))
            .unwrap();

        let state = inspect(dir.path(), [Path::new("link.ts")]).await;
        assert!(matches!(
            state[Path::new("link.ts")],
            LocalFile::Unreadable { .. }
        ));
    }

    #[tokio::test]
    async fn nested_missing_parent_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let state = inspect(dir.path(), [Path::new("components/ui/button.tsx")]).await;
        assert_eq!(
            state[Path::new("components/ui/button.tsx")],
            LocalFile::Missing
        );
    }
}
