//! Project paths and sanitization of registry-declared paths.
//!
//! Every destination path comes from a registry record, so it is untrusted:
//! it must stay relative and must not climb out of the project root.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Project configuration file, at the project root.
pub const CONFIG_FILE: &str = "graft.toml";

/// Sync lock (last-synced fingerprints), at the project root.
pub const LOCK_FILE: &str = "graft.lock";

/// A registry path that cannot be placed inside the project root.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path contains a `..` component.
    #[error("path traversal in '{0}'")]
    Traversal(String),

    /// The path is absolute or carries a drive prefix.
    #[error("absolute path '{0}'")]
    Absolute(String),

    /// Nothing is left after removing `.` components.
    #[error("empty path")]
    Empty,
}

/// Validate a relative path from an untrusted source.
///
/// `.` components are dropped; `..`, root and prefix components are
/// rejected. The returned path is always non-empty and relative.
///
/// ```
/// use graft_core::paths::sanitize_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     sanitize_path("./components/ui/button.tsx").unwrap(),
///     PathBuf::from("components/ui/button.tsx")
/// );
/// assert!(sanitize_path("../outside.tsx").is_err());
/// assert!(sanitize_path("/etc/passwd").is_err());
/// ```
///
/// # Errors
///
/// Returns a [`PathError`] describing why the path is unsafe.
pub fn sanitize_path(path: impl AsRef<Path>) -> Result<PathBuf, PathError> {
    let path = path.as_ref();
    let display = path.to_string_lossy();

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => return Err(PathError::Traversal(display.to_string())),
            Component::Prefix(_) | Component::RootDir => {
                return Err(PathError::Absolute(display.to_string()));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(PathError::Empty);
    }

    Ok(normalized)
}

/// Join a root with an untrusted relative path.
///
/// # Errors
///
/// Returns a [`PathError`] if the path is not safe to place under `root`.
pub fn safe_join(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf, PathError> {
    Ok(root.as_ref().join(sanitize_path(path)?))
}

/// Stable, platform-independent key for a relative path (`/` separated).
pub fn path_key(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `graft.toml` under `root`.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// `graft.lock` under `root`.
pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}

/// Walk up from `start` to the nearest directory holding a `graft.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}
