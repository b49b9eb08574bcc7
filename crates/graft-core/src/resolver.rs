//! Dependency resolution and plan building.
//!
//! Item dependencies mean "also install", not "must be built first", so a
//! cycle is not an error: the second visit of an in-progress item is treated
//! as already resolved.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use futures::{StreamExt, TryStreamExt, stream};
use graft_schema::{Fingerprint, ItemName, RegistryIndex, RegistryItem};
use thiserror::Error;

use crate::client::{ContentFetcher, FetchError};
use crate::paths::sanitize_path;

/// Maximum number of item files fetched at once.
const FETCH_CONCURRENCY: usize = 16;

/// Failure to turn requested names into a plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A requested name, or a dependency of a requested item, is not in the index.
    #[error("Unknown registry item '{name}'{}", required_suffix(.required_by.as_ref()))]
    UnknownItem {
        /// The missing name.
        name: ItemName,
        /// The item that depends on it, if it was not requested directly.
        required_by: Option<ItemName>,
    },

    /// Two different items would write the same destination file.
    #[error("Items '{first}' and '{second}' both provide '{}'", .path.display())]
    SharedTarget {
        /// Destination path.
        path: PathBuf,
        /// Item that claimed the path first.
        first: ItemName,
        /// Item that tried to claim it again.
        second: ItemName,
    },

    /// An item declares a path that would land outside the project.
    #[error("Item '{item}' declares unsafe path '{path}': {reason}")]
    UnsafePath {
        /// Offending item.
        item: ItemName,
        /// Declared path, as published.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// An item file could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

fn required_suffix(required_by: Option<&ItemName>) -> String {
    required_by
        .map(|parent| format!(" (required by '{parent}')"))
        .unwrap_or_default()
}

/// One destination file and the content it should hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTarget {
    /// Sanitized project-relative destination.
    pub path: PathBuf,
    /// Registry-relative path the content came from.
    pub source_path: String,
    /// Item that provides the file.
    pub owner: ItemName,
    /// Remote content.
    pub content: Vec<u8>,
    /// Fingerprint of `content`.
    pub fingerprint: Fingerprint,
}

/// Everything a sync needs to know about the requested items.
///
/// Built fresh for every invocation and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPlan {
    /// Items in install order: every dependency before its dependents.
    pub items: Vec<RegistryItem>,
    /// Destination files, following `items` and then each item's `files`.
    pub file_targets: Vec<FileTarget>,
    /// Package dependencies of all items, sorted and deduplicated.
    pub packages: Vec<String>,
}

impl ResolutionPlan {
    /// Names of the planned items, in install order.
    pub fn item_names(&self) -> Vec<&ItemName> {
        self.items.iter().map(|item| &item.name).collect()
    }

    /// Number of file targets.
    pub fn len(&self) -> usize {
        self.file_targets.len()
    }

    /// Returns true if the plan writes no files.
    pub fn is_empty(&self) -> bool {
        self.file_targets.is_empty()
    }
}

/// Resolves requested names to the full install set, dependencies first.
///
/// Names are normalized and deduplicated. Items are emitted in post-order of
/// a depth-first walk that starts from each requested name in turn, so the
/// result is deterministic for a given index and request.
///
/// # Errors
///
/// Returns [`ResolveError::UnknownItem`] if a requested name or any
/// dependency is missing from the index.
pub fn resolve_order<'a, S: AsRef<str>>(
    names: &[S],
    index: &'a RegistryIndex,
) -> Result<Vec<&'a RegistryItem>, ResolveError> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut visiting = HashSet::new();

    for name in names {
        let name = ItemName::new(name.as_ref());
        resolve_recursive(&name, None, index, &mut order, &mut visited, &mut visiting)?;
    }

    Ok(order)
}

fn resolve_recursive<'a>(
    name: &ItemName,
    required_by: Option<&ItemName>,
    index: &'a RegistryIndex,
    order: &mut Vec<&'a RegistryItem>,
    visited: &mut HashSet<ItemName>,
    visiting: &mut HashSet<ItemName>,
) -> Result<(), ResolveError> {
    if visited.contains(name) {
        return Ok(());
    }

    if visiting.contains(name) {
        tracing::debug!(item = %name, "dependency cycle, already in progress");
        return Ok(());
    }

    let item = index.find(name).ok_or_else(|| ResolveError::UnknownItem {
        name: name.clone(),
        required_by: required_by.cloned(),
    })?;

    visiting.insert(name.clone());

    for dep in &item.dependencies {
        resolve_recursive(dep, Some(name), index, order, visited, visiting)?;
    }

    visiting.remove(name);
    visited.insert(name.clone());
    order.push(item);

    Ok(())
}

struct PendingTarget {
    path: PathBuf,
    source_path: String,
    owner: ItemName,
}

/// Resolves `names` and fetches the content of every file they install.
///
/// Ordering and destination paths are fully validated before the first
/// fetch, so an unknown item or an unsafe path never costs a request.
///
/// # Errors
///
/// Returns [`ResolveError::UnknownItem`], [`ResolveError::UnsafePath`] or
/// [`ResolveError::SharedTarget`] for an unusable request, and
/// [`ResolveError::Fetch`] if any file cannot be fetched.
pub async fn resolve<S: AsRef<str>>(
    names: &[S],
    index: &RegistryIndex,
    fetcher: &dyn ContentFetcher,
    implementation: &str,
) -> Result<ResolutionPlan, ResolveError> {
    let items = resolve_order(names, index)?;

    let mut owners: HashMap<PathBuf, ItemName> = HashMap::new();
    let mut pending = Vec::new();
    for item in &items {
        if item.is_grouping() {
            tracing::debug!(item = %item.name, "grouping item, no files");
        }

        for file in &item.files {
            let path = sanitize_path(file).map_err(|e| ResolveError::UnsafePath {
                item: item.name.clone(),
                path: file.clone(),
                reason: e.to_string(),
            })?;

            if let Some(first) = owners.get(&path) {
                if *first == item.name {
                    continue;
                }
                return Err(ResolveError::SharedTarget {
                    path,
                    first: first.clone(),
                    second: item.name.clone(),
                });
            }
            owners.insert(path.clone(), item.name.clone());

            pending.push(PendingTarget {
                path,
                source_path: item.source_path(file, implementation),
                owner: item.name.clone(),
            });
        }
    }

    tracing::debug!(
        items = items.len(),
        files = pending.len(),
        "plan validated, fetching item files"
    );

    // `buffered` keeps plan order while fetching concurrently
    let file_targets: Vec<FileTarget> = stream::iter(pending)
        .map(|target| async move {
            let content = fetcher.fetch_file(&target.source_path).await?;
            Ok::<_, FetchError>(FileTarget {
                fingerprint: Fingerprint::compute(&content),
                path: target.path,
                source_path: target.source_path,
                owner: target.owner,
                content,
            })
        })
        .buffered(FETCH_CONCURRENCY)
        .try_collect()
        .await?;

    let packages: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.package_dependencies.iter().map(String::as_str))
        .collect();

    Ok(ResolutionPlan {
        items: items.into_iter().cloned().collect(),
        file_targets,
        packages: packages.into_iter().map(str::to_string).collect(),
    })
}
