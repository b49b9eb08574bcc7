//! Registry item wire types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// A registry item as published in `index.json`.
///
/// This structure is shared between the registry publisher (producer) and the
/// engine (consumer). Only `name` and `files` are required on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryItem {
    /// Unique item name (e.g. "button")
    pub name: ItemName,

    /// How the item's sources are laid out in the registry
    #[serde(rename = "type", default)]
    pub kind: ItemKind,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Fixed documentation path used by [`ItemKind::Signature`] items
    #[serde(default)]
    pub docs_path: String,

    /// Repository-relative source paths that make up the item's payload
    pub files: Vec<String>,

    /// Other registry items this item requires
    #[serde(default)]
    pub dependencies: Vec<ItemName>,

    /// External packages the item's sources import (never installed by graft)
    #[serde(default)]
    pub package_dependencies: Vec<String>,

    /// Opaque out-of-band install metadata
    #[serde(default)]
    pub install: BTreeMap<String, String>,
}

/// Errors that can occur when validating a [`RegistryItem`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// The item name is empty after normalization.
    #[error("Item name must not be empty")]
    EmptyName,

    /// The item lists itself as a dependency.
    #[error("Item '{0}' depends on itself")]
    SelfDependency(ItemName),

    /// A `files` entry is empty.
    #[error("Item '{0}' declares an empty file path")]
    EmptyFile(ItemName),
}

impl RegistryItem {
    /// Create a primitive item with the given files and no dependencies.
    pub fn new(name: impl Into<ItemName>, files: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Primitive,
            title: String::new(),
            description: String::new(),
            docs_path: String::new(),
            files,
            dependencies: Vec::new(),
            package_dependencies: Vec::new(),
            install: BTreeMap::new(),
        }
    }

    /// Validates the item's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::EmptyName`] if the name is empty,
    /// [`ItemError::SelfDependency`] if `dependencies` contains the item's own
    /// name, or [`ItemError::EmptyFile`] if a `files` entry is blank.
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.name.is_empty() {
            return Err(ItemError::EmptyName);
        }
        if self.dependencies.contains(&self.name) {
            return Err(ItemError::SelfDependency(self.name.clone()));
        }
        if self.files.iter().any(|f| f.trim().is_empty()) {
            return Err(ItemError::EmptyFile(self.name.clone()));
        }
        Ok(())
    }

    /// Registry-relative path the payload of `file` is fetched from.
    ///
    /// Signature items live under their fixed `docs_path`; primitive items
    /// live under the directory of the selected implementation.
    pub fn source_path(&self, file: &str, implementation: &str) -> String {
        let file = file.trim_start_matches('/');
        let prefix = match self.kind {
            ItemKind::Signature => self.docs_path.trim_matches('/'),
            ItemKind::Primitive => implementation.trim_matches('/'),
        };
        if prefix.is_empty() {
            file.to_string()
        } else {
            format!("{prefix}/{file}")
        }
    }

    /// Returns true if the item contributes no files of its own.
    pub fn is_grouping(&self) -> bool {
        self.files.is_empty()
    }
}

/// Layout of an item's sources inside the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Sources are generated per implementation (default).
    #[default]
    Primitive,
    /// Sources live at a fixed documentation path.
    Signature,
}

impl ItemKind {
    /// Lowercase wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Primitive => "primitive",
            ItemKind::Signature => "signature",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized registry item name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Create a new item name, trimming and lowercasing the input.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for ItemName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ItemName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.trim().to_lowercase()
    }
}

impl PartialEq<&str> for ItemName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.trim().to_lowercase()
    }
}

impl Borrow<str> for ItemName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ItemName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<ItemName> for String {
    fn from(name: ItemName) -> Self {
        name.0
    }
}
