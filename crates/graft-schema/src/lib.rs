//! Shared types and wire format for graft registries.
//!
//! A registry publishes an `index.json` listing [`RegistryItem`]s. Each item
//! is a versionless bundle of source files that the `graft` CLI copies into
//! a consumer project. This crate holds the wire types and the
//! [`Fingerprint`] used to detect local edits; it performs no IO beyond
//! hashing a file on request.

pub mod hash;
pub mod index;
pub mod types;

// Re-exports
pub use hash::*;
pub use index::{IndexError, RegistryIndex};
pub use types::*;

/// File name of the registry index, relative to the registry root.
pub const INDEX_FILE: &str = "index.json";
