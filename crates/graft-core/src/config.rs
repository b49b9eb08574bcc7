//! Project configuration (`graft.toml`).
//!
//! The file is optional. A project without one syncs from
//! [`DEFAULT_REGISTRY`] using the [`DEFAULT_IMPLEMENTATION`] sources.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Registry used when neither `graft.toml` nor the command line names one.
pub const DEFAULT_REGISTRY: &str = "https://graft.dev/r";

/// Implementation directory used for primitive item sources by default.
pub const DEFAULT_IMPLEMENTATION: &str = "default";

/// Settings parsed from a `graft.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Registry source: an http(s) URL or a local directory.
    #[serde(default = "default_registry")]
    pub registry: String,
    /// Implementation directory primitive items are fetched from.
    #[serde(default = "default_implementation")]
    pub implementation: String,
}

fn default_registry() -> String {
    DEFAULT_REGISTRY.to_string()
}

fn default_implementation() -> String {
    DEFAULT_IMPLEMENTATION.to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            implementation: default_implementation(),
        }
    }
}

impl ProjectConfig {
    /// Load and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read graft.toml")?;

        let config: ProjectConfig =
            toml::from_str(&content).context("Failed to parse graft.toml")?;

        Ok(config)
    }

    /// Load the config at `path`, falling back to defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "no graft.toml, using defaults");
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    /// Write the config to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize graft.toml")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
