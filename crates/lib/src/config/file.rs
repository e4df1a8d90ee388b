//! Build file loading.
//!
//! A build file is TOML with a shared `[options]` block and one
//! `[targets.<name>]` block per target. Values are kept untyped until
//! resolution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::ConfigMap;

#[derive(Debug, Error)]
pub enum ConfigFileError {
  #[error("failed to read build file {path}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse build file {path}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("unknown target '{name}' (available: {})", available.join(", "))]
  UnknownTarget { name: String, available: Vec<String> },
}

/// Parsed build file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuildFile {
  /// Shared defaults applied to every target.
  #[serde(default)]
  pub options: ConfigMap,

  /// Per-target overrides, keyed by target name.
  #[serde(default)]
  pub targets: BTreeMap<String, ConfigMap>,
}

impl BuildFile {
  pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let file = Self::parse(&content).map_err(|source| ConfigFileError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    debug!(path = %path.display(), targets = file.targets.len(), "loaded build file");
    Ok(file)
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Target names in iteration (name) order.
  pub fn target_names(&self) -> Vec<String> {
    self.targets.keys().cloned().collect()
  }

  pub fn target(&self, name: &str) -> Result<&ConfigMap, ConfigFileError> {
    self.targets.get(name).ok_or_else(|| ConfigFileError::UnknownTarget {
      name: name.to_string(),
      available: self.target_names(),
    })
  }
}
