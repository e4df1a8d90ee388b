//! Architecture matching against an app template.
//!
//! An app template ships one entry per prebuilt architecture under
//! `<template>/native_libs` (e.g. `armeabi-v7a`, `x86`). A requested
//! architecture matches an entry when their first three characters agree, so
//! `arm` selects `armeabi-v7a`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{ARCH_PREFIX_LEN, NATIVE_LIBS_DIR};

#[derive(Debug, Error)]
pub enum ArchError {
  /// The `native_libs` directory could not be listed.
  #[error("cannot read app template directory {path}")]
  TemplateDirectory {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// No entry shares the requested prefix.
  #[error("no app template for architecture '{requested}' (found: [{}])", found.join(", "))]
  NotFound { requested: String, found: Vec<String> },
}

/// Returns true when `a` and `b` agree on their first three characters.
///
/// Strings shorter than the prefix compare in full, so `"ar"` only matches `"ar"`.
pub fn prefix_matches(a: &str, b: &str) -> bool {
  a.chars().take(ARCH_PREFIX_LEN).eq(b.chars().take(ARCH_PREFIX_LEN))
}

/// The architectures available in one app template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchitectureCatalog {
  entries: Vec<String>,
}

impl ArchitectureCatalog {
  pub fn new(entries: Vec<String>) -> Self {
    Self { entries }
  }

  /// List `<template_dir>/native_libs`.
  ///
  /// Entries are sorted by name. Directory listing order differs between
  /// filesystems, and matching takes the first hit, so a fixed order keeps
  /// selection reproducible.
  pub async fn discover(template_dir: &Path) -> Result<Self, ArchError> {
    let dir = template_dir.join(NATIVE_LIBS_DIR);
    let to_err = |source| ArchError::TemplateDirectory {
      path: dir.clone(),
      source,
    };

    let mut read_dir = tokio::fs::read_dir(&dir).await.map_err(to_err)?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(to_err)? {
      entries.push(entry.file_name().to_string_lossy().into_owned());
    }
    entries.sort();

    debug!(dir = %dir.display(), entries = ?entries, "discovered architectures");
    Ok(Self { entries })
  }

  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  /// First entry, in catalog order, sharing `requested`'s prefix.
  pub fn select(&self, requested: &str) -> Result<&str, ArchError> {
    self
      .entries
      .iter()
      .find(|entry| prefix_matches(entry, requested))
      .map(String::as_str)
      .ok_or_else(|| ArchError::NotFound {
        requested: requested.to_string(),
        found: self.entries.clone(),
      })
  }
}

/// Select the template bundle for `requested`.
///
/// With no requested architecture the build is architecture-independent and
/// the template is not inspected at all.
pub async fn select_architecture(template_dir: &Path, requested: Option<&str>) -> Result<Option<String>, ArchError> {
  let Some(requested) = requested else {
    return Ok(None);
  };

  let catalog = ArchitectureCatalog::discover(template_dir).await?;
  let selected = catalog.select(requested)?;
  debug!(requested, selected, "matched architecture");
  Ok(Some(selected.to_string()))
}
