//! Build failures.
//!
//! Every failure carries a stable `ErrorKind` tag and keeps its underlying
//! cause reachable through `std::error::Error::source`.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::build::{Artifact, BuildStageError, PackagerError, Stage};
use crate::platform::ArchError;

/// Outcome of one orchestrated build.
pub type BuildResult = Result<Artifact, BuildError>;

/// Stable classification of a `BuildError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  MissingRequiredConfig,
  InvalidConfig,
  TemplateDirectory,
  ArchitectureNotFound,
  BuildStage,
  Cancelled,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MissingRequiredConfig => "missing_required_config",
      Self::InvalidConfig => "invalid_config",
      Self::TemplateDirectory => "template_directory",
      Self::ArchitectureNotFound => "architecture_not_found",
      Self::BuildStage => "build_stage",
      Self::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum BuildError {
  /// A required environment setting is absent and could not be autodetected.
  #[error("required setting '{key}' is missing: {hint}")]
  MissingRequiredConfig { key: &'static str, hint: String },

  /// A recognized setting has the wrong type.
  #[error("invalid {section} configuration")]
  InvalidConfig {
    section: &'static str,
    #[source]
    source: serde_json::Error,
  },

  /// The template's `native_libs` directory could not be listed.
  #[error("cannot read app template directory {path}; is xwalkAndroidDir or XWALK_APP_TEMPLATE set correctly?")]
  TemplateDirectory {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// No template bundle matches the requested architecture.
  #[error(
    "'arch' is set to '{requested}' but no app template for that architecture was found (architectures found: [{}])",
    found.join(", ")
  )]
  ArchitectureNotFound { requested: String, found: Vec<String> },

  /// A pipeline stage failed.
  #[error("build failed during {stage}")]
  BuildStage {
    stage: Stage,
    #[source]
    source: PackagerError,
  },

  /// The run was aborted before it finished; nothing was reported as built.
  #[error("build cancelled")]
  Cancelled,
}

impl BuildError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::MissingRequiredConfig { .. } => ErrorKind::MissingRequiredConfig,
      Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
      Self::TemplateDirectory { .. } => ErrorKind::TemplateDirectory,
      Self::ArchitectureNotFound { .. } => ErrorKind::ArchitectureNotFound,
      Self::BuildStage { .. } => ErrorKind::BuildStage,
      Self::Cancelled => ErrorKind::Cancelled,
    }
  }

  /// The failing pipeline stage, for `BuildStage` errors.
  pub fn stage(&self) -> Option<Stage> {
    match self {
      Self::BuildStage { stage, .. } => Some(*stage),
      _ => None,
    }
  }

  /// Messages of the underlying causes, outermost first.
  pub fn causes(&self) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = std::error::Error::source(self);
    while let Some(err) = current {
      causes.push(err.to_string());
      current = err.source();
    }
    causes
  }
}

impl From<ArchError> for BuildError {
  fn from(err: ArchError) -> Self {
    match err {
      ArchError::TemplateDirectory { path, source } => Self::TemplateDirectory { path, source },
      ArchError::NotFound { requested, found } => Self::ArchitectureNotFound { requested, found },
    }
  }
}

impl From<BuildStageError> for BuildError {
  fn from(err: BuildStageError) -> Self {
    Self::BuildStage {
      stage: err.stage,
      source: err.source,
    }
  }
}
