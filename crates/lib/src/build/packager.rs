//! The packaging collaborator.

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{AppConfig, EnvironmentConfig};

use super::types::OutputLocation;

/// Errors reported by a `Packager`.
#[derive(Debug, Error)]
pub enum PackagerError {
  #[error("invalid environment: {0}")]
  InvalidEnvironment(String),

  #[error("invalid app config: {0}")]
  InvalidApp(String),

  #[error("io error at {path}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize {what}")]
  Serialize {
    what: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to start {command}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{command} exited with code {code:?}")]
  CommandFailed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The packaging step claimed success without producing the package.
  #[error("packaging finished but {0} was not produced")]
  MissingArtifact(PathBuf),
}

/// Does the packaging work on behalf of the pipeline.
///
/// The two preparation operations are independent of each other and may be
/// polled concurrently. Dropping any returned future must abandon the work
/// without leaving anything running.
pub trait Packager {
  /// Prepared toolchain state.
  type Env;
  /// Prepared application state.
  type App;

  fn prepare_env(&self, config: &EnvironmentConfig) -> impl Future<Output = Result<Self::Env, PackagerError>>;

  fn prepare_app(&self, config: &AppConfig) -> impl Future<Output = Result<Self::App, PackagerError>>;

  /// Produce the package, returning its path.
  fn assemble(
    &self,
    env: &Self::Env,
    app: &Self::App,
    location: &OutputLocation,
  ) -> impl Future<Output = Result<PathBuf, PackagerError>>;
}
