//! Inputs and outputs of a single build.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{AppConfig, EnvironmentConfig};

const DEFAULT_NAME: &str = "app";
const DEFAULT_VERSION: &str = "0.0.1";
const SHARED_ARCH: &str = "shared";

/// Everything a pipeline run needs, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildContext {
  env: EnvironmentConfig,
  app: AppConfig,
  out_dir: PathBuf,
  architecture: Option<String>,
}

impl BuildContext {
  /// `architecture` is the selected template bundle, `None` for a shared build.
  pub fn new(env: EnvironmentConfig, app: AppConfig, out_dir: PathBuf, architecture: Option<String>) -> Self {
    Self {
      env,
      app,
      out_dir,
      architecture,
    }
  }

  pub fn env(&self) -> &EnvironmentConfig {
    &self.env
  }

  pub fn app(&self) -> &AppConfig {
    &self.app
  }

  pub fn out_dir(&self) -> &Path {
    &self.out_dir
  }

  pub fn architecture(&self) -> Option<&str> {
    self.architecture.as_deref()
  }
}

/// Where a build writes its intermediate files and its final package.
///
/// Naming: intermediates under `<out>/<name>`, the package at
/// `<out>/<name>-<version>-<arch>.apk` with `shared` standing in for the
/// architecture of an architecture-independent build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLocation {
  pub out_dir: PathBuf,
  pub build_dir: PathBuf,
  pub artifact: PathBuf,
}

impl OutputLocation {
  pub fn for_context(ctx: &BuildContext) -> Self {
    let name = ctx
      .app()
      .name()
      .map(|n| sanitise(&n))
      .filter(|n| !n.chars().all(|c| c == '.'))
      .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let version = ctx.app().version().unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let arch = ctx.architecture().unwrap_or(SHARED_ARCH);

    let out_dir = ctx.out_dir().to_path_buf();
    Self {
      build_dir: out_dir.join(&name),
      artifact: out_dir.join(format!("{name}-{version}-{arch}.apk")),
      out_dir,
    }
  }
}

/// Keep ASCII alphanumerics, `-`, `_` and `.`; everything else becomes `_`.
fn sanitise(name: &str) -> String {
  name
    .trim()
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
        c
      } else {
        '_'
      }
    })
    .collect()
}

/// A successfully packaged build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
  pub path: PathBuf,
  pub architecture: Option<String>,
}
