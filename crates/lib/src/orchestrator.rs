//! Top-level build driver.
//!
//! Runs one target end to end:
//!
//! 1. Merge the shared options, then the target block (target wins)
//! 2. Split keys into environment and application settings
//! 3. Fill in the template directory from `XWALK_APP_TEMPLATE` and the SDK
//!    directory from the location of the `android` command, when unset
//! 4. Match the requested architecture against the template, if one was requested
//! 5. Run the build pipeline
//!
//! Progress and failures are reported through `tracing`; the result itself
//! is returned as a `BuildResult`.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::build::{Artifact, BuildContext, BuildPipeline, OutputLocation, Packager};
use crate::config::{AppConfig, ConfigMap, EnvironmentConfig, environment_keys, keys, resolve};
use crate::consts::{ANDROID_COMMAND, DEFAULT_OUT_DIR, TEMPLATE_ENV_VAR};
use crate::error::{BuildError, BuildResult};
use crate::platform::{Environment, ToolLocator, select_architecture};

/// Fully resolved inputs of a build, before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildPlan {
  pub env: EnvironmentConfig,
  pub app: AppConfig,
  pub out_dir: PathBuf,
  /// Selected template bundle; `None` for an architecture-independent build.
  pub architecture: Option<String>,
  pub location: OutputLocation,
}

impl BuildPlan {
  pub fn into_context(self) -> BuildContext {
    BuildContext::new(self.env, self.app, self.out_dir, self.architecture)
  }
}

pub struct Orchestrator<P, L> {
  packager: P,
  locator: L,
  env: Environment,
}

impl<P: Packager, L: ToolLocator> Orchestrator<P, L> {
  pub fn new(packager: P, locator: L, env: Environment) -> Self {
    Self { packager, locator, env }
  }

  pub fn packager(&self) -> &P {
    &self.packager
  }

  pub fn locator(&self) -> &L {
    &self.locator
  }

  /// Resolve configuration and the target architecture without building.
  pub async fn plan(&self, options: &ConfigMap, target: &ConfigMap) -> Result<BuildPlan, BuildError> {
    let resolved = resolve(&environment_keys(), [options, target]);
    debug!(env = ?resolved.env.keys(), app = ?resolved.app.keys(), "resolved configuration");

    let mut env = EnvironmentConfig::from_map(&resolved.env).map_err(|source| BuildError::InvalidConfig {
      section: "environment",
      source,
    })?;
    let app = AppConfig::new(resolved.app);

    env.verbose = target.get(keys::VERBOSE).and_then(|v| v.as_bool()).unwrap_or(false);
    let out_dir = PathBuf::from(app.get_string(keys::OUT_DIR).unwrap_or_else(|| DEFAULT_OUT_DIR.to_string()));

    let template_dir = match env.xwalk_android_dir.take() {
      Some(dir) => dir,
      None => self.template_from_env()?,
    };
    env.xwalk_android_dir = Some(template_dir.clone());

    if env.android_sdk_dir.is_none() {
      env.android_sdk_dir = Some(self.detect_sdk().await?);
    }

    let architecture = select_architecture(&template_dir, env.arch.as_deref()).await?;
    match &architecture {
      Some(arch) => info!(requested = env.arch.as_deref().unwrap_or_default(), selected = %arch, "architecture selected"),
      None => debug!("no architecture requested, building shared package"),
    }

    let context = BuildContext::new(env, app, out_dir, architecture);
    let location = OutputLocation::for_context(&context);
    Ok(BuildPlan {
      env: context.env().clone(),
      app: context.app().clone(),
      out_dir: context.out_dir().to_path_buf(),
      architecture: context.architecture().map(str::to_string),
      location,
    })
  }

  /// Build one target, logging the outcome.
  pub async fn run_build(&self, options: &ConfigMap, target: &ConfigMap) -> BuildResult {
    let result = self.execute(options, target).await;

    match &result {
      Ok(artifact) => info!(path = %artifact.path.display(), "*** DONE, output apk path is {}", artifact.path.display()),
      Err(e) => {
        error!(kind = %e.kind(), "!!! ERROR: {e}");
        for cause in e.causes() {
          error!("  caused by: {cause}");
        }
      }
    }

    result
  }

  /// Build one target unless `shutdown` completes first.
  ///
  /// When `shutdown` wins, the in-flight build is dropped and the result is
  /// `BuildError::Cancelled`, even if packaging was about to finish.
  pub async fn run_build_until<F>(&self, options: &ConfigMap, target: &ConfigMap, shutdown: F) -> BuildResult
  where
    F: Future<Output = ()>,
  {
    tokio::select! {
      biased;
      _ = shutdown => {
        warn!("build cancelled");
        Err(BuildError::Cancelled)
      }
      result = self.run_build(options, target) => result,
    }
  }

  async fn execute(&self, options: &ConfigMap, target: &ConfigMap) -> BuildResult {
    let plan = self.plan(options, target).await?;
    let architecture = plan.architecture.clone();
    info!(out_dir = %plan.out_dir.display(), "starting build");

    let mut pipeline = BuildPipeline::new(&self.packager);
    let path = pipeline.run(plan.into_context()).await?;

    Ok(Artifact { path, architecture })
  }

  fn template_from_env(&self) -> Result<PathBuf, BuildError> {
    match self.env.get(TEMPLATE_ENV_VAR) {
      Some(dir) => {
        debug!(dir, "using app template from {}", TEMPLATE_ENV_VAR);
        Ok(PathBuf::from(dir))
      }
      None => Err(BuildError::MissingRequiredConfig {
        key: keys::XWALK_ANDROID_DIR,
        hint: format!(
          "no xwalk app template specified; use {} in the build file or set {}",
          keys::XWALK_ANDROID_DIR,
          TEMPLATE_ENV_VAR
        ),
      }),
    }
  }

  /// The SDK root is two levels above `<sdk>/tools/android`.
  async fn detect_sdk(&self) -> Result<PathBuf, BuildError> {
    let missing = || BuildError::MissingRequiredConfig {
      key: keys::ANDROID_SDK_DIR,
      hint: format!(
        "set {} in the build file or put the '{}' command on PATH",
        keys::ANDROID_SDK_DIR,
        ANDROID_COMMAND
      ),
    };

    let command = self.locator.locate(ANDROID_COMMAND).await.ok_or_else(missing)?;
    let sdk = command.parent().and_then(Path::parent).ok_or_else(missing)?;
    debug!(sdk = %sdk.display(), "detected Android SDK");
    Ok(sdk.to_path_buf())
  }
}
