//! The build pipeline.
//!
//! ```text
//! Initialized -> PreparingEnvironment -> PreparingApp -> Assembling -> Done
//!        \________________\__________________\______________\-> Failed(stage)
//! ```
//!
//! Environment and application preparation are started together and joined.
//! The first failure wins: the other preparation is dropped without waiting
//! for it, and assembly never starts.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::packager::{Packager, PackagerError};
use super::types::{BuildContext, OutputLocation};

/// A pipeline stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  PrepareEnvironment,
  PrepareApp,
  Assemble,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::PrepareEnvironment => "prepare_environment",
      Self::PrepareApp => "prepare_app",
      Self::Assemble => "assemble",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
  Initialized,
  PreparingEnvironment,
  PreparingApp,
  Assembling,
  Done,
  Failed(Stage),
}

impl PipelineState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Done | Self::Failed(_))
  }
}

/// A stage failed; wraps the packager's error.
#[derive(Debug, Error)]
#[error("{stage} failed")]
pub struct BuildStageError {
  pub stage: Stage,
  #[source]
  pub source: PackagerError,
}

impl BuildStageError {
  pub fn new(stage: Stage, source: PackagerError) -> Self {
    Self { stage, source }
  }
}

/// Runs one build against a `Packager`.
pub struct BuildPipeline<'p, P> {
  packager: &'p P,
  history: Vec<PipelineState>,
}

impl<'p, P: Packager> BuildPipeline<'p, P> {
  pub fn new(packager: &'p P) -> Self {
    Self {
      packager,
      history: vec![PipelineState::Initialized],
    }
  }

  pub fn state(&self) -> PipelineState {
    self.history.last().copied().unwrap_or(PipelineState::Initialized)
  }

  /// Every state visited by the last run, in order.
  pub fn history(&self) -> &[PipelineState] {
    &self.history
  }

  /// Run the build, consuming the context. No stage is retried.
  pub async fn run(&mut self, ctx: BuildContext) -> Result<PathBuf, BuildStageError> {
    self.history = vec![PipelineState::Initialized];
    let packager = self.packager;

    self.transition(PipelineState::PreparingEnvironment);
    let env_task = async {
      packager
        .prepare_env(ctx.env())
        .await
        .map_err(|e| BuildStageError::new(Stage::PrepareEnvironment, e))
    };

    self.transition(PipelineState::PreparingApp);
    let app_task = async {
      packager
        .prepare_app(ctx.app())
        .await
        .map_err(|e| BuildStageError::new(Stage::PrepareApp, e))
    };

    let (env, app) = match tokio::try_join!(env_task, app_task) {
      Ok(prepared) => prepared,
      Err(e) => return Err(self.fail(e)),
    };
    debug!("preparation complete");

    self.transition(PipelineState::Assembling);
    let location = OutputLocation::for_context(&ctx);
    info!(artifact = %location.artifact.display(), "assembling package");

    match packager.assemble(&env, &app, &location).await {
      Ok(path) => {
        self.transition(PipelineState::Done);
        Ok(path)
      }
      Err(e) => Err(self.fail(BuildStageError::new(Stage::Assemble, e))),
    }
  }

  fn transition(&mut self, next: PipelineState) {
    debug!(from = ?self.state(), to = ?next, "pipeline transition");
    self.history.push(next);
  }

  fn fail(&mut self, err: BuildStageError) -> BuildStageError {
    warn!(stage = %err.stage, error = %err.source, "pipeline stage failed");
    self.transition(PipelineState::Failed(err.stage));
    err
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{AppConfig, EnvironmentConfig};
  use crate::util::testutil::{MockPackager, Outcome};

  fn context() -> BuildContext {
    BuildContext::new(
      EnvironmentConfig {
        arch: Some("arm".into()),
        ..Default::default()
      },
      AppConfig::default(),
      "/out".into(),
      Some("armeabi-v7a".into()),
    )
  }

  #[tokio::test]
  async fn successful_run_visits_every_state() {
    let packager = MockPackager::default();
    let mut pipeline = BuildPipeline::new(&packager);

    let path = pipeline.run(context()).await.unwrap();

    assert_eq!(path, PathBuf::from("/out/app-0.0.1-armeabi-v7a.apk"));
    assert_eq!(
      pipeline.history(),
      [
        PipelineState::Initialized,
        PipelineState::PreparingEnvironment,
        PipelineState::PreparingApp,
        PipelineState::Assembling,
        PipelineState::Done,
      ]
    );
    assert!(pipeline.state().is_terminal());
  }

  #[tokio::test]
  async fn assemble_receives_prepared_objects_once() {
    let packager = MockPackager::default();
    let ctx = context();
    let expected_env = ctx.env().clone();
    let expected_app = ctx.app().clone();

    BuildPipeline::new(&packager).run(ctx).await.unwrap();

    let calls = packager.assemble_calls();
    assert_eq!(calls.len(), 1);
    let (env, app, location) = &calls[0];
    assert_eq!(env.config, expected_env);
    assert_eq!(app.config, expected_app);
    assert_eq!(location.artifact, PathBuf::from("/out/app-0.0.1-armeabi-v7a.apk"));
  }

  #[tokio::test]
  async fn env_failure_is_tagged_and_skips_assembly() {
    let packager = MockPackager::new(Outcome::Fail, Outcome::Succeed, Outcome::Succeed);
    let mut pipeline = BuildPipeline::new(&packager);

    let err = pipeline.run(context()).await.unwrap_err();

    assert_eq!(err.stage, Stage::PrepareEnvironment);
    assert_eq!(pipeline.state(), PipelineState::Failed(Stage::PrepareEnvironment));
    assert!(packager.assemble_calls().is_empty());
  }

  #[tokio::test]
  async fn app_failure_is_tagged_and_skips_assembly() {
    let packager = MockPackager::new(Outcome::Succeed, Outcome::Fail, Outcome::Succeed);
    let mut pipeline = BuildPipeline::new(&packager);

    let err = pipeline.run(context()).await.unwrap_err();

    assert_eq!(err.stage, Stage::PrepareApp);
    assert_eq!(pipeline.state(), PipelineState::Failed(Stage::PrepareApp));
    assert!(packager.assemble_calls().is_empty());
  }

  #[tokio::test]
  async fn failure_abandons_in_flight_preparation() {
    let packager = MockPackager::new(Outcome::Hang, Outcome::Fail, Outcome::Succeed);
    let mut pipeline = BuildPipeline::new(&packager);

    let err = pipeline.run(context()).await.unwrap_err();

    assert_eq!(err.stage, Stage::PrepareApp);
    assert_eq!(pipeline.state(), PipelineState::Failed(Stage::PrepareApp));
    assert_eq!(packager.preparations(), 2);
    assert_eq!(packager.dropped_preparations(), 1);
    assert!(packager.assemble_calls().is_empty());
  }

  #[tokio::test]
  async fn early_failure_never_starts_pending_preparation() {
    let packager = MockPackager::new(Outcome::Fail, Outcome::Hang, Outcome::Succeed);

    let err = BuildPipeline::new(&packager).run(context()).await.unwrap_err();

    assert_eq!(err.stage, Stage::PrepareEnvironment);
    assert_eq!(packager.preparations(), 1);
    assert_eq!(packager.dropped_preparations(), 0);
  }

  #[tokio::test]
  async fn preparations_run_concurrently() {
    let packager = MockPackager::new(Outcome::Yield(3), Outcome::Yield(3), Outcome::Succeed);

    BuildPipeline::new(&packager).run(context()).await.unwrap();

    let log = packager.poll_log();
    let first_app = log.iter().position(|s| *s == "app").unwrap();
    let last_env = log.iter().rposition(|s| *s == "env").unwrap();
    assert!(first_app < last_env, "preparations were sequential: {log:?}");
  }

  #[tokio::test]
  async fn assembly_failure_is_tagged() {
    let packager = MockPackager::new(Outcome::Succeed, Outcome::Succeed, Outcome::Fail);
    let mut pipeline = BuildPipeline::new(&packager);

    let err = pipeline.run(context()).await.unwrap_err();

    assert_eq!(err.stage, Stage::Assemble);
    assert_eq!(packager.assemble_calls().len(), 1);
    assert_eq!(pipeline.history().last(), Some(&PipelineState::Failed(Stage::Assemble)));
  }

  #[test]
  fn stage_error_message_names_stage() {
    let err = BuildStageError::new(Stage::PrepareApp, PackagerError::InvalidApp("pkg is required".into()));
    assert_eq!(err.to_string(), "prepare_app failed");
    assert_eq!(
      std::error::Error::source(&err).map(|s| s.to_string()),
      Some("invalid app config: pkg is required".to_string())
    );
  }
}
