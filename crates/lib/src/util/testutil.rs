//! Test doubles and fixtures shared by the crate's unit tests.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::build::{OutputLocation, Packager, PackagerError};
use crate::config::{AppConfig, EnvironmentConfig};
use crate::consts::NATIVE_LIBS_DIR;
use crate::platform::ToolLocator;

/// Create a template directory whose `native_libs` holds one directory per entry.
pub fn template_dir(arches: &[&str]) -> TempDir {
  let temp = TempDir::new().unwrap();
  let native_libs = temp.path().join(NATIVE_LIBS_DIR);
  std::fs::create_dir_all(&native_libs).unwrap();
  for arch in arches {
    std::fs::create_dir(native_libs.join(arch)).unwrap();
  }
  temp
}

/// Write a file and mark it executable.
pub fn write_executable(path: &Path, content: &str) {
  std::fs::write(path, content).unwrap();
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
  }
}

/// What a mocked packager operation does when called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
  #[default]
  Succeed,
  Fail,
  /// Never completes.
  Hang,
  /// Yield to the scheduler this many times, then succeed.
  Yield(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockEnv {
  pub config: EnvironmentConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockApp {
  pub config: AppConfig,
}

/// A `Packager` that records what it was asked to do.
#[derive(Debug, Default)]
pub struct MockPackager {
  env: Outcome,
  app: Outcome,
  assemble: Outcome,
  assembled: RefCell<Vec<(MockEnv, MockApp, OutputLocation)>>,
  polls: RefCell<Vec<&'static str>>,
  dropped: Cell<usize>,
  prepared: Cell<usize>,
}

impl MockPackager {
  pub fn new(env: Outcome, app: Outcome, assemble: Outcome) -> Self {
    Self {
      env,
      app,
      assemble,
      ..Default::default()
    }
  }

  pub fn assemble_calls(&self) -> Vec<(MockEnv, MockApp, OutputLocation)> {
    self.assembled.borrow().clone()
  }

  /// Labels recorded at each yield point, in poll order.
  pub fn poll_log(&self) -> Vec<&'static str> {
    self.polls.borrow().clone()
  }

  /// Preparations dropped before they finished.
  pub fn dropped_preparations(&self) -> usize {
    self.dropped.get()
  }

  /// Preparations started, successful or not.
  pub fn preparations(&self) -> usize {
    self.prepared.get()
  }

  async fn play(&self, label: &'static str, outcome: Outcome) -> Result<(), PackagerError> {
    match outcome {
      Outcome::Succeed => Ok(()),
      Outcome::Fail => Err(match label {
        "env" => PackagerError::InvalidEnvironment("mock env failure".into()),
        "app" => PackagerError::InvalidApp("mock app failure".into()),
        _ => PackagerError::MissingArtifact(PathBuf::from("mock.apk")),
      }),
      Outcome::Hang => std::future::pending().await,
      Outcome::Yield(times) => {
        for _ in 0..times {
          self.polls.borrow_mut().push(label);
          tokio::task::yield_now().await;
        }
        Ok(())
      }
    }
  }

  async fn prepare(&self, label: &'static str, outcome: Outcome) -> Result<(), PackagerError> {
    self.prepared.set(self.prepared.get() + 1);
    let mut guard = Unfinished {
      counter: &self.dropped,
      armed: true,
    };
    let result = self.play(label, outcome).await;
    guard.armed = false;
    result
  }
}

/// Counts futures dropped before reaching the end of their body.
struct Unfinished<'a> {
  counter: &'a Cell<usize>,
  armed: bool,
}

impl Drop for Unfinished<'_> {
  fn drop(&mut self) {
    if self.armed {
      self.counter.set(self.counter.get() + 1);
    }
  }
}

impl Packager for MockPackager {
  type Env = MockEnv;
  type App = MockApp;

  async fn prepare_env(&self, config: &EnvironmentConfig) -> Result<MockEnv, PackagerError> {
    self.prepare("env", self.env).await?;
    Ok(MockEnv { config: config.clone() })
  }

  async fn prepare_app(&self, config: &AppConfig) -> Result<MockApp, PackagerError> {
    self.prepare("app", self.app).await?;
    Ok(MockApp { config: config.clone() })
  }

  async fn assemble(&self, env: &MockEnv, app: &MockApp, location: &OutputLocation) -> Result<PathBuf, PackagerError> {
    self
      .assembled
      .borrow_mut()
      .push((env.clone(), app.clone(), location.clone()));
    self.play("assemble", self.assemble).await?;
    Ok(location.artifact.clone())
  }
}

/// A `ToolLocator` answering from a fixed table.
#[derive(Debug, Default)]
pub struct FakeLocator {
  pub found: Option<PathBuf>,
  calls: Cell<usize>,
}

impl FakeLocator {
  pub fn found(path: impl Into<PathBuf>) -> Self {
    Self {
      found: Some(path.into()),
      calls: Cell::new(0),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.get()
  }
}

impl ToolLocator for FakeLocator {
  async fn locate(&self, _command: &str) -> Option<PathBuf> {
    self.calls.set(self.calls.get() + 1);
    self.found.clone()
  }
}
