//! A `Packager` that delegates to an external packaging command.
//!
//! The command is invoked as
//!
//! ```text
//! <apkgenCommand> --env-config <build>/env.json --app-config <build>/app.json \
//!                 --out-dir <out> --output <artifact>
//! ```
//!
//! and must write the package to the `--output` path. A zero exit status
//! without that file is treated as a failure.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{AppConfig, EnvironmentConfig, keys};
use crate::consts::DEFAULT_APKGEN_COMMAND;

use super::packager::{Packager, PackagerError};
use super::types::OutputLocation;

/// Stderr lines kept in a `CommandFailed` error.
const STDERR_TAIL_LINES: usize = 20;

/// Toolchain state validated by `prepare_env`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedEnv {
  pub sdk_dir: PathBuf,
  pub template_dir: PathBuf,
  pub command: String,
  #[serde(skip)]
  pub verbose: bool,
  pub config: EnvironmentConfig,
}

/// Application state validated by `prepare_app`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedApp {
  pub name: String,
  pub pkg: String,
  pub version: String,
  pub config: AppConfig,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandPackager;

impl CommandPackager {
  pub fn new() -> Self {
    Self
  }
}

impl Packager for CommandPackager {
  type Env = PreparedEnv;
  type App = PreparedApp;

  async fn prepare_env(&self, config: &EnvironmentConfig) -> Result<PreparedEnv, PackagerError> {
    let sdk_dir = require_dir(config.android_sdk_dir.as_deref(), keys::ANDROID_SDK_DIR).await?;
    let template_dir = require_dir(config.xwalk_android_dir.as_deref(), keys::XWALK_ANDROID_DIR).await?;
    let command = config
      .apkgen_command
      .clone()
      .unwrap_or_else(|| DEFAULT_APKGEN_COMMAND.to_string());

    debug!(sdk = %sdk_dir.display(), template = %template_dir.display(), command = %command, "environment prepared");
    Ok(PreparedEnv {
      sdk_dir,
      template_dir,
      command,
      verbose: config.verbose,
      config: config.clone(),
    })
  }

  async fn prepare_app(&self, config: &AppConfig) -> Result<PreparedApp, PackagerError> {
    let name = config
      .name()
      .ok_or_else(|| PackagerError::InvalidApp(format!("'{}' is required", keys::NAME)))?;
    let pkg = config
      .get_string(keys::PKG)
      .ok_or_else(|| PackagerError::InvalidApp(format!("'{}' is required", keys::PKG)))?;
    if !is_java_package(&pkg) {
      return Err(PackagerError::InvalidApp(format!(
        "'{}' must be a dotted Java package name, got '{pkg}'",
        keys::PKG
      )));
    }
    let version = config.version().unwrap_or_else(|| "0.0.1".to_string());

    debug!(name = %name, pkg = %pkg, version = %version, "app prepared");
    Ok(PreparedApp {
      name,
      pkg,
      version,
      config: config.clone(),
    })
  }

  async fn assemble(
    &self,
    env: &PreparedEnv,
    app: &PreparedApp,
    location: &OutputLocation,
  ) -> Result<PathBuf, PackagerError> {
    create_dir(&location.build_dir).await?;

    let env_file = location.build_dir.join("env.json");
    let app_file = location.build_dir.join("app.json");
    write_json(&env_file, &env.config.to_map(), "environment config").await?;
    write_json(&app_file, app.config.values(), "app config").await?;

    // An existing package from an earlier run must not pass for this one.
    match tokio::fs::remove_file(&location.artifact).await {
      Ok(()) => debug!(path = %location.artifact.display(), "removed stale package"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(source) => {
        return Err(PackagerError::Io {
          path: location.artifact.clone(),
          source,
        });
      }
    }

    let mut command = Command::new(&env.command);
    command
      .arg("--env-config")
      .arg(&env_file)
      .arg("--app-config")
      .arg(&app_file)
      .arg("--out-dir")
      .arg(&location.out_dir)
      .arg("--output")
      .arg(&location.artifact)
      .env("ANDROID_SDK_ROOT", &env.sdk_dir)
      .kill_on_drop(true);

    info!(command = %env.command, app = %app.name, "running packager");
    let output = command.output().await.map_err(|source| PackagerError::Spawn {
      command: env.command.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stdout.lines().chain(stderr.lines()) {
      if env.verbose {
        info!("{line}");
      } else {
        debug!("{line}");
      }
    }

    if !output.status.success() {
      return Err(PackagerError::CommandFailed {
        command: env.command.clone(),
        code: output.status.code(),
        stderr: tail(&stderr, STDERR_TAIL_LINES),
      });
    }

    match tokio::fs::metadata(&location.artifact).await {
      Ok(meta) if meta.is_file() => Ok(location.artifact.clone()),
      _ => Err(PackagerError::MissingArtifact(location.artifact.clone())),
    }
  }
}

async fn require_dir(path: Option<&Path>, key: &str) -> Result<PathBuf, PackagerError> {
  let path = path.ok_or_else(|| PackagerError::InvalidEnvironment(format!("'{key}' is not set")))?;
  match tokio::fs::metadata(path).await {
    Ok(meta) if meta.is_dir() => Ok(path.to_path_buf()),
    Ok(_) => Err(PackagerError::InvalidEnvironment(format!(
      "'{key}' is not a directory: {}",
      path.display()
    ))),
    Err(source) => Err(PackagerError::Io {
      path: path.to_path_buf(),
      source,
    }),
  }
}

async fn create_dir(path: &Path) -> Result<(), PackagerError> {
  tokio::fs::create_dir_all(path).await.map_err(|source| PackagerError::Io {
    path: path.to_path_buf(),
    source,
  })
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, what: &'static str) -> Result<(), PackagerError> {
  let json = serde_json::to_string_pretty(value).map_err(|source| PackagerError::Serialize { what, source })?;
  tokio::fs::write(path, json).await.map_err(|source| PackagerError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn is_java_package(pkg: &str) -> bool {
  let mut segments = 0;
  for segment in pkg.split('.') {
    let mut chars = segment.chars();
    match chars.next() {
      Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
      _ => return false,
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
      return false;
    }
    segments += 1;
  }
  segments >= 2
}

fn tail(text: &str, lines: usize) -> String {
  let all: Vec<&str> = text.lines().collect();
  all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::build::types::BuildContext;
  use crate::util::testutil::write_executable;
  use serde_json::json;
  use tempfile::TempDir;

  fn app(value: serde_json::Value) -> AppConfig {
    AppConfig::new(serde_json::from_value(value).unwrap())
  }

  #[test]
  fn java_package_names() {
    assert!(is_java_package("org.example.app"));
    assert!(is_java_package("com.foo_bar.x1"));
    assert!(!is_java_package("app"));
    assert!(!is_java_package("org..app"));
    assert!(!is_java_package("org.1app"));
    assert!(!is_java_package("org.my-app"));
  }

  #[test]
  fn tail_keeps_last_lines() {
    assert_eq!(tail("a\nb\nc", 2), "b\nc");
    assert_eq!(tail("a", 5), "a");
  }

  #[tokio::test]
  async fn prepare_env_requires_existing_dirs() {
    let temp = TempDir::new().unwrap();
    let config = EnvironmentConfig {
      android_sdk_dir: Some(temp.path().to_path_buf()),
      xwalk_android_dir: Some(temp.path().join("missing")),
      ..Default::default()
    };

    let err = CommandPackager.prepare_env(&config).await.unwrap_err();

    assert!(matches!(err, PackagerError::Io { ref path, .. } if path.ends_with("missing")));
  }

  #[tokio::test]
  async fn prepare_env_defaults_command() {
    let temp = TempDir::new().unwrap();
    let config = EnvironmentConfig {
      android_sdk_dir: Some(temp.path().to_path_buf()),
      xwalk_android_dir: Some(temp.path().to_path_buf()),
      ..Default::default()
    };

    let env = CommandPackager.prepare_env(&config).await.unwrap();

    assert_eq!(env.command, DEFAULT_APKGEN_COMMAND);
  }

  #[tokio::test]
  async fn prepare_env_unset_sdk() {
    let err = CommandPackager
      .prepare_env(&EnvironmentConfig::default())
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "invalid environment: 'androidSDKDir' is not set");
  }

  #[tokio::test]
  async fn prepare_app_validates_required_keys() {
    let err = CommandPackager.prepare_app(&app(json!({ "pkg": "org.x.y" }))).await.unwrap_err();
    assert!(matches!(err, PackagerError::InvalidApp(ref m) if m.contains("'name'")));

    let err = CommandPackager
      .prepare_app(&app(json!({ "name": "x", "pkg": "nodots" })))
      .await
      .unwrap_err();
    assert!(matches!(err, PackagerError::InvalidApp(ref m) if m.contains("nodots")));

    let ok = CommandPackager
      .prepare_app(&app(json!({ "name": "x", "pkg": "org.x.y" })))
      .await
      .unwrap();
    assert_eq!(ok.version, "0.0.1");
  }

  #[cfg(unix)]
  mod unix {
    use super::*;

    const WRITES_OUTPUT: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift ;;
  esac
  shift
done
echo "packaging into $out"
echo apk > "$out"
"#;

    struct Fixture {
      _temp: TempDir,
      env: PreparedEnv,
      app: PreparedApp,
      location: OutputLocation,
    }

    async fn fixture(script: &str) -> Fixture {
      let temp = TempDir::new().unwrap();
      let tool = temp.path().join("apkgen");
      write_executable(&tool, script);

      let env_config = EnvironmentConfig {
        android_sdk_dir: Some(temp.path().to_path_buf()),
        xwalk_android_dir: Some(temp.path().to_path_buf()),
        apkgen_command: Some(tool.to_string_lossy().into_owned()),
        ..Default::default()
      };
      let app_config = app(json!({ "name": "demo", "pkg": "org.example.demo", "version": "1.0" }));
      let out = temp.path().join("out");
      let ctx = BuildContext::new(env_config.clone(), app_config.clone(), out, None);

      Fixture {
        env: CommandPackager.prepare_env(&env_config).await.unwrap(),
        app: CommandPackager.prepare_app(&app_config).await.unwrap(),
        location: OutputLocation::for_context(&ctx),
        _temp: temp,
      }
    }

    #[tokio::test]
    async fn assemble_runs_command_and_returns_artifact() {
      let f = fixture(WRITES_OUTPUT).await;

      let path = CommandPackager.assemble(&f.env, &f.app, &f.location).await.unwrap();

      assert_eq!(path, f.location.artifact);
      assert!(path.ends_with("demo-1.0-shared.apk"));
      let app_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(f.location.build_dir.join("app.json")).unwrap()).unwrap();
      assert_eq!(app_json["pkg"], json!("org.example.demo"));
    }

    #[tokio::test]
    async fn assemble_reports_exit_code_and_stderr() {
      let f = fixture("#!/bin/sh\necho 'sdk missing' >&2\nexit 3\n").await;

      let err = CommandPackager.assemble(&f.env, &f.app, &f.location).await.unwrap_err();

      match err {
        PackagerError::CommandFailed { code, stderr, .. } => {
          assert_eq!(code, Some(3));
          assert_eq!(stderr, "sdk missing");
        }
        other => panic!("unexpected error: {other}"),
      }
    }

    #[tokio::test]
    async fn assemble_without_output_is_failure() {
      let f = fixture("#!/bin/sh\nexit 0\n").await;

      let err = CommandPackager.assemble(&f.env, &f.app, &f.location).await.unwrap_err();

      assert!(matches!(err, PackagerError::MissingArtifact(ref p) if p == &f.location.artifact));
    }

    #[tokio::test]
    async fn assemble_ignores_stale_package() {
      let f = fixture("#!/bin/sh\nexit 0\n").await;
      std::fs::create_dir_all(&f.location.out_dir).unwrap();
      std::fs::write(&f.location.artifact, "old").unwrap();

      let err = CommandPackager.assemble(&f.env, &f.app, &f.location).await.unwrap_err();

      assert!(matches!(err, PackagerError::MissingArtifact(_)));
    }

    #[tokio::test]
    async fn dropping_assembly_stops_waiting() {
      let f = fixture("#!/bin/sh\nsleep 30\n").await;

      let result = tokio::time::timeout(
        std::time::Duration::from_millis(200),
        CommandPackager.assemble(&f.env, &f.app, &f.location),
      )
      .await;

      assert!(result.is_err());
      assert!(!f.location.artifact.exists());
    }

    #[tokio::test]
    async fn missing_command_is_spawn_error() {
      let mut f = fixture(WRITES_OUTPUT).await;
      f.env.command = "/nonexistent/apkgen".to_string();

      let err = CommandPackager.assemble(&f.env, &f.app, &f.location).await.unwrap_err();

      assert!(matches!(err, PackagerError::Spawn { .. }));
    }
  }
}
