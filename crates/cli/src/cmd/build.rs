//! Implementation of the `xwalk build` command.
//!
//! Builds the requested target, or every target in name order, stopping at
//! the first failure. Ctrl-C cancels the build in progress.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use xwalk_lib::build::Stage;
use xwalk_lib::{BuildResult, ErrorKind};

use crate::output::{
  OutputFormat, format_duration, print_cause, print_error, print_info, print_json, print_stat, print_success,
};

/// Per-target outcome, as printed in JSON mode.
#[derive(Debug, Serialize)]
struct TargetReport {
  target: String,
  success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  artifact: Option<PathBuf>,
  #[serde(skip_serializing_if = "Option::is_none")]
  architecture: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  kind: Option<ErrorKind>,
  #[serde(skip_serializing_if = "Option::is_none")]
  stage: Option<Stage>,
  #[serde(skip_serializing_if = "Option::is_none")]
  message: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  causes: Vec<String>,
  duration_ms: u128,
}

impl TargetReport {
  fn new(target: &str, result: &BuildResult, elapsed: Duration) -> Self {
    let mut report = Self {
      target: target.to_string(),
      success: result.is_ok(),
      artifact: None,
      architecture: None,
      kind: None,
      stage: None,
      message: None,
      causes: Vec::new(),
      duration_ms: elapsed.as_millis(),
    };

    match result {
      Ok(artifact) => {
        report.artifact = Some(artifact.path.clone());
        report.architecture = artifact.architecture.clone();
      }
      Err(e) => {
        report.kind = Some(e.kind());
        report.stage = e.stage();
        report.message = Some(e.to_string());
        report.causes = e.causes();
      }
    }
    report
  }

  fn print_text(&self) {
    let elapsed = format_duration(Duration::from_millis(self.duration_ms as u64));
    if let Some(artifact) = &self.artifact {
      print_success(&format!("Target '{}' built in {}", self.target, elapsed));
      print_stat("Package", &artifact.display().to_string());
      print_stat("Architecture", self.architecture.as_deref().unwrap_or("shared"));
    } else {
      print_error(&format!("Target '{}' failed", self.target));
      if let Some(message) = &self.message {
        print_cause(message);
      }
      for cause in &self.causes {
        print_cause(cause);
      }
    }
  }
}

/// Returns whether every processed target succeeded.
pub fn cmd_build(file: &Path, target: Option<&str>, format: OutputFormat) -> Result<bool> {
  let build_file = super::load_build_file(file)?;
  let targets = super::select_targets(&build_file, target)?;
  let orchestrator = super::orchestrator();
  let rt = super::runtime()?;

  let mut reports = Vec::new();
  for name in &targets {
    if !format.is_json() {
      print_info(&format!("Building target '{}'", name));
    }

    let target_config = build_file.target(name)?;
    let started = Instant::now();
    let result = rt.block_on(orchestrator.run_build_until(&build_file.options, target_config, shutdown_signal()));
    let report = TargetReport::new(name, &result, started.elapsed());

    if !format.is_json() {
      report.print_text();
    }
    reports.push(report);

    if result.is_err() {
      break;
    }
  }

  if format.is_json() {
    print_json(&reports)?;
  }

  Ok(reports.iter().all(|r| r.success))
}

/// Completes on Ctrl-C; never completes if the signal cannot be installed.
async fn shutdown_signal() {
  if tokio::signal::ctrl_c().await.is_err() {
    std::future::pending::<()>().await;
  }
}
