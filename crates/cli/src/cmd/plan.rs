//! Implementation of the `xwalk plan` command.
//!
//! Resolves configuration, autodetects missing toolchain paths and matches
//! the architecture for each target, then prints what a build would do.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde_json::json;

use xwalk_lib::orchestrator::BuildPlan;

use crate::output::{OutputFormat, print_cause, print_error, print_json, print_stat, print_success};

pub fn cmd_plan(file: &Path, target: Option<&str>, format: OutputFormat) -> Result<bool> {
  let build_file = super::load_build_file(file)?;
  let targets = super::select_targets(&build_file, target)?;
  let orchestrator = super::orchestrator();
  let rt = super::runtime()?;

  let mut plans: BTreeMap<String, serde_json::Value> = BTreeMap::new();
  let mut success = true;

  for name in &targets {
    let target_config = build_file.target(name)?;
    match rt.block_on(orchestrator.plan(&build_file.options, target_config)) {
      Ok(plan) => {
        if format.is_json() {
          plans.insert(name.clone(), serde_json::to_value(&plan)?);
        } else {
          print_plan(name, &plan);
        }
      }
      Err(e) => {
        success = false;
        if format.is_json() {
          plans.insert(
            name.clone(),
            json!({ "kind": e.kind(), "message": e.to_string(), "causes": e.causes() }),
          );
        } else {
          print_error(&format!("Target '{}': {}", name, e));
          for cause in e.causes() {
            print_cause(&cause);
          }
        }
      }
    }
  }

  if format.is_json() {
    print_json(&plans)?;
  }

  Ok(success)
}

fn print_plan(name: &str, plan: &BuildPlan) {
  print_success(&format!("Target '{}'", name));

  let env = plan.env.to_map();
  println!("  Environment:");
  for (key, value) in &env {
    print_stat(&format!("  {}", key), &display_value(value));
  }

  println!("  App:");
  for (key, value) in plan.app.values() {
    print_stat(&format!("  {}", key), &display_value(value));
  }

  print_stat("Architecture", plan.architecture.as_deref().unwrap_or("shared"));
  print_stat("Package", &plan.location.artifact.display().to_string());
}

fn display_value(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
