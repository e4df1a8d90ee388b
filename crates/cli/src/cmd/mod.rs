mod build;
mod plan;
mod targets;

pub use build::cmd_build;
pub use plan::cmd_plan;
pub use targets::cmd_targets;

use std::path::Path;

use anyhow::{Context, Result};

use xwalk_lib::build::CommandPackager;
use xwalk_lib::config::BuildFile;
use xwalk_lib::orchestrator::Orchestrator;
use xwalk_lib::platform::{Environment, PathLocator};

fn load_build_file(file: &Path) -> Result<BuildFile> {
  BuildFile::load(file).with_context(|| format!("Failed to load build file: {}", file.display()))
}

/// Targets to process: the named one, or all of them.
fn select_targets(build_file: &BuildFile, target: Option<&str>) -> Result<Vec<String>> {
  match target {
    Some(name) => {
      build_file.target(name)?;
      Ok(vec![name.to_string()])
    }
    None => {
      let names = build_file.target_names();
      anyhow::ensure!(!names.is_empty(), "No targets defined in build file");
      Ok(names)
    }
  }
}

fn orchestrator() -> Orchestrator<CommandPackager, PathLocator> {
  let env = Environment::from_process();
  Orchestrator::new(CommandPackager::new(), PathLocator::from_env(&env), env)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
