use std::path::Path;

use anyhow::Result;

use crate::output::{OutputFormat, print_info, print_json};

pub fn cmd_targets(file: &Path, format: OutputFormat) -> Result<()> {
  let build_file = super::load_build_file(file)?;
  let names = build_file.target_names();

  if format.is_json() {
    return print_json(&names);
  }

  if names.is_empty() {
    print_info(&format!("No targets defined in {}", file.display()));
    return Ok(());
  }

  for name in names {
    println!("{}", name);
  }
  Ok(())
}
