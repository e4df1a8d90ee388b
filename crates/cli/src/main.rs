mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xwalk_lib::consts::{APP_NAME, DEFAULT_BUILD_FILE};

use crate::output::{OutputFormat, print_error};

/// xwalk - build Crosswalk Android packages from a build file
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  /// Path to the build file
  #[arg(short, long, global = true, default_value = DEFAULT_BUILD_FILE)]
  file: PathBuf,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build one target, or every target in name order
  Build {
    /// Target to build (default: all targets)
    target: Option<String>,
  },

  /// Resolve configuration and architecture without building
  Plan {
    /// Target to resolve (default: all targets)
    target: Option<String>,
  },

  /// List the targets defined in the build file
  Targets,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Build { target } => cmd::cmd_build(&cli.file, target.as_deref(), cli.output),
    Commands::Plan { target } => cmd::cmd_plan(&cli.file, target.as_deref(), cli.output),
    Commands::Targets => cmd::cmd_targets(&cli.file, cli.output).map(|_| true),
  };

  match result {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: u8) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(match verbose {
      0 => "warn",
      1 => "info",
      _ => "info,xwalk_lib=debug",
    })
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
