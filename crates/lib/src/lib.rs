//! xwalk-lib: build orchestration core for Crosswalk Android packaging.
//!
//! This crate provides the pieces that sit between a build file and the
//! external packaging tool:
//! - `config`: layered configuration merge and the environment/app key split
//! - `platform`: architecture matching against template bundles, process
//!   environment capture and toolchain discovery
//! - `build`: the build pipeline and the `Packager` collaborator it drives
//! - `orchestrator`: the top-level driver producing a `BuildResult`

pub mod build;
pub mod config;
pub mod consts;
pub mod error;
pub mod orchestrator;
pub mod platform;
pub mod util;

pub use error::{BuildError, BuildResult, ErrorKind};
