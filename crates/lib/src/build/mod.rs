//! Build execution.
//!
//! This module provides:
//! - `BuildContext` and `OutputLocation`: the inputs of one build
//! - `Packager`: the collaborator that does the actual packaging work
//! - `BuildPipeline`: runs the preparation stages concurrently, joins them,
//!   then assembles
//! - `CommandPackager`: a `Packager` delegating to an external command

pub mod command;
pub mod packager;
pub mod pipeline;
pub mod types;

pub use command::{CommandPackager, PreparedApp, PreparedEnv};
pub use packager::{Packager, PackagerError};
pub use pipeline::{BuildPipeline, BuildStageError, PipelineState, Stage};
pub use types::{Artifact, BuildContext, OutputLocation};
