//! Host and template inspection.
//!
//! - `arch`: matching a requested CPU architecture against the prebuilt
//!   bundles shipped in an app template
//! - `env`: an explicit snapshot of the process environment
//! - `locate`: finding toolchain commands on `PATH`

pub mod arch;
pub mod env;
pub mod locate;

pub use arch::{ArchError, ArchitectureCatalog, prefix_matches, select_architecture};
pub use env::Environment;
pub use locate::{PathLocator, ToolLocator};
