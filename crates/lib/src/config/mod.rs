//! Build configuration.
//!
//! Configuration arrives as untyped key/value blocks (shared options, then a
//! per-target block). Resolution splits every key into either the environment
//! set (toolchain and platform) or the application set (the product being
//! packaged), then lifts each set into a typed record.

pub mod file;
pub mod resolve;
pub mod types;

use std::collections::BTreeMap;

/// An untyped configuration block.
pub type ConfigMap = BTreeMap<String, serde_json::Value>;

pub use file::{BuildFile, ConfigFileError};
pub use resolve::{ResolvedConfig, environment_keys, resolve};
pub use types::{AppConfig, ENVIRONMENT_KEYS, EnvironmentConfig, keys};
