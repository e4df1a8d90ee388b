//! Toolchain command discovery.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::env::Environment;

/// Finds the installed location of a command.
pub trait ToolLocator {
  fn locate(&self, command: &str) -> impl Future<Output = Option<PathBuf>>;
}

/// Searches the directories of a `PATH` value, in order.
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
  search_path: Option<OsString>,
}

impl PathLocator {
  pub fn new(search_path: Option<OsString>) -> Self {
    Self { search_path }
  }

  /// Locator over the `PATH` captured in `env`.
  pub fn from_env(env: &Environment) -> Self {
    Self::new(env.get_os("PATH").cloned())
  }

  fn candidates(dir: &Path, command: &str) -> Vec<PathBuf> {
    #[cfg(windows)]
    {
      ["", ".exe", ".bat", ".cmd"]
        .iter()
        .map(|ext| dir.join(format!("{command}{ext}")))
        .collect()
    }

    #[cfg(not(windows))]
    {
      vec![dir.join(command)]
    }
  }
}

impl ToolLocator for PathLocator {
  async fn locate(&self, command: &str) -> Option<PathBuf> {
    let search_path = self.search_path.as_ref()?;

    for dir in std::env::split_paths(search_path) {
      if dir.as_os_str().is_empty() {
        continue;
      }
      for candidate in Self::candidates(&dir, command) {
        if is_executable(&candidate).await {
          // Follow symlinks so an `android` shim resolves into the real SDK.
          let resolved = dunce::canonicalize(&candidate).unwrap_or(candidate);
          debug!(command, path = %resolved.display(), "located command");
          return Some(resolved);
        }
      }
    }

    debug!(command, "command not found on PATH");
    None
  }
}

#[cfg(unix)]
async fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;

  match tokio::fs::metadata(path).await {
    Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
    Err(_) => false,
  }
}

#[cfg(not(unix))]
async fn is_executable(path: &Path) -> bool {
  tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
