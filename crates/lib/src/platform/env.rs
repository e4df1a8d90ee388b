//! Explicit process environment.
//!
//! The orchestrator never reads `std::env` directly. Callers capture the
//! variables once and pass them in, which keeps resolution testable without
//! touching real process state.

use std::collections::BTreeMap;
use std::ffi::OsString;

/// A captured set of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
  vars: BTreeMap<String, OsString>,
}

impl Environment {
  /// Snapshot the current process environment.
  ///
  /// Variables whose names are not valid Unicode are skipped.
  pub fn from_process() -> Self {
    let vars = std::env::vars_os()
      .filter_map(|(k, v)| k.into_string().ok().map(|k| (k, v)))
      .collect();
    Self { vars }
  }

  pub fn empty() -> Self {
    Self::default()
  }

  pub fn with_var(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
    self.vars.insert(key.into(), value.into());
    self
  }

  /// Raw value of `key`.
  pub fn get_os(&self, key: &str) -> Option<&OsString> {
    self.vars.get(key)
  }

  /// Value of `key` when set, non-empty and valid Unicode.
  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).and_then(|v| v.to_str()).filter(|v| !v.is_empty())
  }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
  K: Into<String>,
  V: Into<OsString>,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }
}
