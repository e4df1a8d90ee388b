//! Layered configuration merge.

use std::collections::BTreeSet;

use serde::Serialize;

use super::ConfigMap;
use super::types::ENVIRONMENT_KEYS;

/// Configuration split into environment keys and application keys.
///
/// A key lives in exactly one of the two maps; which one is decided only by
/// membership in the environment key set, never by its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedConfig {
  pub env: ConfigMap,
  pub app: ConfigMap,
}

impl ResolvedConfig {
  /// Apply one more source on top of the current values (last write wins).
  pub fn layer(&mut self, env_keys: &BTreeSet<&str>, source: &ConfigMap) {
    for (key, value) in source {
      let target = if env_keys.contains(key.as_str()) {
        &mut self.env
      } else {
        &mut self.app
      };
      target.insert(key.clone(), value.clone());
    }
  }

  /// Flatten both sets back into a single block.
  pub fn merged(&self) -> ConfigMap {
    self.env.iter().chain(self.app.iter()).map(|(k, v)| (k.clone(), v.clone())).collect()
  }
}

/// The recognized environment key names as a set.
pub fn environment_keys() -> BTreeSet<&'static str> {
  ENVIRONMENT_KEYS.iter().copied().collect()
}

/// Merge `sources` in priority order (later overrides earlier) and split the
/// result by `env_keys`.
pub fn resolve<'a, I>(env_keys: &BTreeSet<&str>, sources: I) -> ResolvedConfig
where
  I: IntoIterator<Item = &'a ConfigMap>,
{
  let mut resolved = ResolvedConfig::default();
  for source in sources {
    resolved.layer(env_keys, source);
  }
  resolved
}
