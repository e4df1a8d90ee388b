//! Typed configuration records.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ConfigMap;

/// Well-known configuration key names.
pub mod keys {
  pub const ANDROID_SDK_DIR: &str = "androidSDKDir";
  pub const XWALK_ANDROID_DIR: &str = "xwalkAndroidDir";
  pub const ARCH: &str = "arch";
  pub const ANDROID_API_LEVEL: &str = "androidAPILevel";
  pub const SOURCE_JAVA_VERSION: &str = "sourceJavaVersion";
  pub const TARGET_JAVA_VERSION: &str = "targetJavaVersion";
  pub const APKGEN_COMMAND: &str = "apkgenCommand";

  pub const NAME: &str = "name";
  pub const PKG: &str = "pkg";
  pub const VERSION: &str = "version";
  pub const OUT_DIR: &str = "outDir";
  pub const VERBOSE: &str = "verbose";
}

/// Keys describing the toolchain and platform. Everything else is an application key.
pub const ENVIRONMENT_KEYS: &[&str] = &[
  keys::ANDROID_SDK_DIR,
  keys::XWALK_ANDROID_DIR,
  keys::ARCH,
  keys::ANDROID_API_LEVEL,
  keys::SOURCE_JAVA_VERSION,
  keys::TARGET_JAVA_VERSION,
  keys::APKGEN_COMMAND,
];

/// Toolchain and platform settings.
///
/// Fields stay `None` until supplied by configuration or filled by
/// autodetection. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
  #[serde(rename = "androidSDKDir", default, skip_serializing_if = "Option::is_none")]
  pub android_sdk_dir: Option<PathBuf>,

  #[serde(rename = "xwalkAndroidDir", default, skip_serializing_if = "Option::is_none")]
  pub xwalk_android_dir: Option<PathBuf>,

  /// Requested CPU architecture. `None` means an architecture-independent (shared) build.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arch: Option<String>,

  #[serde(rename = "androidAPILevel", default, skip_serializing_if = "Option::is_none")]
  pub android_api_level: Option<u32>,

  #[serde(rename = "sourceJavaVersion", default, skip_serializing_if = "Option::is_none")]
  pub source_java_version: Option<String>,

  #[serde(rename = "targetJavaVersion", default, skip_serializing_if = "Option::is_none")]
  pub target_java_version: Option<String>,

  #[serde(rename = "apkgenCommand", default, skip_serializing_if = "Option::is_none")]
  pub apkgen_command: Option<String>,

  /// Forward packager output at info level instead of debug. Taken from the
  /// target's `verbose` setting, not from the environment key set.
  #[serde(skip)]
  pub verbose: bool,
}

impl EnvironmentConfig {
  /// Build the typed record from an environment key map.
  pub fn from_map(map: &ConfigMap) -> Result<Self, serde_json::Error> {
    let object = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let config: Self = serde_json::from_value(Value::Object(object))?;
    Ok(config.normalized())
  }

  /// The record as a key map using the published key names.
  pub fn to_map(&self) -> ConfigMap {
    match serde_json::to_value(self) {
      Ok(Value::Object(object)) => object.into_iter().collect(),
      _ => ConfigMap::new(),
    }
  }

  fn normalized(mut self) -> Self {
    fn path(p: Option<PathBuf>) -> Option<PathBuf> {
      p.filter(|p| !p.as_os_str().is_empty())
    }
    fn text(s: Option<String>) -> Option<String> {
      s.filter(|s| !s.is_empty())
    }

    self.android_sdk_dir = path(self.android_sdk_dir);
    self.xwalk_android_dir = path(self.xwalk_android_dir);
    self.arch = text(self.arch);
    self.source_java_version = text(self.source_java_version);
    self.target_java_version = text(self.target_java_version);
    self.apkgen_command = text(self.apkgen_command);
    self
  }
}

/// Settings describing the product being packaged.
///
/// The schema is open: any key not recognized as an environment key ends up
/// here and is passed through to the packager untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppConfig(ConfigMap);

impl AppConfig {
  pub fn new(values: ConfigMap) -> Self {
    Self(values)
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  /// String value of `key`; numbers are rendered, other types yield `None`.
  pub fn get_string(&self, key: &str) -> Option<String> {
    match self.0.get(key)? {
      Value::String(s) if !s.is_empty() => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }

  pub fn get_bool(&self, key: &str) -> Option<bool> {
    self.0.get(key).and_then(Value::as_bool)
  }

  pub fn name(&self) -> Option<String> {
    self.get_string(keys::NAME)
  }

  pub fn version(&self) -> Option<String> {
    self.get_string(keys::VERSION)
  }

  pub fn values(&self) -> &ConfigMap {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
