/// Name of the command-line tool.
pub const APP_NAME: &str = "xwalk";

/// Environment variable naming a fallback Crosswalk app template directory.
pub const TEMPLATE_ENV_VAR: &str = "XWALK_APP_TEMPLATE";

/// Subdirectory of the template directory holding one entry per prebuilt architecture.
pub const NATIVE_LIBS_DIR: &str = "native_libs";

/// Number of leading characters compared when matching architectures.
pub const ARCH_PREFIX_LEN: usize = 3;

/// Command whose location on `PATH` identifies the Android SDK.
pub const ANDROID_COMMAND: &str = "android";

/// Default external packaging command.
pub const DEFAULT_APKGEN_COMMAND: &str = "xwalk_apkgen";

/// Build file looked up in the working directory when none is given.
pub const DEFAULT_BUILD_FILE: &str = "xwalk.toml";

/// Default output directory when neither the target nor the options set `outDir`.
pub const DEFAULT_OUT_DIR: &str = ".";
