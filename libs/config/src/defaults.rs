//! Configuration defaults
//!
//! Values used when a settings file or environment leaves a field unset.

/// Settings file read when no path is given
pub const CONFIG_PATH: &str = "config/stableswap.toml";

/// Directory, relative to the settings file, holding per-environment overrides
pub const ENVIRONMENTS_DIR: &str = "environments";

/// Prefix for environment variable overrides (`STABLESWAP__POOL__AMPLIFICATION`)
pub const ENV_PREFIX: &str = "STABLESWAP";

/// Separator between the prefix and nested keys
pub const ENV_SEPARATOR: &str = "__";

/// Logging defaults
pub mod logging {
    /// Filter directive applied when `RUST_LOG` is unset
    pub const LEVEL: &str = "info";

    /// Plain text output unless JSON is requested
    pub const JSON: bool = false;
}
