//! Pool settings loading
//!
//! Settings come from a TOML file, an optional per-environment overlay next to
//! it, and `STABLESWAP__`-prefixed environment variables, in that order.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::defaults;

/// Top-level settings document
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StableSwapSettings {
    pub pool: PoolSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Pool definition as written by an operator
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PoolSettings {
    pub name: String,

    /// Plain amplification coefficient `A`
    pub amplification: u64,

    /// Swap fee in percent (0.04 = 0.04%)
    pub swap_fee_pct: Decimal,

    /// Share of collected fees kept as admin revenue, in percent
    pub admin_fee_pct: Decimal,

    /// Account allowed to withdraw admin revenue
    pub admin: String,

    pub tokens: Vec<TokenSettings>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    pub symbol: String,
    pub decimals: u8,
}

impl TokenSettings {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    defaults::logging::LEVEL.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: defaults::logging::JSON,
        }
    }
}

impl StableSwapSettings {
    /// Load settings with the default environment variable prefix
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_prefix(base_path, environment, defaults::ENV_PREFIX)
    }

    /// Load settings, reading environment overrides under `prefix`
    pub fn load_with_prefix(
        base_path: Option<&Path>,
        environment: Option<&str>,
        prefix: &str,
    ) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(defaults::CONFIG_PATH));
        debug!("Loading settings from {:?}", base);

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
                .join(defaults::ENVIRONMENTS_DIR)
                .join(format!("{env}.toml"));

            if env_file.exists() {
                info!("Loading environment settings: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment settings not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .separator(defaults::ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build settings")?;
        let settings: Self = config
            .try_deserialize()
            .context("Failed to deserialize settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Shape checks that do not need pool math
    pub fn validate(&self) -> Result<()> {
        if self.pool.name.trim().is_empty() {
            bail!("pool.name must not be empty");
        }
        if self.pool.admin.trim().is_empty() {
            bail!("pool.admin must not be empty");
        }
        if let Some(token) = self
            .pool
            .tokens
            .iter()
            .find(|t| t.symbol.trim().is_empty())
        {
            bail!("token with {} decimals has no symbol", token.decimals);
        }
        Ok(())
    }
}

/// Settings file path from an optional override
pub fn settings_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from(defaults::CONFIG_PATH))
}
