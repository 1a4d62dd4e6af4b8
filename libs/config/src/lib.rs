//! # StableSwap Configuration
//!
//! Settings loading and tracing setup for the StableSwap pool engine.
//!
//! ## Features
//!
//! - **Pool Settings**: Pool name, amplification, fee percentages, admin, tokens
//! - **Layered Loading**: TOML file, per-environment overlay, `STABLESWAP__` variables
//! - **Logging**: `tracing-subscriber` setup with `EnvFilter` and optional JSON
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use stableswap_config::{logging, StableSwapSettings};
//!
//! let settings = StableSwapSettings::load(Some(Path::new("config/stableswap.toml")), None)?;
//! logging::init_tracing(&settings.logging)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod logging;
pub mod settings;

pub use settings::{settings_path, LoggingSettings, PoolSettings, StableSwapSettings, TokenSettings};
