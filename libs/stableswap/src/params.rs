//! Immutable pool configuration
//!
//! Built once at pool creation, either directly or from [`PoolSettings`]
//! loaded by the config crate. Percentages from settings are converted to
//! [`FEE_DENOMINATOR`] units exactly; anything that would need rounding is
//! rejected.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use stableswap_config::PoolSettings;

use crate::error::{Result, StableSwapError};
use crate::fees::FeeSchedule;
use crate::math::{Precisions, A_PRECISION, FEE_DENOMINATOR, N_COINS};

/// Smallest accepted amplification coefficient
pub const MIN_A: u64 = 1;

/// Largest accepted amplification coefficient
pub const MAX_A: u64 = 1_000_000;

/// Token identity and precision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    pub name: String,
    pub tokens: [TokenInfo; N_COINS],
    /// Amplification coefficient at [`A_PRECISION`] scale
    pub amp: u64,
    pub fees: FeeSchedule,
    pub precisions: Precisions,
}

impl PoolParams {
    /// Validate and assemble pool parameters
    ///
    /// `amplification` is the plain `A` (e.g. 85); it is stored scaled.
    pub fn new(
        name: impl Into<String>,
        tokens: [TokenInfo; N_COINS],
        amplification: u64,
        fees: FeeSchedule,
    ) -> Result<Self> {
        if !(MIN_A..=MAX_A).contains(&amplification) {
            return Err(StableSwapError::InvalidParameters(format!(
                "amplification {amplification} outside [{MIN_A}, {MAX_A}]"
            )));
        }
        let decimals = [tokens[0].decimals, tokens[1].decimals, tokens[2].decimals];
        let precisions = Precisions::from_decimals(decimals)?;
        // Re-run fee validation for schedules built with struct literals
        let fees = FeeSchedule::new(fees.swap_fee, fees.admin_fee)?;

        Ok(Self {
            name: name.into(),
            tokens,
            amp: amplification * A_PRECISION,
            fees,
            precisions,
        })
    }

    /// Build parameters from loaded settings
    pub fn from_settings(settings: &PoolSettings) -> Result<Self> {
        if settings.tokens.len() != N_COINS {
            return Err(StableSwapError::InvalidParameters(format!(
                "pool needs exactly {N_COINS} tokens, settings list {}",
                settings.tokens.len()
            )));
        }
        let tokens: [TokenInfo; N_COINS] = std::array::from_fn(|i| {
            TokenInfo::new(settings.tokens[i].symbol.clone(), settings.tokens[i].decimals)
        });
        let fees = FeeSchedule::new(
            percent_to_fee_units(settings.swap_fee_pct, "swap_fee_pct")?,
            percent_to_fee_units(settings.admin_fee_pct, "admin_fee_pct")?,
        )?;
        Self::new(settings.name.clone(), tokens, settings.amplification, fees)
    }

    /// Plain amplification coefficient
    pub fn amplification(&self) -> u64 {
        self.amp / A_PRECISION
    }

    pub fn symbol(&self, index: usize) -> &str {
        &self.tokens[index].symbol
    }
}

/// Convert a percentage (0.04 = 0.04%) to `FEE_DENOMINATOR` units
fn percent_to_fee_units(pct: Decimal, field: &str) -> Result<u64> {
    let units = pct * Decimal::from(FEE_DENOMINATOR) / dec!(100);
    if units.is_sign_negative() || !units.fract().is_zero() {
        return Err(StableSwapError::InvalidParameters(format!(
            "{field} = {pct}% is not representable in 1/{FEE_DENOMINATOR} units"
        )));
    }
    units.to_u64().ok_or_else(|| {
        StableSwapError::InvalidParameters(format!("{field} = {pct}% is out of range"))
    })
}
