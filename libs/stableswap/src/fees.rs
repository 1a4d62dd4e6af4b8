//! Swap, imbalance, and admin fee rates
//!
//! Rates are numerators over [`FEE_DENOMINATOR`]. The admin fee is a share of
//! the collected fee, not of the traded amount.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StableSwapError};
use crate::math::{mul_div_wide, wide, Wide, FEE_DENOMINATOR, N_COINS};

/// Highest swap fee a pool accepts (50%)
pub const MAX_SWAP_FEE: u64 = FEE_DENOMINATOR / 2;

/// Highest admin share of the fee (100%)
pub const MAX_ADMIN_FEE: u64 = FEE_DENOMINATOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee on swap output (4_000_000 = 0.04%)
    pub swap_fee: u64,
    /// Share of each collected fee retained as protocol revenue (5_000_000_000 = 50%)
    pub admin_fee: u64,
}

impl FeeSchedule {
    pub fn new(swap_fee: u64, admin_fee: u64) -> Result<Self> {
        if swap_fee > MAX_SWAP_FEE {
            return Err(StableSwapError::InvalidParameters(format!(
                "swap fee {swap_fee} exceeds maximum {MAX_SWAP_FEE}"
            )));
        }
        if admin_fee > MAX_ADMIN_FEE {
            return Err(StableSwapError::InvalidParameters(format!(
                "admin fee {admin_fee} exceeds maximum {MAX_ADMIN_FEE}"
            )));
        }
        Ok(Self {
            swap_fee,
            admin_fee,
        })
    }

    pub const fn zero() -> Self {
        Self {
            swap_fee: 0,
            admin_fee: 0,
        }
    }

    /// Fee rate charged on deviations from a balanced deposit or withdrawal
    ///
    /// `swap_fee * n / (4 * (n - 1))`; for three tokens that is 3/8 of the swap fee.
    pub fn imbalance_fee(&self) -> u64 {
        let n = N_COINS as u64;
        self.swap_fee * n / (4 * (n - 1))
    }

    /// Swap fee on a gross output amount
    pub fn swap_fee_on(&self, amount: Wide) -> Result<Wide> {
        mul_div_wide(
            amount,
            Wide::from(self.swap_fee),
            Wide::from(FEE_DENOMINATOR),
            "swap fee",
        )
    }

    /// Imbalance fee on a deviation from the ideal balance
    pub fn imbalance_fee_on(&self, deviation: Wide) -> Result<Wide> {
        mul_div_wide(
            deviation,
            Wide::from(self.imbalance_fee()),
            Wide::from(FEE_DENOMINATOR),
            "imbalance fee",
        )
    }

    /// Admin portion of an already collected fee
    pub fn admin_share(&self, fee: Wide) -> Result<Wide> {
        mul_div_wide(
            fee,
            Wide::from(self.admin_fee),
            Wide::from(FEE_DENOMINATOR),
            "admin fee",
        )
    }

    /// Admin portion of a fee expressed in native units
    pub fn admin_share_native(&self, fee: u128) -> Result<u128> {
        crate::math::narrow(self.admin_share(wide(fee))?, "admin fee")
    }
}
