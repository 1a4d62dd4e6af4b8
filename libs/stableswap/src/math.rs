//! Fixed-point primitives for the invariant engine
//!
//! Native token amounts are `u128`. The solvers run on balances normalized to
//! the largest token precision and held in a 512-bit integer, so products such
//! as `D_P * D` stay exact for every supported balance. No floating point.

use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StableSwapError};

/// Wide unsigned integer used for normalized balances and the invariant
pub type Wide = U512;

/// Number of tokens held by a pool
pub const N_COINS: usize = 3;

/// Scale at which the amplification coefficient is stored
pub const A_PRECISION: u64 = 100;

/// Denominator for swap and admin fee rates
pub const FEE_DENOMINATOR: u64 = 10_000_000_000;

/// Hard cap on Newton-Raphson iterations for both solvers
pub const MAX_ITERATIONS: usize = 255;

/// Units withheld from every solver-derived payout
pub const ROUNDING_BUFFER: u64 = 1;

/// Largest token precision a pool accepts (`10^36` still fits a `u128` multiplier)
pub const MAX_DECIMALS: u8 = 36;

/// Lift a native amount into the wide domain
#[inline]
pub fn wide(value: u128) -> Wide {
    Wide::from(value)
}

/// Narrow a wide value back to `u128`, failing instead of truncating
pub fn narrow(value: Wide, context: &'static str) -> Result<u128> {
    if value > Wide::from(u128::MAX) {
        return Err(StableSwapError::MathOverflow { context });
    }
    Ok(value.low_u128())
}

/// `floor(a * b / c)` with a 256-bit intermediate
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(StableSwapError::DivisionByZero { context: "mul_div" });
    }
    // u128 * u128 always fits in 256 bits
    let quotient = U256::from(a) * U256::from(b) / U256::from(c);
    if quotient > U256::from(u128::MAX) {
        return Err(StableSwapError::MathOverflow { context: "mul_div" });
    }
    Ok(quotient.low_u128())
}

/// `ceil(a * b / c)` with a 256-bit intermediate
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(StableSwapError::DivisionByZero {
            context: "mul_div_ceil",
        });
    }
    let product = U256::from(a) * U256::from(b);
    let divisor = U256::from(c);
    let mut quotient = product / divisor;
    if !(product % divisor).is_zero() {
        quotient += U256::one();
    }
    if quotient > U256::from(u128::MAX) {
        return Err(StableSwapError::MathOverflow {
            context: "mul_div_ceil",
        });
    }
    Ok(quotient.low_u128())
}

/// `floor(a * b / c)` in the wide domain
pub fn mul_div_wide(a: Wide, b: Wide, c: Wide, context: &'static str) -> Result<Wide> {
    let product = checked_mul(a, b, context)?;
    checked_div(product, c, context)
}

/// `ceil(a * b / c)` in the wide domain
pub fn mul_div_wide_ceil(a: Wide, b: Wide, c: Wide, context: &'static str) -> Result<Wide> {
    let product = checked_mul(a, b, context)?;
    let quotient = checked_div(product, c, context)?;
    if (product % c).is_zero() {
        Ok(quotient)
    } else {
        checked_add(quotient, Wide::one(), context)
    }
}

#[inline]
pub fn checked_add(a: Wide, b: Wide, context: &'static str) -> Result<Wide> {
    a.checked_add(b)
        .ok_or(StableSwapError::MathOverflow { context })
}

#[inline]
pub fn checked_sub(a: Wide, b: Wide, context: &'static str) -> Result<Wide> {
    a.checked_sub(b)
        .ok_or(StableSwapError::MathOverflow { context })
}

#[inline]
pub fn checked_mul(a: Wide, b: Wide, context: &'static str) -> Result<Wide> {
    a.checked_mul(b)
        .ok_or(StableSwapError::MathOverflow { context })
}

#[inline]
pub fn checked_div(a: Wide, b: Wide, context: &'static str) -> Result<Wide> {
    if b.is_zero() {
        return Err(StableSwapError::DivisionByZero { context });
    }
    Ok(a / b)
}

#[inline]
pub fn abs_diff(a: Wide, b: Wide) -> Wide {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Per-token scale factors mapping native units to the common precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precisions {
    multipliers: [u128; N_COINS],
}

impl Precisions {
    /// Derive multipliers from declared token decimals
    ///
    /// The common precision is the largest of the three; each token is scaled
    /// by `10^(max - decimals)`.
    pub fn from_decimals(decimals: [u8; N_COINS]) -> Result<Self> {
        if let Some(index) = decimals.iter().position(|d| *d > MAX_DECIMALS) {
            return Err(StableSwapError::InvalidParameters(format!(
                "token {index} declares {} decimals, maximum is {MAX_DECIMALS}",
                decimals[index]
            )));
        }
        let max = decimals.iter().copied().max().unwrap_or(0);
        let mut multipliers = [1u128; N_COINS];
        for (multiplier, d) in multipliers.iter_mut().zip(decimals) {
            *multiplier = 10u128.pow(u32::from(max - d));
        }
        Ok(Self { multipliers })
    }

    pub fn multipliers(&self) -> [u128; N_COINS] {
        self.multipliers
    }

    /// Native amount of token `index` scaled to the common precision
    pub fn normalize(&self, index: usize, amount: u128) -> Wide {
        wide(amount) * wide(self.multipliers[index])
    }

    pub fn normalize_all(&self, amounts: &[u128; N_COINS]) -> [Wide; N_COINS] {
        let mut xp = [Wide::zero(); N_COINS];
        for (i, x) in xp.iter_mut().enumerate() {
            *x = self.normalize(i, amounts[i]);
        }
        xp
    }

    /// Scale back to native units, truncating toward zero
    pub fn denormalize(&self, index: usize, amount: Wide) -> Result<u128> {
        narrow(amount / wide(self.multipliers[index]), "denormalize")
    }
}
