//! StableSwap invariant solver
//!
//! Solves
//!
//! `A·n^n·Σx_i + D = A·D·n^n + D^(n+1) / (n^n·Πx_i)`
//!
//! for `D` with Newton-Raphson, seeded with the constant-sum value `Σx_i`.
//! Inputs are normalized balances; `amp` is `A` scaled by [`A_PRECISION`].

use tracing::trace;

use crate::error::{Result, StableSwapError};
use crate::math::{
    abs_diff, checked_add, checked_div, checked_mul, checked_sub, mul_div_wide, Wide,
    A_PRECISION, MAX_ITERATIONS, N_COINS,
};

/// `A·n^n` at `A_PRECISION` scale
pub(crate) fn ann(amp: u64) -> Wide {
    let n = N_COINS as u64;
    Wide::from(amp) * Wide::from(n.pow(N_COINS as u32))
}

/// Compute the invariant `D` for normalized balances
///
/// Every balance must be non-zero; an empty or one-sided pool has no defined
/// invariant and is rejected with [`StableSwapError::ZeroBalance`].
pub fn compute_d(xp: &[Wide; N_COINS], amp: u64) -> Result<Wide> {
    if let Some(index) = xp.iter().position(|x| x.is_zero()) {
        return Err(StableSwapError::ZeroBalance { index });
    }

    let n = Wide::from(N_COINS as u64);
    let a_precision = Wide::from(A_PRECISION);
    let ann = ann(amp);
    let sum = xp
        .iter()
        .try_fold(Wide::zero(), |acc, x| checked_add(acc, *x, "compute_d: sum"))?;

    // Constant terms of the Newton step
    let ann_sum = checked_mul(ann, sum, "compute_d: Ann*S")? / a_precision;
    let ann_less_one = checked_sub(ann, a_precision, "compute_d: Ann-1")?;

    // Smallest balances first: dividing by a large balance early truncates
    // D_P enough for the iteration to cycle instead of converging
    let mut ascending = *xp;
    ascending.sort_unstable();

    let mut d = sum;
    for iteration in 0..MAX_ITERATIONS {
        let mut d_p = d;
        for x in &ascending {
            d_p = mul_div_wide(d_p, d, *x * n, "compute_d: D_P")?;
        }
        let d_prev = d;

        let numerator = checked_mul(
            checked_add(ann_sum, checked_mul(d_p, n, "compute_d: D_P*n")?, "compute_d")?,
            d_prev,
            "compute_d: numerator",
        )?;
        let denominator = checked_add(
            checked_mul(ann_less_one, d_prev, "compute_d: denominator")? / a_precision,
            checked_mul(d_p, n + Wide::one(), "compute_d: denominator")?,
            "compute_d: denominator",
        )?;
        d = checked_div(numerator, denominator, "compute_d")?;

        if abs_diff(d, d_prev) <= Wide::one() {
            trace!(iterations = iteration + 1, d = %d, "invariant converged");
            return Ok(d);
        }
    }

    Err(StableSwapError::InvariantDidNotConverge {
        iterations: MAX_ITERATIONS,
    })
}
