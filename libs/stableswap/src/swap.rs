//! Single-balance solver and swap pricing
//!
//! `compute_y` holds `D` fixed and solves the invariant for one unknown
//! balance. Rearranged around `y`, the invariant is the quadratic
//! `y^2 + (b - D)·y = c`, iterated as `y = (y^2 + c) / (2y + b - D)` from `y = D`.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, StableSwapError};
use crate::invariant::{ann, compute_d};
use crate::math::{
    abs_diff, checked_add, checked_mul, checked_sub, mul_div_wide, Wide, A_PRECISION,
    MAX_ITERATIONS, N_COINS, ROUNDING_BUFFER,
};
use crate::params::PoolParams;

/// Reject indices outside the pool and self-swaps
pub fn validate_pair(token_in: usize, token_out: usize) -> Result<()> {
    validate_index(token_in)?;
    validate_index(token_out)?;
    if token_in == token_out {
        return Err(StableSwapError::InvalidTokenIndex {
            index: token_out,
            detail: "input and output token are the same",
        });
    }
    Ok(())
}

pub fn validate_index(index: usize) -> Result<()> {
    if index >= N_COINS {
        return Err(StableSwapError::InvalidTokenIndex {
            index,
            detail: "out of range",
        });
    }
    Ok(())
}

/// New balance of `target` after token `changed` moves to `new_balance`, `D` fixed
pub fn compute_y(
    xp: &[Wide; N_COINS],
    amp: u64,
    d: Wide,
    changed: usize,
    new_balance: Wide,
    target: usize,
) -> Result<Wide> {
    validate_pair(changed, target)?;
    let mut balances = *xp;
    balances[changed] = new_balance;
    solve_y(&balances, amp, d, target)
}

/// Balance of `target` that satisfies the invariant at `d` with all other
/// balances as given
pub fn compute_y_d(xp: &[Wide; N_COINS], amp: u64, d: Wide, target: usize) -> Result<Wide> {
    validate_index(target)?;
    solve_y(xp, amp, d, target)
}

fn solve_y(xp: &[Wide; N_COINS], amp: u64, d: Wide, target: usize) -> Result<Wide> {
    let n = Wide::from(N_COINS as u64);
    let a_precision = Wide::from(A_PRECISION);
    let ann = ann(amp);

    let mut c = d;
    let mut sum = Wide::zero();
    for (index, x) in xp.iter().enumerate() {
        if index == target {
            continue;
        }
        if x.is_zero() {
            return Err(StableSwapError::ZeroBalance { index });
        }
        sum = checked_add(sum, *x, "compute_y: sum")?;
        c = mul_div_wide(c, d, *x * n, "compute_y: c")?;
    }
    c = mul_div_wide(
        c,
        checked_mul(d, a_precision, "compute_y: c")?,
        ann * n,
        "compute_y: c",
    )?;
    let b = checked_add(sum, checked_mul(d, a_precision, "compute_y: b")? / ann, "compute_y: b")?;

    let mut y = d;
    for iteration in 0..MAX_ITERATIONS {
        let y_prev = y;
        let numerator = checked_add(checked_mul(y, y, "compute_y: y^2")?, c, "compute_y")?;
        let denominator = checked_sub(
            checked_add(y * Wide::from(2u8), b, "compute_y: 2y+b")?,
            d,
            "compute_y: 2y+b-D",
        )?;
        y = crate::math::checked_div(numerator, denominator, "compute_y")?;

        if abs_diff(y, y_prev) <= Wide::one() {
            trace!(iterations = iteration + 1, y = %y, "balance solver converged");
            return Ok(y);
        }
    }

    Err(StableSwapError::SolverDidNotConverge {
        iterations: MAX_ITERATIONS,
    })
}

/// Priced swap before any state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Net output in native units of the output token
    pub amount_out: u128,
    /// Fee withheld from the gross output, native units
    pub fee: u128,
    /// Admin share of `fee`, native units; stays in the pool balance
    pub admin_fee: u128,
}

/// Price a swap of `dx` native units of `token_in` into `token_out`
pub fn quote_swap(
    params: &PoolParams,
    balances: &[u128; N_COINS],
    token_in: usize,
    token_out: usize,
    dx: u128,
) -> Result<SwapQuote> {
    validate_pair(token_in, token_out)?;
    if dx == 0 {
        return Err(StableSwapError::InvalidAmount("swap input must be positive"));
    }

    let precisions = &params.precisions;
    let xp = precisions.normalize_all(balances);
    let d = compute_d(&xp, params.amp)?;

    let x = checked_add(xp[token_in], precisions.normalize(token_in, dx), "swap: x")?;
    let y = compute_y(&xp, params.amp, d, token_in, x, token_out)?;

    let dy_gross = xp[token_out]
        .checked_sub(y)
        .and_then(|dy| dy.checked_sub(Wide::from(ROUNDING_BUFFER)))
        .ok_or(StableSwapError::InvalidAmount(
            "swap input too small to produce output",
        ))?;
    let fee = params.fees.swap_fee_on(dy_gross)?;
    let admin = params.fees.admin_share(fee)?;

    let amount_out = precisions.denormalize(token_out, dy_gross - fee)?;
    Ok(SwapQuote {
        amount_out,
        fee: precisions.denormalize(token_out, fee)?,
        admin_fee: precisions.denormalize(token_out, admin)?,
    })
}
