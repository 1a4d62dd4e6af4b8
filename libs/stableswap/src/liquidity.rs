//! LP share accounting for deposits and withdrawals
//!
//! Balanced operations move every token in proportion and carry no fee.
//! Imbalanced deposits and withdrawals are equivalent to a partial swap, so
//! each token's deviation from its ideal proportional balance is charged the
//! imbalance fee before shares are priced.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StableSwapError};
use crate::invariant::compute_d;
use crate::math::{
    abs_diff, checked_sub, mul_div, mul_div_wide, mul_div_wide_ceil, narrow, wide,
    Wide, N_COINS, ROUNDING_BUFFER,
};
use crate::params::PoolParams;
use crate::swap::{compute_y_d, validate_index};

/// Result of pricing a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidityQuote {
    pub minted: u128,
    /// Imbalance fee per token, native units
    pub fees: [u128; N_COINS],
    /// Admin share of `fees`, native units
    pub admin_fees: [u128; N_COINS],
    pub invariant_before: Wide,
    pub invariant_after: Wide,
}

/// Result of pricing an imbalanced withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveImbalanceQuote {
    pub burned: u128,
    pub fees: [u128; N_COINS],
    pub admin_fees: [u128; N_COINS],
    pub invariant_before: Wide,
    pub invariant_after: Wide,
}

/// Result of pricing a single-token withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOneQuote {
    /// Net amount paid out, native units
    pub amount_out: u128,
    /// Fee charged against the payout, native units
    pub fee: u128,
    /// Admin share of `fee`; stays in the pool balance
    pub admin_fee: u128,
}

/// Take `fee` out of a normalized balance
///
/// A fee larger than what remains means the request nearly empties the token.
fn deduct_fee(params: &PoolParams, index: usize, balance: Wide, fee: Wide) -> Result<Wide> {
    match balance.checked_sub(fee) {
        Some(rest) => Ok(rest),
        None => Err(StableSwapError::InsufficientBalance {
            index,
            requested: params.precisions.denormalize(index, fee)?,
            available: params.precisions.denormalize(index, balance)?,
        }),
    }
}

/// Imbalance fee per token against the ideal proportional balances `D1/D0 * old`
///
/// Returns the fee-adjusted balances used to price shares and the fee per token.
fn charge_imbalance_fees(
    params: &PoolParams,
    old_xp: &[Wide; N_COINS],
    new_xp: &[Wide; N_COINS],
    d0: Wide,
    d1: Wide,
) -> Result<([Wide; N_COINS], [Wide; N_COINS])> {
    let mut adjusted = *new_xp;
    let mut fees = [Wide::zero(); N_COINS];
    for i in 0..N_COINS {
        let ideal = mul_div_wide(d1, old_xp[i], d0, "imbalance: ideal balance")?;
        let fee = params.fees.imbalance_fee_on(abs_diff(ideal, new_xp[i]))?;
        adjusted[i] = deduct_fee(params, i, new_xp[i], fee)?;
        fees[i] = fee;
    }
    Ok((adjusted, fees))
}

fn fees_to_native(
    params: &PoolParams,
    fees: &[Wide; N_COINS],
) -> Result<([u128; N_COINS], [u128; N_COINS])> {
    let mut native = [0u128; N_COINS];
    let mut admin = [0u128; N_COINS];
    for i in 0..N_COINS {
        native[i] = params.precisions.denormalize(i, fees[i])?;
        admin[i] = params
            .precisions
            .denormalize(i, params.fees.admin_share(fees[i])?)?;
    }
    Ok((native, admin))
}

/// Price a deposit of arbitrary per-token amounts
///
/// The first deposit into an empty pool must include every token and mints
/// shares 1:1 with the resulting invariant.
pub fn quote_add_liquidity(
    params: &PoolParams,
    balances: &[u128; N_COINS],
    lp_supply: u128,
    amounts: &[u128; N_COINS],
) -> Result<AddLiquidityQuote> {
    if amounts.iter().all(|a| *a == 0) {
        return Err(StableSwapError::NoLiquidityAdded);
    }

    let mut new_balances = *balances;
    for (balance, amount) in new_balances.iter_mut().zip(amounts) {
        *balance = balance
            .checked_add(*amount)
            .ok_or(StableSwapError::MathOverflow {
                context: "add_liquidity: balance",
            })?;
    }
    let new_xp = params.precisions.normalize_all(&new_balances);

    if lp_supply == 0 {
        let d1 = compute_d(&new_xp, params.amp)?;
        let minted = narrow(d1, "add_liquidity: initial shares")?;
        if minted == 0 {
            return Err(StableSwapError::NoLiquidityAdded);
        }
        return Ok(AddLiquidityQuote {
            minted,
            fees: [0; N_COINS],
            admin_fees: [0; N_COINS],
            invariant_before: Wide::zero(),
            invariant_after: d1,
        });
    }

    let old_xp = params.precisions.normalize_all(balances);
    let d0 = compute_d(&old_xp, params.amp)?;
    let d1 = compute_d(&new_xp, params.amp)?;
    if d1 <= d0 {
        return Err(StableSwapError::NoLiquidityAdded);
    }

    let (adjusted, fees) = charge_imbalance_fees(params, &old_xp, &new_xp, d0, d1)?;
    let d2 = compute_d(&adjusted, params.amp)?;
    let growth = d2.checked_sub(d0).ok_or(StableSwapError::NoLiquidityAdded)?;
    let minted = narrow(
        mul_div_wide(wide(lp_supply), growth, d0, "add_liquidity: shares")?,
        "add_liquidity: shares",
    )?;
    if minted == 0 {
        return Err(StableSwapError::NoLiquidityAdded);
    }

    let (fees, admin_fees) = fees_to_native(params, &fees)?;
    Ok(AddLiquidityQuote {
        minted,
        fees,
        admin_fees,
        invariant_before: d0,
        invariant_after: d1,
    })
}

/// Proportional withdrawal of `shares`
pub fn quote_remove_liquidity(
    balances: &[u128; N_COINS],
    lp_supply: u128,
    shares: u128,
) -> Result<[u128; N_COINS]> {
    if shares == 0 {
        return Err(StableSwapError::InvalidAmount("share amount must be positive"));
    }
    if shares > lp_supply {
        return Err(StableSwapError::InsufficientShares {
            requested: shares,
            available: lp_supply,
        });
    }
    let mut amounts = [0u128; N_COINS];
    for (amount, balance) in amounts.iter_mut().zip(balances) {
        *amount = mul_div(*balance, shares, lp_supply)?;
    }
    Ok(amounts)
}

/// Price a withdrawal of exact per-token amounts
///
/// Shares burned round up so the pool never under-charges.
pub fn quote_remove_liquidity_imbalance(
    params: &PoolParams,
    balances: &[u128; N_COINS],
    lp_supply: u128,
    amounts: &[u128; N_COINS],
) -> Result<RemoveImbalanceQuote> {
    if amounts.iter().all(|a| *a == 0) {
        return Err(StableSwapError::NoLiquidityRemoved);
    }
    let mut new_balances = *balances;
    for (index, (balance, amount)) in new_balances.iter_mut().zip(amounts).enumerate() {
        *balance = balance
            .checked_sub(*amount)
            .ok_or(StableSwapError::InsufficientBalance {
                index,
                requested: *amount,
                available: balances[index],
            })?;
    }

    let old_xp = params.precisions.normalize_all(balances);
    let new_xp = params.precisions.normalize_all(&new_balances);
    let d0 = compute_d(&old_xp, params.amp)?;
    let d1 = compute_d(&new_xp, params.amp)?;
    if d1 >= d0 {
        return Err(StableSwapError::NoLiquidityRemoved);
    }

    let (adjusted, fees) = charge_imbalance_fees(params, &old_xp, &new_xp, d0, d1)?;
    let d2 = compute_d(&adjusted, params.amp)?;
    let burned = narrow(
        mul_div_wide_ceil(
            wide(lp_supply),
            checked_sub(d0, d2, "remove_imbalance: D0-D2")?,
            d0,
            "remove_imbalance: shares",
        )?,
        "remove_imbalance: shares",
    )?;
    if burned > lp_supply {
        return Err(StableSwapError::InsufficientShares {
            requested: burned,
            available: lp_supply,
        });
    }

    let (fees, admin_fees) = fees_to_native(params, &fees)?;
    Ok(RemoveImbalanceQuote {
        burned,
        fees,
        admin_fees,
        invariant_before: d0,
        invariant_after: d1,
    })
}

/// Price burning `shares` for a single token
///
/// Two passes: solve the unadjusted balance to measure each token's deviation,
/// charge the imbalance fee on those deviations, then solve again on the
/// fee-adjusted balances for the payout.
pub fn quote_withdraw_one_coin(
    params: &PoolParams,
    balances: &[u128; N_COINS],
    lp_supply: u128,
    shares: u128,
    token_out: usize,
) -> Result<WithdrawOneQuote> {
    validate_index(token_out)?;
    if shares == 0 {
        return Err(StableSwapError::InvalidAmount("share amount must be positive"));
    }
    // Draining the whole supply through one token would strand the others
    if shares >= lp_supply {
        return Err(StableSwapError::InsufficientShares {
            requested: shares,
            available: lp_supply,
        });
    }

    let xp = params.precisions.normalize_all(balances);
    let d0 = compute_d(&xp, params.amp)?;
    let d1 = checked_sub(
        d0,
        mul_div_wide(wide(shares), d0, wide(lp_supply), "withdraw_one: D1")?,
        "withdraw_one: D1",
    )?;
    let new_y = compute_y_d(&xp, params.amp, d1, token_out)?;

    let mut xp_reduced = xp;
    for (i, reduced) in xp_reduced.iter_mut().enumerate() {
        let ideal = mul_div_wide(xp[i], d1, d0, "withdraw_one: ideal balance")?;
        let deviation = if i == token_out {
            abs_diff(ideal, new_y)
        } else {
            checked_sub(xp[i], ideal, "withdraw_one: deviation")?
        };
        let fee = params.fees.imbalance_fee_on(deviation)?;
        *reduced = deduct_fee(params, i, *reduced, fee)?;
    }

    let y = compute_y_d(&xp_reduced, params.amp, d1, token_out)?;
    let dy = xp_reduced[token_out]
        .checked_sub(y)
        .and_then(|dy| dy.checked_sub(Wide::from(ROUNDING_BUFFER)))
        .ok_or(StableSwapError::InvalidAmount(
            "share amount too small to withdraw",
        ))?;
    let amount_out = params.precisions.denormalize(token_out, dy)?;

    let gross = params
        .precisions
        .denormalize(token_out, checked_sub(xp[token_out], new_y, "withdraw_one: gross")?)?;
    let fee = gross.saturating_sub(amount_out);
    let admin_fee = params.fees.admin_share_native(fee)?;

    Ok(WithdrawOneQuote {
        amount_out,
        fee,
        admin_fee,
    })
}
