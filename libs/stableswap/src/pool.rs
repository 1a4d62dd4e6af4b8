//! Pool state and the single commit point for every operation
//!
//! Each mutating call prices the request against the current state through the
//! engines, checks the caller's slippage bound, and only then writes the new
//! balances, share supply and admin counters. Any error leaves the pool as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, StableSwapError};
use crate::invariant::compute_d;
use crate::liquidity::{
    quote_add_liquidity, quote_remove_liquidity, quote_remove_liquidity_imbalance,
    quote_withdraw_one_coin, AddLiquidityQuote, RemoveImbalanceQuote, WithdrawOneQuote,
};
use crate::math::{mul_div_wide, narrow, wide, Wide, N_COINS};
use crate::params::PoolParams;
use crate::swap::{quote_swap, SwapQuote};

/// Virtual price scale (1e18 = one unit of invariant per share)
pub const VIRTUAL_PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Mutable pool accounting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Native-unit balances held in custody, admin revenue included
    pub balances: [u128; N_COINS],
    pub lp_supply: u128,
    /// Admin revenue per token; a claim on part of `balances` that LP
    /// operations never price or pay out
    pub admin_balances: [u128; N_COINS],
}

impl PoolState {
    /// Balances owned by LP shares, admin revenue excluded
    pub fn lp_balances(&self) -> [u128; N_COINS] {
        std::array::from_fn(|i| self.balances[i].saturating_sub(self.admin_balances[i]))
    }

    fn check(&self) -> Result<()> {
        for i in 0..N_COINS {
            if self.admin_balances[i] > self.balances[i] {
                return Err(StableSwapError::InvalidParameters(format!(
                    "admin balance {} of token {i} exceeds pool balance {}",
                    self.admin_balances[i], self.balances[i]
                )));
            }
        }
        let empty = self.lp_balances().iter().all(|b| *b == 0);
        if empty != (self.lp_supply == 0) {
            return Err(StableSwapError::InvalidParameters(format!(
                "share supply {} inconsistent with LP balances {:?}",
                self.lp_supply,
                self.lp_balances()
            )));
        }
        Ok(())
    }

    /// Apply one token's movement to the LP portion of the pool
    ///
    /// `admin_fee` moves from the LP portion to the admin counter; the LP
    /// portion can never be drawn below zero.
    fn settle(&mut self, index: usize, credit: u128, debit: u128, admin_fee: u128) -> Result<()> {
        let available = self.lp_balances()[index];
        let lp = available
            .checked_add(credit)
            .ok_or(StableSwapError::MathOverflow {
                context: "settle: LP balance",
            })?
            .checked_sub(debit)
            .and_then(|lp| lp.checked_sub(admin_fee))
            .ok_or(StableSwapError::InsufficientBalance {
                index,
                requested: debit.saturating_add(admin_fee),
                available: available.saturating_add(credit),
            })?;
        let admin = self.admin_balances[index]
            .checked_add(admin_fee)
            .ok_or(StableSwapError::MathOverflow {
                context: "settle: admin balance",
            })?;
        self.balances[index] = lp.checked_add(admin).ok_or(StableSwapError::MathOverflow {
            context: "settle: pool balance",
        })?;
        self.admin_balances[index] = admin;
        Ok(())
    }
}

/// Committed swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee: u128,
    pub admin_fee: u128,
    pub invariant_before: Wide,
    pub invariant_after: Wide,
}

/// A three-token StableSwap pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    params: PoolParams,
    state: PoolState,
}

impl Pool {
    /// Empty pool; the first deposit sets the share price
    pub fn new(params: PoolParams) -> Self {
        Self {
            params,
            state: PoolState::default(),
        }
    }

    /// Rebuild a pool from persisted state
    pub fn restore(params: PoolParams, state: PoolState) -> Result<Self> {
        state.check()?;
        Ok(Self { params, state })
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn balances(&self) -> [u128; N_COINS] {
        self.state.balances
    }

    pub fn lp_supply(&self) -> u128 {
        self.state.lp_supply
    }

    pub fn admin_balances(&self) -> [u128; N_COINS] {
        self.state.admin_balances
    }

    pub fn lp_balances(&self) -> [u128; N_COINS] {
        self.state.lp_balances()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lp_supply == 0
    }

    /// Current invariant over the LP balances; zero for an empty pool
    pub fn invariant(&self) -> Result<Wide> {
        self.invariant_of(&self.state)
    }

    fn invariant_of(&self, state: &PoolState) -> Result<Wide> {
        if state.lp_supply == 0 {
            return Ok(Wide::zero());
        }
        compute_d(
            &self.params.precisions.normalize_all(&state.lp_balances()),
            self.params.amp,
        )
    }

    /// Invariant per share at [`VIRTUAL_PRICE_PRECISION`]
    pub fn virtual_price(&self) -> Result<u128> {
        if self.is_empty() {
            return Err(StableSwapError::InsufficientShares {
                requested: 0,
                available: 0,
            });
        }
        narrow(
            mul_div_wide(
                self.invariant()?,
                wide(VIRTUAL_PRICE_PRECISION),
                wide(self.state.lp_supply),
                "virtual price",
            )?,
            "virtual price",
        )
    }

    pub fn preview_swap(
        &self,
        token_in: usize,
        token_out: usize,
        dx: u128,
        min_dy: u128,
    ) -> Result<SwapQuote> {
        let quote = quote_swap(&self.params, &self.lp_balances(), token_in, token_out, dx)?;
        debug!(
            pool = %self.params.name,
            token_in,
            token_out,
            dx,
            dy = quote.amount_out,
            fee = quote.fee,
            "swap quoted"
        );
        if quote.amount_out < min_dy {
            return Err(StableSwapError::SlippageExceeded {
                detail: "swap output",
                limit: min_dy,
                computed: quote.amount_out,
            });
        }
        Ok(quote)
    }

    pub fn preview_add_liquidity(
        &self,
        amounts: &[u128; N_COINS],
        min_mint: u128,
    ) -> Result<AddLiquidityQuote> {
        let quote = quote_add_liquidity(
            &self.params,
            &self.lp_balances(),
            self.state.lp_supply,
            amounts,
        )?;
        debug!(pool = %self.params.name, ?amounts, minted = quote.minted, "deposit quoted");
        if quote.minted < min_mint {
            return Err(StableSwapError::SlippageExceeded {
                detail: "shares minted",
                limit: min_mint,
                computed: quote.minted,
            });
        }
        Ok(quote)
    }

    pub fn preview_remove_liquidity(
        &self,
        shares: u128,
        min_amounts: &[u128; N_COINS],
    ) -> Result<[u128; N_COINS]> {
        let amounts = quote_remove_liquidity(&self.lp_balances(), self.state.lp_supply, shares)?;
        for (amount, min) in amounts.iter().zip(min_amounts) {
            if amount < min {
                return Err(StableSwapError::SlippageExceeded {
                    detail: "balanced withdrawal output",
                    limit: *min,
                    computed: *amount,
                });
            }
        }
        Ok(amounts)
    }

    pub fn preview_remove_liquidity_imbalance(
        &self,
        amounts: &[u128; N_COINS],
        max_burn: u128,
    ) -> Result<RemoveImbalanceQuote> {
        let quote = quote_remove_liquidity_imbalance(
            &self.params,
            &self.lp_balances(),
            self.state.lp_supply,
            amounts,
        )?;
        debug!(pool = %self.params.name, ?amounts, burned = quote.burned, "imbalanced withdrawal quoted");
        if quote.burned > max_burn {
            return Err(StableSwapError::SlippageExceeded {
                detail: "shares burned",
                limit: max_burn,
                computed: quote.burned,
            });
        }
        Ok(quote)
    }

    pub fn preview_remove_liquidity_one_coin(
        &self,
        shares: u128,
        token_out: usize,
        min_amount: u128,
    ) -> Result<WithdrawOneQuote> {
        let quote = quote_withdraw_one_coin(
            &self.params,
            &self.lp_balances(),
            self.state.lp_supply,
            shares,
            token_out,
        )?;
        debug!(
            pool = %self.params.name,
            shares,
            token_out,
            dy = quote.amount_out,
            fee = quote.fee,
            "single-token withdrawal quoted"
        );
        if quote.amount_out < min_amount {
            return Err(StableSwapError::SlippageExceeded {
                detail: "single-token withdrawal output",
                limit: min_amount,
                computed: quote.amount_out,
            });
        }
        Ok(quote)
    }

    pub fn swap(
        &mut self,
        token_in: usize,
        token_out: usize,
        dx: u128,
        min_dy: u128,
    ) -> Result<SwapOutcome> {
        let quote = self.preview_swap(token_in, token_out, dx, min_dy)?;
        let invariant_before = self.invariant()?;

        let mut next = self.state.clone();
        next.settle(token_in, dx, 0, 0)?;
        next.settle(token_out, 0, quote.amount_out, quote.admin_fee)?;
        let invariant_after = self.invariant_of(&next)?;
        self.state = next;

        info!(
            pool = %self.params.name,
            token_in = self.params.symbol(token_in),
            token_out = self.params.symbol(token_out),
            dx,
            dy = quote.amount_out,
            fee = quote.fee,
            "swap executed"
        );
        Ok(SwapOutcome {
            amount_in: dx,
            amount_out: quote.amount_out,
            fee: quote.fee,
            admin_fee: quote.admin_fee,
            invariant_before,
            invariant_after,
        })
    }

    pub fn add_liquidity(
        &mut self,
        amounts: &[u128; N_COINS],
        min_mint: u128,
    ) -> Result<AddLiquidityQuote> {
        let quote = self.preview_add_liquidity(amounts, min_mint)?;

        let mut next = self.state.clone();
        for i in 0..N_COINS {
            next.settle(i, amounts[i], 0, quote.admin_fees[i])?;
        }
        next.lp_supply = next
            .lp_supply
            .checked_add(quote.minted)
            .ok_or(StableSwapError::MathOverflow {
                context: "add_liquidity: share supply",
            })?;
        self.state = next;

        info!(
            pool = %self.params.name,
            ?amounts,
            minted = quote.minted,
            lp_supply = self.state.lp_supply,
            "liquidity added"
        );
        Ok(quote)
    }

    pub fn remove_liquidity(
        &mut self,
        shares: u128,
        min_amounts: &[u128; N_COINS],
    ) -> Result<[u128; N_COINS]> {
        let amounts = self.preview_remove_liquidity(shares, min_amounts)?;

        let mut next = self.state.clone();
        for (i, amount) in amounts.iter().enumerate() {
            next.settle(i, 0, *amount, 0)?;
        }
        next.lp_supply -= shares;
        self.state = next;

        info!(pool = %self.params.name, shares, ?amounts, "liquidity removed");
        Ok(amounts)
    }

    pub fn remove_liquidity_imbalance(
        &mut self,
        amounts: &[u128; N_COINS],
        max_burn: u128,
    ) -> Result<RemoveImbalanceQuote> {
        let quote = self.preview_remove_liquidity_imbalance(amounts, max_burn)?;

        let mut next = self.state.clone();
        for i in 0..N_COINS {
            next.settle(i, 0, amounts[i], quote.admin_fees[i])?;
        }
        next.lp_supply -= quote.burned;
        self.state = next;

        info!(
            pool = %self.params.name,
            ?amounts,
            burned = quote.burned,
            "imbalanced liquidity removed"
        );
        Ok(quote)
    }

    pub fn remove_liquidity_one_coin(
        &mut self,
        shares: u128,
        token_out: usize,
        min_amount: u128,
    ) -> Result<WithdrawOneQuote> {
        let quote = self.preview_remove_liquidity_one_coin(shares, token_out, min_amount)?;

        let mut next = self.state.clone();
        next.settle(token_out, 0, quote.amount_out, quote.admin_fee)?;
        next.lp_supply -= shares;
        self.state = next;

        info!(
            pool = %self.params.name,
            shares,
            token_out = self.params.symbol(token_out),
            dy = quote.amount_out,
            "single-token liquidity removed"
        );
        Ok(quote)
    }

    /// Remove accrued admin revenue from the balances and reset the counters
    pub fn take_admin_fees(&mut self) -> [u128; N_COINS] {
        let taken = self.state.admin_balances;
        for (balance, admin) in self.state.balances.iter_mut().zip(taken) {
            *balance -= admin;
        }
        self.state.admin_balances = [0; N_COINS];
        info!(pool = %self.params.name, ?taken, "admin fees withdrawn");
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeeSchedule;
    use crate::params::TokenInfo;

    const E18: u128 = 1_000_000_000_000_000_000;
    const E6: u128 = 1_000_000;

    fn pool() -> Pool {
        let params = PoolParams::new(
            "DAIUSDCUSDT",
            [
                TokenInfo::new("DAI", 18),
                TokenInfo::new("USDC", 6),
                TokenInfo::new("USDT", 6),
            ],
            85,
            FeeSchedule::new(4_000_000, 5_000_000_000).unwrap(),
        )
        .unwrap();
        let mut pool = Pool::new(params);
        pool.add_liquidity(&[1_000 * E18, 1_000 * E6, 1_000 * E6], 0)
            .unwrap();
        pool
    }

    #[test]
    fn test_swap_commits_balances_and_admin_fee() {
        let mut pool = pool();
        let outcome = pool.swap(0, 1, 100 * E18, 99 * E6).unwrap();
        assert_eq!(pool.balances()[0], 1_100 * E18);
        assert_eq!(pool.balances()[1], 1_000 * E6 - outcome.amount_out);
        assert_eq!(pool.admin_balances(), [0, outcome.admin_fee, 0]);
        // Fees stay in the pool, so the invariant can only grow
        assert!(outcome.invariant_after >= outcome.invariant_before);
    }

    #[test]
    fn test_failed_swap_leaves_state_untouched() {
        let mut pool = pool();
        let before = pool.state().clone();
        let err = pool.swap(0, 1, 100 * E18, 100 * E6).unwrap_err();
        assert!(matches!(
            err,
            StableSwapError::SlippageExceeded {
                detail: "swap output",
                ..
            }
        ));
        assert_eq!(pool.state(), &before);
    }

    #[test]
    fn test_virtual_price_starts_at_one() {
        let pool = pool();
        let price = pool.virtual_price().unwrap();
        assert!(price.abs_diff(VIRTUAL_PRICE_PRECISION) <= 1);
    }

    #[test]
    fn test_virtual_price_grows_with_fees() {
        let mut pool = pool();
        let before = pool.virtual_price().unwrap();
        pool.swap(0, 1, 100 * E18, 0).unwrap();
        pool.swap(1, 0, 90 * E6, 0).unwrap();
        assert!(pool.virtual_price().unwrap() > before);
    }

    #[test]
    fn test_full_balanced_withdrawal_leaves_admin_revenue() {
        let mut pool = pool();
        let outcome = pool.swap(0, 2, 10 * E18, 0).unwrap();
        let supply = pool.lp_supply();
        let owned = pool.lp_balances();
        let amounts = pool.remove_liquidity(supply, &[0; N_COINS]).unwrap();
        assert_eq!(amounts, owned);
        assert_eq!(pool.balances(), [0, 0, outcome.admin_fee]);
        assert_eq!(pool.admin_balances(), [0, 0, outcome.admin_fee]);
        assert!(pool.is_empty());
        assert_eq!(pool.invariant().unwrap(), Wide::zero());

        assert_eq!(pool.take_admin_fees(), [0, 0, outcome.admin_fee]);
        assert_eq!(pool.balances(), [0; N_COINS]);
    }

    #[test]
    fn test_equal_shares_get_equal_value_around_admin_withdrawal() {
        let params = PoolParams::new(
            "DAIUSDCUSDT",
            [
                TokenInfo::new("DAI", 18),
                TokenInfo::new("USDC", 6),
                TokenInfo::new("USDT", 6),
            ],
            85,
            // 4% fee, all of it admin revenue
            FeeSchedule::new(400_000_000, 10_000_000_000).unwrap(),
        )
        .unwrap();
        let mut pool = Pool::new(params);
        pool.add_liquidity(&[1_000 * E18, 1_000 * E6, 1_000 * E6], 0)
            .unwrap();
        let supply = pool.lp_supply();
        let first_half = supply / 2;

        let outcome = pool.swap(0, 1, 500 * E18, 0).unwrap();
        assert!(outcome.admin_fee > 0);
        assert_eq!(pool.admin_balances(), [0, outcome.admin_fee, 0]);

        let first = pool.remove_liquidity(first_half, &[0; N_COINS]).unwrap();
        assert_eq!(pool.take_admin_fees(), [0, outcome.admin_fee, 0]);
        let second = pool
            .remove_liquidity(supply - first_half, &[0; N_COINS])
            .unwrap();

        for i in 0..N_COINS {
            assert!(
                first[i].abs_diff(second[i]) <= 1,
                "token {i}: {} vs {}",
                first[i],
                second[i]
            );
        }
        assert_eq!(pool.balances(), [0; N_COINS]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_withdrawals_cannot_reach_admin_revenue() {
        let mut pool = pool();
        let outcome = pool.swap(0, 1, 100 * E18, 0).unwrap();
        let owned = pool.lp_balances()[1];
        assert_eq!(owned, pool.balances()[1] - outcome.admin_fee);

        let err = pool
            .remove_liquidity_imbalance(&[0, owned + 1, 0], u128::MAX)
            .unwrap_err();
        assert_eq!(
            err,
            StableSwapError::InsufficientBalance {
                index: 1,
                requested: owned + 1,
                available: owned,
            }
        );
    }

    #[test]
    fn test_swap_reports_committed_invariant() {
        let mut pool = pool();
        let before = pool.invariant().unwrap();
        let outcome = pool.swap(2, 0, 250 * E6, 0).unwrap();
        assert_eq!(outcome.invariant_before, before);
        assert_eq!(outcome.invariant_after, pool.invariant().unwrap());
    }

    #[test]
    fn test_one_coin_withdrawal_updates_single_balance() {
        let mut pool = pool();
        let supply = pool.lp_supply();
        let quote = pool.remove_liquidity_one_coin(100 * E18, 2, 0).unwrap();
        assert_eq!(pool.lp_supply(), supply - 100 * E18);
        assert_eq!(pool.balances()[0], 1_000 * E18);
        assert_eq!(pool.balances()[2], 1_000 * E6 - quote.amount_out);
        assert_eq!(pool.admin_balances()[2], quote.admin_fee);
    }

    #[test]
    fn test_imbalance_max_burn_enforced() {
        let mut pool = pool();
        let quote = pool
            .preview_remove_liquidity_imbalance(&[0, 100 * E6, 0], u128::MAX)
            .unwrap();
        assert!(matches!(
            pool.remove_liquidity_imbalance(&[0, 100 * E6, 0], quote.burned - 1),
            Err(StableSwapError::SlippageExceeded { .. })
        ));
        let committed = pool
            .remove_liquidity_imbalance(&[0, 100 * E6, 0], quote.burned)
            .unwrap();
        assert_eq!(committed, quote);
    }

    #[test]
    fn test_take_admin_fees_reduces_balances() {
        let mut pool = pool();
        let outcome = pool.swap(0, 1, 100 * E18, 0).unwrap();
        let balance = pool.balances()[1];
        let taken = pool.take_admin_fees();
        assert_eq!(taken, [0, outcome.admin_fee, 0]);
        assert_eq!(pool.balances()[1], balance - outcome.admin_fee);
        assert_eq!(pool.admin_balances(), [0; N_COINS]);
    }

    #[test]
    fn test_restore_validates_state() {
        let pool = pool();
        let restored = Pool::restore(pool.params().clone(), pool.state().clone()).unwrap();
        assert_eq!(restored, pool);

        let bad = PoolState {
            balances: [1, 1, 1],
            lp_supply: 0,
            admin_balances: [0; N_COINS],
        };
        assert!(Pool::restore(pool.params().clone(), bad).is_err());

        let bad = PoolState {
            balances: [1, 1, 1],
            lp_supply: 3,
            admin_balances: [2, 0, 0],
        };
        assert!(Pool::restore(pool.params().clone(), bad).is_err());

        // Drained by LPs, admin revenue still held
        let drained = PoolState {
            balances: [0, 7, 0],
            lp_supply: 0,
            admin_balances: [0, 7, 0],
        };
        assert!(Pool::restore(pool.params().clone(), drained).unwrap().is_empty());
    }
}
