//! Read-only quote interface over a pool

use crate::error::Result;
use crate::math::N_COINS;
use crate::pool::Pool;

/// Quotes a request against current state without changing it
///
/// Every quote enforces the same slippage bound the matching mutating call
/// would, so a quote that succeeds commits with the same result.
pub trait PoolQuotes {
    /// Net output of swapping `dx` of token `i` for token `j`
    fn calc_swap_tokens(&self, dx: u128, i: usize, j: usize, min_dy: u128) -> Result<u128>;

    /// Shares minted for a deposit
    fn calc_liquidity_added(&self, amounts: &[u128; N_COINS]) -> Result<u128>;

    /// Token amounts paid for burning `shares` proportionally
    fn calc_remove_liquidity(
        &self,
        min_amounts: &[u128; N_COINS],
        shares: u128,
    ) -> Result<[u128; N_COINS]>;

    /// Shares burned to withdraw exact `amounts`
    fn calc_remove_liquidity_imbalance(
        &self,
        amounts: &[u128; N_COINS],
        max_burn: u128,
    ) -> Result<u128>;

    /// `(dy, fee)` for burning `shares` into token `j`
    fn calc_withdraw_one_coin(&self, shares: u128, j: usize) -> Result<(u128, u128)>;
}

impl PoolQuotes for Pool {
    fn calc_swap_tokens(&self, dx: u128, i: usize, j: usize, min_dy: u128) -> Result<u128> {
        Ok(self.preview_swap(i, j, dx, min_dy)?.amount_out)
    }

    fn calc_liquidity_added(&self, amounts: &[u128; N_COINS]) -> Result<u128> {
        Ok(self.preview_add_liquidity(amounts, 0)?.minted)
    }

    fn calc_remove_liquidity(
        &self,
        min_amounts: &[u128; N_COINS],
        shares: u128,
    ) -> Result<[u128; N_COINS]> {
        self.preview_remove_liquidity(shares, min_amounts)
    }

    fn calc_remove_liquidity_imbalance(
        &self,
        amounts: &[u128; N_COINS],
        max_burn: u128,
    ) -> Result<u128> {
        Ok(self.preview_remove_liquidity_imbalance(amounts, max_burn)?.burned)
    }

    fn calc_withdraw_one_coin(&self, shares: u128, j: usize) -> Result<(u128, u128)> {
        let quote = self.preview_remove_liquidity_one_coin(shares, j, 0)?;
        Ok((quote.amount_out, quote.fee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StableSwapError;
    use crate::fees::FeeSchedule;
    use crate::params::{PoolParams, TokenInfo};

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
        pool.add_liquidity(&[1_000 * E18, 1_500 * E6, 2_000 * E6], 0)
            .unwrap();
        pool
    }

    #[test]
    fn test_quotes_match_commits() {
        let pool = pool();

        let dy = pool.calc_swap_tokens(100 * E6, 1, 2, 0).unwrap();
        let mut swapped = pool.clone();
        assert_eq!(swapped.swap(1, 2, 100 * E6, dy).unwrap().amount_out, dy);

        let (dy, _fee) = pool.calc_withdraw_one_coin(1_000 * E18, 2).unwrap();
        let mut withdrawn = pool.clone();
        assert_eq!(
            withdrawn
                .remove_liquidity_one_coin(1_000 * E18, 2, dy)
                .unwrap()
                .amount_out,
            dy
        );

        let burned = pool
            .calc_remove_liquidity_imbalance(&[0, 400 * E6, 400 * E6], u128::MAX)
            .unwrap();
        let mut removed = pool.clone();
        assert_eq!(
            removed
                .remove_liquidity_imbalance(&[0, 400 * E6, 400 * E6], burned)
                .unwrap()
                .burned,
            burned
        );
    }

    #[test]
    fn test_quotes_enforce_bounds() {
        let pool = pool();
        assert!(matches!(
            pool.calc_swap_tokens(100 * E6, 1, 2, 101 * E6),
            Err(StableSwapError::SlippageExceeded { .. })
        ));
        let supply = pool.lp_supply();
        assert!(matches!(
            pool.calc_remove_liquidity(&[u128::MAX, 0, 0], supply / 2),
            Err(StableSwapError::SlippageExceeded { .. })
        ));
        assert!(matches!(
            pool.calc_remove_liquidity_imbalance(&[0, 400 * E6, 0], 1),
            Err(StableSwapError::SlippageExceeded { .. })
        ));
    }

    #[test]
    fn test_quotes_do_not_mutate() {
        let pool = pool();
        let before = pool.state().clone();
        pool.calc_liquidity_added(&[E18, 0, 0]).unwrap();
        pool.calc_withdraw_one_coin(E18, 0).unwrap();
        assert_eq!(pool.state(), &before);
    }
}
