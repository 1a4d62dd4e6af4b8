//! Pool service: ledger movements around pool operations
//!
//! Each call prices the operation on a copy of the pool, checks every account
//! it will debit, moves tokens and shares, and only then replaces the pool.

use stableswap_config::PoolSettings;
use tracing::{info, warn};

use crate::error::{Result, StableSwapError};
use crate::ledger::{AccountId, AssetId, TokenLedger};
use crate::liquidity::{AddLiquidityQuote, RemoveImbalanceQuote, WithdrawOneQuote};
use crate::math::N_COINS;
use crate::params::PoolParams;
use crate::pool::{Pool, SwapOutcome};
use crate::staging::{DepositRequest, DepositStatus, PendingDeposits};

pub struct StableSwapService<L: TokenLedger> {
    pool: Pool,
    ledger: L,
    /// Ledger account holding the pool's tokens and staged deposits
    account: AccountId,
    admin: AccountId,
    pending: PendingDeposits,
}

impl<L: TokenLedger> StableSwapService<L> {
    pub fn new(pool: Pool, ledger: L, account: AccountId, admin: AccountId) -> Self {
        Self {
            pool,
            ledger,
            account,
            admin,
            pending: PendingDeposits::new(),
        }
    }

    /// Empty pool built from settings, administered by `settings.admin`
    pub fn from_settings(settings: &PoolSettings, ledger: L, account: AccountId) -> Result<Self> {
        let params = PoolParams::from_settings(settings)?;
        let admin = AccountId::new(settings.admin.trim());
        info!(pool = %params.name, %admin, %account, "pool service configured");
        Ok(Self::new(Pool::new(params), ledger, account, admin))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn pending(&self) -> &PendingDeposits {
        &self.pending
    }

    pub fn token(&self, index: usize) -> AssetId {
        AssetId::Token(self.pool.params().symbol(index).to_string())
    }

    pub fn lp_token(&self) -> AssetId {
        AssetId::LpShare(self.pool.params().name.clone())
    }

    pub fn lp_balance(&self, owner: &AccountId) -> u128 {
        self.ledger.balance_of(&self.lp_token(), owner)
    }

    fn ensure_tokens(&self, owner: &AccountId, amounts: &[u128; N_COINS]) -> Result<()> {
        for (i, amount) in amounts.iter().enumerate() {
            self.ledger.ensure_balance(&self.token(i), owner, *amount)?;
        }
        Ok(())
    }

    fn pay_out(&mut self, to: &AccountId, amounts: &[u128; N_COINS]) -> Result<()> {
        for (i, amount) in amounts.iter().enumerate() {
            if *amount > 0 {
                let asset = self.token(i);
                self.ledger.transfer(&asset, &self.account, to, *amount)?;
            }
        }
        Ok(())
    }

    fn pay_in(&mut self, from: &AccountId, amounts: &[u128; N_COINS]) -> Result<()> {
        for (i, amount) in amounts.iter().enumerate() {
            if *amount > 0 {
                let asset = self.token(i);
                self.ledger.transfer(&asset, from, &self.account, *amount)?;
            }
        }
        Ok(())
    }

    pub fn swap(
        &mut self,
        trader: &AccountId,
        token_in: usize,
        token_out: usize,
        dx: u128,
        min_dy: u128,
    ) -> Result<SwapOutcome> {
        let mut next = self.pool.clone();
        let outcome = next
            .swap(token_in, token_out, dx, min_dy)
            .inspect_err(|e| warn!(%trader, error = %e, "swap rejected"))?;

        let asset_in = self.token(token_in);
        self.ledger.ensure_balance(&asset_in, trader, dx)?;
        self.ledger.transfer(&asset_in, trader, &self.account, dx)?;
        let asset_out = self.token(token_out);
        self.ledger
            .transfer(&asset_out, &self.account, trader, outcome.amount_out)?;

        self.pool = next;
        info!(%trader, dx, dy = outcome.amount_out, "swap settled");
        Ok(outcome)
    }

    /// Deposit every token in one call
    pub fn add_liquidity(
        &mut self,
        provider: &AccountId,
        amounts: &[u128; N_COINS],
        min_mint: u128,
    ) -> Result<AddLiquidityQuote> {
        let mut next = self.pool.clone();
        let quote = next
            .add_liquidity(amounts, min_mint)
            .inspect_err(|e| warn!(%provider, error = %e, "deposit rejected"))?;
        self.ensure_tokens(provider, amounts)?;

        self.pay_in(provider, amounts)?;
        let lp = self.lp_token();
        self.ledger.mint(&lp, provider, quote.minted)?;

        self.pool = next;
        info!(%provider, minted = quote.minted, "deposit settled");
        Ok(quote)
    }

    /// Stage one token of a multi-transfer deposit
    ///
    /// The token moves into pool custody immediately. When the last declared
    /// token arrives the deposit executes, or is refunded in full on failure.
    pub fn deposit_token(
        &mut self,
        provider: &AccountId,
        index: usize,
        amount: u128,
        request: DepositRequest,
    ) -> Result<DepositStatus> {
        self.pending
            .check(provider, index, amount, &request)
            .inspect_err(|e| warn!(%provider, index, error = %e, "staged token rejected"))?;
        let asset = self.token(index);
        self.ledger.ensure_balance(&asset, provider, amount)?;
        self.ledger
            .transfer(&asset, provider, &self.account, amount)?;

        let Some(deposit) = self.pending.record(provider, index, amount, &request)? else {
            let outstanding = self
                .pending
                .get(provider)
                .map(|p| p.outstanding())
                .unwrap_or_default();
            return Ok(DepositStatus::Pending { outstanding });
        };

        let mut next = self.pool.clone();
        match next.add_liquidity(&deposit.received, deposit.request.min_mint) {
            Ok(quote) => {
                let lp = self.lp_token();
                self.ledger.mint(&lp, provider, quote.minted)?;
                self.pool = next;
                info!(%provider, minted = quote.minted, "staged deposit settled");
                Ok(DepositStatus::Minted {
                    shares: quote.minted,
                })
            }
            Err(reason) => {
                warn!(%provider, error = %reason, "staged deposit refunded");
                self.pay_out(provider, &deposit.received)?;
                Ok(DepositStatus::Refunded {
                    amounts: deposit.received,
                    reason,
                })
            }
        }
    }

    /// Return whatever a provider has staged so far
    pub fn cancel_deposit(&mut self, provider: &AccountId) -> Result<[u128; N_COINS]> {
        let Some(deposit) = self.pending.cancel(provider) else {
            return Ok([0; N_COINS]);
        };
        self.pay_out(provider, &deposit.received)?;
        info!(%provider, refunded = ?deposit.received, "staged deposit cancelled");
        Ok(deposit.received)
    }

    pub fn remove_liquidity(
        &mut self,
        provider: &AccountId,
        shares: u128,
        min_amounts: &[u128; N_COINS],
    ) -> Result<[u128; N_COINS]> {
        let lp = self.lp_token();
        self.ledger.ensure_balance(&lp, provider, shares)?;
        let mut next = self.pool.clone();
        let amounts = next
            .remove_liquidity(shares, min_amounts)
            .inspect_err(|e| warn!(%provider, error = %e, "withdrawal rejected"))?;

        self.ledger.burn(&lp, provider, shares)?;
        self.pay_out(provider, &amounts)?;

        self.pool = next;
        info!(%provider, shares, ?amounts, "withdrawal settled");
        Ok(amounts)
    }

    pub fn remove_liquidity_imbalance(
        &mut self,
        provider: &AccountId,
        amounts: &[u128; N_COINS],
        max_burn: u128,
    ) -> Result<RemoveImbalanceQuote> {
        let mut next = self.pool.clone();
        let quote = next
            .remove_liquidity_imbalance(amounts, max_burn)
            .inspect_err(|e| warn!(%provider, error = %e, "imbalanced withdrawal rejected"))?;
        let lp = self.lp_token();
        self.ledger.ensure_balance(&lp, provider, quote.burned)?;

        self.ledger.burn(&lp, provider, quote.burned)?;
        self.pay_out(provider, amounts)?;

        self.pool = next;
        info!(%provider, ?amounts, burned = quote.burned, "imbalanced withdrawal settled");
        Ok(quote)
    }

    pub fn remove_liquidity_one_coin(
        &mut self,
        provider: &AccountId,
        shares: u128,
        token_out: usize,
        min_amount: u128,
    ) -> Result<WithdrawOneQuote> {
        let lp = self.lp_token();
        self.ledger.ensure_balance(&lp, provider, shares)?;
        let mut next = self.pool.clone();
        let quote = next
            .remove_liquidity_one_coin(shares, token_out, min_amount)
            .inspect_err(|e| warn!(%provider, error = %e, "single-token withdrawal rejected"))?;

        self.ledger.burn(&lp, provider, shares)?;
        let asset = self.token(token_out);
        self.ledger
            .transfer(&asset, &self.account, provider, quote.amount_out)?;

        self.pool = next;
        info!(
            %provider,
            shares,
            token_out,
            dy = quote.amount_out,
            "single-token withdrawal settled"
        );
        Ok(quote)
    }

    /// Pay accrued admin revenue to the admin account
    pub fn withdraw_admin_fees(&mut self, caller: &AccountId) -> Result<[u128; N_COINS]> {
        if caller != &self.admin {
            warn!(%caller, "admin fee withdrawal refused");
            return Err(StableSwapError::Unauthorized {
                account: caller.to_string(),
            });
        }
        let mut next = self.pool.clone();
        let taken = next.take_admin_fees();
        let admin = self.admin.clone();
        self.pay_out(&admin, &taken)?;
        self.pool = next;
        info!(%admin, ?taken, "admin fees settled");
        Ok(taken)
    }
}
