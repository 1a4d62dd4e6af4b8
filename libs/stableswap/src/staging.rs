//! Deposits that arrive one token at a time
//!
//! Every transfer carries the full deposit it belongs to. Tokens are held
//! per provider until each non-zero amount in that deposit has arrived.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StableSwapError};
use crate::ledger::AccountId;
use crate::math::N_COINS;
use crate::swap::validate_index;

/// Intended deposit, repeated on every staged transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amounts: [u128; N_COINS],
    pub min_mint: u128,
}

impl DepositRequest {
    pub fn new(amounts: [u128; N_COINS], min_mint: u128) -> Self {
        Self { amounts, min_mint }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeposit {
    pub request: DepositRequest,
    pub received: [u128; N_COINS],
}

impl PendingDeposit {
    fn new(request: DepositRequest) -> Self {
        Self {
            request,
            received: [0; N_COINS],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.received == self.request.amounts
    }

    /// Indices still owed
    pub fn outstanding(&self) -> Vec<usize> {
        (0..N_COINS)
            .filter(|i| self.received[*i] != self.request.amounts[*i])
            .collect()
    }
}

/// Outcome of a staged transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositStatus {
    /// Waiting on the listed token indices
    Pending { outstanding: Vec<usize> },
    /// Deposit executed; shares credited to the provider
    Minted { shares: u128 },
    /// Deposit failed once complete; staged tokens returned
    Refunded {
        amounts: [u128; N_COINS],
        reason: StableSwapError,
    },
}

#[derive(Debug, Default, Clone)]
pub struct PendingDeposits {
    by_provider: HashMap<AccountId, PendingDeposit>,
}

impl PendingDeposits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, provider: &AccountId) -> Option<&PendingDeposit> {
        self.by_provider.get(provider)
    }

    pub fn len(&self) -> usize {
        self.by_provider.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_provider.is_empty()
    }

    /// Validate a transfer without recording it
    pub fn check(
        &self,
        provider: &AccountId,
        index: usize,
        amount: u128,
        request: &DepositRequest,
    ) -> Result<()> {
        validate_index(index)?;
        if request.amounts.iter().all(|a| *a == 0) {
            return Err(StableSwapError::NoLiquidityAdded);
        }
        let received = match self.by_provider.get(provider) {
            Some(pending) => {
                if let Some(changed) =
                    (0..N_COINS).find(|i| pending.request.amounts[*i] != request.amounts[*i])
                {
                    return Err(StableSwapError::DepositMismatch {
                        index: changed,
                        declared: pending.request.amounts[changed],
                        received: request.amounts[changed],
                    });
                }
                if pending.request.min_mint != request.min_mint {
                    return Err(StableSwapError::InvalidAmount(
                        "minimum mint changed while deposit is pending",
                    ));
                }
                pending.received[index]
            }
            None => 0,
        };
        let declared = request.amounts[index];
        // Each token arrives exactly once and in full
        if received != 0 || amount != declared || amount == 0 {
            return Err(StableSwapError::DepositMismatch {
                index,
                declared,
                received: received.saturating_add(amount),
            });
        }
        Ok(())
    }

    /// Record a validated transfer; returns the deposit once complete
    pub fn record(
        &mut self,
        provider: &AccountId,
        index: usize,
        amount: u128,
        request: &DepositRequest,
    ) -> Result<Option<PendingDeposit>> {
        self.check(provider, index, amount, request)?;
        let pending = self
            .by_provider
            .entry(provider.clone())
            .or_insert_with(|| PendingDeposit::new(*request));
        pending.received[index] = amount;
        if pending.is_complete() {
            return Ok(self.by_provider.remove(provider));
        }
        Ok(None)
    }

    pub fn cancel(&mut self, provider: &AccountId) -> Option<PendingDeposit> {
        self.by_provider.remove(provider)
    }
}
