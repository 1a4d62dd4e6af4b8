//! Token custody seam
//!
//! The pool only does arithmetic; moving tokens between accounts and
//! minting or burning LP shares goes through a [`TokenLedger`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ledger account owner
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asset tracked by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetId {
    /// Pool token by symbol
    Token(String),
    /// LP share of the named pool
    LpShare(String),
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Token(symbol) => write!(f, "{symbol}"),
            AssetId::LpShare(pool) => write!(f, "{pool}-LP"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{owner} holds {available} {asset}, needs {requested}")]
    InsufficientFunds {
        asset: AssetId,
        owner: AccountId,
        requested: u128,
        available: u128,
    },

    #[error("Supply of {asset} would overflow")]
    SupplyOverflow { asset: AssetId },
}

pub trait TokenLedger {
    fn balance_of(&self, asset: &AssetId, owner: &AccountId) -> u128;

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError>;

    fn mint(&mut self, asset: &AssetId, to: &AccountId, amount: u128) -> Result<(), LedgerError>;

    fn burn(&mut self, asset: &AssetId, from: &AccountId, amount: u128)
        -> Result<(), LedgerError>;

    /// Fail unless `owner` holds at least `amount`
    fn ensure_balance(
        &self,
        asset: &AssetId,
        owner: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(asset, owner);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                asset: asset.clone(),
                owner: owner.clone(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }
}

/// Ledger held in memory, for tests and simulations
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    balances: HashMap<(AssetId, AccountId), u128>,
    supplies: HashMap<AssetId, u128>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self, asset: &AssetId) -> u128 {
        self.supplies.get(asset).copied().unwrap_or(0)
    }

    fn debit(&mut self, asset: &AssetId, owner: &AccountId, amount: u128) -> Result<(), LedgerError> {
        self.ensure_balance(asset, owner, amount)?;
        let key = (asset.clone(), owner.clone());
        if let Some(balance) = self.balances.get_mut(&key) {
            *balance -= amount;
            if *balance == 0 {
                self.balances.remove(&key);
            }
        }
        Ok(())
    }

    fn credit(&mut self, asset: &AssetId, owner: &AccountId, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self
            .balances
            .entry((asset.clone(), owner.clone()))
            .or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::SupplyOverflow {
                asset: asset.clone(),
            })?;
        Ok(())
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, asset: &AssetId, owner: &AccountId) -> u128 {
        self.balances
            .get(&(asset.clone(), owner.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.ensure_balance(asset, from, amount)?;
        // A credit can only overflow if the recipient already holds nearly the whole supply
        self.credit(asset, to, amount)?;
        self.debit(asset, from, amount)
    }

    fn mint(&mut self, asset: &AssetId, to: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let supply = self.total_supply(asset);
        let next = supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::SupplyOverflow {
                asset: asset.clone(),
            })?;
        self.credit(asset, to, amount)?;
        self.supplies.insert(asset.clone(), next);
        Ok(())
    }

    fn burn(&mut self, asset: &AssetId, from: &AccountId, amount: u128) -> Result<(), LedgerError> {
        self.debit(asset, from, amount)?;
        let supply = self.total_supply(asset);
        self.supplies.insert(asset.clone(), supply.saturating_sub(amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> AssetId {
        AssetId::Token("USDC".to_string())
    }

    #[test]
    fn test_mint_transfer_burn() {
        let mut ledger = InMemoryLedger::new();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");

        ledger.mint(&usdc(), &alice, 100).unwrap();
        ledger.transfer(&usdc(), &alice, &bob, 40).unwrap();
        assert_eq!(ledger.balance_of(&usdc(), &alice), 60);
        assert_eq!(ledger.balance_of(&usdc(), &bob), 40);

        ledger.burn(&usdc(), &bob, 40).unwrap();
        assert_eq!(ledger.balance_of(&usdc(), &bob), 0);
        assert_eq!(ledger.total_supply(&usdc()), 60);
    }

    #[test]
    fn test_overdraft_rejected_without_side_effects() {
        let mut ledger = InMemoryLedger::new();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        ledger.mint(&usdc(), &alice, 10).unwrap();

        let err = ledger.transfer(&usdc(), &alice, &bob, 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                asset: usdc(),
                owner: alice.clone(),
                requested: 11,
                available: 10,
            }
        );
        assert_eq!(ledger.balance_of(&usdc(), &alice), 10);
        assert_eq!(ledger.balance_of(&usdc(), &bob), 0);
        assert!(ledger.burn(&usdc(), &bob, 1).is_err());
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut ledger = InMemoryLedger::new();
        let alice = AccountId::new("alice");
        ledger.mint(&usdc(), &alice, 5).unwrap();
        ledger.transfer(&usdc(), &alice, &alice, 5).unwrap();
        assert_eq!(ledger.balance_of(&usdc(), &alice), 5);
    }

    #[test]
    fn test_asset_display() {
        assert_eq!(usdc().to_string(), "USDC");
        assert_eq!(AssetId::LpShare("3pool".into()).to_string(), "3pool-LP");
        assert_eq!(
            LedgerError::SupplyOverflow { asset: usdc() }.to_string(),
            "Supply of USDC would overflow"
        );
    }
}
