//! Pool errors
//!
//! Every variant is a pure rejection: the pool state is never touched before
//! one of these is returned, and nothing is retried internally.

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::math::N_COINS;

/// Errors raised by the invariant engine, the pool, and the pool service
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StableSwapError {
    /// Token index out of `[0, N_COINS)` or a swap from a token to itself
    #[error("Invalid token index {index}: {detail} (pool holds {} tokens)", N_COINS)]
    InvalidTokenIndex { index: usize, detail: &'static str },

    /// `compute_d` hit the iteration cap
    #[error("Invariant did not converge after {iterations} iterations")]
    InvariantDidNotConverge { iterations: usize },

    /// `compute_y` / `compute_y_d` hit the iteration cap
    #[error("Balance solver did not converge after {iterations} iterations")]
    SolverDidNotConverge { iterations: usize },

    /// Output below the caller's minimum, or burn above the caller's maximum
    #[error("Slippage exceeded on {detail}: limit {limit}, computed {computed}")]
    SlippageExceeded {
        detail: &'static str,
        limit: u128,
        computed: u128,
    },

    /// Withdrawal would take more of a token than the pool holds
    #[error("Insufficient balance of token {index}: requested {requested}, available {available}")]
    InsufficientBalance {
        index: usize,
        requested: u128,
        available: u128,
    },

    /// Deposit did not increase the invariant
    #[error("Deposit does not add liquidity")]
    NoLiquidityAdded,

    /// Imbalanced withdrawal did not decrease the invariant
    #[error("Withdrawal does not remove liquidity")]
    NoLiquidityRemoved,

    /// Share amount is zero or exceeds what can be burned
    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(&'static str),

    /// The invariant is undefined when any normalized balance is zero
    #[error("Token {index} has zero balance; invariant is undefined")]
    ZeroBalance { index: usize },

    #[error("Arithmetic overflow in {context}")]
    MathOverflow { context: &'static str },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: &'static str },

    #[error("Invalid pool parameters: {0}")]
    InvalidParameters(String),

    #[error("Ledger rejected transfer: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Account {account} is not allowed to perform this operation")]
    Unauthorized { account: String },

    /// Staged deposit token does not match the declared deposit vector
    #[error("Deposit mismatch on token {index}: declared {declared}, received {received}")]
    DepositMismatch {
        index: usize,
        declared: u128,
        received: u128,
    },
}

pub type Result<T> = std::result::Result<T, StableSwapError>;
