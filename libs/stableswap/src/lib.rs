//! # StableSwap Pool Engine - Three-Token Invariant Mathematics
//!
//! ## Purpose
//!
//! Exact integer implementation of a three-token StableSwap pool: the invariant
//! solver, swap pricing, LP share accounting for balanced and imbalanced
//! deposits and withdrawals, and the pool state those operations commit to.
//! Built for pegged assets with different precisions (e.g. DAI at 18 decimals
//! alongside USDC and USDT at 6).
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool parameters from [`PoolParams::from_settings`], swap and
//!   liquidity requests from callers or [`StableSwapService`]
//! - **Output Destinations**: Quotes via [`PoolQuotes`], committed outcomes, and
//!   token/share movements through a [`TokenLedger`]
//! - **Precision**: Native `u128` amounts, normalized to the largest token precision
//!   and solved in 512-bit integers
//! - **Validation**: Every operation is failure-atomic; rejections leave state untouched
//!
//! ## Architecture Role
//!
//! ```text
//! math -> invariant (compute_d) -> swap (compute_y) -> liquidity
//!                                         \               /
//!                                          pool (commit) -> service (ledger)
//! ```
//!
//! ## Performance Profile
//!
//! - **Invariant**: Newton-Raphson, typically under 10 iterations for pegged balances
//! - **Iteration Cap**: 255 for both solvers; exceeding it is an error, never a stale value
//! - **Allocation**: None on the pricing path; balances are fixed-size arrays
//! - **Precision**: No floating point anywhere in the engine

pub mod error;
pub mod fees;
pub mod invariant;
pub mod ledger;
pub mod liquidity;
pub mod math;
pub mod params;
pub mod pool;
pub mod pool_traits;
pub mod service;
pub mod staging;
pub mod swap;

pub use error::{Result, StableSwapError};
pub use fees::FeeSchedule;
pub use invariant::compute_d;
pub use ledger::{AccountId, AssetId, InMemoryLedger, LedgerError, TokenLedger};
pub use liquidity::{AddLiquidityQuote, RemoveImbalanceQuote, WithdrawOneQuote};
pub use math::{Precisions, Wide, A_PRECISION, FEE_DENOMINATOR, N_COINS};
pub use params::{PoolParams, TokenInfo, MAX_A, MIN_A};
pub use pool::{Pool, PoolState, SwapOutcome};
pub use pool_traits::PoolQuotes;
pub use service::StableSwapService;
pub use staging::{DepositRequest, DepositStatus, PendingDeposits};
pub use swap::{compute_y, compute_y_d, SwapQuote};
