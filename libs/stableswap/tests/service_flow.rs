//! Pool Service Flow Tests
//!
//! Ledger-backed deposits, swaps and withdrawals through `StableSwapService`,
//! including deposits staged one token at a time.

use stableswap::{
    AccountId, AssetId, DepositRequest, DepositStatus, FeeSchedule, InMemoryLedger, LedgerError,
    Pool, PoolParams, StableSwapError, StableSwapService, TokenInfo, TokenLedger, N_COINS,
};

const E18: u128 = 1_000_000_000_000_000_000;
const E6: u128 = 1_000_000;
const FUNDING: [u128; N_COINS] = [100_000 * E18, 100_000 * E6, 100_000 * E6];

fn user1() -> AccountId {
    AccountId::new("user1")
}

fn user2() -> AccountId {
    AccountId::new("user2")
}

fn deployer() -> AccountId {
    AccountId::new("deployer")
}

fn service() -> StableSwapService<InMemoryLedger> {
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
    let mut service = StableSwapService::new(
        Pool::new(params),
        InMemoryLedger::new(),
        AccountId::new("pool"),
        deployer(),
    );
    for user in [user1(), user2()] {
        for (i, amount) in FUNDING.iter().enumerate() {
            let asset = service.token(i);
            service.ledger_mut().mint(&asset, &user, *amount).unwrap();
        }
    }
    service
}

/// Pool custody must always cover the pool's recorded balances
fn assert_custody(service: &StableSwapService<InMemoryLedger>) {
    for i in 0..N_COINS {
        assert_eq!(
            service
                .ledger()
                .balance_of(&service.token(i), service.account()),
            service.pool().balances()[i],
            "custody mismatch for token {i}"
        );
    }
    assert_eq!(
        service.ledger().total_supply(&service.lp_token()),
        service.pool().lp_supply()
    );
}

#[test_log::test]
fn test_deposit_swap_withdraw_cycle() {
    let mut service = service();
    let deposit = [1_000 * E18, 1_500 * E6, 2_000 * E6];

    let minted = service.add_liquidity(&user1(), &deposit, 0).unwrap().minted;
    assert_eq!(service.lp_balance(&user1()), minted);
    assert_custody(&service);

    let swap = service.swap(&user2(), 1, 2, 100 * E6, 0).unwrap();
    assert_eq!(
        service.ledger().balance_of(&service.token(2), &user2()),
        FUNDING[2] + swap.amount_out
    );
    assert_custody(&service);

    let paid = service
        .remove_liquidity(&user1(), minted / 2, &[0; N_COINS])
        .unwrap();
    assert_eq!(service.lp_balance(&user1()), minted - minted / 2);
    assert_eq!(
        service.ledger().balance_of(&service.token(0), &user1()),
        FUNDING[0] - deposit[0] + paid[0]
    );
    assert_custody(&service);
}

#[test_log::test]
fn test_withdrawals_require_shares() {
    let mut service = service();
    service
        .add_liquidity(&user1(), &[1_000 * E18, 1_000 * E6, 1_000 * E6], 0)
        .unwrap();

    let err = service
        .remove_liquidity_one_coin(&user2(), E18, 0, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        StableSwapError::Ledger(LedgerError::InsufficientFunds {
            asset: AssetId::LpShare(_),
            ..
        })
    ));
    assert!(service
        .remove_liquidity_imbalance(&user2(), &[0, E6, 0], u128::MAX)
        .is_err());
    assert_custody(&service);
}

#[test_log::test]
fn test_single_and_imbalanced_withdrawals_settle() {
    let mut service = service();
    let minted = service
        .add_liquidity(&user1(), &[1_000 * E18, 1_500 * E6, 2_000 * E6], 0)
        .unwrap()
        .minted;

    let one = service
        .remove_liquidity_one_coin(&user1(), 1_000 * E18, 2, 0)
        .unwrap();
    assert_eq!(
        service.ledger().balance_of(&service.token(2), &user1()),
        FUNDING[2] - 2_000 * E6 + one.amount_out
    );

    let imbalance = service
        .remove_liquidity_imbalance(&user1(), &[0, 400 * E6, 400 * E6], 1_000 * E18)
        .unwrap();
    assert_eq!(
        service.lp_balance(&user1()),
        minted - 1_000 * E18 - imbalance.burned
    );
    assert_custody(&service);
}

#[test_log::test]
fn test_staged_deposit_mints_after_last_token() {
    let mut service = service();
    let request = DepositRequest::new([1_000 * E18, 1_500 * E6, 2_000 * E6], 4_497 * E18);

    let status = service
        .deposit_token(&user1(), 2, 2_000 * E6, request)
        .unwrap();
    assert_eq!(status, DepositStatus::Pending { outstanding: vec![0, 1] });
    let status = service
        .deposit_token(&user1(), 0, 1_000 * E18, request)
        .unwrap();
    assert_eq!(status, DepositStatus::Pending { outstanding: vec![1] });
    assert!(service.pool().is_empty());

    let status = service
        .deposit_token(&user1(), 1, 1_500 * E6, request)
        .unwrap();
    let DepositStatus::Minted { shares } = status else {
        panic!("expected mint, got {status:?}");
    };
    assert!(shares > 4_497 * E18 && shares < 4_500 * E18);
    assert_eq!(service.lp_balance(&user1()), shares);
    assert!(service.pending().is_empty());
    assert_custody(&service);
}

#[test_log::test]
fn test_staged_deposit_refunds_on_slippage() {
    let mut service = service();
    let request = DepositRequest::new([1_000 * E18, 1_500 * E6, 0], 0);
    service
        .add_liquidity(&user2(), &[1_000 * E18, 1_000 * E6, 1_000 * E6], 0)
        .unwrap();

    let greedy = DepositRequest::new(request.amounts, 10_000 * E18);
    service
        .deposit_token(&user1(), 0, 1_000 * E18, greedy)
        .unwrap();
    let status = service
        .deposit_token(&user1(), 1, 1_500 * E6, greedy)
        .unwrap();
    let DepositStatus::Refunded { amounts, reason } = status else {
        panic!("expected refund, got {status:?}");
    };
    assert_eq!(amounts, [1_000 * E18, 1_500 * E6, 0]);
    assert!(matches!(reason, StableSwapError::SlippageExceeded { .. }));
    for i in 0..N_COINS {
        assert_eq!(
            service.ledger().balance_of(&service.token(i), &user1()),
            FUNDING[i]
        );
    }
    assert_custody(&service);
}

#[test_log::test]
fn test_staged_deposit_mismatch_and_cancel() {
    let mut service = service();
    let request = DepositRequest::new([1_000 * E18, 1_500 * E6, 2_000 * E6], 0);

    assert_eq!(
        service.deposit_token(&user1(), 1, 1_499 * E6, request),
        Err(StableSwapError::DepositMismatch {
            index: 1,
            declared: 1_500 * E6,
            received: 1_499 * E6,
        })
    );
    assert_eq!(
        service.ledger().balance_of(&service.token(1), &user1()),
        FUNDING[1]
    );

    service
        .deposit_token(&user1(), 1, 1_500 * E6, request)
        .unwrap();
    assert_eq!(
        service.cancel_deposit(&user1()).unwrap(),
        [0, 1_500 * E6, 0]
    );
    assert_eq!(
        service.ledger().balance_of(&service.token(1), &user1()),
        FUNDING[1]
    );
    assert_eq!(service.cancel_deposit(&user1()).unwrap(), [0; N_COINS]);
}

#[test_log::test]
fn test_admin_fee_withdrawal() {
    let mut service = service();
    service
        .add_liquidity(&user1(), &[1_000 * E18, 1_000 * E6, 1_000 * E6], 0)
        .unwrap();
    let swap = service.swap(&user2(), 0, 1, 100 * E18, 0).unwrap();

    assert_eq!(
        service.withdraw_admin_fees(&user1()),
        Err(StableSwapError::Unauthorized {
            account: "user1".to_string()
        })
    );

    let taken = service.withdraw_admin_fees(&deployer()).unwrap();
    assert_eq!(taken, [0, swap.admin_fee, 0]);
    assert_eq!(
        service.ledger().balance_of(&service.token(1), &deployer()),
        swap.admin_fee
    );
    assert_eq!(service.pool().admin_balances(), [0; N_COINS]);
    assert_custody(&service);
}
