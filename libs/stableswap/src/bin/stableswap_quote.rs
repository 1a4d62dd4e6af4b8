//! Quote StableSwap operations against a pool built from settings
//!
//! Seeds an empty pool with `--deposit` through an in-memory ledger, then prints
//! the requested quote as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use stableswap::{AccountId, InMemoryLedger, PoolQuotes, StableSwapService, TokenLedger, N_COINS};
use stableswap_config::{logging, settings_path, StableSwapSettings};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stableswap-quote", about = "Quote StableSwap pool operations")]
struct Args {
    /// Settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay (reads environments/<name>.toml next to the settings file)
    #[arg(short, long)]
    environment: Option<String>,

    /// Initial deposit in native units, comma separated
    #[arg(long, value_delimiter = ',')]
    deposit: Vec<u128>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Output of swapping `amount` of token `from` into token `to`
    Swap {
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        #[arg(long)]
        amount: u128,
    },
    /// Shares minted for a deposit
    Add {
        #[arg(long, value_delimiter = ',')]
        amounts: Vec<u128>,
    },
    /// Shares burned to withdraw exact amounts
    RemoveImbalance {
        #[arg(long, value_delimiter = ',')]
        amounts: Vec<u128>,
    },
    /// Single-token payout for burning shares
    RemoveOne {
        #[arg(long)]
        shares: u128,
        #[arg(long)]
        token: usize,
    },
}

fn triple(values: &[u128], what: &str) -> Result<[u128; N_COINS]> {
    match values.try_into() {
        Ok(array) => Ok(array),
        Err(_) => bail!("{what} needs {N_COINS} amounts, got {}", values.len()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path = settings_path(args.config);
    let settings = StableSwapSettings::load(Some(&path), args.environment.as_deref())
        .with_context(|| format!("loading settings from {}", path.display()))?;
    logging::init_tracing(&settings.logging)?;

    let mut service = StableSwapService::from_settings(
        &settings.pool,
        InMemoryLedger::new(),
        AccountId::new("pool"),
    )?;
    info!(
        pool = %service.pool().params().name,
        amplification = service.pool().params().amplification(),
        admin = %service.admin(),
        "pool configured"
    );

    let seeder = AccountId::new("seeder");
    let deposit = triple(&args.deposit, "--deposit")?;
    for (i, amount) in deposit.iter().enumerate() {
        let asset = service.token(i);
        service.ledger_mut().mint(&asset, &seeder, *amount)?;
    }
    service.add_liquidity(&seeder, &deposit, 0)?;
    let pool = service.pool();

    let report = match args.command {
        Command::Swap { from, to, amount } => {
            let dy = pool.calc_swap_tokens(amount, from, to, 0)?;
            json!({ "swap": { "from": from, "to": to, "dx": amount.to_string(), "dy": dy.to_string() } })
        }
        Command::Add { amounts } => {
            let minted = pool.calc_liquidity_added(&triple(&amounts, "--amounts")?)?;
            json!({ "add_liquidity": { "minted": minted.to_string() } })
        }
        Command::RemoveImbalance { amounts } => {
            let burned =
                pool.calc_remove_liquidity_imbalance(&triple(&amounts, "--amounts")?, u128::MAX)?;
            json!({ "remove_liquidity_imbalance": { "burned": burned.to_string() } })
        }
        Command::RemoveOne { shares, token } => {
            let (dy, fee) = pool.calc_withdraw_one_coin(shares, token)?;
            json!({ "remove_liquidity_one_coin": { "dy": dy.to_string(), "fee": fee.to_string() } })
        }
    };

    println!(
        "{}",
        json!({
            "pool": pool.params().name,
            "admin": service.admin().to_string(),
            "lp_supply": pool.lp_supply().to_string(),
            "virtual_price": pool.virtual_price()?.to_string(),
            "quote": report,
        })
    );
    Ok(())
}
