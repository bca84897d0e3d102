//! Follow the burner balance live

use anyhow::{Context, Result};
use burner_wallet::{format_lamports, Wallet};
use colored::Colorize;
use tokio::sync::watch;

use crate::config::Session;

/// Fetch the balance, then subscribe so only later changes are reported
pub async fn initial_balance(wallet: &Wallet) -> Result<(u64, watch::Receiver<u64>)> {
    let initial = wallet.sync_balance().await.context("Failed to fetch balance")?;
    Ok((initial, wallet.subscribe_balance()))
}

pub async fn run(session: &Session) -> Result<()> {
    let wallet = &session.wallet;
    let (initial, mut balances) = initial_balance(wallet).await?;
    println!("Watching {} on {}", wallet.address(), session.settings.cluster);
    println!("Balance: {}", format_lamports(initial).green());
    println!("{}", "Press Ctrl-C to stop.".dimmed());

    let printer = async {
        while balances.changed().await.is_ok() {
            let lamports = *balances.borrow_and_update();
            println!(
                "[{}] Balance: {}",
                chrono::Local::now().format("%H:%M:%S"),
                format_lamports(lamports).green()
            );
        }
    };

    tokio::select! {
        result = wallet.watch_account() => {
            result.context("Account subscription failed")?;
            println!("{}", "Subscription closed.".yellow());
        }
        _ = printer => {}
        _ = tokio::signal::ctrl_c() => {
            println!();
        }
    }

    Ok(())
}
