//! Show the burner balance

use anyhow::{Context, Result};
use burner_wallet::format_lamports;
use colored::Colorize;

use crate::config::Session;

pub async fn run(session: &Session) -> Result<()> {
    println!("{}", "Fetching balance...".cyan());

    let lamports = session
        .wallet
        .sync_balance()
        .await
        .context("Failed to fetch balance")?;

    println!();
    println!("Address: {}", session.wallet.address());
    println!("Cluster: {}", session.settings.cluster);
    println!("Balance: {}", format_lamports(lamports).green());

    if lamports == 0 && session.settings.cluster.supports_airdrop() {
        println!();
        println!("{}", "Use 'burner airdrop' to request test funds.".dimmed());
    }

    Ok(())
}
