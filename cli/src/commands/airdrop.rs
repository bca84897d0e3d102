//! Request test funds from the cluster faucet

use anyhow::{Context, Result};
use burner_wallet::format_lamports;
use colored::Colorize;

use crate::config::Session;

pub async fn run(session: &Session, lamports: u64) -> Result<()> {
    println!(
        "{}",
        format!("Requesting airdrop of {}...", format_lamports(lamports)).cyan()
    );

    let signature = session
        .wallet
        .request_airdrop(lamports)
        .await
        .context("Airdrop failed")?;

    println!();
    println!("{}", "Airdrop received!".green().bold());
    println!("Signature: {}", signature);
    println!("Balance:   {}", format_lamports(session.wallet.balance()).green());

    Ok(())
}
