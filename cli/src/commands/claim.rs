//! Claim the funds behind a claim link

use anyhow::{Context, Result};
use burner_wallet::claim::claim_funds;
use burner_wallet::format_lamports;
use colored::Colorize;

use crate::config::Session;

pub async fn run(session: &Session, code: &str, to: Option<&str>) -> Result<()> {
    println!("{}", "Claiming funds...".cyan());

    let claimed = claim_funds(&session.wallet, &session.storage, code, to)
        .await
        .context("Failed to claim funds")?;

    println!();
    println!("{}", "Funds claimed!".green().bold());
    println!();
    println!("Amount:      {}", format_lamports(claimed.lamports).green());
    println!("Destination: {}", claimed.destination);
    println!("Transaction: {}", claimed.signature);

    Ok(())
}
