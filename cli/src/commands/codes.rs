//! List the claim links created from this burner

use anyhow::{Context, Result};
use burner_wallet::claim::{claim_url, list_claim_codes};
use burner_wallet::format_lamports;
use colored::Colorize;

use crate::config::Session;

pub async fn run(session: &Session) -> Result<()> {
    let listed = list_claim_codes(&session.wallet, &session.storage)
        .await
        .context("Failed to list claim codes")?;

    println!();
    println!(
        "{}",
        format!("Claim Links ({})", session.settings.cluster).yellow().bold()
    );
    println!();

    if listed.is_empty() {
        println!("{}", "No claim links on this cluster.".dimmed());
        println!("{}", "Create one with 'burner link --amount <SOL>'.".dimmed());
        return Ok(());
    }

    for (i, entry) in listed.iter().enumerate() {
        let balance = match entry.lamports {
            Some(0) => "claimed".dimmed().to_string(),
            Some(lamports) => format_lamports(lamports).green().to_string(),
            None => "unknown".red().to_string(),
        };

        println!("{}. {}", i + 1, entry.address);
        println!("   Balance: {}", balance);
        if let Some(created_at) = entry.record.created_at {
            println!("   Created: {}", created_at.format("%Y-%m-%d %H:%M UTC"));
        }
        println!("   Link:    {}", claim_url(&session.settings.site_url, &entry.record.code));
        println!();
    }

    Ok(())
}
