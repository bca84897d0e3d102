//! Create a claim link

use anyhow::{Context, Result};
use burner_wallet::claim::create_claim_link;
use burner_wallet::{format_lamports, LAMPORTS_PER_SIGNER};
use colored::Colorize;

use crate::commands::prompt_yes;
use crate::config::Session;

pub async fn run(session: &Session, lamports: u64, yes: bool) -> Result<()> {
    println!();
    println!("{}", "Create Claim Link".yellow().bold());
    println!();
    println!("Amount:      {}", format_lamports(lamports));
    println!("Claim fee:   {}", format_lamports(LAMPORTS_PER_SIGNER));
    println!();

    if !yes && !prompt_yes(&mut std::io::stdin().lock(), "Fund a new claim link?")? {
        println!("{}", "Cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Funding claim link...".cyan());
    let link = create_claim_link(&session.wallet, &session.storage, lamports, &session.settings.site_url)
        .await
        .context("Failed to create claim link")?;

    println!();
    println!("{}", "Claim link created!".green().bold());
    println!();
    println!("{}", link.url);
    println!();
    println!("Funding tx: {}", link.signature);
    println!(
        "{}",
        "Anyone with this link can claim the funds. Share it carefully.".dimmed()
    );

    Ok(())
}
