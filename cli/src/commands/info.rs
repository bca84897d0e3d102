//! Show configuration and wallet info

use anyhow::Result;
use burner_wallet::format_lamports;
use colored::Colorize;

use crate::config::Session;

pub async fn run(session: &Session) -> Result<()> {
    let settings = &session.settings;
    let ledger = session.wallet.ledger();

    println!();
    println!("{}", "Burner Wallet Configuration".yellow().bold());
    println!();

    println!("{}:", "Burner".cyan());
    println!("  Address: {}", session.wallet.address());
    match session.wallet.sync_balance().await {
        Ok(lamports) => println!("  Balance: {}", format_lamports(lamports)),
        Err(e) => println!("  Balance: {}", format!("unavailable ({})", e).red()),
    }
    println!();

    println!("{}:", "Cluster".cyan());
    println!("  Name: {}", settings.cluster);
    println!("  RPC:  {}", settings.rpc_url());
    println!("  WS:   {}", settings.ws_url());
    if let Ok(rent) = ledger.minimum_balance_for_rent_exemption(0).await {
        println!("  Rent-exempt minimum: {}", format_lamports(rent));
    }
    println!();

    println!("{}:", "Relay".cyan());
    println!("  {}", session.relay.endpoint());
    println!();

    println!("{}:", "Claim Links".cyan());
    println!("  Site:   {}", settings.site_url);
    println!("  Stored: {}", session.storage.claim_codes()?.len());
    println!();

    println!("{}:", "File Locations".cyan());
    println!("  Storage: {}", settings.storage_path().display());
    println!(
        "  {}",
        "The burner secret key is stored unencrypted in this file.".dimmed()
    );

    Ok(())
}
