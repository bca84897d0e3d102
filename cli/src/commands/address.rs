//! Display the burner address

use anyhow::Result;
use burner_wallet::cluster::ExplorerTarget;
use burner_wallet::TransferRequest;
use colored::Colorize;

use crate::config::Session;

pub fn run(session: &Session) -> Result<()> {
    let address = session.wallet.address();

    println!();
    println!("{}", "Your Burner Address".yellow().bold());
    println!();
    println!("{}", address);
    println!();
    println!("{}:", "Payment link".dimmed());
    println!("  {}", TransferRequest::new(address).to_url());
    println!("{}:", "Explorer".dimmed());
    println!(
        "  {}",
        session
            .settings
            .cluster
            .explorer_url(ExplorerTarget::Address(&address.to_string()))
    );
    println!();
    println!(
        "{}",
        "This is a burner wallet. Do not keep more funds here than you can afford to lose.".dimmed()
    );

    Ok(())
}
