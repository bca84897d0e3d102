//! CLI commands
//!
//! Every command that moves funds out of the burner goes through
//! [`approve_and_submit`]: the pending transaction is shown, and nothing is
//! signed without an explicit yes.

pub mod address;
pub mod airdrop;
pub mod balance;
pub mod claim;
pub mod codes;
pub mod info;
pub mod link;
pub mod pay;
pub mod send;
pub mod watch;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use burner_wallet::cluster::ExplorerTarget;
use burner_wallet::gate::PendingConfirmation;
use burner_wallet::{format_lamports, Cluster, Notice, Notifier};
use colored::Colorize;
use solana_sdk::signature::Signature;

use crate::config::Session;

/// Prints gate notices to the terminal
pub struct ConsoleNotifier {
    cluster: Cluster,
}

impl ConsoleNotifier {
    pub fn new(cluster: Cluster) -> Self {
        Self { cluster }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Error(message) => println!("{} {}", "Request rejected:".red().bold(), message),
            Notice::Failure(message) => println!("{}", message.red()),
            Notice::Submitted(signature) => {
                println!();
                println!("{}", "Transaction sent!".green().bold());
                println!("Signature: {}", signature);
                println!(
                    "{}",
                    self.cluster
                        .explorer_url(ExplorerTarget::Transaction(&signature.to_string()))
                        .dimmed()
                );
            }
        }
    }
}

/// Print the transaction awaiting confirmation
pub fn print_pending(state: &PendingConfirmation) {
    let Some(pending) = state.awaiting() else {
        return;
    };

    println!();
    println!("{}", "Confirm Transaction".yellow().bold());
    println!();

    if let Some(metadata) = &pending.metadata {
        if let Some(label) = &metadata.label {
            println!("Requested by: {}", label.bold());
        }
        if let Some(icon) = &metadata.icon {
            println!("Icon:         {}", icon.dimmed());
        }
    }
    if let Some(message) = &pending.message {
        println!("Message:      {}", message);
    }

    let details = &pending.details;
    println!("Fee payer:    {}", details.fee_payer);
    println!("Signatures:   {}", details.required_signatures);
    println!("Network fee:  {}", format_lamports(details.fee));
    if let Some(memo) = &details.memo {
        println!("Memo:         {}", memo);
    }
    println!();
}

/// Ask a yes/no question; anything but `y`/`yes` is a no
pub fn prompt_yes(input: &mut impl BufRead, question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer).context("Failed to read answer")?;

    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Show the prepared transaction and submit it once approved
///
/// Returns `None` when the user declines; the gate is cancelled.
pub async fn approve_and_submit(session: &Session, assume_yes: bool) -> Result<Option<Signature>> {
    print_pending(&session.gate.state());

    let approved = assume_yes || prompt_yes(&mut io::stdin().lock(), "Approve this transaction?")?;
    if !approved {
        session.gate.cancel();
        println!("{}", "Transaction cancelled.".yellow());
        return Ok(None);
    }

    println!("{}", "Signing and sending...".cyan());
    let signature = session
        .gate
        .confirm(&session.wallet)
        .await
        .context("Transaction was not submitted")?;

    println!("New balance: {}", format_lamports(session.wallet.balance()).green());
    Ok(Some(signature))
}
