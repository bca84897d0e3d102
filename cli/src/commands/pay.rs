//! Process a scanned or typed payment request
//!
//! Accepts a Solana Pay transfer request, a Solana Pay transaction request
//! or a bare address (which needs `--amount`).

use std::convert::Infallible;

use anyhow::{Context, Result};
use burner_wallet::{format_lamports, parse, prepare, ParsedInput};
use colored::Colorize;

use crate::commands::approve_and_submit;
use crate::config::Session;

pub struct PayOptions {
    pub input: String,
    pub lamports: Option<u64>,
    pub yes: bool,
}

pub async fn run(session: &Session, options: PayOptions) -> Result<()> {
    let input = parse(&options.input).context("Unable to read payment request")?;
    describe(&input, options.lamports);

    let payer = session.wallet.address();
    session
        .gate
        .begin_preparation(&session.wallet, async {
            Ok::<_, Infallible>(prepare(input, &payer, &session.relay, options.lamports).await)
        })
        .await
        .context("Failed to prepare payment")?;

    approve_and_submit(session, options.yes).await?;
    Ok(())
}

fn describe(input: &ParsedInput, fallback: Option<u64>) {
    match input {
        ParsedInput::Transfer(request) => {
            println!("{}", "Solana Pay transfer request".cyan());
            println!("Recipient: {}", request.recipient);
            if let Some(amount) = request.amount.or(fallback) {
                println!("Amount:    {}", format_lamports(amount).green());
            }
            if let Some(label) = &request.label {
                println!("Label:     {}", label);
            }
            if !request.references.is_empty() {
                println!("References: {}", request.references.len());
            }
        }
        ParsedInput::TransactionRequest(request) => {
            println!("{}", "Solana Pay transaction request".cyan());
            println!("Fetching transaction from {}...", request.link);
        }
        ParsedInput::Address(address) => {
            println!("{}", "Payment to address".cyan());
            println!("Recipient: {}", address);
            if let Some(amount) = fallback {
                println!("Amount:    {}", format_lamports(amount).green());
            }
        }
    }
}
