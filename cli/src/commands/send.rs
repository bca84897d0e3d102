//! Send SOL from the burner

use std::convert::Infallible;

use anyhow::{Context, Result};
use burner_wallet::prepare::prepare_transfer;
use burner_wallet::request::parse_address;
use burner_wallet::{format_lamports, TransferRequest};
use colored::Colorize;

use crate::commands::approve_and_submit;
use crate::config::Session;

pub struct SendOptions {
    pub to: String,
    pub lamports: u64,
    pub memo: Option<String>,
    pub yes: bool,
}

pub async fn run(session: &Session, options: SendOptions) -> Result<()> {
    let recipient = parse_address(options.to.trim()).context("Invalid recipient")?;

    println!(
        "{}",
        format!("Preparing transfer of {} to {}...", format_lamports(options.lamports), recipient).cyan()
    );

    let mut request = TransferRequest::new(recipient).with_amount(options.lamports);
    request.memo = options.memo;

    let payer = session.wallet.address();
    session
        .gate
        .begin_preparation(&session.wallet, async {
            Ok::<_, Infallible>(prepare_transfer(request, &payer, None))
        })
        .await
        .context("Failed to prepare transfer")?;

    approve_and_submit(session, options.yes).await?;
    Ok(())
}
