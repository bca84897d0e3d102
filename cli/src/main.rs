//! Burner CLI - a disposable Solana wallet for the terminal

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use burner_wallet::Cluster;
use clap::{Parser, Subcommand};
use url::Url;

mod commands;
mod config;




use commands::*;
use config::{default_storage_dir, parse_sol, Session, Settings};

#[derive(Parser)]
#[command(name = "burner")]
#[command(version = "0.1.0")]
#[command(about = "Burner wallet for Solana - scan, confirm, pay")]
#[command(long_about = r#"
A burner wallet keeps a throwaway Solana keypair on this machine and pays
Solana Pay requests with it after you confirm each transaction.

Quick Start:
  1. burner address              Show your burner address
  2. burner airdrop              Get test funds (devnet/testnet)
  3. burner pay "solana:..."     Pay a scanned Solana Pay request
  4. burner link --amount 0.1    Send funds as a claim link
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Solana cluster
    #[arg(long, global = true, env = "BURNER_CLUSTER", default_value_t = Cluster::Devnet)]
    cluster: Cluster,

    /// Override the cluster's RPC URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Relay used to resolve Solana Pay transaction requests (may include a path prefix)
    #[arg(long, global = true, env = "BURNER_RELAY_URL", default_value = "http://127.0.0.1:3000")]
    relay_url: Url,

    /// Base URL of generated claim links
    #[arg(long, global = true, default_value = "https://burner.codes")]
    site_url: Url,

    /// Directory holding the burner storage file (default: ~/.burner)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Timeout for resolving transaction requests, in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the burner address and its payment link
    Address,

    /// Show the burner balance
    Balance,

    /// Request test funds (not available on mainnet-beta)
    Airdrop {
        /// Amount of SOL to request
        #[arg(short, long, value_parser = parse_sol, default_value = "0.5")]
        amount: u64,
    },

    /// Send SOL to an address
    Send {
        /// Recipient address
        #[arg(short, long)]
        to: String,

        /// Amount of SOL to send
        #[arg(short, long, value_parser = parse_sol)]
        amount: u64,

        /// Memo attached to the transfer
        #[arg(long)]
        memo: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Pay a Solana Pay URL or an address
    Pay {
        /// Scanned or typed text (solana:... URL or address)
        input: String,

        /// Amount of SOL, for requests that do not carry one
        #[arg(short, long, value_parser = parse_sol)]
        amount: Option<u64>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Fund a claim link anyone can redeem
    Link {
        /// Amount of SOL to put behind the link
        #[arg(short, long, value_parser = parse_sol)]
        amount: u64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Claim the funds behind a claim link
    Claim {
        /// Claim link or claim code
        code: String,

        /// Destination address (default: your burner)
        #[arg(short, long)]
        to: Option<String>,
    },

    /// List claim links created on this cluster
    Codes,

    /// Follow the burner balance live
    Watch,

    /// Show configuration and wallet info
    Info,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "burner_wallet=info,burner=info",
        _ => "burner_wallet=debug,burner=debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let storage_dir = match &self.storage_dir {
            Some(dir) => dir.clone(),
            None => default_storage_dir()?,
        };

        Ok(Settings {
            cluster: self.cluster,
            rpc_url: self.rpc_url.clone(),
            relay_url: self.relay_url.clone(),
            site_url: self.site_url.clone(),
            storage_dir,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let session = Session::open(cli.settings()?)?;

    match cli.command {
        Commands::Address => {
            address::run(&session)?;
        }
        Commands::Balance => {
            balance::run(&session).await?;
        }
        Commands::Airdrop { amount } => {
            airdrop::run(&session, amount).await?;
        }
        Commands::Send { to, amount, memo, yes } => {
            send::run(&session, send::SendOptions {
                to,
                lamports: amount,
                memo,
                yes,
            })
            .await?;
        }
        Commands::Pay { input, amount, yes } => {
            pay::run(&session, pay::PayOptions {
                input,
                lamports: amount,
                yes,
            })
            .await?;
        }
        Commands::Link { amount, yes } => {
            link::run(&session, amount, yes).await?;
        }
        Commands::Claim { code, to } => {
            claim::run(&session, &code, to.as_deref()).await?;
        }
        Commands::Codes => {
            codes::run(&session).await?;
        }
        Commands::Watch => {
            watch::run(&session).await?;
        }
        Commands::Info => {
            info::run(&session).await?;
        }
    }

    Ok(())
}
