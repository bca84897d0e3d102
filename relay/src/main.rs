//! Burner relay server
//!
//! # Usage
//!
//! ```bash
//! burner-relay --bind 127.0.0.1:3000
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use burner_relay::{router, AppState};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "burner-relay")]
#[command(version)]
#[command(about = "Same-origin relay for Solana Pay transaction requests")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BURNER_RELAY_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Timeout for each forwarded request, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "burner_relay=info,tower_http=debug".into()),
        )
        .init();

    let state = AppState::new(Duration::from_secs(args.timeout_secs))
        .context("Failed to build the forwarding client")?;
    let app = router(Arc::new(state));

    info!("Starting burner relay on {}", args.bind);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    axum::serve(listener, app).await?;

    Ok(())
}
