//! Runtime configuration for the burner CLI
//!
//! Everything here comes from global command-line flags (or their
//! environment variables); nothing is read from a config file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use burner_wallet::{
    request::parse_amount, Cluster, ConfirmationGate, LedgerClient, LocalStorage, RelayClient, RpcLedger, Wallet,
};
use tracing::debug;
use url::Url;

use crate::commands::ConsoleNotifier;

/// Default directory for burner wallet data
pub fn default_storage_dir() -> Result<PathBuf> {
    LocalStorage::default_dir().context("Could not find home directory")
}

/// Resolved global settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub cluster: Cluster,
    /// Overrides the cluster's public RPC endpoint
    pub rpc_url: Option<String>,
    pub relay_url: Url,
    pub site_url: Url,
    pub storage_dir: PathBuf,
    pub timeout: Duration,
}

impl Settings {
    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.cluster.rpc_url().to_string())
    }

    pub fn ws_url(&self) -> String {
        match &self.rpc_url {
            Some(rpc_url) => ws_url_for(rpc_url),
            None => self.cluster.ws_url().to_string(),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage().path().to_path_buf()
    }

    pub fn storage(&self) -> LocalStorage {
        LocalStorage::in_dir(&self.storage_dir)
    }

    pub fn ledger(&self) -> Arc<dyn LedgerClient> {
        RpcLedger::new(self.rpc_url(), self.ws_url()).into_shared()
    }

    pub fn relay(&self) -> Result<RelayClient> {
        RelayClient::new(&self.relay_url, self.timeout).context("Invalid relay URL")
    }
}

/// Everything a command needs, loaded once per invocation
pub struct Session {
    pub settings: Settings,
    pub storage: LocalStorage,
    pub wallet: Wallet,
    pub relay: RelayClient,
    pub gate: ConfirmationGate,
}

impl Session {
    /// Load the burner from storage against the configured cluster
    pub fn open(settings: Settings) -> Result<Self> {
        let ledger = settings.ledger();
        Self::with_ledger(settings, ledger)
    }

    pub fn with_ledger(settings: Settings, ledger: Arc<dyn LedgerClient>) -> Result<Self> {
        let storage = settings.storage();
        let wallet = Wallet::load(&storage, settings.cluster, ledger)
            .with_context(|| format!("Failed to load burner from {}", storage.path().display()))?;
        let relay = settings.relay()?;
        let gate = ConfirmationGate::new(Arc::new(ConsoleNotifier::new(settings.cluster)));
        debug!("Loaded burner {} on {}", wallet.address(), settings.cluster);

        Ok(Self {
            settings,
            storage,
            wallet,
            relay,
            gate,
        })
    }
}

/// Websocket endpoint paired with an RPC endpoint
///
/// Follows the validator's default of serving pubsub on the RPC port + 1.
pub fn ws_url_for(rpc_url: &str) -> String {
    let Ok(mut url) = Url::parse(rpc_url) else {
        return rpc_url.to_string();
    };

    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return rpc_url.to_string(),
    };
    let _ = url.set_scheme(scheme);

    if let Some(port) = url.port() {
        let _ = url.set_port(port.checked_add(1));
    }

    url.to_string()
}

/// clap value parser for SOL amounts such as `0.01`
pub fn parse_sol(text: &str) -> std::result::Result<u64, String> {
    let lamports = parse_amount(text).map_err(|e| e.to_string())?;
    if lamports == 0 {
        return Err("amount must be greater than zero".to_string());
    }
    Ok(lamports)
}
