//! Network selector

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Solana cluster the wallet operates against
///
/// Connections, balances and claim codes are all scoped to the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub const ALL: [Cluster; 4] = [
        Cluster::Devnet,
        Cluster::Testnet,
        Cluster::MainnetBeta,
        Cluster::Localnet,
    ];

    /// Public JSON-RPC endpoint
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    /// Public websocket endpoint for subscriptions
    pub fn ws_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "wss://api.devnet.solana.com",
            Cluster::Testnet => "wss://api.testnet.solana.com",
            Cluster::MainnetBeta => "wss://api.mainnet-beta.solana.com",
            Cluster::Localnet => "ws://127.0.0.1:8900",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Localnet => "localnet",
        }
    }

    /// Airdrops are only served by the test clusters
    pub fn supports_airdrop(&self) -> bool {
        !matches!(self, Cluster::MainnetBeta)
    }

    /// Solana explorer link for an address or a transaction signature
    pub fn explorer_url(&self, target: ExplorerTarget<'_>) -> String {
        let path = match target {
            ExplorerTarget::Address(address) => format!("address/{}", address),
            ExplorerTarget::Transaction(sig) => format!("tx/{}", sig),
        };

        match self {
            Cluster::Localnet => format!(
                "https://explorer.solana.com/{}?cluster=custom&customUrl={}",
                path,
                self.rpc_url()
            ),
            _ => format!("https://explorer.solana.com/{}?cluster={}", path, self.as_str()),
        }
    }
}

/// What an explorer link points at
#[derive(Debug, Clone, Copy)]
pub enum ExplorerTarget<'a> {
    Address(&'a str),
    Transaction(&'a str),
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(format!(
                "unknown cluster '{}' (expected devnet, testnet, mainnet-beta or localnet)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_names_roundtrip() {
        for cluster in Cluster::ALL {
            assert_eq!(cluster.to_string().parse::<Cluster>().unwrap(), cluster);
        }
        assert_eq!("mainnet".parse::<Cluster>().unwrap(), Cluster::MainnetBeta);
        assert!("moonnet".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_explorer_url() {
        let url = Cluster::Devnet.explorer_url(ExplorerTarget::Transaction("abc"));
        assert_eq!(url, "https://explorer.solana.com/tx/abc?cluster=devnet");

        let url = Cluster::MainnetBeta.explorer_url(ExplorerTarget::Address("xyz"));
        assert_eq!(url, "https://explorer.solana.com/address/xyz?cluster=mainnet-beta");
    }

    #[test]
    fn test_serde_uses_cluster_names() {
        let json = serde_json::to_string(&Cluster::MainnetBeta).unwrap();
        assert_eq!(json, "\"mainnet-beta\"");
    }
}
