//! Local wallet state: the resident burner keypair, its cached balance and
//! the selected cluster
//!
//! The keypair is created once at load time and never mutated afterwards;
//! it is shared read-only with the signer and the balance sync.

use std::sync::Arc;

use solana_sdk::{
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    signer::keypair::keypair_from_seed,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::cluster::Cluster;
use crate::error::{LedgerError, StorageError};
use crate::ledger::LedgerClient;
use crate::storage::LocalStorage;
use crate::LOCAL_STORAGE_BURNER_KEY;

/// Default airdrop request (0.5 SOL)
pub const DEFAULT_AIRDROP_LAMPORTS: u64 = LAMPORTS_PER_SOL / 2;

/// The burner wallet and everything scoped to it
pub struct Wallet {
    keypair: Arc<Keypair>,
    cluster: Cluster,
    ledger: Arc<dyn LedgerClient>,
    balance: watch::Sender<u64>,
}

impl Wallet {
    pub fn new(keypair: Keypair, cluster: Cluster, ledger: Arc<dyn LedgerClient>) -> Self {
        let (balance, _) = watch::channel(0);
        Self {
            keypair: Arc::new(keypair),
            cluster,
            ledger,
            balance,
        }
    }

    /// Load the resident keypair from storage, generating one when needed
    pub fn load(
        storage: &LocalStorage,
        cluster: Cluster,
        ledger: Arc<dyn LedgerClient>,
    ) -> Result<Self, StorageError> {
        let keypair = load_or_generate_keypair(storage)?;
        Ok(Self::new(keypair, cluster, ledger))
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn address(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn cluster(&self) -> Cluster {
        self.cluster
    }

    pub fn ledger(&self) -> Arc<dyn LedgerClient> {
        Arc::clone(&self.ledger)
    }

    /// Last synced balance in lamports
    pub fn balance(&self) -> u64 {
        *self.balance.borrow()
    }

    /// Receiver that observes every balance sync
    pub fn subscribe_balance(&self) -> watch::Receiver<u64> {
        self.balance.subscribe()
    }

    /// Re-query the balance from the network
    ///
    /// Balances are never adjusted locally from transaction contents.
    pub async fn sync_balance(&self) -> Result<u64, LedgerError> {
        debug!("Syncing the state with the blockchain...");
        let lamports = self.ledger.balance(&self.address()).await?;
        self.balance.send_replace(lamports);
        debug!("Sync complete: {} lamports", lamports);
        Ok(lamports)
    }

    /// Switch clusters, dropping the cached balance and syncing again
    pub async fn switch_cluster(
        &mut self,
        cluster: Cluster,
        ledger: Arc<dyn LedgerClient>,
    ) -> Result<u64, LedgerError> {
        info!("Switching cluster {} -> {}", self.cluster, cluster);
        self.cluster = cluster;
        self.ledger = ledger;
        self.balance.send_replace(0);
        self.sync_balance().await
    }

    /// Request test funds for the burner and wait for them to land
    pub async fn request_airdrop(&self, lamports: u64) -> Result<Signature, LedgerError> {
        if !self.cluster.supports_airdrop() {
            return Err(LedgerError::AirdropUnsupported(self.cluster.to_string()));
        }

        info!("Requesting airdrop of {} lamports on {}", lamports, self.cluster);
        let signature = self
            .ledger
            .request_airdrop(&self.address(), lamports)
            .await
            .map_err(|e| if is_rate_limited(&e) { LedgerError::RateLimited } else { e })?;

        self.ledger.confirm_transaction(&signature).await?;

        if let Err(e) = self.sync_balance().await {
            warn!("Balance sync after airdrop failed: {}", e);
        }
        Ok(signature)
    }

    /// Follow account-change notifications for the burner address
    ///
    /// Each notification triggers a fresh balance query. Returns when the
    /// subscription closes; call again after a cluster switch.
    pub async fn watch_account(&self) -> Result<(), LedgerError> {
        let mut changes = self.ledger.subscribe_account(&self.address()).await?;

        while let Some(slot) = changes.recv().await {
            debug!("Account changed at slot {}", slot);
            if let Err(e) = self.sync_balance().await {
                warn!("Balance sync after account change failed: {}", e);
            }
        }

        Ok(())
    }
}

fn is_rate_limited(error: &LedgerError) -> bool {
    let message = error.to_string();
    message.starts_with("429") || message.contains("429 Too Many Requests")
}

/// Read the persisted burner keypair, or generate and persist a new one
///
/// A missing or malformed value is replaced with a fresh keypair. Storage
/// always ends up holding the resident keypair's encoding.
pub fn load_or_generate_keypair(storage: &LocalStorage) -> Result<Keypair, StorageError> {
    let current = storage.get_item(LOCAL_STORAGE_BURNER_KEY)?;

    let keypair = match current.as_deref().map(decode_secret_key) {
        Some(Some(keypair)) => keypair,
        Some(None) => {
            warn!("Invalid keypair found in local storage, generating a new burner");
            Keypair::new()
        }
        None => {
            info!("No burner keypair found, generating a new one");
            Keypair::new()
        }
    };

    let mut encoded = encode_secret_key(&keypair);
    if current.as_deref() != Some(encoded.as_str()) {
        storage.set_item(LOCAL_STORAGE_BURNER_KEY, &encoded)?;
    }
    encoded.zeroize();

    Ok(keypair)
}

/// Base58 encoding of the 64-byte secret key
pub fn encode_secret_key(keypair: &Keypair) -> String {
    let mut bytes = keypair.to_bytes();
    let encoded = bs58::encode(&bytes).into_string();
    bytes.zeroize();
    encoded
}

/// Decode a base58 secret key, checking the embedded public key
pub fn decode_secret_key(encoded: &str) -> Option<Keypair> {
    let mut bytes = bs58::decode(encoded.trim()).into_vec().ok()?;

    let keypair = if bytes.len() == 64 {
        keypair_from_seed(&bytes[..32])
            .ok()
            .filter(|keypair| keypair.pubkey().as_ref() == &bytes[32..])
    } else {
        None
    };

    bytes.zeroize();
    keypair
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockLedger;
    use tempfile::tempdir;

    #[test]
    fn test_secret_key_roundtrip() {
        let keypair = Keypair::new();
        let decoded = decode_secret_key(&encode_secret_key(&keypair)).unwrap();
        assert_eq!(decoded.pubkey(), keypair.pubkey());
        assert_eq!(decoded.to_bytes(), keypair.to_bytes());
    }

    #[test]
    fn test_mismatched_public_half_is_rejected() {
        let mut bytes = Keypair::new().to_bytes();
        bytes[32..].copy_from_slice(&Keypair::new().pubkey().to_bytes());
        assert!(decode_secret_key(&bs58::encode(bytes).into_string()).is_none());
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        assert!(decode_secret_key(&bs58::encode([7u8; 32]).into_string()).is_none());
        assert!(decode_secret_key("").is_none());
    }

    #[test]
    fn test_generates_and_persists_when_empty() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());

        let keypair = load_or_generate_keypair(&storage).unwrap();
        let stored = storage.get_item(LOCAL_STORAGE_BURNER_KEY).unwrap().unwrap();
        assert_eq!(stored, encode_secret_key(&keypair));

        // second load keeps the same burner
        let again = load_or_generate_keypair(&storage).unwrap();
        assert_eq!(again.pubkey(), keypair.pubkey());
    }

    #[tokio::test]
    async fn test_sync_balance_requeries() {
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        ledger.set_balance(wallet.address(), 1_000);
        assert_eq!(wallet.sync_balance().await.unwrap(), 1_000);

        ledger.set_balance(wallet.address(), 400);
        assert_eq!(wallet.sync_balance().await.unwrap(), 400);
        assert_eq!(wallet.balance(), 400);
        assert_eq!(ledger.balance_calls(), 2);
    }

    #[tokio::test]
    async fn test_switch_cluster_resets_and_resyncs() {
        let devnet = Arc::new(MockLedger::new());
        let testnet = Arc::new(MockLedger::new());
        let mut wallet = Wallet::new(Keypair::new(), Cluster::Devnet, devnet.clone());

        devnet.set_balance(wallet.address(), 5_000_000);
        wallet.sync_balance().await.unwrap();

        testnet.set_balance(wallet.address(), 42);
        let balance = wallet.switch_cluster(Cluster::Testnet, testnet.clone()).await.unwrap();

        assert_eq!(balance, 42);
        assert_eq!(wallet.cluster(), Cluster::Testnet);
        assert_eq!(testnet.balance_calls(), 1);
    }

    #[tokio::test]
    async fn test_airdrop_resyncs_balance() {
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        wallet.request_airdrop(DEFAULT_AIRDROP_LAMPORTS).await.unwrap();

        assert_eq!(ledger.airdrops(), 1);
        assert_eq!(wallet.balance(), 500_000_000);
    }

    #[tokio::test]
    async fn test_airdrop_rate_limit() {
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_airdrops("429 Too Many Requests: airdrop limit reached");
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        let err = wallet.request_airdrop(DEFAULT_AIRDROP_LAMPORTS).await.unwrap_err();
        assert!(matches!(err, LedgerError::RateLimited));
        assert_eq!(err.to_string(), "Airdrop rate limit exceeded");
    }

    #[tokio::test]
    async fn test_no_airdrop_on_mainnet() {
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::MainnetBeta, ledger.clone());

        let err = wallet.request_airdrop(DEFAULT_AIRDROP_LAMPORTS).await.unwrap_err();
        assert!(matches!(err, LedgerError::AirdropUnsupported(_)));
        assert_eq!(ledger.airdrops(), 0);
    }

    #[tokio::test]
    async fn test_each_account_change_triggers_a_sync() {
        let ledger = Arc::new(MockLedger::new());
        let wallet = Arc::new(Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone()));
        let mut balances = wallet.subscribe_balance();

        let watcher = {
            let wallet = Arc::clone(&wallet);
            tokio::spawn(async move { wallet.watch_account().await })
        };

        // wait for the subscription to be registered
        while ledger.balance_calls() == 0 {
            ledger.set_balance(wallet.address(), 10);
            ledger.notify_account_change(1);
            tokio::task::yield_now().await;
        }
        balances.changed().await.unwrap();

        ledger.set_balance(wallet.address(), 20);
        ledger.notify_account_change(2);
        balances.changed().await.unwrap();
        assert_eq!(*balances.borrow(), 20);

        ledger.close_subscriptions();
        watcher.await.unwrap().unwrap();
    }
}
