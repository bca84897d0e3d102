//! Network access behind a single seam
//!
//! Every suspension point of the pipeline (fee query, blockhash, submit,
//! balance, airdrop, account subscription) is a [`LedgerClient`] call, so
//! the rest of the crate can be driven by an in-memory ledger in tests.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::{pubsub_client::PubsubClient, rpc_client::RpcClient},
    rpc_config::{RpcAccountInfoConfig, RpcSendTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::LedgerError;

/// Transport-level retry bound for transaction submission
pub const SEND_MAX_RETRIES: usize = 5;

/// Network operations used by the wallet pipeline
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Most recent blockhash to anchor a transaction to
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Fee in lamports the network would charge for `message`
    async fn fee_for_message(&self, message: &VersionedMessage) -> Result<u64, LedgerError>;

    /// Lamport balance of `address`
    async fn balance(&self, address: &Pubkey) -> Result<u64, LedgerError>;

    /// Submit a signed transaction, retried up to [`SEND_MAX_RETRIES`] times
    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature, LedgerError>;

    /// Wait until `signature` reaches the client's commitment level
    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), LedgerError>;

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature, LedgerError>;

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError>;

    /// Stream of slots at which `address` changed
    ///
    /// The channel closes when the underlying subscription ends.
    async fn subscribe_account(&self, address: &Pubkey) -> Result<mpsc::UnboundedReceiver<u64>, LedgerError>;
}

/// [`LedgerClient`] backed by Solana JSON-RPC and websocket endpoints
pub struct RpcLedger {
    client: RpcClient,
    ws_url: String,
}

impl RpcLedger {
    pub fn new(rpc_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.into(), CommitmentConfig::confirmed()),
            ws_url: ws_url.into(),
        }
    }

    pub fn into_shared(self) -> Arc<dyn LedgerClient> {
        Arc::new(self)
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn fee_for_message(&self, message: &VersionedMessage) -> Result<u64, LedgerError> {
        let fee = match message {
            VersionedMessage::Legacy(message) => self.client.get_fee_for_message(message).await?,
            VersionedMessage::V0(message) => self.client.get_fee_for_message(message).await?,
        };
        Ok(fee)
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        Ok(self.client.get_balance(address).await?)
    }

    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            max_retries: Some(SEND_MAX_RETRIES),
            ..RpcSendTransactionConfig::default()
        };
        Ok(self.client.send_transaction_with_config(transaction, config).await?)
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<(), LedgerError> {
        self.client
            .poll_for_signature_with_commitment(signature, self.client.commitment())
            .await?;
        Ok(())
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature, LedgerError> {
        Ok(self.client.request_airdrop(address, lamports).await?)
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, LedgerError> {
        Ok(self.client.get_minimum_balance_for_rent_exemption(data_len).await?)
    }

    async fn subscribe_account(&self, address: &Pubkey) -> Result<mpsc::UnboundedReceiver<u64>, LedgerError> {
        let pubsub = PubsubClient::new(&self.ws_url)
            .await
            .map_err(|e| LedgerError::Subscription(e.to_string()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let address = *address;

        // The subscription stream borrows the client, so both live in the task
        tokio::spawn(async move {
            let config = RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                // tightest confirmation level
                commitment: Some(CommitmentConfig::finalized()),
                ..RpcAccountInfoConfig::default()
            };

            let (mut notifications, unsubscribe) = match pubsub.account_subscribe(&address, Some(config)).await {
                Ok(subscription) => subscription,
                Err(e) => {
                    warn!("Account subscription for {} failed: {}", address, e);
                    return;
                }
            };

            debug!("Subscribed to account changes for {}", address);
            while let Some(update) = notifications.next().await {
                if sender.send(update.context.slot).is_err() {
                    break;
                }
            }

            unsubscribe().await;
            debug!("Account subscription for {} closed", address);
        });

        Ok(receiver)
    }
}
