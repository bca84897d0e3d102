//! In-memory ledger for pipeline tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use tokio::sync::mpsc;

use crate::error::LedgerError;
use crate::gate::{Notice, Notifier};
use crate::ledger::LedgerClient;

pub struct MockLedger {
    pub blockhash: Hash,
    fee: AtomicU64,
    fee_fails: AtomicBool,
    fee_delay: Mutex<Duration>,
    send_fails: AtomicBool,
    balances: Mutex<HashMap<Pubkey, u64>>,
    sent: Mutex<Vec<VersionedTransaction>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<u64>>>,
    blockhash_calls: AtomicUsize,
    fee_calls: AtomicUsize,
    balance_calls: AtomicUsize,
    airdrops: AtomicUsize,
    airdrop_error: Mutex<Option<String>>,
    confirm_error: Mutex<Option<String>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            fee: AtomicU64::new(5_000),
            fee_fails: AtomicBool::new(false),
            fee_delay: Mutex::new(Duration::ZERO),
            send_fails: AtomicBool::new(false),
            balances: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            blockhash_calls: AtomicUsize::new(0),
            fee_calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
            airdrops: AtomicUsize::new(0),
            airdrop_error: Mutex::new(None),
            confirm_error: Mutex::new(None),
        }
    }

    pub fn set_fee(&self, fee: u64) {
        self.fee.store(fee, Ordering::SeqCst);
    }

    pub fn fail_fee_queries(&self) {
        self.fee_fails.store(true, Ordering::SeqCst);
    }

    pub fn delay_fee_queries(&self, delay: Duration) {
        *self.fee_delay.lock().unwrap() = delay;
    }

    pub fn fail_sends(&self) {
        self.send_fails.store(true, Ordering::SeqCst);
    }

    /// Make every airdrop request fail with `message`
    pub fn fail_airdrops(&self, message: &str) {
        *self.airdrop_error.lock().unwrap() = Some(message.to_string());
    }

    /// Make every confirmation wait fail with `message`
    pub fn fail_confirmations(&self, message: &str) {
        *self.confirm_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.balances.lock().unwrap().insert(address, lamports);
    }

    /// Push an account-change notification to every subscriber
    pub fn notify_account_change(&self, slot: u64) {
        for subscriber in self.subscribers.lock().unwrap().iter() {
            let _ = subscriber.send(slot);
        }
    }

    /// Close every subscription channel
    pub fn close_subscriptions(&self) {
        self.subscribers.lock().unwrap().clear();
    }

    pub fn sent(&self) -> Vec<VersionedTransaction> {
        self.sent.lock().unwrap().clone()
    }

    pub fn blockhash_calls(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst)
    }

    pub fn fee_queries(&self) -> usize {
        self.fee_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn airdrops(&self) -> usize {
        self.airdrops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blockhash)
    }

    async fn fee_for_message(&self, _message: &VersionedMessage) -> Result<u64, LedgerError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fee_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fee_fails.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("fee query failed".to_string()));
        }
        Ok(self.fee.load(Ordering::SeqCst))
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balances.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    async fn send_transaction(&self, transaction: &VersionedTransaction) -> Result<Signature, LedgerError> {
        if self.send_fails.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("Transaction simulation failed".to_string()));
        }
        self.sent.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures.first().copied().unwrap_or_default())
    }

    async fn confirm_transaction(&self, _signature: &Signature) -> Result<(), LedgerError> {
        if let Some(message) = self.confirm_error.lock().unwrap().clone() {
            return Err(LedgerError::Unavailable(message));
        }
        Ok(())
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature, LedgerError> {
        self.airdrops.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.airdrop_error.lock().unwrap().clone() {
            return Err(LedgerError::Unavailable(message));
        }
        *self.balances.lock().unwrap().entry(*address).or_insert(0) += lamports;
        Ok(Signature::new_unique())
    }

    async fn minimum_balance_for_rent_exemption(&self, _data_len: usize) -> Result<u64, LedgerError> {
        Ok(890_880)
    }

    async fn subscribe_account(&self, _address: &Pubkey) -> Result<mpsc::UnboundedReceiver<u64>, LedgerError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(sender);
        Ok(receiver)
    }
}

/// Notifier that keeps every notice for later inspection
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Drain the notices recorded so far
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
