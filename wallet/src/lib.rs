//! Burner Wallet core
//!
//! A disposable Solana keypair kept in client-side storage, plus the
//! pipeline that turns an externally supplied payment request into a
//! signed, submitted transaction:
//!
//! ```text
//! request::parse ─┬─ Transfer Request ──── transfer::create_transfer_transaction ─┐
//!                 └─ Transaction Request ─ resolver::RelayClient::resolve ────────┤
//!                                                                                 ▼
//!          gate::ConfirmationGate (details::TransactionDetails, user decision)
//!                                                                                 ▼
//!                          signer::sign_and_send ──► wallet::Wallet::sync_balance
//! ```
//!
//! Every network call goes through the [`ledger::LedgerClient`] seam.

pub mod claim;
pub mod cluster;
pub mod details;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod prepare;
pub mod request;
pub mod resolver;
pub mod signer;
pub mod storage;
pub mod transaction;
pub mod transfer;
pub mod wallet;

#[cfg(test)]
mod test_utils;



pub use cluster::Cluster;
pub use details::TransactionDetails;
pub use gate::{ConfirmationGate, Notice, Notifier, PendingConfirmation, Preparation};
pub use ledger::{LedgerClient, RpcLedger};
pub use request::{parse, ParsedInput, TransactionRequest, TransferRequest};
pub use prepare::prepare;
pub use resolver::{RelayClient, ResolvedTransaction};
pub use storage::LocalStorage;
pub use transaction::AnyTransaction;
pub use wallet::Wallet;

/// Base transaction fee for each signature (lamports per signer)
pub const LAMPORTS_PER_SIGNER: u64 = 5_000;

/// SPL Memo program ID
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

/// Storage key holding the base58 encoded secret key of the burner wallet
pub const LOCAL_STORAGE_BURNER_KEY: &str = "default_keypair";

/// Storage key holding the user generated claim codes
pub const LOCAL_STORAGE_CLAIM_CODE: &str = "claim_codes";

/// Relay path that forwards Solana Pay transaction requests
pub const RELAY_PATH: &str = "/api/solanapay";

/// Format lamports as SOL for display, e.g. `0.01 SOL`
pub fn format_lamports(lamports: u64) -> String {
    format!("{} SOL", request::format_amount(lamports))
}
