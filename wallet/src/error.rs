//! Error vocabulary for each pipeline stage
//!
//! Library failures are converted into these types at the stage boundary,
//! so nothing from `reqwest`, `bincode` or `solana-client` leaks across
//! into the next stage.

use solana_sdk::signature::Signature;
use thiserror::Error;

/// Input could not be read as a payment request or an address
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Not a Solana Pay URL")]
    NotPaymentUrl,

    #[error("Invalid Solana address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transaction request link: {0}")]
    InvalidLink(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("Unrecognized input - not a payment request or Solana address")]
    Unrecognized,
}

/// Failures of the remote transaction-request resolution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Invalid transaction request link: {0}")]
    InvalidLink(String),

    #[error("Unable to reach the relay: {0}")]
    RelayUnreachable(String),

    #[error("Relay rejected the request: {0}")]
    RelayRejected(String),

    #[error("Unable to parse relay response")]
    MalformedMetadata,

    #[error("No transaction provided from the url")]
    NoTransactionField,

    #[error("Unable to decode the provided transaction")]
    UndecodableTransaction,

    /// `error` field returned by the transaction request endpoint
    #[error("{0}")]
    Remote(String),
}

/// A transfer request that cannot be built client-side
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Transfer request has no amount")]
    MissingAmount,

    #[error("SPL token transfers are not supported (token {0})")]
    UnsupportedToken(String),
}

/// Network call failures behind the ledger seam
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Airdrop rate limit exceeded")]
    RateLimited,

    #[error("Airdrops are not available on {0}")]
    AirdropUnsupported(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Failures while finalizing, signing or submitting a transaction
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Transaction has no accounts")]
    EmptyMessage,

    #[error("Burner wallet {0} is not a required signer of this transaction")]
    NotASigner(String),

    #[error("Unable to fetch a recent blockhash: {0}")]
    Blockhash(#[source] LedgerError),

    #[error("Transaction submission failed: {0}")]
    Submission(#[source] LedgerError),
}

/// Client-side storage failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),

    #[error("Could not find home directory")]
    NoHomeDirectory,
}

/// Failures reported by the confirmation gate
#[derive(Debug, Error)]
pub enum GateError {
    /// A newer preparation or a cancel replaced this one while it was in flight
    #[error("Preparation superseded by a newer request")]
    Superseded,

    #[error("{0}")]
    Rejected(String),

    #[error("Unable to resolve transaction")]
    ResolutionFailed,

    #[error("No transaction is awaiting confirmation")]
    NothingToConfirm,

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Claim link failures
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Invalid claim code")]
    InvalidCode,

    #[error("Claim amount must be greater than zero and fit in a u64")]
    InvalidAmount,

    #[error("Claim account is empty - nothing to claim")]
    NothingToClaim,

    #[error("Invalid destination address: {0}")]
    InvalidDestination(String),

    #[error("Funding transaction {signature} was sent but not confirmed ({source}); the claim link is saved: {url}")]
    Unconfirmed {
        url: String,
        code: String,
        signature: Signature,
        source: LedgerError,
    },

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
