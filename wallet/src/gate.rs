//! Confirmation gate
//!
//! Holds at most one prepared transaction and refuses to sign anything the
//! user has not explicitly confirmed. State is published through a
//! `tokio::sync::watch` channel so any number of views can follow it.
//!
//! ```text
//!             beginPreparation
//!   Idle ─────────────────────────► Loading ──── Ready ────► AwaitingConfirmation
//!    ▲                                 │                             │   │
//!    │◄──── Rejected / failure ────────┘                             │   │
//!    │◄──── cancel ──────────────────────────────────────────────────┘   │
//!    │◄──── submitted / failed ◄── Loading ◄──────── confirm ────────────┘
//! ```
//!
//! Every preparation and every cancel takes a fresh slot token. A
//! resolution only lands if its token is still current, so the newest
//! request always wins and a cancel discards whatever is in flight.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use solana_sdk::{message::VersionedMessage, signature::Signature, transaction::VersionedTransaction};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::details::{self, TransactionDetails};
use crate::error::{GateError, ResolveError};
use crate::ledger::LedgerClient;
use crate::resolver::{RequestMetadata, ResolvedTransaction};
use crate::signer;
use crate::transaction::AnyTransaction;
use crate::wallet::Wallet;

/// Generation number identifying one preparation
pub type SlotToken = u64;

// ==================== Notifications ====================

/// User-facing notification emitted by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An error message supplied by the remote party, shown as-is
    Error(String),
    /// A local failure
    Failure(String),
    /// The transaction was accepted by the network
    Submitted(Signature),
}

/// Sink for gate notifications (toasts in a UI, lines on a console)
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

// ==================== State ====================

/// Outcome of a preparation step, handed to the gate
#[derive(Debug, Clone)]
pub enum Preparation {
    Ready {
        transaction: AnyTransaction,
        metadata: Option<RequestMetadata>,
        message: Option<String>,
    },
    Rejected {
        error: String,
        metadata: Option<RequestMetadata>,
    },
}

impl From<AnyTransaction> for Preparation {
    fn from(transaction: AnyTransaction) -> Self {
        Preparation::Ready {
            transaction,
            metadata: None,
            message: None,
        }
    }
}

impl From<ResolvedTransaction> for Preparation {
    fn from(resolved: ResolvedTransaction) -> Self {
        Preparation::Ready {
            transaction: resolved.transaction,
            metadata: Some(resolved.metadata),
            message: resolved.message,
        }
    }
}

impl From<Result<ResolvedTransaction, ResolveError>> for Preparation {
    fn from(result: Result<ResolvedTransaction, ResolveError>) -> Self {
        match result {
            Ok(resolved) => resolved.into(),
            Err(e) => Preparation::Rejected {
                error: e.to_string(),
                metadata: None,
            },
        }
    }
}

/// A prepared transaction waiting for the user's decision
#[derive(Debug)]
pub struct AwaitingConfirmation {
    pub slot: SlotToken,
    pub transaction: VersionedTransaction,
    pub details: TransactionDetails,
    pub metadata: Option<RequestMetadata>,
    pub message: Option<String>,
    refinement: Option<AbortHandle>,
}

/// The gate's single slot
#[derive(Debug, Default)]
pub enum PendingConfirmation {
    #[default]
    Idle,
    Loading {
        slot: SlotToken,
    },
    AwaitingConfirmation(Box<AwaitingConfirmation>),
}

impl PendingConfirmation {
    pub fn is_idle(&self) -> bool {
        matches!(self, PendingConfirmation::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PendingConfirmation::Loading { .. })
    }

    pub fn awaiting(&self) -> Option<&AwaitingConfirmation> {
        match self {
            PendingConfirmation::AwaitingConfirmation(awaiting) => Some(awaiting),
            _ => None,
        }
    }

    fn abort_refinement(&self) {
        if let Some(handle) = self.awaiting().and_then(|a| a.refinement.as_ref()) {
            handle.abort();
        }
    }
}

struct GateShared {
    state: watch::Sender<PendingConfirmation>,
    generation: AtomicU64,
}

impl GateShared {
    fn next_slot(&self) -> SlotToken {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, slot: SlotToken) -> bool {
        self.generation.load(Ordering::SeqCst) == slot
    }

    /// Store `next` only while `slot` is current, checked under the state lock
    fn replace_if_current(&self, slot: SlotToken, next: PendingConfirmation) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(slot) {
                return false;
            }
            std::mem::replace(state, next).abort_refinement();
            true
        })
    }
}

// ==================== Gate ====================

/// Single-slot confirmation gate
#[derive(Clone)]
pub struct ConfirmationGate {
    shared: Arc<GateShared>,
    notifier: Arc<dyn Notifier>,
}

impl ConfirmationGate {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(PendingConfirmation::Idle);
        Self {
            shared: Arc::new(GateShared {
                state,
                generation: AtomicU64::new(0),
            }),
            notifier,
        }
    }

    /// Current state
    pub fn state(&self) -> watch::Ref<'_, PendingConfirmation> {
        self.shared.state.borrow()
    }

    /// Receiver that observes every state transition
    pub fn subscribe(&self) -> watch::Receiver<PendingConfirmation> {
        self.shared.state.subscribe()
    }

    /// Details of the transaction awaiting confirmation, if any
    pub fn details(&self) -> Option<TransactionDetails> {
        self.state().awaiting().map(|awaiting| awaiting.details.clone())
    }

    /// Run a preparation and park its transaction for confirmation
    ///
    /// The gate moves to `Loading` immediately, replacing anything pending.
    /// If another preparation or a cancel happens before `producer`
    /// finishes, its result is discarded with [`GateError::Superseded`].
    pub async fn begin_preparation<F, E>(
        &self,
        wallet: &Wallet,
        producer: F,
    ) -> Result<TransactionDetails, GateError>
    where
        F: Future<Output = Result<Preparation, E>>,
        E: Display,
    {
        let slot = self.shared.next_slot();
        if !self.shared.replace_if_current(slot, PendingConfirmation::Loading { slot }) {
            return Err(GateError::Superseded);
        }
        debug!("Preparation {} started", slot);

        let outcome = producer.await;

        if !self.shared.is_current(slot) {
            debug!("Preparation {} superseded, discarding result", slot);
            return Err(GateError::Superseded);
        }

        let (transaction, metadata, message) = match outcome {
            Ok(Preparation::Ready {
                transaction,
                metadata,
                message,
            }) => (transaction.into_versioned(), metadata, message),
            Ok(Preparation::Rejected { error, .. }) => {
                self.settle_idle(slot)?;
                self.notifier.notify(Notice::Error(error.clone()));
                return Err(GateError::Rejected(error));
            }
            Err(e) => {
                error!("Unable to resolve transaction: {}", e);
                self.settle_idle(slot)?;
                self.notifier
                    .notify(Notice::Failure("Unable to resolve transaction".to_string()));
                return Err(GateError::ResolutionFailed);
            }
        };

        let Some(details) = TransactionDetails::from_transaction(&transaction) else {
            self.settle_idle(slot)?;
            let error = "Transaction has no accounts".to_string();
            self.notifier.notify(Notice::Failure(error.clone()));
            return Err(GateError::Rejected(error));
        };

        let refinement_message = transaction.message.clone();
        let awaiting = PendingConfirmation::AwaitingConfirmation(Box::new(AwaitingConfirmation {
            slot,
            transaction,
            details: details.clone(),
            metadata,
            message,
            refinement: None,
        }));
        if !self.shared.replace_if_current(slot, awaiting) {
            return Err(GateError::Superseded);
        }

        self.spawn_fee_refinement(slot, refinement_message, wallet.ledger());

        Ok(details)
    }

    /// Return to `Idle` if `slot` still owns the gate
    fn settle_idle(&self, slot: SlotToken) -> Result<(), GateError> {
        if self.shared.replace_if_current(slot, PendingConfirmation::Idle) {
            Ok(())
        } else {
            debug!("Preparation {} superseded, discarding result", slot);
            Err(GateError::Superseded)
        }
    }

    /// Query the live fee in the background and apply it if `slot` is
    /// still the transaction awaiting confirmation
    fn spawn_fee_refinement(&self, slot: SlotToken, message: VersionedMessage, ledger: Arc<dyn LedgerClient>) {
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let Some(fee) = details::query_fee(&message, ledger.as_ref()).await else {
                return;
            };

            shared.state.send_if_modified(|state| match state {
                PendingConfirmation::AwaitingConfirmation(awaiting)
                    if awaiting.slot == slot && awaiting.details.fee != fee =>
                {
                    debug!("Refined fee for preparation {}: {} lamports", slot, fee);
                    awaiting.details.fee = fee;
                    true
                }
                _ => false,
            });
        });

        let mut handle = Some(task.abort_handle());
        self.shared.state.send_if_modified(|state| {
            if let PendingConfirmation::AwaitingConfirmation(awaiting) = state {
                if awaiting.slot == slot {
                    awaiting.refinement = handle.take();
                }
            }
            false
        });

        // the gate moved on before the task could be attached
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Discard whatever is pending; a no-op when idle
    pub fn cancel(&self) {
        if self.state().is_idle() {
            return;
        }

        let slot = self.shared.next_slot();
        debug!("Cancelled, slot advanced to {}", slot);
        self.shared.replace_if_current(slot, PendingConfirmation::Idle);
    }

    /// Sign and submit the transaction awaiting confirmation
    ///
    /// On success the gate returns to `Idle` and the wallet balance is
    /// re-synced. On failure the gate returns to `Idle` and the error is
    /// both notified and returned.
    pub async fn confirm(&self, wallet: &Wallet) -> Result<Signature, GateError> {
        let mut taken = None;
        self.shared.state.send_if_modified(|state| {
            let PendingConfirmation::AwaitingConfirmation(awaiting) = state else {
                return false;
            };
            let slot = awaiting.slot;
            taken = Some(std::mem::replace(state, PendingConfirmation::Loading { slot }));
            true
        });

        let Some(PendingConfirmation::AwaitingConfirmation(awaiting)) = taken else {
            return Err(GateError::NothingToConfirm);
        };
        if let Some(handle) = &awaiting.refinement {
            handle.abort();
        }

        let AwaitingConfirmation { slot, transaction, .. } = *awaiting;
        let ledger = wallet.ledger();
        let result = signer::sign_and_send(transaction.into(), wallet.keypair(), ledger.as_ref()).await;

        // a newer preparation may own the slot by now
        self.shared.replace_if_current(slot, PendingConfirmation::Idle);

        match result {
            Ok(signature) => {
                info!("Transaction sent: {}", signature);
                self.notifier.notify(Notice::Submitted(signature));
                if let Err(e) = wallet.sync_balance().await {
                    warn!("Balance sync after submission failed: {}", e);
                }
                Ok(signature)
            }
            Err(e) => {
                error!("Transaction failed: {}", e);
                self.notifier
                    .notify(Notice::Failure(format!("Transaction failed: {}", e)));
                Err(e.into())
            }
        }
    }
}
