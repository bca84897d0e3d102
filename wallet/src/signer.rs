//! Finalize, sign and submit a transaction with the burner keypair

use solana_sdk::{
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use tracing::{debug, info};

use crate::error::SubmitError;
use crate::ledger::LedgerClient;
use crate::transaction::AnyTransaction;

/// Normalize, sign with `keypair` and submit
///
/// When the burner is the only required signer the blockhash is refreshed
/// right before signing; otherwise the blockhash chosen by the remote party
/// is kept, since their signatures cover it.
pub async fn sign_and_send(
    transaction: AnyTransaction,
    keypair: &Keypair,
    ledger: &dyn LedgerClient,
) -> Result<Signature, SubmitError> {
    let mut transaction = transaction.into_versioned();

    if is_sole_signer(&transaction, keypair)? {
        let blockhash = ledger
            .latest_blockhash()
            .await
            .map_err(SubmitError::Blockhash)?;
        debug!("Refreshing blockhash to {}", blockhash);
        transaction.message.set_recent_blockhash(blockhash);
    }

    sign_transaction(&mut transaction, keypair)?;

    let signature = ledger
        .send_transaction(&transaction)
        .await
        .map_err(SubmitError::Submission)?;

    info!("Transaction submitted: {}", signature);
    Ok(signature)
}

/// Is `keypair` the single required signer of `transaction`?
pub fn is_sole_signer(transaction: &VersionedTransaction, keypair: &Keypair) -> Result<bool, SubmitError> {
    let message = &transaction.message;
    let first = message
        .static_account_keys()
        .first()
        .ok_or(SubmitError::EmptyMessage)?;

    Ok(message.header().num_required_signatures == 1 && *first == keypair.pubkey())
}

/// Place `keypair`'s signature in its slot, leaving other signatures intact
pub fn sign_transaction(transaction: &mut VersionedTransaction, keypair: &Keypair) -> Result<(), SubmitError> {
    let message = &transaction.message;
    let required = message.header().num_required_signatures as usize;
    let pubkey = keypair.pubkey();

    let position = message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|key| *key == pubkey)
        .ok_or_else(|| SubmitError::NotASigner(pubkey.to_string()))?;

    let signature = keypair.sign_message(&message.serialize());

    if transaction.signatures.len() != required {
        transaction.signatures.resize(required, Signature::default());
    }
    transaction.signatures[position] = signature;

    Ok(())
}
