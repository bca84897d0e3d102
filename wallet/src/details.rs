//! Human-checkable summary of a transaction awaiting confirmation
//!
//! Derived from the message alone: nothing is simulated or executed.

use std::str::FromStr;
use std::time::Duration;

use solana_sdk::{message::VersionedMessage, pubkey::Pubkey, transaction::VersionedTransaction};
use tracing::debug;

use crate::ledger::LedgerClient;
use crate::{LAMPORTS_PER_SIGNER, MEMO_PROGRAM_ID};

/// Upper bound on the best-effort fee query
pub const FEE_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only projection shown to the user before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    /// First static account key (always the fee payer)
    pub fee_payer: Pubkey,
    /// Network fee estimate in lamports
    pub fee: u64,
    pub required_signatures: u8,
    pub memo: Option<String>,
}

impl TransactionDetails {
    /// Summary with the default fee of `signatures * 5000` lamports
    ///
    /// Returns `None` for a message with no accounts (no fee payer).
    pub fn from_transaction(transaction: &VersionedTransaction) -> Option<Self> {
        let message = &transaction.message;
        let fee_payer = *message.static_account_keys().first()?;
        let required_signatures = message.header().num_required_signatures;

        Some(Self {
            fee_payer,
            fee: required_signatures as u64 * LAMPORTS_PER_SIGNER,
            required_signatures,
            memo: find_memo(message),
        })
    }
}

/// Summary with the fee refined by a live query when it succeeds in time
///
/// A failed or slow fee query keeps the default estimate.
pub async fn extract_details(
    transaction: &VersionedTransaction,
    ledger: &dyn LedgerClient,
) -> Option<TransactionDetails> {
    let mut details = TransactionDetails::from_transaction(transaction)?;

    if let Some(fee) = query_fee(&transaction.message, ledger).await {
        details.fee = fee;
    }

    Some(details)
}

/// Best-effort fee lookup; `None` on error or timeout
pub async fn query_fee(message: &VersionedMessage, ledger: &dyn LedgerClient) -> Option<u64> {
    match tokio::time::timeout(FEE_QUERY_TIMEOUT, ledger.fee_for_message(message)).await {
        Ok(Ok(fee)) => Some(fee),
        Ok(Err(e)) => {
            debug!("Fee query failed, keeping default estimate: {}", e);
            None
        }
        Err(_) => {
            debug!("Fee query timed out, keeping default estimate");
            None
        }
    }
}

/// UTF-8 text of the first memo program instruction
fn find_memo(message: &VersionedMessage) -> Option<String> {
    let memo_program = Pubkey::from_str(MEMO_PROGRAM_ID).ok()?;
    let keys = message.static_account_keys();

    message
        .instructions()
        .iter()
        .find(|ix| keys.get(ix.program_id_index as usize) == Some(&memo_program))
        .and_then(|ix| match String::from_utf8(ix.data.clone()) {
            Ok(memo) => Some(memo),
            Err(_) => {
                debug!("Memo instruction data is not valid UTF-8");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockLedger;
    use solana_sdk::{instruction::Instruction, system_instruction, transaction::Transaction};

    fn memo_ix(text: &[u8]) -> Instruction {
        Instruction::new_with_bytes(Pubkey::from_str(MEMO_PROGRAM_ID).unwrap(), text, vec![])
    }

    fn build(instructions: &[Instruction], payer: &Pubkey) -> VersionedTransaction {
        VersionedTransaction::from(Transaction::new_with_payer(instructions, Some(payer)))
    }

    #[test]
    fn test_default_details() {
        let payer = Pubkey::new_unique();
        let tx = build(
            &[system_instruction::transfer(&payer, &Pubkey::new_unique(), 1)],
            &payer,
        );

        let details = TransactionDetails::from_transaction(&tx).unwrap();
        assert_eq!(details.fee_payer, payer);
        assert_eq!(details.fee, 5_000);
        assert_eq!(details.required_signatures, 1);
        assert_eq!(details.memo, None);
    }

    #[test]
    fn test_memo_is_decoded() {
        let payer = Pubkey::new_unique();
        let tx = build(
            &[
                memo_ix(b"order 123"),
                system_instruction::transfer(&payer, &Pubkey::new_unique(), 1),
            ],
            &payer,
        );

        let details = TransactionDetails::from_transaction(&tx).unwrap();
        assert_eq!(details.memo.as_deref(), Some("order 123"));
    }

    #[test]
    fn test_invalid_utf8_memo_is_skipped() {
        let payer = Pubkey::new_unique();
        let tx = build(&[memo_ix(&[0xff, 0xfe])], &payer);

        let details = TransactionDetails::from_transaction(&tx).unwrap();
        assert_eq!(details.memo, None);
    }

    #[test]
    fn test_empty_message_has_no_details() {
        let tx = VersionedTransaction::default();
        assert!(TransactionDetails::from_transaction(&tx).is_none());
    }

    #[tokio::test]
    async fn test_fee_defaults_when_query_fails() {
        // two required signers
        let payer = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let tx = build(
            &[
                system_instruction::transfer(&payer, &Pubkey::new_unique(), 1),
                system_instruction::transfer(&other, &Pubkey::new_unique(), 1),
            ],
            &payer,
        );

        let ledger = MockLedger::new();
        ledger.fail_fee_queries();

        let details = extract_details(&tx, &ledger).await.unwrap();
        assert_eq!(details.required_signatures, 2);
        assert_eq!(details.fee, 10_000);
    }

    #[tokio::test]
    async fn test_fee_uses_live_query() {
        let payer = Pubkey::new_unique();
        let tx = build(
            &[system_instruction::transfer(&payer, &Pubkey::new_unique(), 1)],
            &payer,
        );

        let ledger = MockLedger::new();
        ledger.set_fee(7_500);

        let details = extract_details(&tx, &ledger).await.unwrap();
        assert_eq!(details.fee, 7_500);
        assert_eq!(ledger.fee_queries(), 1);
    }
}
