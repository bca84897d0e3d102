//! Turn parsed input into something the confirmation gate can hold

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::gate::Preparation;
use crate::request::{ParsedInput, TransferRequest};
use crate::resolver::{RelayClient, RequestMetadata};
use crate::transfer::create_transfer_transaction;

/// Build or fetch the transaction for `input`, paid for by `payer`
///
/// `amount` fills in transfer requests and bare addresses that carry no
/// amount of their own. Every failure becomes [`Preparation::Rejected`].
pub async fn prepare(input: ParsedInput, payer: &Pubkey, relay: &RelayClient, amount: Option<u64>) -> Preparation {
    match input {
        ParsedInput::Transfer(request) => prepare_transfer(request, payer, amount),
        ParsedInput::Address(recipient) => prepare_transfer(TransferRequest::new(recipient), payer, amount),
        ParsedInput::TransactionRequest(request) => {
            debug!("Fetching transaction request {}", request.link);
            let mut preparation: Preparation = relay.resolve(&request.link, payer).await.into();

            // label from the link stands in when the merchant sent none
            if let Preparation::Ready { metadata: Some(metadata), .. } = &mut preparation {
                if metadata.label.is_none() {
                    metadata.label = request.label;
                }
            }
            preparation
        }
    }
}

/// Build a transfer client-side
pub fn prepare_transfer(mut request: TransferRequest, payer: &Pubkey, amount: Option<u64>) -> Preparation {
    if request.amount.is_none() {
        request.amount = amount;
    }

    let metadata = request.label.clone().map(|label| RequestMetadata {
        label: Some(label),
        icon: None,
    });

    match create_transfer_transaction(&request, payer) {
        Ok(transaction) => Preparation::Ready {
            transaction: transaction.into(),
            metadata,
            message: request.message,
        },
        Err(e) => Preparation::Rejected {
            error: e.to_string(),
            metadata,
        },
    }
}
