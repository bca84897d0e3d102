//! Client-side construction of Solana Pay transfer transactions
//!
//! Layout: an optional memo instruction first, then a native SOL transfer
//! carrying every reference key as a read-only, non-signer account so the
//! payment can be located on chain afterwards. The blockhash is left
//! empty; the signer fills it in.

use std::str::FromStr;

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_instruction,
    transaction::Transaction,
};

use crate::error::TransferError;
use crate::request::TransferRequest;
use crate::MEMO_PROGRAM_ID;

/// Build an unsigned transfer paid for by `from`
pub fn create_transfer_transaction(
    request: &TransferRequest,
    from: &Pubkey,
) -> Result<Transaction, TransferError> {
    if let Some(token) = &request.spl_token {
        return Err(TransferError::UnsupportedToken(token.to_string()));
    }
    let lamports = request.amount.ok_or(TransferError::MissingAmount)?;

    let mut instructions = Vec::with_capacity(2);

    if let Some(memo) = &request.memo {
        instructions.push(memo_instruction(memo));
    }

    let mut transfer = system_instruction::transfer(from, &request.recipient, lamports);
    transfer.accounts.extend(
        request
            .references
            .iter()
            .map(|reference| AccountMeta::new_readonly(*reference, false)),
    );
    instructions.push(transfer);

    Ok(Transaction::new_with_payer(&instructions, Some(from)))
}

/// Memo program instruction with no signer accounts
pub fn memo_instruction(memo: &str) -> Instruction {
    let program_id = Pubkey::from_str(MEMO_PROGRAM_ID).unwrap_or_default();
    Instruction::new_with_bytes(program_id, memo.as_bytes(), Vec::new())
}
