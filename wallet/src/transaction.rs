//! Legacy and versioned transaction shapes
//!
//! Transaction request endpoints may answer with either wire format. The
//! pipeline carries the tagged union until the signer normalizes it to
//! [`VersionedTransaction`].

use base64::{engine::general_purpose::STANDARD, Engine};
use solana_sdk::{
    message::VersionedMessage,
    transaction::{Transaction, VersionedTransaction},
};

use crate::error::ResolveError;

/// High bit of the first message byte marks a versioned message
const MESSAGE_VERSION_PREFIX: u8 = 0x80;

/// A decoded transaction in either wire format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyTransaction {
    Legacy(Transaction),
    Versioned(VersionedTransaction),
}

impl AnyTransaction {
    /// Decode a base64 wire transaction (the Solana Pay POST response format)
    pub fn from_base64(encoded: &str) -> Result<Self, ResolveError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| ResolveError::UndecodableTransaction)?;
        Self::from_bytes(&bytes)
    }

    /// Decode wire bytes, trying the legacy format before the versioned one
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ResolveError> {
        if let Some(tx) = decode_legacy(bytes) {
            return Ok(AnyTransaction::Legacy(tx));
        }

        if let Some(tx) = decode_versioned(bytes) {
            return Ok(AnyTransaction::Versioned(tx));
        }

        Err(ResolveError::UndecodableTransaction)
    }

    /// Wire bytes of the transaction, in its current shape
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        match self {
            AnyTransaction::Legacy(tx) => bincode::serialize(tx),
            AnyTransaction::Versioned(tx) => bincode::serialize(tx),
        }
    }

    pub fn to_base64(&self) -> Result<String, bincode::Error> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Convert to the single shape used for display and signing
    pub fn into_versioned(self) -> VersionedTransaction {
        match self {
            AnyTransaction::Legacy(tx) => VersionedTransaction::from(tx),
            AnyTransaction::Versioned(tx) => tx,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, AnyTransaction::Legacy(_))
    }
}

impl From<Transaction> for AnyTransaction {
    fn from(tx: Transaction) -> Self {
        AnyTransaction::Legacy(tx)
    }
}

impl From<VersionedTransaction> for AnyTransaction {
    fn from(tx: VersionedTransaction) -> Self {
        AnyTransaction::Versioned(tx)
    }
}

fn decode_legacy(bytes: &[u8]) -> Option<Transaction> {
    let tx: Transaction = bincode::deserialize(bytes).ok()?;

    // bincode reads a versioned message header as a legacy one without complaint
    if tx.message.header.num_required_signatures & MESSAGE_VERSION_PREFIX != 0 {
        return None;
    }
    if tx.message.account_keys.is_empty()
        || tx.signatures.len() != tx.message.header.num_required_signatures as usize
    {
        return None;
    }

    reencodes_to(&tx, bytes).then_some(tx)
}

fn decode_versioned(bytes: &[u8]) -> Option<VersionedTransaction> {
    let tx: VersionedTransaction = bincode::deserialize(bytes).ok()?;

    let message: &VersionedMessage = &tx.message;
    if message.static_account_keys().is_empty()
        || tx.signatures.len() != message.header().num_required_signatures as usize
    {
        return None;
    }

    reencodes_to(&tx, bytes).then_some(tx)
}

/// Trailing garbage is tolerated by bincode; a faithful decode re-encodes exactly
fn reencodes_to<T: serde::Serialize>(value: &T, bytes: &[u8]) -> bool {
    bincode::serialize(value)
        .map(|encoded| encoded == bytes)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        message::v0,
        pubkey::Pubkey,
        signature::{Keypair, Signer},
        system_instruction,
    };

    fn legacy_transfer(payer: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 42);
        let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
        tx.message.recent_blockhash = Hash::new_unique();
        tx
    }

    fn v0_transfer(payer: &Keypair) -> VersionedTransaction {
        let ix = system_instruction::transfer(&payer.pubkey(), &Pubkey::new_unique(), 42);
        let message = v0::Message::try_compile(&payer.pubkey(), &[ix], &[], Hash::new_unique())
            .unwrap();
        VersionedTransaction::try_new(VersionedMessage::V0(message), &[payer]).unwrap()
    }

    #[test]
    fn test_legacy_base64_roundtrip() {
        let tx = legacy_transfer(&Pubkey::new_unique());
        let encoded = AnyTransaction::Legacy(tx.clone()).to_base64().unwrap();

        let decoded = AnyTransaction::from_base64(&encoded).unwrap();
        assert_eq!(decoded, AnyTransaction::Legacy(tx));
        assert_eq!(decoded.to_base64().unwrap(), encoded);
    }

    #[test]
    fn test_versioned_is_not_mistaken_for_legacy() {
        let payer = Keypair::new();
        let tx = v0_transfer(&payer);
        let encoded = AnyTransaction::Versioned(tx.clone()).to_base64().unwrap();

        let decoded = AnyTransaction::from_base64(&encoded).unwrap();
        assert!(!decoded.is_legacy());
        assert_eq!(decoded, AnyTransaction::Versioned(tx));
    }

    #[test]
    fn test_garbage_is_undecodable() {
        assert_eq!(
            AnyTransaction::from_base64("not base64!!").unwrap_err(),
            ResolveError::UndecodableTransaction
        );
        assert_eq!(
            AnyTransaction::from_base64(&STANDARD.encode([1u8, 2, 3, 4])).unwrap_err(),
            ResolveError::UndecodableTransaction
        );
        assert_eq!(
            AnyTransaction::from_bytes(&[]).unwrap_err(),
            ResolveError::UndecodableTransaction
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let tx = legacy_transfer(&Pubkey::new_unique());
        let mut bytes = bincode::serialize(&tx).unwrap();
        bytes.extend_from_slice(&[0xde, 0xad]);

        assert!(AnyTransaction::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_into_versioned_keeps_message() {
        let payer = Pubkey::new_unique();
        let tx = legacy_transfer(&payer);
        let blockhash = tx.message.recent_blockhash;

        let versioned = AnyTransaction::Legacy(tx).into_versioned();
        assert!(matches!(versioned.message, VersionedMessage::Legacy(_)));
        assert_eq!(versioned.message.static_account_keys()[0], payer);
        assert_eq!(*versioned.message.recent_blockhash(), blockhash);
        assert_eq!(versioned.signatures.len(), 1);
    }
}
