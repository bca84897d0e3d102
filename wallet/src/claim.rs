//! Claim links
//!
//! A claim link moves funds into a one-time keypair whose secret is the
//! link itself. Anyone holding the link can sweep the funds (less one
//! signature fee) into their own wallet.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use tracing::{info, warn};
use url::Url;

use crate::error::ClaimError;
use crate::ledger::LedgerClient;
use crate::request::{parse_canonical_address, TransferRequest};
use crate::signer::sign_and_send;
use crate::storage::{ClaimCodeRecord, LocalStorage};
use crate::transfer::create_transfer_transaction;
use crate::wallet::{decode_secret_key, encode_secret_key, Wallet};
use crate::LAMPORTS_PER_SIGNER;

/// Path segment preceding the code in a claim URL
pub const CLAIM_PATH: &str = "claim";

/// A funded claim link
#[derive(Debug, Clone)]
pub struct ClaimLink {
    pub code: String,
    pub url: String,
    pub address: Pubkey,
    pub signature: Signature,
}

/// Result of sweeping a claim link
#[derive(Debug, Clone)]
pub struct Claimed {
    pub lamports: u64,
    pub destination: Pubkey,
    pub signature: Signature,
}

/// A stored claim code and what it currently holds
#[derive(Debug, Clone)]
pub struct ClaimBalance {
    pub record: ClaimCodeRecord,
    pub address: Pubkey,
    /// `None` when the balance query failed
    pub lamports: Option<u64>,
}

/// `<site>/claim/<code>`
pub fn claim_url(site: &Url, code: &str) -> String {
    format!("{}/{}/{}", site.as_str().trim_end_matches('/'), CLAIM_PATH, code)
}

/// Accept either a bare code or a claim URL
pub fn parse_claim_code(input: &str) -> Result<Keypair, ClaimError> {
    let input = input.trim();

    let code = match Url::parse(input) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .ok_or(ClaimError::InvalidCode)?,
        Err(_) => input.to_string(),
    };

    decode_secret_key(&code).ok_or(ClaimError::InvalidCode)
}

/// Fund a fresh claim keypair with `lamports` plus one signature fee
///
/// The code is stored before the funding transaction is sent and stays
/// stored whatever happens afterwards. A funding transfer that was
/// submitted but not confirmed is reported as [`ClaimError::Unconfirmed`],
/// which still carries the link.
pub async fn create_claim_link(
    wallet: &Wallet,
    storage: &LocalStorage,
    lamports: u64,
    site: &Url,
) -> Result<ClaimLink, ClaimError> {
    if lamports == 0 {
        return Err(ClaimError::InvalidAmount);
    }
    let funding = lamports
        .checked_add(LAMPORTS_PER_SIGNER)
        .ok_or(ClaimError::InvalidAmount)?;

    let claim = Keypair::new();
    let request = TransferRequest::new(claim.pubkey()).with_amount(funding);
    let transaction = create_transfer_transaction(&request, &wallet.address())?;

    let code = encode_secret_key(&claim);
    storage.save_claim_code(&code, wallet.cluster())?;

    let ledger = wallet.ledger();
    let signature = sign_and_send(transaction.into(), wallet.keypair(), ledger.as_ref()).await?;
    if let Err(source) = ledger.confirm_transaction(&signature).await {
        warn!("Claim link funding {} not confirmed: {}", signature, source);
        return Err(ClaimError::Unconfirmed {
            url: claim_url(site, &code),
            code,
            signature,
            source,
        });
    }
    info!("Claim link funded with {} lamports: {}", funding, claim.pubkey());

    if let Err(e) = wallet.sync_balance().await {
        warn!("Balance sync after funding claim link failed: {}", e);
    }

    Ok(ClaimLink {
        url: claim_url(site, &code),
        code,
        address: claim.pubkey(),
        signature,
    })
}

/// Sweep a claim link into `destination` (the burner when `None`)
pub async fn claim_funds(
    wallet: &Wallet,
    storage: &LocalStorage,
    input: &str,
    destination: Option<&str>,
) -> Result<Claimed, ClaimError> {
    let claim = parse_claim_code(input)?;
    let destination = match destination {
        Some(text) => {
            parse_canonical_address(text).map_err(|_| ClaimError::InvalidDestination(text.to_string()))?
        }
        None => wallet.address(),
    };

    let ledger = wallet.ledger();
    let balance = ledger.balance(&claim.pubkey()).await?;
    if balance <= LAMPORTS_PER_SIGNER {
        return Err(ClaimError::NothingToClaim);
    }
    let lamports = balance - LAMPORTS_PER_SIGNER;

    let request = TransferRequest::new(destination).with_amount(lamports);
    let transaction = create_transfer_transaction(&request, &claim.pubkey())?;

    let signature = sign_and_send(transaction.into(), &claim, ledger.as_ref()).await?;
    ledger.confirm_transaction(&signature).await?;
    info!("Claimed {} lamports into {}", lamports, destination);

    storage.remove_claim_code(&encode_secret_key(&claim))?;

    if let Err(e) = wallet.sync_balance().await {
        warn!("Balance sync after claim failed: {}", e);
    }

    Ok(Claimed {
        lamports,
        destination,
        signature,
    })
}

/// Stored claim codes for the wallet's cluster, with live balances
pub async fn list_claim_codes(wallet: &Wallet, storage: &LocalStorage) -> Result<Vec<ClaimBalance>, ClaimError> {
    let ledger = wallet.ledger();
    let mut listed = Vec::new();

    for record in storage.claim_codes()? {
        if record.cluster != wallet.cluster() {
            continue;
        }
        let Some(claim) = decode_secret_key(&record.code) else {
            warn!("Skipping unreadable claim code");
            continue;
        };

        let address = claim.pubkey();
        listed.push(ClaimBalance {
            lamports: query_balance(ledger.as_ref(), &address).await,
            record,
            address,
        });
    }

    Ok(listed)
}

async fn query_balance(ledger: &dyn LedgerClient, address: &Pubkey) -> Option<u64> {
    match ledger.balance(address).await {
        Ok(lamports) => Some(lamports),
        Err(e) => {
            warn!("Balance query for {} failed: {}", address, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use crate::test_utils::MockLedger;
    use solana_sdk::{system_instruction::SystemInstruction, transaction::VersionedTransaction};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn site() -> Url {
        Url::parse("https://burner.codes").unwrap()
    }

    /// (recipient, lamports) of the transfer in `tx`
    fn transfer_of(tx: &VersionedTransaction) -> (Pubkey, u64) {
        let keys = tx.message.static_account_keys();
        let ix = &tx.message.instructions()[0];
        let SystemInstruction::Transfer { lamports } = bincode::deserialize(&ix.data).unwrap() else {
            panic!("not a transfer");
        };
        (keys[ix.accounts[1] as usize], lamports)
    }

    #[test]
    fn test_parse_code_or_url() {
        let claim = Keypair::new();
        let code = encode_secret_key(&claim);

        assert_eq!(parse_claim_code(&code).unwrap().pubkey(), claim.pubkey());
        let url = claim_url(&site(), &code);
        assert_eq!(url, format!("https://burner.codes/claim/{}", code));
        assert_eq!(parse_claim_code(&url).unwrap().pubkey(), claim.pubkey());
        assert_eq!(
            parse_claim_code(&format!("{}/", url)).unwrap().pubkey(),
            claim.pubkey()
        );
    }

    #[test]
    fn test_invalid_codes() {
        for input in ["", "not-a-code", "https://burner.codes/claim/", "https://burner.codes/claim/abc"] {
            assert!(
                matches!(parse_claim_code(input), Err(ClaimError::InvalidCode)),
                "input: {}",
                input
            );
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_funding_keeps_the_code() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_confirmations("confirmation timed out");
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        let err = create_claim_link(&wallet, &storage, 10_000_000, &site()).await.unwrap_err();

        // the transfer went out, so the secret must survive the error
        assert_eq!(ledger.sent().len(), 1);
        let ClaimError::Unconfirmed { url, code, signature, .. } = err else {
            panic!("expected an unconfirmed funding error, got {:?}", err);
        };
        assert_eq!(signature, ledger.sent()[0].signatures[0]);

        let codes = storage.claim_codes().unwrap();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].code, code);

        let claim = parse_claim_code(&url).unwrap();
        assert_eq!(transfer_of(&ledger.sent()[0]), (claim.pubkey(), 10_005_000));
    }

    #[tokio::test]
    async fn test_failed_send_keeps_the_code() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        ledger.fail_sends();
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        assert!(matches!(
            create_claim_link(&wallet, &storage, 10_000_000, &site()).await,
            Err(ClaimError::Submit(_))
        ));
        assert_eq!(storage.claim_codes().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_funds_one_time_keypair() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        let link = create_claim_link(&wallet, &storage, 1_000_000, &site()).await.unwrap();

        let sent = ledger.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.static_account_keys()[0], wallet.address());
        assert_eq!(transfer_of(&sent[0]), (link.address, 1_005_000));

        let codes = storage.claim_codes().unwrap();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].code, link.code);
        assert_eq!(codes[0].cluster, Cluster::Devnet);
        assert_eq!(parse_claim_code(&link.url).unwrap().pubkey(), link.address);
    }

    #[tokio::test]
    async fn test_zero_amount_is_refused() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        assert!(matches!(
            create_claim_link(&wallet, &storage, 0, &site()).await,
            Err(ClaimError::InvalidAmount)
        ));
        assert!(ledger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_claim_sweeps_balance_less_fee() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        let claim = Keypair::new();
        let code = encode_secret_key(&claim);
        storage.save_claim_code(&code, Cluster::Devnet).unwrap();
        ledger.set_balance(claim.pubkey(), 1_005_000);

        let claimed = claim_funds(&wallet, &storage, &claim_url(&site(), &code), None)
            .await
            .unwrap();

        assert_eq!(claimed.lamports, 1_000_000);
        assert_eq!(claimed.destination, wallet.address());
        let sent = ledger.sent();
        assert_eq!(sent[0].message.static_account_keys()[0], claim.pubkey());
        assert_eq!(transfer_of(&sent[0]), (wallet.address(), 1_000_000));
        assert!(storage.claim_codes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_claim_to_explicit_destination() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        let claim = Keypair::new();
        ledger.set_balance(claim.pubkey(), 20_000);
        let destination = Pubkey::new_unique();

        let claimed = claim_funds(
            &wallet,
            &storage,
            &encode_secret_key(&claim),
            Some(&destination.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(claimed.destination, destination);
        assert_eq!(transfer_of(&ledger.sent()[0]), (destination, 15_000));
    }

    #[tokio::test]
    async fn test_claim_errors() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        let claim = Keypair::new();
        let code = encode_secret_key(&claim);
        ledger.set_balance(claim.pubkey(), LAMPORTS_PER_SIGNER);

        assert!(matches!(
            claim_funds(&wallet, &storage, &code, None).await,
            Err(ClaimError::NothingToClaim)
        ));
        assert!(matches!(
            claim_funds(&wallet, &storage, &code, Some("bad.sol")).await,
            Err(ClaimError::InvalidDestination(_))
        ));
        assert!(matches!(
            claim_funds(&wallet, &storage, "garbage", None).await,
            Err(ClaimError::InvalidCode)
        ));
        assert!(ledger.sent().is_empty());
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_cluster() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::in_dir(dir.path());
        let ledger = Arc::new(MockLedger::new());
        let wallet = Wallet::new(Keypair::new(), Cluster::Devnet, ledger.clone());

        let devnet = Keypair::new();
        let testnet = Keypair::new();
        storage.save_claim_code(&encode_secret_key(&devnet), Cluster::Devnet).unwrap();
        storage.save_claim_code(&encode_secret_key(&testnet), Cluster::Testnet).unwrap();
        ledger.set_balance(devnet.pubkey(), 42);

        let listed = list_claim_codes(&wallet, &storage).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].address, devnet.pubkey());
        assert_eq!(listed[0].lamports, Some(42));
    }
}
