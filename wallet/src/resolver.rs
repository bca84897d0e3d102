//! Remote resolution of Solana Pay transaction requests
//!
//! The browser cannot call arbitrary merchant endpoints, so the request is
//! made through the same-origin relay (`burner-relay`). One relay call
//! performs both protocol phases in order:
//!
//! 1. `GET <link>`  - merchant metadata (`label`, `icon`)
//! 2. `POST <link>` with `{ "account": <payer> }` - base64 transaction
//!
//! The relay answers `{ "get": {...}, "post": {...} }`, which is decoded
//! here into a [`ResolvedTransaction`]. There is no retry at this layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};
use url::Url;

use crate::error::ResolveError;
use crate::transaction::AnyTransaction;
use crate::RELAY_PATH;

/// Default bound on a whole relay round trip
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Body sent to the relay endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayRequest {
    pub url: Option<String>,
    pub address: Option<String>,
}

/// Body returned by the relay: the merchant's GET and POST answers verbatim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayResponse {
    pub get: Value,
    pub post: Value,
}

/// Body the relay forwards to the merchant in the POST phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRequest {
    pub account: String,
}

/// Merchant metadata from the GET phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Describes the source of the request (brand, store, person)
    pub label: Option<String>,
    /// Absolute http(s) URL of an SVG, PNG or WebP icon
    pub icon: Option<String>,
}

/// Merchant answer from the POST phase
#[derive(Debug, Clone, Default, Deserialize)]
struct PostResponse {
    transaction: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// A transaction ready for confirmation plus what the merchant said about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransaction {
    pub transaction: AnyTransaction,
    pub metadata: RequestMetadata,
    /// Optional message to show alongside the transaction
    pub message: Option<String>,
}

/// Client for the same-origin relay
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl RelayClient {
    /// `relay_base` is where the relay is mounted; [`RELAY_PATH`] is
    /// resolved below any path prefix it carries
    pub fn new(relay_base: &Url, timeout: Duration) -> Result<Self, ResolveError> {
        let mut base = relay_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(RELAY_PATH.trim_start_matches('/'))
            .map_err(|e| ResolveError::InvalidLink(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolveError::RelayUnreachable(e.to_string()))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolve `link` into a signable transaction for `payer`
    ///
    /// Exactly one relay round trip; an `error` from the merchant always
    /// wins over any transaction bytes sent alongside it.
    pub async fn resolve(&self, link: &Url, payer: &Pubkey) -> Result<ResolvedTransaction, ResolveError> {
        if !matches!(link.scheme(), "https" | "http") {
            return Err(ResolveError::InvalidLink(link.to_string()));
        }

        debug!("Resolving transaction request {} via {}", link, self.endpoint);

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&RelayRequest {
                url: Some(link.to_string()),
                address: Some(payer.to_string()),
            })
            .send()
            .await
            .map_err(|e| ResolveError::RelayUnreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::RelayUnreachable(e.to_string()))?;

        if !status.is_success() {
            warn!("Relay rejected transaction request ({}): {}", status, body);
            return Err(ResolveError::RelayRejected(body));
        }

        interpret_relay_response(&body)
    }
}

/// Decode a successful relay body into a resolved transaction
pub fn interpret_relay_response(body: &str) -> Result<ResolvedTransaction, ResolveError> {
    let relayed: RelayResponse = serde_json::from_str(body).map_err(|_| ResolveError::MalformedMetadata)?;

    let metadata = match relayed.get {
        Value::Object(_) => serde_json::from_value::<RequestMetadata>(relayed.get)
            .map_err(|_| ResolveError::MalformedMetadata)?,
        _ => return Err(ResolveError::MalformedMetadata),
    };

    let post = match relayed.post {
        Value::Object(_) => serde_json::from_value::<PostResponse>(relayed.post)
            .map_err(|_| ResolveError::MalformedMetadata)?,
        _ => return Err(ResolveError::MalformedMetadata),
    };

    if let Some(error) = post.error {
        return Err(ResolveError::Remote(error));
    }

    let encoded = post.transaction.ok_or(ResolveError::NoTransactionField)?;
    let transaction = AnyTransaction::from_base64(&encoded)?;

    Ok(ResolvedTransaction {
        transaction,
        metadata,
        message: post.message,
    })
}
