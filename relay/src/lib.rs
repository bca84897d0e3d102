//! Burner relay - same-origin pass-through for Solana Pay transaction requests
//!
//! Wallet clients cannot call arbitrary merchant endpoints directly, so they
//! post `{ url, address }` here and the relay performs both protocol phases
//! on their behalf:
//!
//! 1. `GET <url>` for the merchant's `label` / `icon`
//! 2. `POST <url>` with `{ "account": <address> }` for the transaction
//!
//! and answers `{ "get": <GET json>, "post": <POST json> }`.
//!
//! # API Endpoints
//!
//! - POST /api/solanapay - Resolve a transaction request
//! - GET /health - Health check endpoint
//!
//! Every failure is a `400` with a short plain-text message; the relay
//! never returns partial results.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use burner_wallet::request::parse_canonical_address;
use burner_wallet::resolver::{AccountRequest, RelayRequest, RelayResponse};
use burner_wallet::RELAY_PATH;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use url::Url;


/// The only identity the relay presents to merchant endpoints
pub const CLIENT_IDENTIFIER: &str = "burner.codes";

/// Default bound on each forwarded request
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Relay failures, all reported to the caller as `400 Bad Request`
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request")]
    InvalidBody,

    #[error("Invalid input: url")]
    MissingUrl,

    #[error("Invalid input: address")]
    MissingAddress,

    #[error("Invalid url")]
    InvalidUrl,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Bad proxy response: {0}")]
    BadResponse(&'static str),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Shared relay state
#[derive(Clone)]
pub struct AppState {
    http: reqwest::Client,
}

impl AppState {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(CLIENT_IDENTIFIER)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Forward a GET and decode the JSON answer
    async fn forward_get(&self, url: &Url) -> Result<Value, RelayError> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await;
        decode_forwarded(response, "GET").await
    }

    /// Forward a POST carrying the payer account and decode the JSON answer
    async fn forward_post(&self, url: &Url, account: &str) -> Result<Value, RelayError> {
        let response = self
            .http
            .post(url.clone())
            .header(ACCEPT, "application/json")
            .json(&AccountRequest {
                account: account.to_string(),
            })
            .send()
            .await;
        decode_forwarded(response, "POST").await
    }
}

async fn decode_forwarded(
    response: Result<reqwest::Response, reqwest::Error>,
    method: &'static str,
) -> Result<Value, RelayError> {
    let response = response.map_err(|e| {
        warn!("{} forward failed: {}", method, e);
        RelayError::BadResponse(method)
    })?;

    if !response.status().is_success() {
        warn!("{} forward returned {}", method, response.status());
        return Err(RelayError::BadResponse(method));
    }

    response.json::<Value>().await.map_err(|e| {
        warn!("{} forward returned invalid JSON: {}", method, e);
        RelayError::BadResponse(method)
    })
}

/// Check the caller's input before anything is forwarded
///
/// The address must re-encode to exactly the given string.
pub fn validate(request: &RelayRequest) -> Result<(Url, String), RelayError> {
    let url = request
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .ok_or(RelayError::MissingUrl)?;
    let address = request
        .address
        .as_deref()
        .filter(|address| !address.is_empty())
        .ok_or(RelayError::MissingAddress)?;

    let url = Url::parse(url).map_err(|_| RelayError::InvalidUrl)?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(RelayError::InvalidUrl);
    }

    let pubkey = parse_canonical_address(address).map_err(|_| RelayError::InvalidAddress)?;

    Ok((url, pubkey.to_string()))
}

/// Resolve a transaction request on behalf of a wallet
async fn relay(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RelayResponse>, RelayError> {
    let request: RelayRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Failed to parse request: {}", e);
        RelayError::InvalidBody
    })?;

    let (url, account) = validate(&request)?;
    info!("[SolanaPay] {}", url);

    let get = state.forward_get(&url).await?;
    let post = state.forward_post(&url, &account).await?;

    Ok(Json(RelayResponse { get, post }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the relay router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(RELAY_PATH, post(relay))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
