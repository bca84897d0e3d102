//! Address and payment-request parsing
//!
//! Decodes scanned or typed text into one of:
//! - a Solana Pay transfer request (`solana:<recipient>?amount=...`)
//! - a Solana Pay transaction request (`solana:<https link>`)
//! - a bare base58 account address
//!
//! Pure functions only - nothing here touches the network.

use std::str::FromStr;

use percent_encoding::percent_decode_str;
use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};
use url::{form_urlencoded, Url};

use crate::error::ParseError;

/// URI scheme of Solana Pay links
pub const SOLANA_PROTOCOL: &str = "solana";

/// Decimal places of the native token
pub const SOL_DECIMALS: usize = 9;

/// Static payment instruction, fully resolvable client-side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub recipient: Pubkey,
    /// Amount in lamports
    pub amount: Option<u64>,
    pub spl_token: Option<Pubkey>,
    pub references: Vec<Pubkey>,
    pub label: Option<String>,
    pub message: Option<String>,
    pub memo: Option<String>,
}

/// Payment instruction that must be fetched from a remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub link: Url,
    pub label: Option<String>,
    pub message: Option<String>,
}

/// A decoded `solana:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRequest {
    Transfer(TransferRequest),
    Transaction(TransactionRequest),
}

/// Result of [`parse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    Transfer(TransferRequest),
    TransactionRequest(TransactionRequest),
    Address(Pubkey),
}

impl From<PaymentRequest> for ParsedInput {
    fn from(request: PaymentRequest) -> Self {
        match request {
            PaymentRequest::Transfer(req) => ParsedInput::Transfer(req),
            PaymentRequest::Transaction(req) => ParsedInput::TransactionRequest(req),
        }
    }
}

/// Classify scanned or typed text
///
/// Tries the Solana Pay grammar first, then a bare address. Text containing
/// a `.` is never read as an address (reserved for name services).
pub fn parse(text: &str) -> Result<ParsedInput, ParseError> {
    let text = text.trim();

    match parse_url(text) {
        Ok(request) => return Ok(request.into()),
        Err(ParseError::NotPaymentUrl) => {}
        Err(err) => {
            tracing::debug!("Solana Pay URL rejected: {}", err);
        }
    }

    parse_address(text)
        .map(ParsedInput::Address)
        .map_err(|_| ParseError::Unrecognized)
}

/// Read a bare account address
pub fn parse_address(text: &str) -> Result<Pubkey, ParseError> {
    // todo: name service lookups for `.sol` style names
    if text.contains('.') {
        return Err(ParseError::InvalidAddress(text.to_string()));
    }

    parse_canonical_address(text)
}

/// Parse an address and require its base58 re-encoding to match the input
/// exactly. Guards against alternate encodings of the same key.
pub fn parse_canonical_address(text: &str) -> Result<Pubkey, ParseError> {
    let pubkey = Pubkey::from_str(text).map_err(|_| ParseError::InvalidAddress(text.to_string()))?;

    if pubkey.to_string() != text {
        return Err(ParseError::InvalidAddress(text.to_string()));
    }

    Ok(pubkey)
}

/// Decode a `solana:` URL into a transfer or transaction request
pub fn parse_url(text: &str) -> Result<PaymentRequest, ParseError> {
    let url = Url::parse(text).map_err(|_| ParseError::NotPaymentUrl)?;
    if url.scheme() != SOLANA_PROTOCOL {
        return Err(ParseError::NotPaymentUrl);
    }

    let pathname = percent_decode_str(url.path())
        .decode_utf8()
        .map_err(|_| ParseError::InvalidField {
            field: "pathname",
            value: url.path().to_string(),
        })?;

    if pathname.is_empty() {
        return Err(ParseError::InvalidField {
            field: "pathname",
            value: String::new(),
        });
    }

    // A colon in the path can only be an embedded link
    if pathname.contains(':') {
        parse_transaction_request(&url, &pathname).map(PaymentRequest::Transaction)
    } else {
        parse_transfer_request(&url, &pathname).map(PaymentRequest::Transfer)
    }
}

fn parse_transaction_request(url: &Url, pathname: &str) -> Result<TransactionRequest, ParseError> {
    let link = Url::parse(pathname).map_err(|_| ParseError::InvalidLink(pathname.to_string()))?;
    if link.scheme() != "https" {
        return Err(ParseError::InvalidLink(pathname.to_string()));
    }

    Ok(TransactionRequest {
        link,
        label: query_param(url, "label"),
        message: query_param(url, "message"),
    })
}

fn parse_transfer_request(url: &Url, pathname: &str) -> Result<TransferRequest, ParseError> {
    let recipient = parse_canonical_address(pathname)?;

    let amount = query_param(url, "amount")
        .map(|value| parse_amount(&value))
        .transpose()?;

    let spl_token = query_param(url, "spl-token")
        .map(|value| parse_field_address("spl-token", &value))
        .transpose()?;

    let references = url
        .query_pairs()
        .filter(|(key, _)| key == "reference")
        .map(|(_, value)| parse_field_address("reference", &value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TransferRequest {
        recipient,
        amount,
        spl_token,
        references,
        label: query_param(url, "label"),
        message: query_param(url, "message"),
        memo: query_param(url, "memo"),
    })
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn parse_field_address(field: &'static str, value: &str) -> Result<Pubkey, ParseError> {
    Pubkey::from_str(value).map_err(|_| ParseError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Parse a decimal SOL amount (e.g. `0.01`) into lamports
pub fn parse_amount(text: &str) -> Result<u64, ParseError> {
    let invalid = || ParseError::InvalidAmount(text.to_string());

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
        return Err(invalid());
    }
    if text.contains('.') && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.len() > SOL_DECIMALS {
        return Err(invalid());
    }

    let whole: u64 = whole.parse().map_err(|_| invalid())?;
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<width$}", fraction, width = SOL_DECIMALS)
            .parse()
            .map_err(|_| invalid())?
    };

    whole
        .checked_mul(LAMPORTS_PER_SOL)
        .and_then(|lamports| lamports.checked_add(fraction))
        .ok_or_else(invalid)
}

/// Render lamports as a decimal SOL amount without trailing zeros
pub fn format_amount(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let fraction = lamports % LAMPORTS_PER_SOL;

    if fraction == 0 {
        whole.to_string()
    } else {
        let digits = format!("{:0width$}", fraction, width = SOL_DECIMALS);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl TransferRequest {
    /// Request a payment to `recipient` with nothing else filled in
    pub fn new(recipient: Pubkey) -> Self {
        Self {
            recipient,
            amount: None,
            spl_token: None,
            references: Vec::new(),
            label: None,
            message: None,
            memo: None,
        }
    }

    pub fn with_amount(mut self, lamports: u64) -> Self {
        self.amount = Some(lamports);
        self
    }

    /// Encode as a `solana:` URL
    pub fn to_url(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());

        if let Some(amount) = self.amount {
            query.append_pair("amount", &format_amount(amount));
        }
        if let Some(token) = &self.spl_token {
            query.append_pair("spl-token", &token.to_string());
        }
        for reference in &self.references {
            query.append_pair("reference", &reference.to_string());
        }
        if let Some(label) = &self.label {
            query.append_pair("label", label);
        }
        if let Some(message) = &self.message {
            query.append_pair("message", message);
        }
        if let Some(memo) = &self.memo {
            query.append_pair("memo", memo);
        }

        let query = query.finish();
        if query.is_empty() {
            format!("{}:{}", SOLANA_PROTOCOL, self.recipient)
        } else {
            format!("{}:{}?{}", SOLANA_PROTOCOL, self.recipient, query)
        }
    }
}
