//! Error types for the epay-rs library.
//!
//! Failures fall into three families that callers usually want to tell apart:
//! transport failures (the request never got a response), encoding failures
//! (a body did not match the expected JSON shape) and gateway rejections (any
//! response other than HTTP 200). The remaining variants are raised before any
//! network call is made.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum EpayError {
    /// Connection, DNS, TLS or timeout failure while talking to the gateway
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request or response body could not be (de)serialized
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The gateway answered with a non-200 status. The body is kept verbatim
    /// because the gateway has no stable error schema.
    #[error("Gateway rejected request (status {status}): {body}")]
    GatewayRejected {
        /// HTTP status code returned by the gateway
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Payment payload violates a mode-specific requirement
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    /// Amount is not a valid decimal
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error parsing URL
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// The payment page renderer failed
    #[error("Render error: {0}")]
    RenderError(String),
}

impl EpayError {
    /// Returns `true` if the request failed before a response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, EpayError::Transport(_))
    }

    /// Returns `true` for body (de)serialization failures.
    pub fn is_encoding(&self) -> bool {
        matches!(self, EpayError::Encoding(_))
    }

    /// Returns the HTTP status of a gateway rejection, if this is one.
    pub fn gateway_status(&self) -> Option<u16> {
        match self {
            EpayError::GatewayRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, EpayError>;
