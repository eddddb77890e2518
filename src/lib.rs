//! # epay-rs
//!
//! An async Rust client for the Epay payment gateway.
//!
//! The gateway authenticates merchants with OAuth2 client credentials and
//! settles payments in two ways: by redirecting the customer to a hosted
//! payment page, or by charging a card the customer saved earlier. This crate
//! covers the gateway-facing half of a billing backend: token lifecycle,
//! payload construction for each payment mode, and the HTTP exchange.
//!
//! ## Features
//!
//! - **Token management**: service tokens (cached) and single-use payment tokens
//! - **Hosted redirect**: builds the token-bearing payload for the hosted page
//! - **Card-id charge**: synchronous settlement returning an [`Invoice`]
//! - **Exact amounts**: all money is [`rust_decimal::Decimal`], never floating point
//! - **Typed errors**: transport, encoding and gateway rejections are distinct variants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use epay::client::EpayClient;
//! use epay::types::{Credential, Payment};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EpayClient::new(Credential::from_env()?)?;
//!
//! let payment = Payment {
//!     amount: "2500.00".parse()?,
//!     currency: "KZT".to_string(),
//!     invoice_id: "000123".to_string(),
//!     description: "Policy premium".to_string(),
//!     ..Default::default()
//! };
//!
//! let invoice = client.pay_by_card_id("saved-card-id", "ins-123", &payment).await?;
//! println!("gateway id: {}, code: {}", invoice.external_id, invoice.code);
//! # Ok(())
//! # }
//! ```
//!
//! ## Protocol Overview
//!
//! 1. **Token**: `POST {oauth_endpoint}/oauth2/token` with a multipart form
//!    (`grant_type=client_credentials`, `scope`, client id/secret and, for
//!    payment tokens, the terminal, currency, invoice id and amount)
//! 2. **Charge**: `POST {endpoint}/payments/cards/auth` with a JSON payment and
//!    the payment token as bearer authorization
//! 3. **Result**: HTTP 200 carries the invoice; every other status is a
//!    rejection whose body is returned verbatim
//!
//! ## Security
//!
//! - TLS certificates are always verified
//! - Payment tokens are bound to one invoice and never reused or cached
//! - Terminal id and callback links always come from the merchant credential,
//!   never from the caller's payment

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod errors;
pub mod modes;
pub mod token;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use client::{EpayClient, PaymentPageRenderer};
pub use errors::{EpayError, Result};
pub use types::{
    BillingRequest, CardRef, Credential, Invoice, Payment, PaymentType, Token, PAYMENT_SCOPE,
    SERVICE_SCOPE,
};
