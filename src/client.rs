//! Gateway client facade.
//!
//! [`EpayClient`] owns the merchant credential and composes the payment
//! modes, the token manager and the transport into the two flows the billing
//! service uses: the hosted redirect page and the synchronous card-id charge.

use crate::errors::{EpayError, Result};
use crate::modes::{CardIdCharge, HostedRedirect, PaymentMode};
use crate::token::TokenManager;
use crate::transport::{RequestBody, Transport};
use crate::types::{Credential, Invoice, Payment, Token};
use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Renders the hosted payment page for a fully populated payment.
///
/// Implementations typically write an HTML form that auto-submits to the
/// gateway, using `payment.payment_js_link` and `payment.token`.
#[async_trait]
pub trait PaymentPageRenderer: Send + Sync {
    /// Renders the page. Errors should be reported as [`EpayError::RenderError`].
    async fn render(&self, payment: &Payment) -> Result<()>;
}

/// Client for the Epay payment gateway.
///
/// Cloning is cheap; clones share the credential and its cached service token.
/// Every operation performs at most one request per step and never retries.
/// Dropping a returned future aborts the in-flight HTTP request.
#[derive(Clone)]
pub struct EpayClient {
    credential: Arc<RwLock<Credential>>,
    transport: Transport,
    tokens: TokenManager,
}

impl EpayClient {
    /// Creates a client for the given merchant credential.
    ///
    /// The credential is not validated; bad values surface when the gateway
    /// rejects a request.
    ///
    /// # Examples
    ///
    /// ```
    /// use epay::client::EpayClient;
    /// use epay::types::Credential;
    ///
    /// let client = EpayClient::new(Credential {
    ///     terminal_id: "67e34d63-102f-4bd1-898e-370781d0074d".to_string(),
    ///     client_id: "merchant".to_string(),
    ///     client_secret: "secret".to_string(),
    ///     oauth_endpoint: "https://testoauth.homebank.kz/epay2".to_string(),
    ///     endpoint: "https://testepay.homebank.kz/api".to_string(),
    ///     ..Default::default()
    /// })
    /// .unwrap();
    /// ```
    pub fn new(credential: Credential) -> Result<Self> {
        let credential = Arc::new(RwLock::new(credential));
        let transport = Transport::new(credential.clone())?;
        let tokens = TokenManager::new(transport.clone(), credential.clone());

        Ok(Self {
            credential,
            transport,
            tokens,
        })
    }

    /// Returns a snapshot of the credential, including the cached service token.
    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    /// Requests a new service token and caches it.
    pub async fn fetch_service_token(&self) -> Result<Token> {
        self.tokens.fetch_service_token().await
    }

    /// Returns the cached service token, refreshing it when needed.
    pub async fn service_token(&self) -> Result<Token> {
        self.tokens.service_token().await
    }

    /// Starts a hosted redirect payment.
    ///
    /// Builds the hosted payload, obtains a payment token for it and hands the
    /// token-bearing payload to `renderer`. Nothing is returned to the caller;
    /// the rendered page is the result.
    ///
    /// # Arguments
    ///
    /// * `renderer` - Writes the auto-submit page
    /// * `card_save` - Whether the page offers to save the card
    /// * `homebank_token` - Passed through to the page
    /// * `insurance_id` - Order id appended to the success back link
    /// * `payment` - Payment as requested by the billing service
    pub async fn pay_on_template<R>(
        &self,
        renderer: &R,
        card_save: &str,
        homebank_token: &str,
        insurance_id: &str,
        payment: &Payment,
    ) -> Result<()>
    where
        R: PaymentPageRenderer + ?Sized,
    {
        let credential = self.credential().await;
        let mode = HostedRedirect::new(card_save, homebank_token);
        let mut outbound = mode.build(&credential, insurance_id, payment)?;
        tracing::debug!(mode = mode.name(), invoice_id = %outbound.invoice_id, "payment built");

        outbound.token = Some(self.tokens.fetch_payment_token(&outbound).await?);

        renderer.render(&outbound).await
    }

    /// Charges a saved card and returns the gateway's invoice.
    ///
    /// Exactly one token request and one payment request are made; an empty
    /// `card_id` fails before either.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use epay::client::EpayClient;
    /// use epay::types::{Credential, Payment};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = EpayClient::new(Credential::from_env()?)?;
    /// let payment = Payment {
    ///     amount: "1500".parse()?,
    ///     currency: "KZT".to_string(),
    ///     invoice_id: "000001".to_string(),
    ///     ..Default::default()
    /// };
    ///
    /// let invoice = client.pay_by_card_id("card-id", "ins-1", &payment).await?;
    /// println!("settled as {}", invoice.external_id);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn pay_by_card_id(
        &self,
        card_id: &str,
        insurance_id: &str,
        payment: &Payment,
    ) -> Result<Invoice> {
        let credential = self.credential().await;
        let mode = CardIdCharge::new(card_id);
        let outbound = mode.build(&credential, insurance_id, payment)?;
        tracing::debug!(mode = mode.name(), invoice_id = %outbound.invoice_id, "payment built");

        let token = self.tokens.fetch_payment_token(&outbound).await?;

        let body = serde_json::to_vec(&outbound).map_err(|e| {
            tracing::error!(error = %e, invoice_id = %outbound.invoice_id, "failed to encode payment");
            EpayError::Encoding(e)
        })?;

        let url = format!("{}/payments/cards/auth", credential.endpoint);
        let response = self
            .transport
            .send(Method::POST, &url, RequestBody::Json(body), Some(&token))
            .await?;

        tracing::info!(
            invoice_id = %outbound.invoice_id,
            status = response.status.as_u16(),
            "invoice confirmation by card id"
        );

        response.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::fixtures;

    #[tokio::test]
    async fn test_client_credential_snapshot() {
        let client = EpayClient::new(fixtures::credential()).unwrap();
        let snapshot = client.credential().await;
        assert_eq!(snapshot.terminal_id, fixtures::credential().terminal_id);
        assert!(snapshot.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_empty_card_id_fails_before_network() {
        // Unroutable endpoints: any network attempt would surface as a transport error
        let mut credential = fixtures::credential();
        credential.oauth_endpoint = "http://127.0.0.1:9".to_string();
        credential.endpoint = "http://127.0.0.1:9".to_string();

        let client = EpayClient::new(credential).unwrap();
        let err = client
            .pay_by_card_id("", "ins-1", &fixtures::inbound())
            .await
            .unwrap_err();
        assert!(matches!(err, EpayError::InvalidPayment(_)));
    }
}
