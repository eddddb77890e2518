//! OAuth2 client-credentials token acquisition.
//!
//! Two kinds of token are requested from `{oauth_endpoint}/oauth2/token`:
//!
//! - a **service token** with [`SERVICE_SCOPE`], cached on the credential;
//! - a **payment token** with [`PAYMENT_SCOPE`], bound to one
//!   `(terminal, currency, invoice, amount)` tuple and never cached.
//!
//! Each call obtains a new token from the gateway.

use crate::errors::Result;
use crate::transport::{RequestBody, Transport};
use crate::types::{Credential, Payment, Token, PAYMENT_SCOPE, SERVICE_SCOPE};
use crate::utils::{canonical_amount, current_timestamp};
use reqwest::multipart::Form;
use reqwest::Method;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Grant type used for every token request.
pub const GRANT_TYPE: &str = "client_credentials";

/// Requests and caches OAuth2 tokens for one merchant credential.
#[derive(Clone)]
pub struct TokenManager {
    transport: Transport,
    credential: Arc<RwLock<Credential>>,
    refresh: Arc<Mutex<()>>,
}

impl TokenManager {
    /// Creates a token manager sharing the given credential and transport.
    pub fn new(transport: Transport, credential: Arc<RwLock<Credential>>) -> Self {
        Self {
            transport,
            credential,
            refresh: Arc::new(Mutex::new(())),
        }
    }

    /// Requests a broadly scoped service token and caches it on the credential.
    pub async fn fetch_service_token(&self) -> Result<Token> {
        let (url, form) = {
            let credential = self.credential.read().await;
            (token_url(&credential), base_form(&credential, SERVICE_SCOPE))
        };

        tracing::debug!(scope = SERVICE_SCOPE, "requesting service token");

        let token: Token = self
            .transport
            .send(Method::POST, &url, RequestBody::Multipart(form), None)
            .await?
            .decode()?;

        self.credential
            .write()
            .await
            .cache_service_token(&token, current_timestamp());

        Ok(token)
    }

    /// Returns the cached service token, fetching a new one when it is
    /// missing or about to expire.
    ///
    /// Concurrent callers that find the cache cold wait for a single refresh
    /// instead of each requesting their own token.
    pub async fn service_token(&self) -> Result<Token> {
        if let Some(token) = self.cached_service_token().await {
            return Ok(token);
        }

        let _refresh = self.refresh.lock().await;
        if let Some(token) = self.cached_service_token().await {
            return Ok(token);
        }

        self.fetch_service_token().await
    }

    async fn cached_service_token(&self) -> Option<Token> {
        let credential = self.credential.read().await;
        credential
            .has_valid_service_token(current_timestamp())
            .then(|| Token {
                access_token: credential.access_token.clone(),
                expires_in: credential.expires_in.clone(),
                scope: SERVICE_SCOPE.to_string(),
                ..Default::default()
            })
    }

    /// Requests a token scoped to exactly this payment.
    ///
    /// The token must be used for this payment only and then discarded.
    pub async fn fetch_payment_token(&self, payment: &Payment) -> Result<Token> {
        let (url, form) = {
            let credential = self.credential.read().await;
            (token_url(&credential), payment_form(&credential, payment))
        };

        tracing::debug!(
            scope = PAYMENT_SCOPE,
            invoice_id = %payment.invoice_id,
            terminal = %payment.terminal_id,
            "requesting payment token"
        );

        self.transport
            .send(Method::POST, &url, RequestBody::Multipart(form), None)
            .await?
            .decode()
    }
}

fn token_url(credential: &Credential) -> String {
    format!("{}/oauth2/token", credential.oauth_endpoint)
}

fn base_form(credential: &Credential, scope: &'static str) -> Form {
    Form::new()
        .text("grant_type", GRANT_TYPE)
        .text("scope", scope)
        .text("client_id", credential.client_id.clone())
        .text("client_secret", credential.client_secret.clone())
}

fn payment_form(credential: &Credential, payment: &Payment) -> Form {
    base_form(credential, PAYMENT_SCOPE)
        .text("postLink", payment.post_link.clone())
        .text("terminal", payment.terminal_id.clone())
        .text("currency", payment.currency.clone())
        .text("invoiceID", payment.invoice_id.clone())
        .text("amount", canonical_amount(&payment.amount))
}
