//! HTTP exchange with the gateway.
//!
//! Every gateway call goes through [`Transport::send`], which encodes the
//! body, attaches bearer authorization and returns the raw status and body.
//! [`RawResponse::decode`] then turns that into a typed value or a
//! [`EpayError::GatewayRejected`]. Nothing here retries.

use crate::errors::{EpayError, Result};
use crate::types::{Credential, Token};
use crate::utils::current_timestamp;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Fixed timeout applied to every gateway request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body and its wire encoding.
pub enum RequestBody {
    /// Pre-serialized JSON, sent as `application/json`
    Json(Vec<u8>),
    /// `multipart/form-data`, used by the OAuth token endpoint
    Multipart(Form),
}

/// Status and body of a gateway response, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Raw response body
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body as (lossy) UTF-8 text.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes a 200 response as JSON; any other status becomes
    /// [`EpayError::GatewayRejected`] carrying the verbatim body.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        if self.status != StatusCode::OK {
            let body = self.body_text();
            tracing::warn!(status = self.status.as_u16(), "gateway rejected request");
            return Err(EpayError::GatewayRejected {
                status: self.status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&self.body).map_err(|e| {
            tracing::error!(error = %e, "gateway response does not match expected schema");
            EpayError::Encoding(e)
        })
    }
}

/// Shared HTTP client bound to one merchant credential.
#[derive(Clone)]
pub struct Transport {
    http: Client,
    credential: Arc<RwLock<Credential>>,
}

impl Transport {
    /// Builds the HTTP client with the fixed request timeout.
    ///
    /// TLS certificate verification is enabled and must stay enabled; the
    /// gateway is only ever reached over verified HTTPS in production.
    pub fn new(credential: Arc<RwLock<Credential>>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, credential })
    }

    /// Sends one request and returns its raw response.
    ///
    /// `token` is used as bearer authorization when given. Without it, the
    /// credential's cached service token is used, but only while it is still
    /// valid; otherwise the request goes out unauthenticated. Payment-scoped
    /// calls must always pass their own token.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        body: RequestBody,
        token: Option<&Token>,
    ) -> Result<RawResponse> {
        let mut request = self.http.request(method.clone(), url);

        request = match body {
            RequestBody::Json(bytes) => request.header(CONTENT_TYPE, "application/json").body(bytes),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let bearer = match token {
            Some(token) => Some(token.access_token.clone()),
            None => {
                let credential = self.credential.read().await;
                credential
                    .has_valid_service_token(current_timestamp())
                    .then(|| credential.access_token.clone())
            }
        };
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(%method, url, status = status.as_u16(), "gateway responded");

        Ok(RawResponse { status, body })
    }
}
