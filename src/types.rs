//! Core type definitions for the Epay gateway.
//!
//! This module contains the merchant credential, OAuth2 tokens, outbound
//! payment payloads, inbound invoices and the billing request DTO the
//! billing service hands to the client.

use crate::errors::{EpayError, Result};
use crate::utils::{null_as_default, serialize_amount, string_or_number};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OAuth scope requested for general account/service operations.
pub const SERVICE_SCOPE: &str = "webapi usermanagement email_send verification statement statistics";

/// OAuth scope requested for a token bound to a single payment.
pub const PAYMENT_SCOPE: &str = "payment";

/// A cached service token is treated as expired this many seconds early.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

/// Merchant identity and static gateway configuration.
///
/// The `access_token`, `expires_in` and `expires_at` fields cache the last
/// service token and are only written by the token manager.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Merchant terminal identifier
    pub terminal_id: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Base URL of the OAuth server (without `/oauth2/token`)
    pub oauth_endpoint: String,
    /// Base URL of the payments API
    pub endpoint: String,
    /// Hosted payment page script URL
    pub js_link: String,
    /// Base URL the customer is sent back to
    pub back_link: String,
    /// Webhook the gateway posts payment results to
    pub post_link: String,
    /// Default amount, as configured
    pub amount: String,
    /// Cached service token
    pub access_token: String,
    /// Lifetime of the cached service token, as sent by the gateway
    pub expires_in: String,
    /// Unix time the cached service token expires at (0 if never cached)
    pub expires_at: i64,
}

impl Credential {
    /// Loads a credential from `EPAY_*` environment variables.
    ///
    /// Required: `EPAY_TERMINAL_ID`, `EPAY_CLIENT_ID`, `EPAY_CLIENT_SECRET`,
    /// `EPAY_OAUTH_ENDPOINT`, `EPAY_ENDPOINT`, `EPAY_JS_LINK`,
    /// `EPAY_BACK_LINK`, `EPAY_POST_LINK`. Optional: `EPAY_AMOUNT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads a credential through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| EpayError::ConfigError(format!("{} is not set", key)))
        };

        Ok(Self {
            terminal_id: required("EPAY_TERMINAL_ID")?,
            client_id: required("EPAY_CLIENT_ID")?,
            client_secret: required("EPAY_CLIENT_SECRET")?,
            oauth_endpoint: required("EPAY_OAUTH_ENDPOINT")?,
            endpoint: required("EPAY_ENDPOINT")?,
            js_link: required("EPAY_JS_LINK")?,
            back_link: required("EPAY_BACK_LINK")?,
            post_link: required("EPAY_POST_LINK")?,
            amount: lookup("EPAY_AMOUNT").unwrap_or_default(),
            ..Default::default()
        })
    }

    /// Whether the cached service token can still be used at unix time `now`.
    pub fn has_valid_service_token(&self, now: i64) -> bool {
        !self.access_token.is_empty()
            && self.expires_at.saturating_sub(TOKEN_EXPIRY_SKEW_SECS) > now
    }

    /// Negative or unparsable lifetimes expire the token at `now`.
    pub(crate) fn cache_service_token(&mut self, token: &Token, now: i64) {
        let lifetime = token.expires_in_secs().unwrap_or(0).max(0);
        self.access_token = token.access_token.clone();
        self.expires_in = token.expires_in.clone();
        self.expires_at = now.saturating_add(lifetime);
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("terminal_id", &self.terminal_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("oauth_endpoint", &self.oauth_endpoint)
            .field("endpoint", &self.endpoint)
            .field("js_link", &self.js_link)
            .field("back_link", &self.back_link)
            .field("post_link", &self.post_link)
            .field("amount", &self.amount)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// OAuth2 token returned by the gateway's token endpoint.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Token {
    /// Bearer token value
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_token: String,

    /// Lifetime in seconds. The gateway sends either a string or a number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub expires_in: String,

    /// Refresh token, usually empty for client-credentials grants
    #[serde(default, deserialize_with = "null_as_default")]
    pub refresh_token: String,

    /// Granted scope
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope: String,

    /// Token type, normally "Bearer"
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_type: String,
}

impl Token {
    /// Parses `expires_in` as seconds.
    pub fn expires_in_secs(&self) -> Option<i64> {
        self.expires_in.trim().parse().ok()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// How a payment is settled.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentType {
    /// Customer is redirected to the gateway's hosted page
    #[default]
    #[serde(rename = "")]
    Hosted,
    /// Direct charge against a previously saved card
    #[serde(rename = "cardId")]
    CardId,
}

impl FromStr for PaymentType {
    type Err = EpayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(PaymentType::Hosted),
            "cardId" => Ok(PaymentType::CardId),
            other => Err(EpayError::InvalidPayment(format!(
                "unknown payment type: {}",
                other
            ))),
        }
    }
}

/// Reference to a saved card, serialized as `{"id": "..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CardRef {
    /// Gateway card identifier
    pub id: String,
}

/// Payment request sent to the gateway.
///
/// `payment_js_link`, `token`, `card_save` and `homebank_token` only feed the
/// hosted payment page and are never part of the JSON body.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Amount to charge
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Decimal,
    /// ISO currency code, e.g. "KZT"
    pub currency: String,
    /// Payer name
    pub name: String,
    /// Merchant terminal
    pub terminal_id: String,
    /// Merchant invoice identifier
    pub invoice_id: String,
    /// Human readable description
    pub description: String,
    /// Merchant-side account of the payer
    pub account_id: String,
    /// Payer email
    pub email: String,
    /// Payer phone
    pub phone: String,
    /// Success redirect
    pub back_link: String,
    /// Failure redirect
    pub failure_back_link: String,
    /// Success webhook
    pub post_link: String,
    /// Failure webhook
    pub failure_post_link: String,
    /// Page language
    pub language: String,
    /// Settlement mode
    pub payment_type: PaymentType,
    /// Saved card to charge (card-id mode)
    pub card_id: CardRef,

    /// Hosted page script URL
    #[serde(skip)]
    pub payment_js_link: String,
    /// Payment-scoped token embedded in the hosted page
    #[serde(skip)]
    pub token: Option<Token>,
    /// Whether the hosted page offers to save the card
    #[serde(skip)]
    pub card_save: String,
    /// Homebank token passed through to the hosted page
    #[serde(skip)]
    pub homebank_token: String,
}

impl Payment {
    /// Checks the mode-specific field requirements.
    ///
    /// # Examples
    ///
    /// ```
    /// use epay::types::{Payment, PaymentType};
    ///
    /// let payment = Payment {
    ///     payment_type: PaymentType::CardId,
    ///     ..Default::default()
    /// };
    /// assert!(payment.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        match self.payment_type {
            PaymentType::CardId if self.card_id.id.is_empty() => Err(EpayError::InvalidPayment(
                "cardId payment requires a card id".to_string(),
            )),
            PaymentType::Hosted if self.payment_js_link.is_empty() => Err(
                EpayError::InvalidPayment("hosted payment requires a payment js link".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

impl TryFrom<&BillingRequest> for Payment {
    type Error = EpayError;

    fn try_from(req: &BillingRequest) -> Result<Self> {
        let amount = Decimal::from_str(req.amount.trim())
            .map_err(|e| EpayError::InvalidAmount(format!("{:?}: {}", req.amount, e)))?;

        Ok(Payment {
            amount,
            currency: req.currency.clone(),
            name: req.name.clone(),
            terminal_id: req.terminal_id.clone(),
            invoice_id: req.invoice_id.clone(),
            description: req.description.clone(),
            account_id: req.account_id.clone(),
            email: req.email.clone(),
            phone: req.phone.clone(),
            back_link: req.backlink.clone(),
            failure_back_link: req.failure_backlink.clone(),
            post_link: req.post_link.clone(),
            failure_post_link: req.failure_post_link.clone(),
            language: req.language.clone(),
            payment_type: req.payment_type.parse()?,
            ..Default::default()
        })
    }
}

/// Settlement record returned by the gateway on success.
#[allow(missing_docs)]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Invoice {
    /// Gateway-assigned identifier
    #[serde(rename = "id", deserialize_with = "null_as_default")]
    pub external_id: String,
    pub date_time: Option<DateTime<FixedOffset>>,
    /// Echoed merchant invoice identifier
    #[serde(deserialize_with = "null_as_default")]
    pub invoice_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub amount_bonus: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub terminal: String,
    #[serde(deserialize_with = "null_as_default")]
    pub account_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(deserialize_with = "null_as_default")]
    pub card_mask: String,
    #[serde(deserialize_with = "null_as_default")]
    pub card_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issuer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reference: String,
    #[serde(deserialize_with = "null_as_default")]
    pub int_reference: String,
    #[serde(deserialize_with = "null_as_default")]
    pub secure: String,
    #[serde(rename = "secure3D", deserialize_with = "null_as_default")]
    pub secure_3d: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token_recipient: String,
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_region: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_district: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_longitude: Decimal,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_latitude: Decimal,
    /// Saved card identifier
    #[serde(rename = "cardID", deserialize_with = "null_as_default")]
    pub card_id: String,
}

/// Billing request as received by the billing service.
#[allow(missing_docs)]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BillingRequest {
    pub correlation_id: String,
    pub source: String,
    /// Decimal amount as a string
    pub amount: String,
    pub currency: String,
    pub name: String,
    pub terminal_id: String,
    pub invoice_id: String,
    pub description: String,
    pub account_id: String,
    pub email: String,
    pub phone: String,
    pub backlink: String,
    pub failure_backlink: String,
    pub post_link: String,
    pub failure_post_link: String,
    pub language: String,
    pub payment_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_payment_json_shape() {
        let payment = Payment {
            amount: Decimal::from_str("100.50").unwrap(),
            currency: "KZT".to_string(),
            terminal_id: "term-1".to_string(),
            invoice_id: "000001".to_string(),
            payment_type: PaymentType::CardId,
            card_id: CardRef {
                id: "card-9".to_string(),
            },
            payment_js_link: "https://pay.example.kz/payform.js".to_string(),
            card_save: "true".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["amount"], "100.5");
        assert_eq!(json["terminalId"], "term-1");
        assert_eq!(json["paymentType"], "cardId");
        assert_eq!(json["cardId"]["id"], "card-9");
        assert!(json.get("paymentJsLink").is_none());
        assert!(json.get("cardSave").is_none());
        assert!(json.get("token").is_none());
    }

    #[test]
    fn test_hosted_payment_type_is_empty_string() {
        let json = serde_json::to_value(Payment::default()).unwrap();
        assert_eq!(json["paymentType"], "");
    }

    #[test]
    fn test_validate() {
        let mut payment = Payment {
            payment_type: PaymentType::CardId,
            ..Default::default()
        };
        assert!(matches!(payment.validate(), Err(EpayError::InvalidPayment(_))));
        payment.card_id.id = "card-1".to_string();
        assert!(payment.validate().is_ok());

        let mut hosted = Payment::default();
        assert!(hosted.validate().is_err());
        hosted.payment_js_link = "https://pay.example.kz/payform.js".to_string();
        assert!(hosted.validate().is_ok());
    }

    #[test]
    fn test_invoice_deserialization() {
        let body = r#"{
            "id": "ext-1",
            "dateTime": "2024-03-01T10:15:00+06:00",
            "invoiceId": "inv-1",
            "amount": "100.00",
            "amountBonus": 0,
            "currency": "KZT",
            "cardMask": "440043...0001",
            "secure3D": "yes",
            "ipLatitude": 43.2567,
            "cardID": "card-9",
            "code": "ok"
        }"#;

        let invoice: Invoice = serde_json::from_str(body).unwrap();
        assert_eq!(invoice.external_id, "ext-1");
        assert_eq!(invoice.invoice_id, "inv-1");
        assert_eq!(invoice.amount, Decimal::new(10000, 2));
        assert_eq!(invoice.amount_bonus, Decimal::ZERO);
        assert_eq!(invoice.secure_3d, "yes");
        assert_eq!(invoice.ip_latitude, Decimal::from_str("43.2567").unwrap());
        assert_eq!(invoice.card_id, "card-9");
        assert!(invoice.date_time.is_some());
        assert!(invoice.reason.is_empty());
    }

    #[test]
    fn test_invoice_tolerates_null_fields() {
        let body = r#"{"id":"ext-1","invoiceId":"inv-1","amount":100,"secure3D":null,
            "reason":null,"amountBonus":null,"cardID":null,"dateTime":null,"ipLatitude":null}"#;

        let invoice: Invoice = serde_json::from_str(body).unwrap();
        assert_eq!(invoice.external_id, "ext-1");
        assert_eq!(invoice.amount, Decimal::from(100));
        assert_eq!(invoice.amount_bonus, Decimal::ZERO);
        assert_eq!(invoice.ip_latitude, Decimal::ZERO);
        assert!(invoice.secure_3d.is_empty());
        assert!(invoice.reason.is_empty());
        assert!(invoice.card_id.is_empty());
        assert!(invoice.date_time.is_none());
    }

    #[test]
    fn test_token_tolerates_null_fields() {
        let token: Token = serde_json::from_str(
            r#"{"access_token":null,"expires_in":null,"refresh_token":null,"scope":null,"token_type":null}"#,
        )
        .unwrap();
        assert!(token.access_token.is_empty());
        assert_eq!(token.expires_in_secs(), None);

        let token: Token = serde_json::from_str(r#"{"scope":"payment"}"#).unwrap();
        assert!(token.access_token.is_empty());
        assert_eq!(token.scope, "payment");
    }

    #[test]
    fn test_token_expires_in_number_or_string() {
        let token: Token =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":7200,"scope":"payment"}"#)
                .unwrap();
        assert_eq!(token.expires_in_secs(), Some(7200));
        assert_eq!(token.token_type, "");

        let token: Token =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":"1200"}"#).unwrap();
        assert_eq!(token.expires_in_secs(), Some(1200));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential {
            client_secret: "s3cr3t".to_string(),
            access_token: "tok".to_string(),
            ..Default::default()
        };
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("<redacted>"));

        let token = Token {
            access_token: "very-secret-token".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", token).contains("very-secret-token"));
    }

    #[test]
    fn test_service_token_validity() {
        let mut credential = Credential::default();
        assert!(!credential.has_valid_service_token(1_000));

        let token = Token {
            access_token: "svc".to_string(),
            expires_in: "7200".to_string(),
            ..Default::default()
        };
        credential.cache_service_token(&token, 1_000);
        assert_eq!(credential.expires_at, 8_200);
        assert!(credential.has_valid_service_token(1_000));
        assert!(!credential.has_valid_service_token(8_200 - TOKEN_EXPIRY_SKEW_SECS));
    }

    #[test]
    fn test_service_token_lifetime_is_clamped() {
        let now = 1_700_000_000;
        let mut credential = Credential::default();

        let huge = Token {
            access_token: "svc".to_string(),
            expires_in: i64::MAX.to_string(),
            ..Default::default()
        };
        credential.cache_service_token(&huge, now);
        assert_eq!(credential.expires_at, i64::MAX);
        assert!(credential.has_valid_service_token(now));

        let negative = Token {
            access_token: "svc".to_string(),
            expires_in: "-7200".to_string(),
            ..Default::default()
        };
        credential.cache_service_token(&negative, now);
        assert_eq!(credential.expires_at, now);
        assert!(!credential.has_valid_service_token(now));

        credential.expires_at = i64::MIN;
        assert!(!credential.has_valid_service_token(now));
    }

    #[test]
    fn test_credential_from_lookup() {
        let mut vars: HashMap<&str, &str> = HashMap::from([
            ("EPAY_TERMINAL_ID", "term-1"),
            ("EPAY_CLIENT_ID", "client"),
            ("EPAY_CLIENT_SECRET", "secret"),
            ("EPAY_OAUTH_ENDPOINT", "https://oauth.example.kz"),
            ("EPAY_ENDPOINT", "https://api.example.kz"),
            ("EPAY_JS_LINK", "https://pay.example.kz/payform.js"),
            ("EPAY_BACK_LINK", "https://shop.example.kz"),
            ("EPAY_POST_LINK", "https://shop.example.kz/webhook"),
        ]);

        let credential =
            Credential::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(credential.terminal_id, "term-1");
        assert!(credential.amount.is_empty());
        assert!(credential.access_token.is_empty());

        vars.remove("EPAY_CLIENT_SECRET");
        let err = Credential::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap_err();
        assert!(err.to_string().contains("EPAY_CLIENT_SECRET"));
    }

    #[test]
    fn test_payment_from_billing_request() {
        let req: BillingRequest = serde_json::from_str(
            r#"{"correlation_id":"c-1","amount":"2500.75","currency":"KZT","name":"Aigerim",
                "invoice_id":"000123","payment_type":"cardId","backlink":"https://caller.kz"}"#,
        )
        .unwrap();

        let payment = Payment::try_from(&req).unwrap();
        assert_eq!(payment.amount, Decimal::from_str("2500.75").unwrap());
        assert_eq!(payment.payment_type, PaymentType::CardId);
        assert_eq!(payment.back_link, "https://caller.kz");
        assert_eq!(payment.invoice_id, "000123");
    }

    #[test]
    fn test_billing_request_rejects_bad_input() {
        let req = BillingRequest {
            amount: "12,5".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Payment::try_from(&req),
            Err(EpayError::InvalidAmount(_))
        ));

        let req = BillingRequest {
            amount: "1".to_string(),
            payment_type: "crypto".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Payment::try_from(&req),
            Err(EpayError::InvalidPayment(_))
        ));
    }
}
