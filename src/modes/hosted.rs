//! Hosted redirect mode.
//!
//! The customer's browser is sent to the gateway's own payment page. The
//! payload built here, together with a payment token, feeds the page that
//! auto-submits to the gateway.

use crate::errors::Result;
use crate::modes::{base_payment, PaymentMode};
use crate::types::{Credential, Payment, PaymentType};

/// Language the hosted page is shown in.
pub const HOSTED_LANGUAGE: &str = "RU";

/// Hosted redirect payment.
#[derive(Debug, Clone, Default)]
pub struct HostedRedirect {
    /// Whether the page offers to save the card
    pub card_save: String,
    /// Homebank token passed through to the page
    pub homebank_token: String,
}

impl HostedRedirect {
    /// Creates a new hosted redirect mode.
    pub fn new(card_save: impl Into<String>, homebank_token: impl Into<String>) -> Self {
        Self {
            card_save: card_save.into(),
            homebank_token: homebank_token.into(),
        }
    }
}

impl PaymentMode for HostedRedirect {
    fn name(&self) -> &str {
        "hosted"
    }

    fn build(&self, credential: &Credential, insurance_id: &str, inbound: &Payment) -> Result<Payment> {
        let payment = Payment {
            language: HOSTED_LANGUAGE.to_string(),
            payment_type: PaymentType::Hosted,
            payment_js_link: credential.js_link.clone(),
            card_save: self.card_save.clone(),
            homebank_token: self.homebank_token.clone(),
            ..base_payment(credential, insurance_id, inbound)?
        };
        payment.validate()?;
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EpayError;
    use crate::modes::fixtures;

    #[test]
    fn test_build_hosted() {
        let mode = HostedRedirect::new("true", "hb-1");
        let payment = mode
            .build(&fixtures::credential(), "ins-9", &fixtures::inbound())
            .unwrap();

        assert_eq!(payment.language, "RU");
        assert_eq!(payment.payment_type, PaymentType::Hosted);
        assert_eq!(payment.payment_js_link, "https://pay.example.kz/payform.js");
        assert_eq!(payment.card_save, "true");
        assert_eq!(payment.homebank_token, "hb-1");
        assert_eq!(payment.back_link, "https://shop.example.kz/order/ins-9");
        assert!(payment.token.is_none());
    }

    #[test]
    fn test_build_hosted_requires_js_link() {
        let mut credential = fixtures::credential();
        credential.js_link.clear();

        let err = HostedRedirect::default()
            .build(&credential, "ins-9", &fixtures::inbound())
            .unwrap_err();
        assert!(matches!(err, EpayError::InvalidPayment(_)));
    }
}
