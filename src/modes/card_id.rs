//! Direct charge against a saved card.

use crate::errors::Result;
use crate::modes::{base_payment, PaymentMode};
use crate::types::{CardRef, Credential, Payment, PaymentType};

/// Language code the gateway expects for card-id charges.
pub const CARD_ID_LANGUAGE: &str = "rus";

/// Card-id charge, settled synchronously without a redirect.
#[derive(Debug, Clone)]
pub struct CardIdCharge {
    /// Gateway identifier of the saved card
    pub card_id: String,
}

impl CardIdCharge {
    /// Creates a charge against the given saved card.
    pub fn new(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
        }
    }
}

impl PaymentMode for CardIdCharge {
    fn name(&self) -> &str {
        "cardId"
    }

    fn build(&self, credential: &Credential, insurance_id: &str, inbound: &Payment) -> Result<Payment> {
        let payment = Payment {
            language: CARD_ID_LANGUAGE.to_string(),
            payment_type: PaymentType::CardId,
            card_id: CardRef {
                id: self.card_id.clone(),
            },
            ..base_payment(credential, insurance_id, inbound)?
        };
        payment.validate()?;
        Ok(payment)
    }
}
