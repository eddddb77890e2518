//! Payment mode implementations.
//!
//! This module contains the trait every payment mode implements and the two
//! modes the gateway supports: the hosted redirect page and the direct
//! charge against a saved card.

pub mod card_id;
pub mod hosted;

pub use card_id::CardIdCharge;
pub use hosted::HostedRedirect;

use crate::errors::Result;
use crate::types::{Credential, Payment};
use crate::utils::order_back_link;

/// Trait for building the outbound gateway payload of a payment mode.
///
/// Implementations start from the caller's payment, replace every field the
/// merchant controls (terminal, callback links) with the credential's values,
/// apply their own mode-specific fields and validate the result. A payload
/// that fails validation never reaches the network.
pub trait PaymentMode: Send + Sync {
    /// Returns the name of this mode (e.g., "hosted").
    fn name(&self) -> &str;

    /// Builds the outbound payload.
    ///
    /// # Arguments
    ///
    /// * `credential` - The merchant credential
    /// * `insurance_id` - Order identifier appended to the success back link
    /// * `inbound` - The payment as requested by the billing service
    fn build(&self, credential: &Credential, insurance_id: &str, inbound: &Payment) -> Result<Payment>;
}

/// Fields shared by every mode.
///
/// `name` and `email` are deliberately not forwarded to the gateway.
fn base_payment(credential: &Credential, insurance_id: &str, inbound: &Payment) -> Result<Payment> {
    Ok(Payment {
        amount: inbound.amount,
        currency: inbound.currency.clone(),
        terminal_id: credential.terminal_id.clone(),
        invoice_id: inbound.invoice_id.clone(),
        description: inbound.description.clone(),
        account_id: inbound.account_id.clone(),
        phone: inbound.phone.clone(),
        back_link: order_back_link(&credential.back_link, insurance_id)?,
        failure_back_link: credential.back_link.clone(),
        post_link: credential.post_link.clone(),
        failure_post_link: credential.post_link.clone(),
        ..Default::default()
    })
}
