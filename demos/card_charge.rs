//! Example Epay client.
//!
//! Charges a saved card when `CARD_ID` is set, otherwise prints the hosted
//! payment page for the same payment.
//!
//! Run with:
//! ```bash
//! cargo run --example card_charge
//! ```
//!
//! Environment variables (a `.env` file is honored):
//! - EPAY_*: merchant credential, see `Credential::from_env`
//! - CARD_ID: saved card to charge
//! - INVOICE_ID: merchant invoice id (default: 000001)
//! - AMOUNT: amount in KZT (default: 100)

use async_trait::async_trait;
use epay::{Credential, EpayClient, Payment, PaymentPageRenderer, Result};

/// Prints a minimal auto-submit page to stdout.
struct StdoutPage;

#[async_trait]
impl PaymentPageRenderer for StdoutPage {
    async fn render(&self, payment: &Payment) -> Result<()> {
        let token = payment
            .token
            .as_ref()
            .map(|t| t.access_token.as_str())
            .unwrap_or_default();

        println!("<script src=\"{}\"></script>", payment.payment_js_link);
        println!("<script>");
        println!("  halyk.pay({{");
        println!("    invoiceId: \"{}\",", payment.invoice_id);
        println!("    amount: \"{}\",", payment.amount.normalize());
        println!("    currency: \"{}\",", payment.currency);
        println!("    terminal: \"{}\",", payment.terminal_id);
        println!("    backLink: \"{}\",", payment.back_link);
        println!("    failureBackLink: \"{}\",", payment.failure_back_link);
        println!("    postLink: \"{}\",", payment.post_link);
        println!("    language: \"{}\",", payment.language);
        println!("    cardSave: \"{}\",", payment.card_save);
        println!("    auth: {{ access_token: \"{}\" }}", token);
        println!("  }});");
        println!("</script>");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let credential = Credential::from_env()?;
    let client = EpayClient::new(credential)?;

    let invoice_id = std::env::var("INVOICE_ID").unwrap_or_else(|_| "000001".to_string());
    let amount = std::env::var("AMOUNT").unwrap_or_else(|_| "100".to_string());

    let payment = Payment {
        amount: amount.parse()?,
        currency: "KZT".to_string(),
        invoice_id: invoice_id.clone(),
        description: "Demo payment".to_string(),
        ..Default::default()
    };

    println!("🔐 Epay Example Client");
    println!("   Invoice: {}", invoice_id);
    println!();

    match std::env::var("CARD_ID") {
        Ok(card_id) => {
            println!("💳 Charging saved card...");
            match client.pay_by_card_id(&card_id, &invoice_id, &payment).await {
                Ok(invoice) => {
                    println!("✅ Settled: {}", invoice.external_id);
                    println!("{}", serde_json::to_string_pretty(&invoice)?);
                }
                Err(e) => {
                    eprintln!("❌ Error: {}", e);
                    return Err(e.into());
                }
            }
        }
        Err(_) => {
            println!("🌐 Rendering hosted payment page...");
            client
                .pay_on_template(&StdoutPage, "true", "", &invoice_id, &payment)
                .await?;
        }
    }

    println!("\n✨ Done!");
    Ok(())
}
