//! Utility functions for gateway operations.
//!
//! Amount rendering, callback URL construction, timestamps and the lenient
//! deserializers needed for the gateway's loosely typed JSON.

use crate::errors::{EpayError, Result};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use url::Url;

/// Renders an amount the way the gateway expects it in form fields and JSON.
///
/// Trailing zeros are dropped and the output never uses scientific notation.
///
/// # Examples
///
/// ```
/// use epay::utils::canonical_amount;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let amount = Decimal::from_str("100.50").unwrap();
/// assert_eq!(canonical_amount(&amount), "100.5");
/// ```
pub fn canonical_amount(amount: &Decimal) -> String {
    amount.normalize().to_string()
}

/// Serde adapter writing a [`Decimal`] as its canonical string.
pub fn serialize_amount<S>(amount: &Decimal, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&canonical_amount(amount))
}

/// Deserializes a field the gateway sends either as a JSON string or a number.
///
/// `null` becomes an empty string.
pub fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Deserializes a field, mapping an explicit JSON `null` to the type's default.
///
/// Combine with `#[serde(default)]` so missing keys are accepted too.
pub fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Builds the success callback URL `{back_link}/order/{insurance_id}`.
///
/// The insurance id is percent-encoded as a single path segment, so ids
/// containing `/`, `?` or spaces cannot break the URL.
///
/// # Examples
///
/// ```
/// use epay::utils::order_back_link;
///
/// let link = order_back_link("https://shop.example.kz", "ins-42").unwrap();
/// assert_eq!(link, "https://shop.example.kz/order/ins-42");
/// ```
pub fn order_back_link(back_link: &str, insurance_id: &str) -> Result<String> {
    let mut url = Url::parse(back_link)?;
    url.path_segments_mut()
        .map_err(|_| EpayError::ConfigError(format!("back link cannot carry a path: {}", back_link)))?
        .pop_if_empty()
        .push("order")
        .push(insurance_id);
    Ok(url.into())
}

/// Gets the current Unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
