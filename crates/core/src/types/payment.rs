//! Payment details captured with an order.
//!
//! Payments are never processed. Card fields are validated for shape and then
//! reduced to what is safe to keep: the method, the card holder name and the
//! last four digits of the card number.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::contact::{is_digits, is_letters_and_spaces};

const CARD_NUMBER_DIGITS: usize = 16;
const SECURITY_CODE_DIGITS: usize = 3;

/// Errors that can occur when validating payment details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The payment method is not one we accept.
    #[error("unknown payment method: {0}")]
    UnknownMethod(String),
    /// Online payment was chosen but card details are missing or malformed.
    #[error("invalid card details")]
    InvalidCard,
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paid in person.
    Cash,
    /// Paid by card through the order form.
    Online,
}

impl PaymentMethod {
    /// The lowercase wire/database name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Online => "online",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "online" => Ok(Self::Online),
            other => Err(PaymentError::UnknownMethod(other.to_owned())),
        }
    }
}

/// Raw card fields as submitted on the order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
    pub security_code: String,
}

impl CardDetails {
    /// Check every field's shape.
    fn validate(&self) -> Result<(), PaymentError> {
        let valid = is_digits(&self.card_number, CARD_NUMBER_DIGITS)
            && is_letters_and_spaces(&self.card_name)
            && is_expiry(&self.expiry_date)
            && is_digits(&self.security_code, SECURITY_CODE_DIGITS);
        if valid {
            Ok(())
        } else {
            Err(PaymentError::InvalidCard)
        }
    }
}

/// `MM/YY`: two digits, a slash, two digits.
fn is_expiry(s: &str) -> bool {
    s.split_once('/')
        .is_some_and(|(month, year)| is_digits(month, 2) && is_digits(year, 2))
}

/// The payment information persisted on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
}

impl PaymentDetails {
    /// Validate submitted payment fields and keep only what may be stored.
    ///
    /// Card details are ignored for cash payments.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidCard` if the method is online and the
    /// card details are missing or malformed.
    pub fn capture(method: PaymentMethod, card: Option<&CardDetails>) -> Result<Self, PaymentError> {
        match method {
            PaymentMethod::Cash => Ok(Self {
                method,
                card_name: None,
                card_last4: None,
            }),
            PaymentMethod::Online => {
                let card = card.ok_or(PaymentError::InvalidCard)?;
                card.validate()?;
                let last4 = card
                    .card_number
                    .get(CARD_NUMBER_DIGITS - 4..)
                    .ok_or(PaymentError::InvalidCard)?;
                Ok(Self {
                    method,
                    card_name: Some(card.card_name.clone()),
                    card_last4: Some(last4.to_owned()),
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card() -> CardDetails {
        CardDetails {
            card_number: "4111111111111234".to_string(),
            card_name: "Ada Lovelace".to_string(),
            expiry_date: "09/27".to_string(),
            security_code: "123".to_string(),
        }
    }

    #[test]
    fn test_cash_ignores_card() {
        let details = PaymentDetails::capture(PaymentMethod::Cash, None).unwrap();
        assert_eq!(details.method, PaymentMethod::Cash);
        assert!(details.card_last4.is_none());
    }

    #[test]
    fn test_online_keeps_only_last_four() {
        let details = PaymentDetails::capture(PaymentMethod::Online, Some(&card())).unwrap();
        assert_eq!(details.card_last4.as_deref(), Some("1234"));
        assert_eq!(details.card_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_online_requires_card() {
        assert_eq!(
            PaymentDetails::capture(PaymentMethod::Online, None),
            Err(PaymentError::InvalidCard)
        );
    }

    #[test]
    fn test_malformed_card_fields() {
        let cases = [
            CardDetails {
                card_number: "411111111111123".to_string(),
                ..card()
            },
            CardDetails {
                card_name: "Ada 1".to_string(),
                ..card()
            },
            CardDetails {
                expiry_date: "9/27".to_string(),
                ..card()
            },
            CardDetails {
                expiry_date: "0927".to_string(),
                ..card()
            },
            CardDetails {
                security_code: "12a".to_string(),
                ..card()
            },
        ];
        for case in &cases {
            assert_eq!(
                PaymentDetails::capture(PaymentMethod::Online, Some(case)),
                Err(PaymentError::InvalidCard),
                "{case:?}"
            );
        }
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("online".parse::<PaymentMethod>().unwrap(), PaymentMethod::Online);
        assert_eq!(
            "cheque".parse::<PaymentMethod>(),
            Err(PaymentError::UnknownMethod("cheque".to_string()))
        );
    }
}
