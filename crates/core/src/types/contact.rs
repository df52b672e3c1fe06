//! Contact details captured on the order form.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Minimum number of digits in a phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Errors that can occur when parsing order-form contact fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The name is empty or contains something other than letters and whitespace.
    #[error("name must contain only letters and spaces")]
    InvalidName,
    /// The phone number is too short or contains non-digits.
    #[error("phone must be at least {min} digits")]
    InvalidPhone {
        /// Minimum number of digits.
        min: usize,
    },
}

/// Returns `true` for non-empty strings made of ASCII letters and whitespace.
///
/// Shared by customer names and card holder names.
#[must_use]
pub fn is_letters_and_spaces(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
}

/// Returns `true` when `s` is exactly `len` ASCII digits.
#[must_use]
pub fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// The name an order is placed under.
///
/// ```
/// use afterschool_core::CustomerName;
///
/// assert!(CustomerName::parse("Ada Lovelace").is_ok());
/// assert!(CustomerName::parse("R2-D2").is_err());
/// assert!(CustomerName::parse("").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CustomerName(String);

impl CustomerName {
    /// Parse a customer name.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::InvalidName` unless the input is a non-empty
    /// run of ASCII letters and whitespace.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        if !is_letters_and_spaces(s) {
            return Err(ContactError::InvalidName);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contact phone number: ten or more digits, nothing else.
///
/// ```
/// use afterschool_core::PhoneNumber;
///
/// assert!(PhoneNumber::parse("07123456789").is_ok());
/// assert!(PhoneNumber::parse("0712 345 678").is_err());
/// assert!(PhoneNumber::parse("123456789").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::InvalidPhone` if the input has fewer than ten
    /// characters or any non-digit.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        if s.len() < MIN_PHONE_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ContactError::InvalidPhone {
                min: MIN_PHONE_DIGITS,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
