//! Student identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StudentId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StudentIdError {
    /// The input string is empty.
    #[error("student id cannot be empty")]
    Empty,
    /// The input does not start with the `M` prefix.
    #[error("student id must start with 'M'")]
    MissingPrefix,
    /// The part after the prefix is not exactly eight digits.
    #[error("student id must be 'M' followed by {digits} digits")]
    InvalidDigits {
        /// Required number of digits.
        digits: usize,
    },
}

/// The external identifier a student logs in with, e.g. `M00123456`.
///
/// ## Constraints
///
/// - Starts with an uppercase `M`
/// - Followed by exactly eight ASCII digits
///
/// ## Examples
///
/// ```
/// use afterschool_core::StudentId;
///
/// assert!(StudentId::parse("M00123456").is_ok());
///
/// assert!(StudentId::parse("").is_err());
/// assert!(StudentId::parse("00123456").is_err());
/// assert!(StudentId::parse("M0012345").is_err());
/// assert!(StudentId::parse("M0012345X").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Number of digits after the prefix.
    pub const DIGITS: usize = 8;

    /// Parse a `StudentId`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, lacks the `M` prefix, or is
    /// not followed by exactly eight digits.
    pub fn parse(s: &str) -> Result<Self, StudentIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StudentIdError::Empty);
        }

        let digits = s.strip_prefix('M').ok_or(StudentIdError::MissingPrefix)?;

        if digits.len() != Self::DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StudentIdError::InvalidDigits {
                digits: Self::DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the student id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
