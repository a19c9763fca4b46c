//! Ukrainian mobile phone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone cannot be empty")]
    Empty,
    #[error("phone contains invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("phone must be a Ukrainian number (+380XXXXXXXXX)")]
    NotUkrainian,
}

/// A phone number normalized to `+380XXXXXXXXX`.
///
/// Customers type numbers as `067 123 45 67`, `(067) 123-45-67`,
/// `380671234567` or `+38 067 123 45 67`; all of these parse to the same
/// value. Only spaces, dashes, dots, parentheses and a leading `+` are
/// tolerated as separators.
///
/// ```
/// use ruchna_core::Phone;
///
/// let phone = Phone::parse("(067) 123-45-67").unwrap();
/// assert_eq!(phone.as_str(), "+380671234567");
/// assert!(Phone::parse("+1 555 0100").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] if the input is empty, contains letters or
    /// does not resolve to a 9-digit subscriber number under +380.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let mut digits = String::with_capacity(trimmed.len());
        for (i, c) in trimmed.chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                '+' if i == 0 => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        let subscriber = match digits.len() {
            12 => digits.strip_prefix("380"),
            11 => digits.strip_prefix("80"),
            10 => digits.strip_prefix('0'),
            9 => Some(digits.as_str()),
            _ => None,
        }
        .ok_or(PhoneError::NotUkrainian)?;

        if subscriber.starts_with('0') {
            return Err(PhoneError::NotUkrainian);
        }

        Ok(Self(format!("+380{subscriber}")))
    }

    /// Returns the normalized number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
