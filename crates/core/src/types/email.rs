//! Customer email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty (after trimming).
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain a single @ symbol")]
    InvalidAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part has no dot or starts/ends with one.
    #[error("email domain is invalid")]
    InvalidDomain,
    /// The address contains whitespace.
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A normalized email address.
///
/// Checkout and preorder forms are filled in on phones, so input is trimmed
/// and lowercased before validation. Validation is structural only; delivery
/// is never attempted.
///
/// ## Constraints
///
/// - Length: 1-254 characters (RFC 5321 limit)
/// - Exactly one @ symbol, no whitespace
/// - Non-empty local part
/// - Domain contains a dot that is neither first nor last
///
/// ## Examples
///
/// ```
/// use ruchna_core::Email;
///
/// let email = Email::parse("  Olena@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "olena@example.com");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first violated constraint.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(EmailError::Empty);
        }

        if normalized.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if normalized.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = normalized
            .split_once('@')
            .ok_or(EmailError::InvalidAtSymbol)?;

        if domain.contains('@') {
            return Err(EmailError::InvalidAtSymbol);
        }

        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }

        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(normalized))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let email = Email::parse("  Maria.K@Ukr.Net\n").unwrap();
        assert_eq!(email.as_str(), "maria.k@ukr.net");
    }

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user+tag@example.com.ua").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at"), Err(EmailError::InvalidAtSymbol));
        assert_eq!(Email::parse("a@b@c.com"), Err(EmailError::InvalidAtSymbol));
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("user@domain"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("user@.com"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("us er@mail.com"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let parsed: Email = serde_json::from_str("\"Shop@Ruchna.UA\"").unwrap();
        assert_eq!(parsed.as_str(), "shop@ruchna.ua");

        assert!(serde_json::from_str::<Email>("\"broken\"").is_err());
    }
}
