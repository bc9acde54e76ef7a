//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain exactly one @ symbol")]
    AtSymbol,
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    #[error("email domain must contain a dot")]
    InvalidDomain,
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A normalized (trimmed, lowercase domain) email address.
///
/// ```
/// use foodloc_core::Email;
///
/// let email = Email::parse("  Chef@Pho.VN ").unwrap();
/// assert_eq!(email.as_str(), "Chef@pho.vn");
/// assert!(Email::parse("chef@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an email address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::AtSymbol)?;
        if domain.contains('@') {
            return Err(EmailError::AtSymbol);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        let dot_ok = domain
            .split('.')
            .all(|label| !label.is_empty())
            && domain.contains('.');
        if !dot_ok {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(format!("{local}@{}", domain.to_ascii_lowercase())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Domain part (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, d)| d)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
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

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
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
    fn test_accepts_common_addresses() {
        for ok in ["an@quan.vn", "an.nguyen+orders@mail.example.com", "x@y.co"] {
            assert!(Email::parse(ok).is_ok(), "{ok} should parse");
        }
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at.vn"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("a@b@c.vn"), Err(EmailError::AtSymbol));
        assert_eq!(Email::parse("@quan.vn"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("an@localhost"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("an@quan..vn"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("a n@quan.vn"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@quan.vn", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_domain_is_lowercased() {
        let email = Email::parse("An@Quan.VN").unwrap();
        assert_eq!(email.as_str(), "An@quan.vn");
        assert_eq!(email.domain(), "quan.vn");
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Email>("\"bad\"").is_err());
        let email: Email = serde_json::from_str("\"an@quan.vn\"").unwrap();
        assert_eq!(email.to_string(), "an@quan.vn");
    }
}
