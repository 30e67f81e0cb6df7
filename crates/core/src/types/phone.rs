//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Length outside the accepted range.
    #[error("phone number must be between {min} and {max} characters")]
    Length {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
    },
    /// Contains a character other than digits, spaces, `-`, `(`, `)` or a leading `+`.
    #[error("phone number contains invalid characters")]
    InvalidCharacter,
}

/// A loosely formatted phone number as typed by a customer.
///
/// Accepts `+91 98765-43210` or `(022) 2345 6789`: 10-15 characters made of
/// digits, spaces, dashes and parentheses, with an optional leading `+`.
/// The value is stored as entered (trimmed); no canonicalisation is done.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum accepted length.
    pub const MIN_LENGTH: usize = 10;
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 15;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if the trimmed input has the wrong length or
    /// contains a disallowed character.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        let len = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(PhoneError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }

        let body = s.strip_prefix('+').unwrap_or(s);
        let valid = !body.is_empty()
            && body
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'));
        if !valid {
            return Err(PhoneError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_common_formats() {
        assert!(Phone::parse("9876543210").is_ok());
        assert!(Phone::parse("+91 98765-43210").is_ok());
        assert!(Phone::parse("(022) 2345 6789").is_ok());
    }

    #[test]
    fn test_parse_length_bounds() {
        assert!(matches!(
            Phone::parse("12345"),
            Err(PhoneError::Length { .. })
        ));
        assert!(matches!(
            Phone::parse("1234567890123456"),
            Err(PhoneError::Length { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_letters_and_inner_plus() {
        assert_eq!(
            Phone::parse("98765abc10"),
            Err(PhoneError::InvalidCharacter)
        );
        assert_eq!(
            Phone::parse("98765+43210"),
            Err(PhoneError::InvalidCharacter)
        );
    }

    #[test]
    fn test_parse_trims() {
        let phone = Phone::parse("  9876543210 ").map(Phone::into_inner);
        assert_eq!(phone, Ok("9876543210".to_string()));
    }
}
