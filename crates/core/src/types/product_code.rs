//! Human-readable product identifiers (`FK001`, `FK002`, ...).

use core::fmt;

use serde::{Deserialize, Serialize};

/// A product primary key.
///
/// Codes are normally generated: `FK` followed by a number padded to at
/// least three digits. Staff may also supply their own code when creating a
/// product, so any non-empty string is accepted as an existing code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCode(String);

impl ProductCode {
    /// Prefix of generated codes.
    pub const PREFIX: &'static str = "FK";

    /// Wraps an existing code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code given to the first product in an empty catalogue.
    #[must_use]
    pub fn first() -> Self {
        Self::from_number(1)
    }

    /// Formats `FK` + `n` zero-padded to three digits.
    #[must_use]
    pub fn from_number(n: u64) -> Self {
        Self(format!("{}{n:03}", Self::PREFIX))
    }

    /// Numeric part of the code.
    ///
    /// Strips the `FK` prefix and reads the leading digits. A code without
    /// leading digits counts as 0, so the next generated code is `FK001`.
    #[must_use]
    pub fn numeric_part(&self) -> u64 {
        let rest = self.0.trim().replacen(Self::PREFIX, "", 1);
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().unwrap_or(0)
    }

    /// The code that follows this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self::from_number(self.numeric_part().saturating_add(1))
    }

    /// Given the most recently created product's code, the code for a new one.
    #[must_use]
    pub fn next_after(last: Option<&Self>) -> Self {
        last.map_or_else(Self::first, Self::next)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
