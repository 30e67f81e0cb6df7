//! Request body validation.
//!
//! Handlers deserialize bodies into structs of optional raw values, then run
//! them through a [`Validator`], which collects every failing field before
//! answering with a single 400. Inputs are trimmed, and free text that ends
//! up in the database is HTML-escaped.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use fk_designers_core::{Email, Phone};

use crate::error::AppError;

/// One failed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors.
///
/// Each check returns the cleaned value when the field passed, so callers
/// can write `let name = v.text("name", body.name.as_deref(), 2, 100);` and
/// unwrap the options only after [`Validator::finish`] succeeded.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `field`.
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Required text, trimmed, with a character count in `min..=max`.
    pub fn text(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) -> Option<String> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            self.reject(field, format!("{} is required", label(field)));
            return None;
        };
        self.length(field, value, min, max)
    }

    /// Optional text, trimmed; empty counts as absent.
    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        self.length(field, value, 0, max)
    }

    fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> Option<String> {
        let len = value.chars().count();
        if len < min || len > max {
            let message = if min == 0 {
                format!("{} must be at most {max} characters", label(field))
            } else {
                format!("{} must be between {min} and {max} characters", label(field))
            };
            self.reject(field, message);
            return None;
        }
        Some(value.to_string())
    }

    /// Required, valid, normalised email.
    pub fn email(&mut self, field: &str, value: Option<&str>) -> Option<Email> {
        match Email::parse(value.unwrap_or_default()) {
            Ok(email) => Some(email),
            Err(_) => {
                self.reject(field, "Please provide a valid email address");
                None
            }
        }
    }

    /// Required phone number.
    pub fn phone(&mut self, field: &str, value: Option<&str>) -> Option<Phone> {
        match Phone::parse(value.unwrap_or_default()) {
            Ok(phone) => Some(phone),
            Err(_) => {
                self.reject(field, "Please provide a valid phone number (10-15 digits)");
                None
            }
        }
    }

    /// Optional phone number; empty counts as absent.
    pub fn optional_phone(&mut self, field: &str, value: Option<&str>) -> Option<Phone> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        self.phone(field, Some(value))
    }

    /// Password with a minimum length. Not trimmed.
    pub fn password(&mut self, field: &str, value: Option<&str>, min: usize) -> Option<String> {
        match value {
            Some(p) if !p.is_empty() && p.chars().count() >= min => Some(p.to_string()),
            Some(p) if !p.is_empty() => {
                self.reject(field, format!("Password must be at least {min} characters long"));
                None
            }
            _ => {
                self.reject(field, "Password is required");
                None
            }
        }
    }

    /// Optional ISO-8601 calendar date (`YYYY-MM-DD`, or a full timestamp
    /// whose date part is used).
    pub fn optional_date(&mut self, field: &str, value: Option<&str>) -> Option<chrono::NaiveDate> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        let parsed = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        });
        if parsed.is_none() {
            self.reject(field, format!("{} must be a valid date", label(field)));
        }
        parsed
    }

    /// Required non-negative number (JSON number or numeric string).
    pub fn price(&mut self, field: &str, value: Option<&Value>) -> Option<Decimal> {
        let parsed = value.and_then(decimal_from_json);
        match parsed {
            Some(d) if d >= Decimal::ZERO => Some(d.round_dp(2)),
            _ => {
                self.reject(field, format!("{} must be a positive number", label(field)));
                None
            }
        }
    }

    /// Optional non-negative number. An invalid value is recorded and
    /// surfaces from [`Validator::finish`].
    pub fn optional_price(&mut self, field: &str, value: Option<&Value>) -> Option<Decimal> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => self.price(field, Some(v)),
        }
    }

    /// Required value from a fixed set, parsed with `FromStr`.
    pub fn one_of<T: std::str::FromStr>(
        &mut self,
        field: &str,
        value: Option<&str>,
        allowed: &[&str],
    ) -> Option<T> {
        let parsed = value.map(str::trim).and_then(|v| v.parse::<T>().ok());
        if parsed.is_none() {
            self.reject(
                field,
                format!("{} must be one of: {}", label(field), allowed.join(", ")),
            );
        }
        parsed
    }

    /// Non-empty list of non-empty strings.
    pub fn string_list(&mut self, field: &str, value: Option<&Value>) -> Option<Vec<String>> {
        let items: Option<Vec<String>> = match value {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                })
                .collect(),
            _ => None,
        };
        match items {
            Some(items) if !items.is_empty() => Some(items),
            _ => {
                self.reject(field, format!("At least one {} is required", singular(field)));
                None
            }
        }
    }

    /// Optional boolean; accepts `true`/`false` and their string forms.
    pub fn optional_bool(&mut self, field: &str, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s == "true" => true,
            Some(Value::String(s)) if s == "false" => false,
            Some(_) => {
                self.reject(field, format!("{} must be a boolean", label(field)));
                false
            }
        }
    }

    /// Succeeds when every check passed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` carrying every recorded field error.
    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Error for a required value found absent after [`Validator::finish`]
/// succeeded. Reaching it means a check forgot to record its failure.
#[must_use]
pub fn missing_after_validation() -> AppError {
    AppError::Internal("validated field missing".to_string())
}

fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok().or_else(|| {
            n.as_f64().and_then(|f| Decimal::try_from(f).ok())
        }),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// `first_name` -> `First name`.
fn label(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn singular(field: &str) -> String {
    let word = field.strip_suffix('s').unwrap_or(field);
    match word {
        "image" => "image URL".to_string(),
        other => other.replace('_', " "),
    }
}

/// Escapes the characters HTML treats specially.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}
