//! Names, e-mail addresses and phone numbers

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use super::validation::{normalize_whitespace, ValidationError};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex")
});

/// Optional leading `+`, then 8 to 15 digits after separators are stripped
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("invalid phone regex"));

/// Validated first or last name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonName(String);

impl PersonName {
    /// Create a name, collapsing whitespace.
    ///
    /// # Example
    /// ```
    /// use chiroctl_core::domain::PersonName;
    ///
    /// assert_eq!(PersonName::new("  Jan  Peeters ").unwrap().as_str(), "Jan Peeters");
    /// assert!(PersonName::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let name = normalize_whitespace(s);
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Validated, lower-cased e-mail address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let email = s.trim().to_lowercase();
        if email.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if email.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@domain.tld",
            });
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number with separators stripped
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a phone number.
    ///
    /// Spaces, dots, slashes, dashes and parentheses are removed before
    /// checking, so `0470 12 34 56` and `0470/12.34.56` are the same number.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let digits: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '.' | '/' | '-' | '(' | ')'))
            .collect();
        if digits.is_empty() {
            return Err(ValidationError::Empty { field: "phone" });
        }
        if !PHONE_RE.is_match(&digits) {
            return Err(ValidationError::InvalidFormat {
                field: "phone",
                reason: "must contain 8 to 15 digits, optionally prefixed with +",
            });
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! serialize_as_str {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(&self.0)
                }
            }

            impl AsRef<str> for $ty {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }
        )*
    };
}

serialize_as_str!(PersonName, EmailAddress, PhoneNumber);

/// Parse an optional contact field, treating blank input as absent.
pub(crate) fn optional<T>(
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, ValidationError>,
) -> Result<Option<T>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse(v).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_trim_and_bound() {
        assert_eq!(PersonName::new(" Lotte ").unwrap().as_str(), "Lotte");
        let long = "a".repeat(101);
        assert!(matches!(
            PersonName::new(&long).unwrap_err(),
            ValidationError::TooLong { max: 100, .. }
        ));
    }

    #[test]
    fn email_is_lowercased() {
        let email = EmailAddress::new("  Els.Janssens@Example.BE ").unwrap();
        assert_eq!(email.as_str(), "els.janssens@example.be");
    }

    #[test]
    fn rejects_malformed_email() {
        for bad in ["els", "els@", "@example.be", "els@example", "els jan@example.be"] {
            assert!(
                matches!(
                    EmailAddress::new(bad).unwrap_err(),
                    ValidationError::InvalidFormat { .. }
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn phone_strips_separators() {
        assert_eq!(PhoneNumber::new("0470 12 34 56").unwrap().as_str(), "0470123456");
        assert_eq!(PhoneNumber::new("0470/12.34.56").unwrap().as_str(), "0470123456");
        assert_eq!(
            PhoneNumber::new("+32 (0)470-12-34-56").unwrap().as_str(),
            "+320470123456"
        );
    }

    #[test]
    fn rejects_short_or_alpha_phone() {
        assert!(PhoneNumber::new("1234").is_err());
        assert!(PhoneNumber::new("0470 AB CD EF").is_err());
        assert!(matches!(
            PhoneNumber::new("  ").unwrap_err(),
            ValidationError::Empty { .. }
        ));
    }

    #[test]
    fn optional_blank_is_none() {
        assert_eq!(optional(Some("  "), EmailAddress::new).unwrap(), None);
        assert!(optional(Some("nope"), EmailAddress::new).is_err());
    }
}
