//! Postal addresses
//!
//! Addresses are shared rows: a member, their parents and a sponsor may all
//! point at the same record. Input is whitespace-normalized so two forms for
//! the same house resolve to the same [`NewAddress`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{optional_text, required_text, same_text, ValidationError};

const MAX_STREET_LEN: usize = 200;
const MAX_HOUSE_NUMBER_LEN: usize = 10;
const MAX_BUS_LEN: usize = 10;
const MAX_MUNICIPALITY_LEN: usize = 100;

static POSTAL_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]{3}$").expect("invalid postal code regex"));

static HOUSE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9][0-9A-Za-z/-]*$").expect("invalid house number regex"));

/// Belgian postal code (1000-9999)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let code = s.trim();
        if code.is_empty() {
            return Err(ValidationError::Empty {
                field: "postal code",
            });
        }
        if !POSTAL_CODE_RE.is_match(code) {
            return Err(ValidationError::InvalidFormat {
                field: "postal code",
                reason: "must be four digits between 1000 and 9999",
            });
        }
        Ok(Self(code.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// House number, e.g. `12`, `12A` or `12/3`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HouseNumber(String);

impl HouseNumber {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let number: String = s.split_whitespace().collect();
        if number.is_empty() {
            return Err(ValidationError::Empty {
                field: "house number",
            });
        }
        if number.len() > MAX_HOUSE_NUMBER_LEN {
            return Err(ValidationError::TooLong {
                field: "house number",
                max: MAX_HOUSE_NUMBER_LEN,
            });
        }
        if !HOUSE_NUMBER_RE.is_match(&number) {
            return Err(ValidationError::InvalidFormat {
                field: "house number",
                reason: "must start with a digit",
            });
        }
        Ok(Self(number.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Address as submitted by a form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressForm {
    pub street: String,
    pub house_number: String,
    #[serde(default)]
    pub bus: Option<String>,
    pub postal_code: String,
    pub municipality: String,
}

impl AddressForm {
    pub fn validate(&self) -> Result<NewAddress, ValidationError> {
        Ok(NewAddress {
            street: required_text("street", &self.street, MAX_STREET_LEN)?,
            house_number: HouseNumber::new(&self.house_number)?.0,
            bus: optional_text("bus", self.bus.as_deref(), MAX_BUS_LEN)?
                .map(|b| b.to_uppercase()),
            postal_code: PostalCode::new(&self.postal_code)?.0,
            municipality: required_text("municipality", &self.municipality, MAX_MUNICIPALITY_LEN)?,
        })
    }
}

/// Validated, normalized address; the natural key of an [`Address`] row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewAddress {
    pub street: String,
    pub house_number: String,
    pub bus: Option<String>,
    pub postal_code: String,
    pub municipality: String,
}

impl NewAddress {
    /// Case-insensitive equality on the natural key.
    pub fn same_place(&self, other: &Address) -> bool {
        same_text(&self.street, &other.street)
            && same_text(&self.house_number, &other.house_number)
            && same_text(
                self.bus.as_deref().unwrap_or_default(),
                other.bus.as_deref().unwrap_or_default(),
            )
            && self.postal_code == other.postal_code
            && same_text(&self.municipality, &other.municipality)
    }
}

/// Stored address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: Uuid,
    pub street: String,
    pub house_number: String,
    pub bus: Option<String>,
    pub postal_code: String,
    pub municipality: String,
}

impl Address {
    pub fn from_new(id: Uuid, new: &NewAddress) -> Self {
        Self {
            id,
            street: new.street.clone(),
            house_number: new.house_number.clone(),
            bus: new.bus.clone(),
            postal_code: new.postal_code.clone(),
            municipality: new.municipality.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            street: " Kerkstraat ".into(),
            house_number: "12 a".into(),
            bus: Some(" ".into()),
            postal_code: "9000".into(),
            municipality: "Gent".into(),
        }
    }

    #[test]
    fn normalizes_form() {
        let address = form().validate().unwrap();
        assert_eq!(address.street, "Kerkstraat");
        assert_eq!(address.house_number, "12A");
        assert_eq!(address.bus, None);
        assert_eq!(address.postal_code, "9000");
    }

    #[test]
    fn postal_code_rules() {
        assert!(PostalCode::new("1000").is_ok());
        assert!(PostalCode::new("0999").is_err());
        assert!(PostalCode::new("90000").is_err());
        assert!(PostalCode::new("9ooo").is_err());
    }

    #[test]
    fn house_number_must_start_with_digit() {
        assert!(HouseNumber::new("12/3").is_ok());
        assert!(matches!(
            HouseNumber::new("A12").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn same_place_ignores_case() {
        let new = form().validate().unwrap();
        let mut stored = Address::from_new(Uuid::new_v4(), &new);
        stored.street = "KERKSTRAAT".into();
        assert!(new.same_place(&stored));
        stored.bus = Some("1".into());
        assert!(!new.same_place(&stored));
    }
}
