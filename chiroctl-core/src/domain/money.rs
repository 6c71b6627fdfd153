//! Euro amounts in cents

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

/// Non-negative amount of euro cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "amount",
                reason: "must not be negative",
            });
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = ValidationError;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        Self::from_cents(cents)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "€{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative() {
        assert!(Amount::from_cents(-1).is_err());
        assert!(serde_json::from_str::<Amount>("-5").is_err());
    }

    #[test]
    fn displays_euros() {
        assert_eq!(Amount::from_cents(4550).unwrap().to_string(), "€45.50");
        assert_eq!(Amount::ZERO.to_string(), "€0.00");
    }
}
