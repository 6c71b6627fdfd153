//! Closed vocabularies stored as lower-case text

use serde::{Deserialize, Serialize};

use super::validation::ValidationError;

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ValidationError::InvalidVariant {
                        field: $field,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Registered gender; `X` for members who do not identify as either
    Gender, "gender" {
        Male => "male",
        Female => "female",
        X => "x",
    }
);

text_enum!(
    ParentRelation, "relation" {
        Mother => "mother",
        Father => "father",
        Guardian => "guardian",
        Other => "other",
    }
);

text_enum!(
    PaymentMethod, "payment method" {
        Cash => "cash",
        Transfer => "transfer",
        Online => "online",
    }
);

text_enum!(
    /// Money or goods/services
    SponsorshipKind, "sponsorship kind" {
        Financial => "financial",
        InKind => "inkind",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_text() {
        for gender in Gender::ALL {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), *gender);
        }
        assert_eq!(" Mother ".parse::<ParentRelation>().unwrap(), ParentRelation::Mother);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let err = "uncle".parse::<ParentRelation>().unwrap_err();
        assert_eq!(err.to_string(), "invalid relation value: 'uncle'");
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&SponsorshipKind::InKind).unwrap(), "\"inkind\"");
        let method: PaymentMethod = serde_json::from_str("\"transfer\"").unwrap();
        assert_eq!(method, PaymentMethod::Transfer);
    }
}
