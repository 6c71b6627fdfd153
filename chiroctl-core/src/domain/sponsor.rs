//! Sponsors and their per-work-year agreements

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::address::{Address, AddressForm, NewAddress};
use super::contact::{optional, EmailAddress, PersonName, PhoneNumber};
use super::kinds::SponsorshipKind;
use super::money::Amount;
use super::validation::{optional_text, required_text, ValidationError};

const MAX_COMPANY_LEN: usize = 200;
const MAX_WEBSITE_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 2000;

static WEBSITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("invalid website regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sponsor {
    pub id: Uuid,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorForm {
    pub company_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<AddressForm>,
}

/// Validated sponsor fields; the address is resolved by the use-case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorProfile {
    pub company_name: String,
    pub contact_name: Option<PersonName>,
    pub email: Option<EmailAddress>,
    pub phone: Option<PhoneNumber>,
    pub website: Option<String>,
    pub address: Option<NewAddress>,
}

/// Row written to the sponsors table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSponsor {
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address_id: Option<Uuid>,
}

impl SponsorForm {
    pub fn validate(&self) -> Result<SponsorProfile, ValidationError> {
        let website = optional_text("website", self.website.as_deref(), MAX_WEBSITE_LEN)?;
        if let Some(url) = &website {
            if !WEBSITE_RE.is_match(url) {
                return Err(ValidationError::InvalidFormat {
                    field: "website",
                    reason: "must be an http(s) URL",
                });
            }
        }
        Ok(SponsorProfile {
            company_name: required_text("company name", &self.company_name, MAX_COMPANY_LEN)?,
            contact_name: optional(self.contact_name.as_deref(), PersonName::new)?,
            email: optional(self.email.as_deref(), EmailAddress::new)?,
            phone: optional(self.phone.as_deref(), PhoneNumber::new)?,
            website,
            address: self.address.as_ref().map(AddressForm::validate).transpose()?,
        })
    }
}

impl SponsorProfile {
    pub fn sponsor(&self, address_id: Option<Uuid>) -> NewSponsor {
        NewSponsor {
            company_name: self.company_name.clone(),
            contact_name: self.contact_name.as_ref().map(|n| n.as_str().to_owned()),
            email: self.email.as_ref().map(|e| e.as_str().to_owned()),
            phone: self.phone.as_ref().map(|p| p.as_str().to_owned()),
            website: self.website.clone(),
            address_id,
        }
    }
}

impl Sponsor {
    pub fn from_new(id: Uuid, new: &NewSponsor) -> Self {
        Self {
            id,
            company_name: new.company_name.clone(),
            contact_name: new.contact_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            website: new.website.clone(),
            address_id: new.address_id,
        }
    }
}

/// Per-work-year arrangement with a sponsor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorshipAgreement {
    pub id: Uuid,
    pub sponsor_id: Uuid,
    pub work_year_id: Uuid,
    pub amount: Amount,
    pub kind: SponsorshipKind,
    pub paid: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementForm {
    pub work_year_id: Uuid,
    pub amount_cents: i64,
    pub kind: SponsorshipKind,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgreement {
    pub sponsor_id: Uuid,
    pub work_year_id: Uuid,
    pub amount: Amount,
    pub kind: SponsorshipKind,
    pub notes: Option<String>,
}

impl AgreementForm {
    pub fn validate(&self, sponsor_id: Uuid) -> Result<NewAgreement, ValidationError> {
        Ok(NewAgreement {
            sponsor_id,
            work_year_id: self.work_year_id,
            amount: Amount::from_cents(self.amount_cents)?,
            kind: self.kind,
            notes: optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?,
        })
    }
}

impl SponsorshipAgreement {
    pub fn from_new(id: Uuid, new: &NewAgreement) -> Self {
        Self {
            id,
            sponsor_id: new.sponsor_id,
            work_year_id: new.work_year_id,
            amount: new.amount,
            kind: new.kind,
            paid: false,
            notes: new.notes.clone(),
        }
    }
}

/// Sponsor with its address and agreements
#[derive(Debug, Clone, Serialize)]
pub struct SponsorView {
    #[serde(flatten)]
    pub sponsor: Sponsor,
    pub address: Option<Address>,
    pub agreements: Vec<SponsorshipAgreement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_must_be_http() {
        let form = SponsorForm {
            company_name: "Bakkerij Claes".into(),
            website: Some("ftp://claes.be".into()),
            ..Default::default()
        };
        assert!(matches!(
            form.validate().unwrap_err(),
            ValidationError::InvalidFormat { field: "website", .. }
        ));

        let form = SponsorForm {
            company_name: "Bakkerij Claes".into(),
            website: Some("https://claes.be".into()),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn agreement_rejects_negative_amount() {
        let form = AgreementForm {
            work_year_id: Uuid::new_v4(),
            amount_cents: -100,
            kind: SponsorshipKind::Financial,
            notes: None,
        };
        assert!(form.validate(Uuid::new_v4()).is_err());
    }
}
