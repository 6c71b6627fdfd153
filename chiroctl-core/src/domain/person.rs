//! Persons, members and parents
//!
//! A `Person` row carries the contact details shared by members and parents.
//! Members are identified by name + birth date, parents by e-mail address.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::address::{Address, AddressForm, NewAddress};
use super::contact::{optional, EmailAddress, PersonName, PhoneNumber};
use super::kinds::{Gender, ParentRelation};
use super::validation::ValidationError;

/// Stored person
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_id: Option<Uuid>,
}

/// Validated person fields, address resolved by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Option<EmailAddress>,
    pub phone: Option<PhoneNumber>,
    pub address_id: Option<Uuid>,
}

impl Person {
    pub fn from_new(id: Uuid, new: &NewPerson) -> Self {
        Self {
            id,
            first_name: new.first_name.as_str().to_owned(),
            last_name: new.last_name.as_str().to_owned(),
            email: new.email.as_ref().map(|e| e.as_str().to_owned()),
            phone: new.phone.as_ref().map(|p| p.as_str().to_owned()),
            address_id: new.address_id,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Stored member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: Uuid,
    pub person_id: Uuid,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub photo_permission: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub person_id: Uuid,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub photo_permission: bool,
}

/// Member fields as submitted by a registration or edit form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub photo_permission: bool,
    pub address: AddressForm,
}

/// Validated member fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Option<EmailAddress>,
    pub phone: Option<PhoneNumber>,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub photo_permission: bool,
    pub address: NewAddress,
}

impl MemberForm {
    /// Validate the form; the birth date may not lie after `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<MemberProfile, ValidationError> {
        if self.birth_date > today {
            return Err(ValidationError::OutOfRange {
                field: "birth date",
                reason: "must not be in the future",
            });
        }
        Ok(MemberProfile {
            first_name: PersonName::new(&self.first_name)?,
            last_name: PersonName::new(&self.last_name)?,
            email: optional(self.email.as_deref(), EmailAddress::new)?,
            phone: optional(self.phone.as_deref(), PhoneNumber::new)?,
            gender: self.gender,
            birth_date: self.birth_date,
            photo_permission: self.photo_permission,
            address: self.address.validate()?,
        })
    }
}

impl MemberProfile {
    pub fn person(&self, address_id: Option<Uuid>) -> NewPerson {
        NewPerson {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address_id,
        }
    }

    pub fn member(&self, person_id: Uuid) -> NewMember {
        NewMember {
            person_id,
            gender: self.gender,
            birth_date: self.birth_date,
            photo_permission: self.photo_permission,
        }
    }
}

/// Stored parent; `email` is the natural key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parent {
    pub id: Uuid,
    pub person_id: Uuid,
    pub email: String,
    pub relation: ParentRelation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub relation: ParentRelation,
    /// Absent when the parent lives at the member's address
    #[serde(default)]
    pub address: Option<AddressForm>,
}

/// Validated parent fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentProfile {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub relation: ParentRelation,
    pub address: Option<NewAddress>,
}

impl ParentForm {
    pub fn validate(&self) -> Result<ParentProfile, ValidationError> {
        Ok(ParentProfile {
            first_name: PersonName::new(&self.first_name)?,
            last_name: PersonName::new(&self.last_name)?,
            email: EmailAddress::new(&self.email)?,
            phone: PhoneNumber::new(&self.phone)?,
            relation: self.relation,
            address: self.address.as_ref().map(AddressForm::validate).transpose()?,
        })
    }
}

impl ParentProfile {
    pub fn person(&self, address_id: Option<Uuid>) -> NewPerson {
        NewPerson {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: Some(self.email.clone()),
            phone: Some(self.phone.clone()),
            address_id,
        }
    }
}

/// Parent with the person and address rows it points at
#[derive(Debug, Clone, Serialize)]
pub struct ParentView {
    #[serde(flatten)]
    pub parent: Parent,
    pub person: Person,
    pub address: Option<Address>,
}
