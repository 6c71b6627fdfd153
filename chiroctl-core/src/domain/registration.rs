//! Registration form: member, parents, emergency contact and medical record
//! submitted together

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::address::Address;
use super::care::{
    EmergencyContact, EmergencyContactForm, MedicalForm, MedicalInformation,
    NewEmergencyContact, NewMedicalInformation,
};
use super::membership::Membership;
use super::person::{Member, MemberForm, MemberProfile, ParentForm, ParentProfile, ParentView, Person};
use super::validation::ValidationError;

pub const MAX_PARENTS: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub member: MemberForm,
    pub parents: Vec<ParentForm>,
    pub emergency_contact: EmergencyContactForm,
    pub medical: MedicalForm,
    /// Explicit group; resolved from age and gender when absent
    #[serde(default)]
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub member: MemberProfile,
    pub parents: Vec<ParentProfile>,
    pub emergency_contact: NewEmergencyContact,
    pub medical: NewMedicalInformation,
    pub group_id: Option<Uuid>,
}

impl RegistrationForm {
    pub fn validate(&self, today: NaiveDate) -> Result<Registration, ValidationError> {
        if self.parents.is_empty() {
            return Err(ValidationError::Empty { field: "parents" });
        }
        if self.parents.len() > MAX_PARENTS {
            return Err(ValidationError::OutOfRange {
                field: "parents",
                reason: "at most two parents can be registered",
            });
        }
        let parents = self
            .parents
            .iter()
            .map(ParentForm::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        if !parents.iter().all(|p| seen.insert(p.email.clone())) {
            return Err(ValidationError::InvalidFormat {
                field: "parents",
                reason: "each parent needs a distinct email address",
            });
        }

        Ok(Registration {
            member: self.member.validate(today)?,
            parents,
            emergency_contact: self.emergency_contact.validate()?,
            medical: self.medical.validate()?,
            group_id: self.group_id,
        })
    }
}

/// Result of `register_member`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationOutcome {
    pub member_id: Uuid,
    pub membership_id: Uuid,
    pub work_year_id: Uuid,
    pub group_id: Uuid,
    pub parent_ids: Vec<Uuid>,
    /// False when an existing member with the same name and birth date was updated
    pub member_created: bool,
    /// False when the member was already enrolled in the work-year
    pub membership_created: bool,
}

/// Everything known about one member
#[derive(Debug, Clone, Serialize)]
pub struct MemberDetails {
    #[serde(flatten)]
    pub member: Member,
    pub person: Person,
    pub address: Option<Address>,
    pub parents: Vec<ParentView>,
    pub emergency_contact: Option<EmergencyContact>,
    pub medical: Option<MedicalInformation>,
    pub memberships: Vec<Membership>,
}
