//! Emergency contacts and medical information, one of each per member

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contact::{PersonName, PhoneNumber};
use super::validation::{optional_text, required_text, ValidationError};

const MAX_RELATION_LEN: usize = 50;
const MAX_NOTE_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergencyContact {
    pub id: Uuid,
    pub member_id: Uuid,
    pub name: String,
    pub phone: String,
    pub relation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContactForm {
    pub name: String,
    pub phone: String,
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmergencyContact {
    pub name: PersonName,
    pub phone: PhoneNumber,
    pub relation: String,
}

impl EmergencyContactForm {
    pub fn validate(&self) -> Result<NewEmergencyContact, ValidationError> {
        Ok(NewEmergencyContact {
            name: PersonName::new(&self.name)?,
            phone: PhoneNumber::new(&self.phone)?,
            relation: required_text("relation", &self.relation, MAX_RELATION_LEN)?,
        })
    }
}

impl EmergencyContact {
    pub fn from_new(id: Uuid, member_id: Uuid, new: &NewEmergencyContact) -> Self {
        Self {
            id,
            member_id,
            name: new.name.as_str().to_owned(),
            phone: new.phone.as_str().to_owned(),
            relation: new.relation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicalInformation {
    pub id: Uuid,
    pub member_id: Uuid,
    pub doctor_name: String,
    pub doctor_phone: String,
    pub allergies: Option<String>,
    pub medication: Option<String>,
    pub diet: Option<String>,
    pub conditions: Option<String>,
    pub tetanus_vaccinated: bool,
    pub paracetamol_allowed: bool,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalForm {
    pub doctor_name: String,
    pub doctor_phone: String,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medication: Option<String>,
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub tetanus_vaccinated: bool,
    #[serde(default)]
    pub paracetamol_allowed: bool,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedicalInformation {
    pub doctor_name: PersonName,
    pub doctor_phone: PhoneNumber,
    pub allergies: Option<String>,
    pub medication: Option<String>,
    pub diet: Option<String>,
    pub conditions: Option<String>,
    pub tetanus_vaccinated: bool,
    pub paracetamol_allowed: bool,
    pub remarks: Option<String>,
}

impl MedicalForm {
    pub fn validate(&self) -> Result<NewMedicalInformation, ValidationError> {
        Ok(NewMedicalInformation {
            doctor_name: PersonName::new(&self.doctor_name)?,
            doctor_phone: PhoneNumber::new(&self.doctor_phone)?,
            allergies: optional_text("allergies", self.allergies.as_deref(), MAX_NOTE_LEN)?,
            medication: optional_text("medication", self.medication.as_deref(), MAX_NOTE_LEN)?,
            diet: optional_text("diet", self.diet.as_deref(), MAX_NOTE_LEN)?,
            conditions: optional_text("conditions", self.conditions.as_deref(), MAX_NOTE_LEN)?,
            tetanus_vaccinated: self.tetanus_vaccinated,
            paracetamol_allowed: self.paracetamol_allowed,
            remarks: optional_text("remarks", self.remarks.as_deref(), MAX_NOTE_LEN)?,
        })
    }
}

impl MedicalInformation {
    pub fn from_new(id: Uuid, member_id: Uuid, new: &NewMedicalInformation) -> Self {
        Self {
            id,
            member_id,
            doctor_name: new.doctor_name.as_str().to_owned(),
            doctor_phone: new.doctor_phone.as_str().to_owned(),
            allergies: new.allergies.clone(),
            medication: new.medication.clone(),
            diet: new.diet.clone(),
            conditions: new.conditions.clone(),
            tetanus_vaccinated: new.tetanus_vaccinated,
            paracetamol_allowed: new.paracetamol_allowed,
            remarks: new.remarks.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_notes_become_none() {
        let form = MedicalForm {
            doctor_name: "Dr. Wouters".into(),
            doctor_phone: "09 223 45 67".into(),
            allergies: Some("  ".into()),
            medication: Some("Rilatine".into()),
            ..Default::default()
        };
        let medical = form.validate().unwrap();
        assert_eq!(medical.allergies, None);
        assert_eq!(medical.medication.as_deref(), Some("Rilatine"));
        assert_eq!(medical.doctor_phone.as_str(), "092234567");
    }

    #[test]
    fn emergency_contact_needs_relation() {
        let form = EmergencyContactForm {
            name: "Oma Mieke".into(),
            phone: "0470123456".into(),
            relation: " ".into(),
        };
        assert!(matches!(
            form.validate().unwrap_err(),
            ValidationError::Empty { field: "relation" }
        ));
    }
}
