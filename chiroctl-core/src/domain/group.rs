//! Age/gender cohorts and group resolution

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kinds::Gender;
use super::validation::{optional_text, required_text, ValidationError};

const MAX_GROUP_NAME_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_AGE: i32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub min_age: i32,
    pub max_age: i32,
    /// `None` for mixed groups
    pub gender: Option<Gender>,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupForm {
    pub name: String,
    pub min_age: i32,
    pub max_age: i32,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub min_age: i32,
    pub max_age: i32,
    pub gender: Option<Gender>,
    pub description: Option<String>,
    pub active: bool,
}

impl GroupForm {
    pub fn validate(&self) -> Result<NewGroup, ValidationError> {
        if self.min_age < 0 || self.max_age > MAX_AGE {
            return Err(ValidationError::OutOfRange {
                field: "age",
                reason: "ages must lie between 0 and 99",
            });
        }
        if self.min_age > self.max_age {
            return Err(ValidationError::OutOfRange {
                field: "max age",
                reason: "must not be below the minimum age",
            });
        }
        Ok(NewGroup {
            name: required_text("name", &self.name, MAX_GROUP_NAME_LEN)?,
            min_age: self.min_age,
            max_age: self.max_age,
            gender: self.gender,
            description: optional_text(
                "description",
                self.description.as_deref(),
                MAX_DESCRIPTION_LEN,
            )?,
            active: self.active,
        })
    }
}

impl Group {
    pub fn from_new(id: Uuid, new: &NewGroup) -> Self {
        Self {
            id,
            name: new.name.clone(),
            min_age: new.min_age,
            max_age: new.max_age,
            gender: new.gender,
            description: new.description.clone(),
            active: new.active,
        }
    }

    /// Whether a member of this age and gender may join.
    pub fn accepts(&self, age: i32, gender: Gender) -> bool {
        self.active
            && self.min_age <= age
            && age <= self.max_age
            && self.gender.map_or(true, |g| g == gender)
    }

    fn span(&self) -> i32 {
        self.max_age - self.min_age
    }
}

/// Pick the group a member belongs in.
///
/// Gender-specific groups win over mixed ones, then the narrowest age range,
/// then the name, so the outcome does not depend on input order.
pub fn resolve_group(groups: &[Group], age: i32, gender: Gender) -> Option<&Group> {
    groups
        .iter()
        .filter(|g| g.accepts(age, gender))
        .min_by(|a, b| {
            a.gender
                .is_none()
                .cmp(&b.gender.is_none())
                .then(a.span().cmp(&b.span()))
                .then_with(|| a.name.cmp(&b.name))
        })
}
