//! Work-years: the chapter's yearly membership cycle

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::Amount;
use super::validation::{required_text, ValidationError};

const MAX_WORK_YEAR_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkYear {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub membership_fee: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkYearForm {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub membership_fee_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkYear {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub membership_fee: Amount,
}

impl WorkYearForm {
    pub fn validate(&self) -> Result<NewWorkYear, ValidationError> {
        if self.start_date >= self.end_date {
            return Err(ValidationError::OutOfRange {
                field: "end date",
                reason: "must be after the start date",
            });
        }
        Ok(NewWorkYear {
            name: required_text("name", &self.name, MAX_WORK_YEAR_NAME_LEN)?,
            start_date: self.start_date,
            end_date: self.end_date,
            membership_fee: Amount::from_cents(self.membership_fee_cents)?,
        })
    }
}

impl WorkYear {
    pub fn from_new(id: Uuid, new: &NewWorkYear) -> Self {
        Self {
            id,
            name: new.name.clone(),
            start_date: new.start_date,
            end_date: new.end_date,
            membership_fee: new.membership_fee,
        }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// Age a member counts as during this work-year.
    ///
    /// Groups are cohorts by birth year, so only the years are compared.
    pub fn age_of(&self, birth_date: NaiveDate) -> i32 {
        self.start_date.year() - birth_date.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn work_year() -> WorkYear {
        WorkYear {
            id: Uuid::new_v4(),
            name: "2025-2026".into(),
            start_date: date(2025, 9, 1),
            end_date: date(2026, 8, 31),
            membership_fee: Amount::from_cents(4500).unwrap(),
        }
    }

    #[test]
    fn contains_is_inclusive() {
        let wy = work_year();
        assert!(wy.contains(date(2025, 9, 1)));
        assert!(wy.contains(date(2026, 8, 31)));
        assert!(!wy.contains(date(2025, 8, 31)));
        assert!(!wy.contains(date(2026, 9, 1)));
    }

    #[test]
    fn overlap_detection() {
        let wy = work_year();
        assert!(wy.overlaps(date(2026, 8, 31), date(2027, 8, 31)));
        assert!(!wy.overlaps(date(2026, 9, 1), date(2027, 8, 31)));
        assert!(wy.overlaps(date(2024, 1, 1), date(2030, 1, 1)));
    }

    #[test]
    fn age_uses_birth_year() {
        let wy = work_year();
        assert_eq!(wy.age_of(date(2015, 12, 31)), 10);
        assert_eq!(wy.age_of(date(2015, 1, 1)), 10);
    }

    #[test]
    fn rejects_inverted_range() {
        let form = WorkYearForm {
            name: "bad".into(),
            start_date: date(2026, 9, 1),
            end_date: date(2026, 9, 1),
            membership_fee_cents: 0,
        };
        assert!(matches!(
            form.validate().unwrap_err(),
            ValidationError::OutOfRange { .. }
        ));
    }
}
