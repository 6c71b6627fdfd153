//! Yearly enrollment of a member in a group

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kinds::{Gender, PaymentMethod};

/// One row per (member, work-year)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub id: Uuid,
    pub member_id: Uuid,
    pub work_year_id: Uuid,
    pub group_id: Uuid,
    pub paid: bool,
    pub paid_on: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    pub member_id: Uuid,
    pub work_year_id: Uuid,
    pub group_id: Uuid,
}

/// Payment state written by `record_payment` / `clear_payment`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentState {
    pub paid: bool,
    pub paid_on: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentForm {
    pub method: PaymentMethod,
    /// Defaults to today
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
}

impl Membership {
    pub fn payment(&self) -> PaymentState {
        PaymentState {
            paid: self.paid,
            paid_on: self.paid_on,
            payment_method: self.payment_method,
        }
    }
}

/// Row of a member listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub member_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub membership_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub group_name: Option<String>,
    pub paid: Option<bool>,
}

/// Filters for member listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MemberFilter {
    /// Only members enrolled in this work-year
    pub work_year_id: Option<Uuid>,
    /// Only members enrolled in this group (in any matching work-year)
    pub group_id: Option<Uuid>,
}
