#![allow(dead_code)]

use chiroctl_core::domain::{
    AddressForm, EmergencyContactForm, Gender, Group, GroupForm, MedicalForm, MemberForm,
    ParentForm, ParentRelation, RegistrationForm, WorkYear, WorkYearForm,
};
use chiroctl_core::{usecases, MemoryStore, Store, UnitOfWork};
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A day inside the 2025-2026 work-year
pub fn today() -> NaiveDate {
    date(2025, 10, 1)
}

pub struct Chapter {
    pub store: MemoryStore,
    pub work_year: WorkYear,
    pub groups: Vec<Group>,
}

impl Chapter {
    pub fn group(&self, name: &str) -> &Group {
        self.groups.iter().find(|g| g.name == name).unwrap()
    }
}

pub fn work_year_form(start: i32) -> WorkYearForm {
    WorkYearForm {
        name: format!("{}-{}", start, start + 1),
        start_date: date(start, 9, 1),
        end_date: date(start + 1, 8, 31),
        membership_fee_cents: 4500,
    }
}

fn group_form(name: &str, min_age: i32, max_age: i32, gender: Option<Gender>) -> GroupForm {
    GroupForm {
        name: name.into(),
        min_age,
        max_age,
        gender,
        description: None,
        active: true,
    }
}

/// Store with the 2025-2026 work-year and the usual age groups
pub async fn chapter() -> Chapter {
    let store = MemoryStore::new();
    let mut uow = store.begin().await.unwrap();
    let work_year = usecases::create_work_year(uow.as_mut(), &work_year_form(2025))
        .await
        .unwrap();

    let mut groups = Vec::new();
    for form in [
        group_form("Ribbels", 6, 7, None),
        group_form("Speelclub", 8, 9, None),
        group_form("Rakwi's", 10, 11, None),
        group_form("Kwiks", 10, 11, Some(Gender::Female)),
        group_form("Tito's", 12, 13, None),
        group_form("Keti's", 14, 15, None),
        group_form("Aspi's", 16, 17, None),
    ] {
        groups.push(usecases::create_group(uow.as_mut(), &form).await.unwrap());
    }
    uow.commit().await.unwrap();

    Chapter {
        store,
        work_year,
        groups,
    }
}

pub fn address(street: &str, number: &str) -> AddressForm {
    AddressForm {
        street: street.into(),
        house_number: number.into(),
        bus: None,
        postal_code: "9000".into(),
        municipality: "Gent".into(),
    }
}

pub fn parent(first_name: &str, email: &str) -> ParentForm {
    ParentForm {
        first_name: first_name.into(),
        last_name: "Peeters".into(),
        email: email.into(),
        phone: "0470 12 34 56".into(),
        relation: ParentRelation::Mother,
        address: None,
    }
}

pub fn registration(first_name: &str, gender: Gender, birth_date: NaiveDate) -> RegistrationForm {
    RegistrationForm {
        member: MemberForm {
            first_name: first_name.into(),
            last_name: "Peeters".into(),
            email: None,
            phone: None,
            gender,
            birth_date,
            photo_permission: true,
            address: address("Kerkstraat", "12"),
        },
        parents: vec![parent("An", "an.peeters@example.be")],
        emergency_contact: EmergencyContactForm {
            name: "Mieke Janssens".into(),
            phone: "+32 470 65 43 21".into(),
            relation: "grootmoeder".into(),
        },
        medical: MedicalForm {
            doctor_name: "Dr. Wouters".into(),
            doctor_phone: "09 223 45 67".into(),
            allergies: Some("pollen".into()),
            tetanus_vaccinated: true,
            ..Default::default()
        },
        group_id: None,
    }
}

/// Run one registration in its own committed unit of work.
pub async fn register(
    store: &MemoryStore,
    form: &RegistrationForm,
    today: NaiveDate,
) -> chiroctl_core::Result<chiroctl_core::domain::RegistrationOutcome> {
    let mut uow = store.begin().await?;
    let outcome = usecases::register_member(uow.as_mut(), form, today).await?;
    uow.commit().await?;
    Ok(outcome)
}
