//! Work-years, groups, events and sponsors against the in-memory store

mod common;

use chiroctl_core::domain::{
    AgreementForm, EventFilter, EventForm, Gender, GroupForm, SponsorForm, SponsorshipKind,
    WorkYearForm,
};
use chiroctl_core::repository::AddressRepository;
use chiroctl_core::{usecases, CoreError, Store, UnitOfWork};
use chrono::NaiveDateTime;
use common::{chapter, date, register, registration, today, work_year_form};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

fn event(title: &str, start: NaiveDateTime, group_ids: Vec<uuid::Uuid>) -> EventForm {
    EventForm {
        title: title.into(),
        description: None,
        location: Some("Chirolokaal".into()),
        starts_at: start,
        ends_at: start + chrono::Duration::hours(3),
        group_ids,
    }
}

#[tokio::test]
async fn overlapping_work_years_conflict() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();

    let overlapping = WorkYearForm {
        name: "zomer".into(),
        start_date: date(2026, 7, 1),
        end_date: date(2026, 9, 30),
        membership_fee_cents: 0,
    };
    let err = usecases::create_work_year(uow.as_mut(), &overlapping)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    // a work-year may be edited without conflicting with itself
    let mut edited = work_year_form(2025);
    edited.membership_fee_cents = 5000;
    let updated = usecases::update_work_year(uow.as_mut(), chapter.work_year.id, &edited)
        .await
        .unwrap();
    assert_eq!(updated.membership_fee.cents(), 5000);
}

#[tokio::test]
async fn current_work_year_covers_both_ends() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();

    for day in [date(2025, 9, 1), date(2026, 8, 31)] {
        let current = usecases::current_work_year(uow.as_mut(), day).await.unwrap();
        assert_eq!(current.id, chapter.work_year.id);
    }
    assert!(usecases::work_year_for_date(uow.as_mut(), date(2025, 8, 31))
        .await
        .unwrap()
        .is_none());
    assert!(matches!(
        usecases::current_work_year(uow.as_mut(), date(2026, 9, 1)).await,
        Err(CoreError::NoCurrentWorkYear { .. })
    ));
}

#[tokio::test]
async fn work_years_listed_newest_first() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    usecases::create_work_year(uow.as_mut(), &work_year_form(2024))
        .await
        .unwrap();
    usecases::create_work_year(uow.as_mut(), &work_year_form(2026))
        .await
        .unwrap();

    let names: Vec<String> = usecases::list_work_years(uow.as_mut())
        .await
        .unwrap()
        .into_iter()
        .map(|wy| wy.name)
        .collect();
    assert_eq!(names, ["2026-2027", "2025-2026", "2024-2025"]);
}

#[tokio::test]
async fn work_year_in_use_cannot_be_deleted() {
    let chapter = chapter().await;
    register(
        &chapter.store,
        &registration("Lotte", Gender::Female, date(2015, 3, 14)),
        today(),
    )
    .await
    .unwrap();

    let mut uow = chapter.store.begin().await.unwrap();
    let err = usecases::delete_work_year(uow.as_mut(), chapter.work_year.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InUse { resource: "work-year", .. }));

    let spare = usecases::create_work_year(uow.as_mut(), &work_year_form(2030))
        .await
        .unwrap();
    usecases::delete_work_year(uow.as_mut(), spare.id).await.unwrap();
    usecases::delete_work_year(uow.as_mut(), spare.id).await.unwrap();
    assert!(matches!(
        usecases::get_work_year(uow.as_mut(), spare.id).await,
        Err(CoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn group_names_are_unique() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    let form = GroupForm {
        name: "ribbels".into(),
        min_age: 6,
        max_age: 7,
        gender: None,
        description: None,
        active: true,
    };
    let err = usecases::create_group(uow.as_mut(), &form).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    let renamed = GroupForm {
        name: "Speelclub".into(),
        ..form
    };
    let err = usecases::update_group(uow.as_mut(), chapter.group("Ribbels").id, &renamed)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[tokio::test]
async fn group_names_clash_regardless_of_accent_case() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    let form = GroupForm {
        name: "Ébène".into(),
        min_age: 18,
        max_age: 25,
        gender: None,
        description: None,
        active: true,
    };
    usecases::create_group(uow.as_mut(), &form).await.unwrap();

    let shouted = GroupForm {
        name: "éBÈNE".into(),
        ..form
    };
    let err = usecases::create_group(uow.as_mut(), &shouted).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[tokio::test]
async fn inactive_groups_are_skipped() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    let kwiks = chapter.group("Kwiks");
    let closed = GroupForm {
        name: kwiks.name.clone(),
        min_age: kwiks.min_age,
        max_age: kwiks.max_age,
        gender: kwiks.gender,
        description: Some("dit jaar samen met de Rakwi's".into()),
        active: false,
    };
    usecases::update_group(uow.as_mut(), kwiks.id, &closed)
        .await
        .unwrap();

    let active = usecases::list_groups(uow.as_mut(), true).await.unwrap();
    assert_eq!(active.len(), chapter.groups.len() - 1);
    assert_eq!(active[0].name, "Ribbels");

    let group = usecases::resolve_group(
        uow.as_mut(),
        date(2015, 3, 14),
        Gender::Female,
        &chapter.work_year,
    )
    .await
    .unwrap();
    assert_eq!(group.name, "Rakwi's");
}

#[tokio::test]
async fn group_delete_guards_memberships_and_clears_event_targets() {
    let chapter = chapter().await;
    register(
        &chapter.store,
        &registration("Lotte", Gender::Female, date(2015, 3, 14)),
        today(),
    )
    .await
    .unwrap();

    let mut uow = chapter.store.begin().await.unwrap();
    let err = usecases::delete_group(uow.as_mut(), chapter.group("Kwiks").id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InUse { resource: "group", .. }));

    let aspis = chapter.group("Aspi's").id;
    let weekend = usecases::create_event(
        uow.as_mut(),
        &event("Aspi-weekend", at(2025, 11, 7, 19), vec![aspis]),
    )
    .await
    .unwrap();
    usecases::delete_group(uow.as_mut(), aspis).await.unwrap();

    let weekend = usecases::get_event(uow.as_mut(), weekend.id).await.unwrap();
    assert!(weekend.group_ids.is_empty());
}

#[tokio::test]
async fn events_belong_to_the_work_year_of_their_start() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    let ribbels = chapter.group("Ribbels").id;

    let party = usecases::create_event(
        uow.as_mut(),
        &event("Startdag", at(2025, 9, 21, 14), vec![]),
    )
    .await
    .unwrap();
    assert_eq!(party.work_year_id, chapter.work_year.id);

    let err = usecases::create_event(
        uow.as_mut(),
        &event("Kamp", at(2026, 9, 2, 10), vec![]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::NoWorkYearForDate { .. }));

    let err = usecases::create_event(
        uow.as_mut(),
        &event("Spel", at(2025, 10, 5, 14), vec![uuid::Uuid::new_v4()]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { resource: "group", .. }));

    let outing = usecases::create_event(
        uow.as_mut(),
        &event("Ribbeluitstap", at(2025, 10, 12, 9), vec![ribbels]),
    )
    .await
    .unwrap();
    usecases::create_event(
        uow.as_mut(),
        &event("Aspi-avond", at(2025, 10, 3, 20), vec![chapter.group("Aspi's").id]),
    )
    .await
    .unwrap();

    let for_ribbels = usecases::list_events(
        uow.as_mut(),
        EventFilter {
            group_id: Some(ribbels),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let titles: Vec<&str> = for_ribbels.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Startdag", "Ribbeluitstap"]);

    let october = usecases::list_events(
        uow.as_mut(),
        EventFilter {
            from: Some(date(2025, 10, 1)),
            to: Some(date(2025, 10, 31)),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(october.len(), 2);

    let mut moved = event("Ribbeluitstap", at(2025, 10, 19, 9), vec![ribbels]);
    moved.description = Some("verplaatst wegens regen".into());
    let updated = usecases::update_event(uow.as_mut(), outing.id, &moved)
        .await
        .unwrap();
    assert_eq!(updated.starts_at, at(2025, 10, 19, 9));

    usecases::delete_event(uow.as_mut(), outing.id).await.unwrap();
    assert!(matches!(
        usecases::get_event(uow.as_mut(), outing.id).await,
        Err(CoreError::NotFound { .. })
    ));
}

fn bakery() -> SponsorForm {
    SponsorForm {
        company_name: "Bakkerij Claeys".into(),
        contact_name: Some("Els Claeys".into()),
        email: Some("info@bakkerijclaeys.be".into()),
        website: Some("https://bakkerijclaeys.be".into()),
        address: Some(common::address("Markt", "1")),
        ..Default::default()
    }
}

#[tokio::test]
async fn sponsor_agreements_one_per_work_year() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    let sponsor = usecases::create_sponsor(uow.as_mut(), &bakery()).await.unwrap();

    let err = usecases::create_sponsor(uow.as_mut(), &bakery()).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    let form = AgreementForm {
        work_year_id: chapter.work_year.id,
        amount_cents: 25_000,
        kind: SponsorshipKind::Financial,
        notes: Some("logo op de T-shirts".into()),
    };
    let agreement = usecases::add_agreement(uow.as_mut(), sponsor.id, &form)
        .await
        .unwrap();
    assert!(!agreement.paid);

    let err = usecases::add_agreement(uow.as_mut(), sponsor.id, &form)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    let paid = usecases::mark_agreement_paid(uow.as_mut(), agreement.id)
        .await
        .unwrap();
    assert!(paid.paid);

    let view = usecases::get_sponsor(uow.as_mut(), sponsor.id).await.unwrap();
    assert_eq!(view.agreements.len(), 1);
    assert_eq!(view.address.unwrap().street, "Markt");

    usecases::remove_agreement(uow.as_mut(), agreement.id).await.unwrap();
    let view = usecases::get_sponsor(uow.as_mut(), sponsor.id).await.unwrap();
    assert!(view.agreements.is_empty());
}

#[tokio::test]
async fn deleting_a_sponsor_releases_its_address() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    let sponsor = usecases::create_sponsor(uow.as_mut(), &bakery()).await.unwrap();
    usecases::add_agreement(
        uow.as_mut(),
        sponsor.id,
        &AgreementForm {
            work_year_id: chapter.work_year.id,
            amount_cents: 0,
            kind: SponsorshipKind::InKind,
            notes: Some("pistolets voor het ontbijt".into()),
        },
    )
    .await
    .unwrap();

    let work_year = chapter.work_year.id;
    assert!(matches!(
        usecases::delete_work_year(uow.as_mut(), work_year).await,
        Err(CoreError::InUse { .. })
    ));

    usecases::delete_sponsor(uow.as_mut(), sponsor.id).await.unwrap();
    let markt = common::address("Markt", "1").validate().unwrap();
    assert!(uow.find_address(&markt).await.unwrap().is_none());
    assert!(usecases::list_sponsors(uow.as_mut()).await.unwrap().is_empty());
}

#[tokio::test]
async fn sponsor_moves_to_new_address() {
    let chapter = chapter().await;
    let mut uow = chapter.store.begin().await.unwrap();
    let sponsor = usecases::create_sponsor(uow.as_mut(), &bakery()).await.unwrap();

    let moved = SponsorForm {
        address: Some(common::address("Markt", "2")),
        ..bakery()
    };
    let updated = usecases::update_sponsor(uow.as_mut(), sponsor.id, &moved)
        .await
        .unwrap();
    assert_ne!(updated.address_id, sponsor.address_id);

    let old = common::address("Markt", "1").validate().unwrap();
    assert!(uow.find_address(&old).await.unwrap().is_none());
}
