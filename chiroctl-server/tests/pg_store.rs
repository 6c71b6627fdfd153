//! PostgreSQL store tests
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p chiroctl-server -- --ignored
//!
//! Most tests work inside one unit of work that is never committed. The
//! concurrency tests commit and delete their rows again at the end.

use chrono::NaiveDate;

use chiroctl_core::domain::{
    AddressForm, EmergencyContactForm, EventForm, Gender, GroupForm, MedicalForm, MemberFilter,
    MemberForm, ParentForm, ParentRelation, PaymentForm, PaymentMethod, RegistrationForm,
    WorkYearForm,
};
use chiroctl_core::repository::GroupRepository;
use chiroctl_core::{usecases, CoreError, Pagination, Store};
use chiroctl_server::db::{create_pool, migrations, PgStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = create_pool(&url).await.expect("pool creation failed");
    migrations::run(&pool).await.expect("migrations failed");
    PgStore::new(pool)
}

fn registration(first_name: &str, email: &str) -> RegistrationForm {
    RegistrationForm {
        member: MemberForm {
            first_name: first_name.into(),
            last_name: "Testlid".into(),
            email: None,
            phone: None,
            gender: Gender::Male,
            birth_date: date(2990, 3, 14),
            photo_permission: false,
            address: AddressForm {
                street: "Teststraat".into(),
                house_number: "1".into(),
                bus: Some("B".into()),
                postal_code: "9999".into(),
                municipality: "Testgem".into(),
            },
        },
        parents: vec![ParentForm {
            first_name: "Ouder".into(),
            last_name: "Testlid".into(),
            email: email.into(),
            phone: "0470 00 00 00".into(),
            relation: ParentRelation::Father,
            address: None,
        }],
        emergency_contact: EmergencyContactForm {
            name: "Nood Contact".into(),
            phone: "0470 00 00 01".into(),
            relation: "tante".into(),
        },
        medical: MedicalForm {
            doctor_name: "Dr. Test".into(),
            doctor_phone: "09 000 00 00".into(),
            ..Default::default()
        },
        group_id: None,
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn registration_round_trip() {
    let store = store().await;
    let mut uow = store.begin().await.unwrap();
    let today = date(2999, 10, 1);
    let email = format!("{}@example.test", uuid::Uuid::new_v4());

    let work_year = usecases::create_work_year(
        uow.as_mut(),
        &WorkYearForm {
            name: "2999-3000".into(),
            start_date: date(2999, 9, 1),
            end_date: date(3000, 8, 31),
            membership_fee_cents: 5000,
        },
    )
    .await
    .unwrap();
    let group = usecases::create_group(
        uow.as_mut(),
        &GroupForm {
            name: format!("Testgroep {}", uuid::Uuid::new_v4()),
            min_age: 9,
            max_age: 9,
            gender: None,
            description: None,
            active: true,
        },
    )
    .await
    .unwrap();

    let first = usecases::register_member(uow.as_mut(), &registration("Piet", &email), today)
        .await
        .unwrap();
    assert!(first.member_created);
    assert_eq!(first.group_id, group.id);
    assert_eq!(first.work_year_id, work_year.id);

    let again = usecases::register_member(uow.as_mut(), &registration("piet", &email), today)
        .await
        .unwrap();
    assert!(!again.member_created);
    assert!(!again.membership_created);
    assert_eq!(again.member_id, first.member_id);
    assert_eq!(again.parent_ids, first.parent_ids);

    let paid = usecases::record_payment(
        uow.as_mut(),
        first.membership_id,
        &PaymentForm {
            method: PaymentMethod::Cash,
            paid_on: None,
        },
        today,
    )
    .await
    .unwrap();
    assert_eq!(paid.paid_on, Some(today));

    let page = usecases::list_members(
        uow.as_mut(),
        MemberFilter {
            work_year_id: Some(work_year.id),
            group_id: Some(group.id),
        },
        Pagination::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].paid, Some(true));

    let details = usecases::member_details(uow.as_mut(), first.member_id)
        .await
        .unwrap();
    assert_eq!(details.parents.len(), 1);
    assert!(details.emergency_contact.is_some());
    assert_eq!(details.memberships.len(), 1);

    usecases::delete_member(uow.as_mut(), first.member_id)
        .await
        .unwrap();
    assert!(matches!(
        usecases::member_details(uow.as_mut(), first.member_id).await,
        Err(CoreError::NotFound { .. })
    ));
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_group_name_keeps_transaction_usable() {
    let store = store().await;
    let mut uow = store.begin().await.unwrap();
    let form = GroupForm {
        name: format!("Dubbel {}", uuid::Uuid::new_v4()),
        min_age: 6,
        max_age: 7,
        gender: None,
        description: None,
        active: true,
    };

    usecases::create_group(uow.as_mut(), &form).await.unwrap();
    let err = usecases::create_group(uow.as_mut(), &form).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    // Still usable after the rejected insert
    let groups = usecases::list_groups(uow.as_mut(), true).await.unwrap();
    assert!(groups.iter().any(|g| g.name == form.name));
}

#[tokio::test]
#[ignore = "requires database"]
async fn event_targets_are_stored() {
    let store = store().await;
    let mut uow = store.begin().await.unwrap();

    usecases::create_work_year(
        uow.as_mut(),
        &WorkYearForm {
            name: "2999-3000".into(),
            start_date: date(2999, 9, 1),
            end_date: date(3000, 8, 31),
            membership_fee_cents: 0,
        },
    )
    .await
    .unwrap();
    let group = usecases::create_group(
        uow.as_mut(),
        &GroupForm {
            name: format!("Doelgroep {}", uuid::Uuid::new_v4()),
            min_age: 12,
            max_age: 13,
            gender: None,
            description: None,
            active: true,
        },
    )
    .await
    .unwrap();

    let start = date(2999, 11, 11).and_hms_opt(10, 0, 0).unwrap();
    let event = usecases::create_event(
        uow.as_mut(),
        &EventForm {
            title: "Weekend".into(),
            description: None,
            location: Some("Heem".into()),
            starts_at: start,
            ends_at: date(2999, 11, 13).and_hms_opt(16, 0, 0).unwrap(),
            group_ids: vec![group.id],
        },
    )
    .await
    .unwrap();

    let stored = usecases::get_event(uow.as_mut(), event.id).await.unwrap();
    assert_eq!(stored.group_ids, vec![group.id]);
    assert_eq!(stored.starts_at, start);

    usecases::delete_group(uow.as_mut(), group.id).await.unwrap();
    let stored = usecases::get_event(uow.as_mut(), event.id).await.unwrap();
    assert!(stored.group_ids.is_empty());
}

#[tokio::test]
#[ignore = "requires database"]
async fn group_names_are_unique_ignoring_case() {
    let store = store().await;
    let mut uow = store.begin().await.unwrap();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let form = GroupForm {
        name: format!("Ébène {suffix}"),
        min_age: 18,
        max_age: 25,
        gender: None,
        description: None,
        active: true,
    };
    usecases::create_group(uow.as_mut(), &form).await.unwrap();

    // Straight to the repository, past the use-case check
    let shouted = GroupForm {
        name: form.name.to_uppercase(),
        ..form
    };
    let err = uow
        .insert_group(&shouted.validate().unwrap())
        .await
        .unwrap_err();
    assert!(err.is_unique_violation());
}

fn far_work_year(start: i32) -> WorkYearForm {
    WorkYearForm {
        name: format!("{start}-{}", start + 1),
        start_date: date(start, 9, 1),
        end_date: date(start + 1, 8, 31),
        membership_fee_cents: 0,
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn concurrent_overlapping_work_years_conflict() {
    let store = store().await;
    let mut first = store.begin().await.unwrap();
    let created = usecases::create_work_year(first.as_mut(), &far_work_year(3100))
        .await
        .unwrap();

    // Misses the uncommitted row, then waits on the exclusion constraint
    let other = store.clone();
    let second = tokio::spawn(async move {
        let mut uow = other.begin().await.unwrap();
        usecases::create_work_year(uow.as_mut(), &far_work_year(3100)).await
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    first.commit().await.unwrap();

    let err = second.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));

    let mut cleanup = store.begin().await.unwrap();
    usecases::delete_work_year(cleanup.as_mut(), created.id)
        .await
        .unwrap();
    cleanup.commit().await.unwrap();
}

#[tokio::test]
#[ignore = "requires database"]
async fn concurrent_registrations_share_one_member() {
    let store = store().await;
    let today = date(3200, 10, 1);
    let email = format!("{}@example.test", uuid::Uuid::new_v4());

    let mut setup = store.begin().await.unwrap();
    let work_year = usecases::create_work_year(setup.as_mut(), &far_work_year(3200))
        .await
        .unwrap();
    let group = usecases::create_group(
        setup.as_mut(),
        &GroupForm {
            name: format!("Gelijktijdig {}", uuid::Uuid::new_v4()),
            min_age: 10,
            max_age: 10,
            gender: None,
            description: None,
            active: true,
        },
    )
    .await
    .unwrap();
    setup.commit().await.unwrap();

    let mut form = registration("Gelijk", &email);
    form.member.birth_date = date(3190, 3, 14);
    form.group_id = Some(group.id);

    let mut first = store.begin().await.unwrap();
    let created = usecases::register_member(first.as_mut(), &form, today)
        .await
        .unwrap();
    assert!(created.member_created);

    let other = store.clone();
    let second_form = form.clone();
    let second = tokio::spawn(async move {
        let mut uow = other.begin().await.unwrap();
        let outcome = usecases::register_member(uow.as_mut(), &second_form, today).await;
        uow.commit().await.unwrap();
        outcome
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    first.commit().await.unwrap();

    let again = second.await.unwrap().unwrap();
    assert!(!again.member_created);
    assert_eq!(again.member_id, created.member_id);

    let mut cleanup = store.begin().await.unwrap();
    usecases::delete_member(cleanup.as_mut(), created.member_id)
        .await
        .unwrap();
    usecases::delete_group(cleanup.as_mut(), group.id).await.unwrap();
    usecases::delete_work_year(cleanup.as_mut(), work_year.id)
        .await
        .unwrap();
    cleanup.commit().await.unwrap();
}
