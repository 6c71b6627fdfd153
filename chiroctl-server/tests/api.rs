//! Router tests over the in-memory store

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use chiroctl_core::MemoryStore;
use chiroctl_server::{build_router, AppState};

fn app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), chrono_tz::UTC);
    build_router(state, false)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Work-year around today plus one catch-all group; returns (work_year_id, group_id)
async fn seed(app: &Router) -> (String, String) {
    let (status, work_year) = send(
        app,
        "POST",
        "/work-years",
        Some(json!({
            "name": "current",
            "start_date": today() - Duration::days(100),
            "end_date": today() + Duration::days(200),
            "membership_fee_cents": 4500
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{work_year}");

    let (status, group) = send(
        app,
        "POST",
        "/groups",
        Some(json!({ "name": "Iedereen", "min_age": 0, "max_age": 99 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{group}");

    (
        work_year["id"].as_str().unwrap().to_string(),
        group["id"].as_str().unwrap().to_string(),
    )
}

fn registration(first_name: &str, email: &str) -> Value {
    json!({
        "member": {
            "first_name": first_name,
            "last_name": "Claes",
            "gender": "female",
            "birth_date": today() - Duration::days(9 * 365),
            "photo_permission": true,
            "address": {
                "street": "Dorpsstraat",
                "house_number": "3",
                "postal_code": "2000",
                "municipality": "Antwerpen"
            }
        },
        "parents": [{
            "first_name": "Els",
            "last_name": "Claes",
            "email": email,
            "phone": "0470 11 22 33",
            "relation": "mother"
        }],
        "emergency_contact": {
            "name": "Jan Claes",
            "phone": "0470 99 88 77",
            "relation": "grootvader"
        },
        "medical": {
            "doctor_name": "Dr. Maes",
            "doctor_phone": "03 123 45 67",
            "tetanus_vaccinated": true
        }
    })
}

#[tokio::test]
async fn health_endpoint() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn current_work_year_requires_one() {
    let app = app();
    let (status, body) = send(&app, "GET", "/work-years/current", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no_current_work_year");

    let (work_year_id, _) = seed(&app).await;
    let (status, body) = send(&app, "GET", "/work-years/current", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], work_year_id);
    assert_eq!(body["membership_fee"], 4500);
}

#[tokio::test]
async fn overlapping_work_year_is_conflict() {
    let app = app();
    seed(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/work-years",
        Some(json!({
            "name": "overlap",
            "start_date": today(),
            "end_date": today() + Duration::days(400)
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn registration_is_idempotent() {
    let app = app();
    let (work_year_id, group_id) = seed(&app).await;

    let (status, first) = send(
        &app,
        "POST",
        "/registrations",
        Some(registration("Lotte", "els.claes@example.be")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["work_year_id"], work_year_id);
    assert_eq!(first["group_id"], group_id);
    assert_eq!(first["membership_created"], true);

    let (status, second) = send(
        &app,
        "POST",
        "/registrations",
        Some(registration("Lotte", "els.claes@example.be")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["member_id"], first["member_id"]);
    assert_eq!(second["membership_id"], first["membership_id"]);
    assert_eq!(second["membership_created"], false);

    let (status, page) = send(&app, "GET", "/members?per_page=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["first_name"], "Lotte");
    assert_eq!(page["items"][0]["group_name"], "Iedereen");
}

#[tokio::test]
async fn siblings_share_parent_and_address() {
    let app = app();
    seed(&app).await;

    let (_, lotte) = send(
        &app,
        "POST",
        "/registrations",
        Some(registration("Lotte", "els.claes@example.be")),
    )
    .await;
    let (status, wout) = send(
        &app,
        "POST",
        "/registrations",
        Some(registration("Wout", "els.claes@example.be")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(wout["parent_ids"], lotte["parent_ids"]);

    let uri = format!("/members/{}", lotte["member_id"].as_str().unwrap());
    let (_, lotte_details) = send(&app, "GET", &uri, None).await;
    let uri = format!("/members/{}", wout["member_id"].as_str().unwrap());
    let (_, wout_details) = send(&app, "GET", &uri, None).await;
    assert_eq!(lotte_details["address"]["id"], wout_details["address"]["id"]);

    let (status, page) = send(&app, "GET", "/members?page=1&per_page=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["has_next"], true);
    assert_eq!(page["has_prev"], false);
}

#[tokio::test]
async fn invalid_registration_is_400() {
    let app = app();
    seed(&app).await;

    let mut form = registration("Lotte", "els.claes@example.be");
    form["parents"] = json!([]);
    let (status, body) = send(&app, "POST", "/registrations", Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = send(
        &app,
        "POST",
        "/registrations",
        Some(json!({ "member": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn payment_lifecycle() {
    let app = app();
    seed(&app).await;
    let (_, outcome) = send(
        &app,
        "POST",
        "/registrations",
        Some(registration("Lotte", "els.claes@example.be")),
    )
    .await;
    let uri = format!(
        "/memberships/{}/payment",
        outcome["membership_id"].as_str().unwrap()
    );

    let (status, membership) =
        send(&app, "POST", &uri, Some(json!({ "method": "transfer" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["paid"], true);
    assert_eq!(membership["payment_method"], "transfer");
    assert_eq!(membership["paid_on"], json!(today()));

    let (status, membership) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["paid"], false);
    assert_eq!(membership["payment_method"], Value::Null);
}

#[tokio::test]
async fn group_in_use_cannot_be_deleted() {
    let app = app();
    let (_, group_id) = seed(&app).await;
    let (_, outcome) = send(
        &app,
        "POST",
        "/registrations",
        Some(registration("Lotte", "els.claes@example.be")),
    )
    .await;

    let (status, body) = send(&app, "DELETE", &format!("/groups/{group_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "in_use");

    let uri = format!("/members/{}", outcome["member_id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &format!("/groups/{group_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/groups/{group_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_need_a_work_year() {
    let app = app();
    let (work_year_id, group_id) = seed(&app).await;
    let start = today().and_hms_opt(14, 0, 0).unwrap();

    let (status, event) = send(
        &app,
        "POST",
        "/events",
        Some(json!({
            "title": "Startdag",
            "starts_at": start,
            "ends_at": start + Duration::hours(3),
            "group_ids": [group_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{event}");
    assert_eq!(event["work_year_id"], work_year_id);

    let far = (today() + Duration::days(1000)).and_hms_opt(14, 0, 0).unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/events",
        Some(json!({
            "title": "Te laat",
            "starts_at": far,
            "ends_at": far + Duration::hours(1)
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "no_work_year_for_date");

    let (status, events) = send(&app, "GET", &format!("/events?group_id={group_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sponsor_agreements() {
    let app = app();
    let (work_year_id, _) = seed(&app).await;

    let (status, sponsor) = send(
        &app,
        "POST",
        "/sponsors",
        Some(json!({ "company_name": "Bakkerij Janssens", "website": "https://bakkerij.be" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{sponsor}");
    let sponsor_uri = format!("/sponsors/{}", sponsor["id"].as_str().unwrap());

    let agreement = json!({ "work_year_id": work_year_id, "amount_cents": 25000, "kind": "financial" });
    let (status, created) = send(
        &app,
        "POST",
        &format!("{sponsor_uri}/agreements"),
        Some(agreement.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let (status, body) = send(
        &app,
        "POST",
        &format!("{sponsor_uri}/agreements"),
        Some(agreement),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let paid_uri = format!("/agreements/{}/paid", created["id"].as_str().unwrap());
    let (status, paid) = send(&app, "POST", &paid_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["paid"], true);

    let (status, view) = send(&app, "GET", &sponsor_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["company_name"], "Bakkerij Janssens");
    assert_eq!(view["agreements"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_id_is_400() {
    let (status, body) = send(&app(), "GET", "/members/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn unknown_member_is_404() {
    let uri = format!("/members/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app(), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
