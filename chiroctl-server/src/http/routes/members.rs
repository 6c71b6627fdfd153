//! Registration and member endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use chiroctl_core::domain::{
    MemberDetails, MemberFilter, MemberForm, MemberSummary, RegistrationForm, RegistrationOutcome,
};
use chiroctl_core::usecases::{self, Enrollment};
use chiroctl_core::{Paginated, Pagination, PaginationParams};

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, ValidUuid};
use crate::http::server::AppState;

/// Renewal request; without a group the member's age decides
#[derive(Debug, Default, Deserialize)]
pub struct RenewalRequest {
    #[serde(default)]
    pub group_id: Option<Uuid>,
}

/// POST /registrations - 201 when the member is new, 200 when it was updated
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(form): ApiJson<RegistrationForm>,
) -> Result<(StatusCode, Json<RegistrationOutcome>), ApiError> {
    let mut uow = state.begin().await?;
    let outcome = usecases::register_member(uow.as_mut(), &form, state.today()).await?;
    uow.commit().await?;

    let status = if outcome.member_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

/// GET /members - paginated, ordered by last name then first name
async fn list_members(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<MemberFilter>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<Paginated<MemberSummary>>, ApiError> {
    let page = Pagination::from(params);
    let mut uow = state.begin().await?;
    Ok(Json(usecases::list_members(uow.as_mut(), filter, page).await?))
}

/// GET /members/{id}
async fn get_member(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<MemberDetails>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::member_details(uow.as_mut(), id).await?))
}

/// PUT /members/{id}
async fn update_member(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(form): ApiJson<MemberForm>,
) -> Result<Json<MemberDetails>, ApiError> {
    let mut uow = state.begin().await?;
    let details = usecases::update_member(uow.as_mut(), id, &form, state.today()).await?;
    uow.commit().await?;
    Ok(Json(details))
}

/// DELETE /members/{id}
async fn delete_member(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.begin().await?;
    usecases::delete_member(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /members/{id}/renewals - enroll into the current work-year
async fn renew(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<RenewalRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let mut uow = state.begin().await?;
    let enrollment =
        usecases::renew_membership(uow.as_mut(), id, req.group_id, state.today()).await?;
    uow.commit().await?;

    let status = if enrollment.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(enrollment)))
}

/// Member routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/registrations", post(register))
        .route("/members", get(list_members))
        .route(
            "/members/{id}",
            get(get_member).put(update_member).delete(delete_member),
        )
        .route("/members/{id}/renewals", post(renew))
}
