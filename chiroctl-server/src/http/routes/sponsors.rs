//! Sponsor and sponsorship agreement endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use chiroctl_core::domain::{AgreementForm, Sponsor, SponsorForm, SponsorView, SponsorshipAgreement};
use chiroctl_core::usecases;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ValidUuid};
use crate::http::server::AppState;

/// GET /sponsors - ordered by company name
async fn list_sponsors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Sponsor>>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::list_sponsors(uow.as_mut()).await?))
}

/// POST /sponsors
async fn create_sponsor(
    State(state): State<Arc<AppState>>,
    ApiJson(form): ApiJson<SponsorForm>,
) -> Result<(StatusCode, Json<Sponsor>), ApiError> {
    let mut uow = state.begin().await?;
    let sponsor = usecases::create_sponsor(uow.as_mut(), &form).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(sponsor)))
}

/// GET /sponsors/{id} - with address and agreements
async fn get_sponsor(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<SponsorView>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::get_sponsor(uow.as_mut(), id).await?))
}

/// PUT /sponsors/{id}
async fn update_sponsor(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(form): ApiJson<SponsorForm>,
) -> Result<Json<Sponsor>, ApiError> {
    let mut uow = state.begin().await?;
    let sponsor = usecases::update_sponsor(uow.as_mut(), id, &form).await?;
    uow.commit().await?;
    Ok(Json(sponsor))
}

/// DELETE /sponsors/{id}
async fn delete_sponsor(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.begin().await?;
    usecases::delete_sponsor(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sponsors/{id}/agreements
async fn add_agreement(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(form): ApiJson<AgreementForm>,
) -> Result<(StatusCode, Json<SponsorshipAgreement>), ApiError> {
    let mut uow = state.begin().await?;
    let agreement = usecases::add_agreement(uow.as_mut(), id, &form).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(agreement)))
}

/// POST /agreements/{id}/paid
async fn mark_paid(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<SponsorshipAgreement>, ApiError> {
    let mut uow = state.begin().await?;
    let agreement = usecases::mark_agreement_paid(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(Json(agreement))
}

/// DELETE /agreements/{id}
async fn remove_agreement(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.begin().await?;
    usecases::remove_agreement(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sponsor routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sponsors", get(list_sponsors).post(create_sponsor))
        .route(
            "/sponsors/{id}",
            get(get_sponsor).put(update_sponsor).delete(delete_sponsor),
        )
        .route("/sponsors/{id}/agreements", post(add_agreement))
        .route("/agreements/{id}", delete(remove_agreement))
        .route("/agreements/{id}/paid", post(mark_paid))
}
