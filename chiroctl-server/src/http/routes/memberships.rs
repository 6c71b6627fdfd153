//! Membership payment and group endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use chiroctl_core::domain::{Membership, PaymentForm};
use chiroctl_core::usecases;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ValidUuid};
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangeGroupRequest {
    pub group_id: Uuid,
}

/// POST /memberships/{id}/payment
async fn record_payment(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(form): ApiJson<PaymentForm>,
) -> Result<Json<Membership>, ApiError> {
    let mut uow = state.begin().await?;
    let membership = usecases::record_payment(uow.as_mut(), id, &form, state.today()).await?;
    uow.commit().await?;
    Ok(Json(membership))
}

/// DELETE /memberships/{id}/payment
async fn clear_payment(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Membership>, ApiError> {
    let mut uow = state.begin().await?;
    let membership = usecases::clear_payment(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(Json(membership))
}

/// PUT /memberships/{id}/group
async fn change_group(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<ChangeGroupRequest>,
) -> Result<Json<Membership>, ApiError> {
    let mut uow = state.begin().await?;
    let membership = usecases::change_group(uow.as_mut(), id, req.group_id).await?;
    uow.commit().await?;
    Ok(Json(membership))
}

/// Membership routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/memberships/{id}/payment",
            post(record_payment).delete(clear_payment),
        )
        .route("/memberships/{id}/group", put(change_group))
}
