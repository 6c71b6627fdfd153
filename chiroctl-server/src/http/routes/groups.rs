//! Group endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;

use chiroctl_core::domain::{Group, GroupForm};
use chiroctl_core::usecases;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, ValidUuid};
use crate::http::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GroupQuery {
    /// Only active groups
    #[serde(default)]
    pub active: bool,
}

/// GET /groups
async fn list_groups(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<GroupQuery>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::list_groups(uow.as_mut(), query.active).await?))
}

/// POST /groups
async fn create_group(
    State(state): State<Arc<AppState>>,
    ApiJson(form): ApiJson<GroupForm>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let mut uow = state.begin().await?;
    let group = usecases::create_group(uow.as_mut(), &form).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /groups/{id}
async fn get_group(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Group>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::get_group(uow.as_mut(), id).await?))
}

/// PUT /groups/{id}
async fn update_group(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(form): ApiJson<GroupForm>,
) -> Result<Json<Group>, ApiError> {
    let mut uow = state.begin().await?;
    let group = usecases::update_group(uow.as_mut(), id, &form).await?;
    uow.commit().await?;
    Ok(Json(group))
}

/// DELETE /groups/{id}
async fn delete_group(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.begin().await?;
    usecases::delete_group(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Group routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{id}",
            get(get_group).put(update_group).delete(delete_group),
        )
}
