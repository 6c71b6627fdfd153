//! Event endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use chiroctl_core::domain::{Event, EventFilter, EventForm};
use chiroctl_core::usecases;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, ValidUuid};
use crate::http::server::AppState;

/// GET /events - `?from&to&group_id&work_year_id`, ordered by start
async fn list_events(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<EventFilter>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::list_events(uow.as_mut(), filter).await?))
}

/// POST /events
async fn create_event(
    State(state): State<Arc<AppState>>,
    ApiJson(form): ApiJson<EventForm>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let mut uow = state.begin().await?;
    let event = usecases::create_event(uow.as_mut(), &form).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Event>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::get_event(uow.as_mut(), id).await?))
}

/// PUT /events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(form): ApiJson<EventForm>,
) -> Result<Json<Event>, ApiError> {
    let mut uow = state.begin().await?;
    let event = usecases::update_event(uow.as_mut(), id, &form).await?;
    uow.commit().await?;
    Ok(Json(event))
}

/// DELETE /events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.begin().await?;
    usecases::delete_event(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Event routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}
