//! Work-year endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;

use chiroctl_core::domain::{WorkYear, WorkYearForm};
use chiroctl_core::usecases;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, ValidUuid};
use crate::http::server::AppState;

/// Optional date for the current work-year lookup
#[derive(Debug, Default, Deserialize)]
pub struct CurrentQuery {
    pub date: Option<chrono::NaiveDate>,
}

/// GET /work-years - newest first
async fn list_work_years(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WorkYear>>, ApiError> {
    let mut uow = state.begin().await?;
    let work_years = usecases::list_work_years(uow.as_mut()).await?;
    Ok(Json(work_years))
}

/// POST /work-years
async fn create_work_year(
    State(state): State<Arc<AppState>>,
    ApiJson(form): ApiJson<WorkYearForm>,
) -> Result<(StatusCode, Json<WorkYear>), ApiError> {
    let mut uow = state.begin().await?;
    let work_year = usecases::create_work_year(uow.as_mut(), &form).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(work_year)))
}

/// GET /work-years/current - work-year containing today (or `?date=`)
async fn current_work_year(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CurrentQuery>,
) -> Result<Json<WorkYear>, ApiError> {
    let date = query.date.unwrap_or_else(|| state.today());
    let mut uow = state.begin().await?;
    let work_year = usecases::current_work_year(uow.as_mut(), date).await?;
    Ok(Json(work_year))
}

/// GET /work-years/{id}
async fn get_work_year(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<WorkYear>, ApiError> {
    let mut uow = state.begin().await?;
    Ok(Json(usecases::get_work_year(uow.as_mut(), id).await?))
}

/// PUT /work-years/{id}
async fn update_work_year(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(form): ApiJson<WorkYearForm>,
) -> Result<Json<WorkYear>, ApiError> {
    let mut uow = state.begin().await?;
    let work_year = usecases::update_work_year(uow.as_mut(), id, &form).await?;
    uow.commit().await?;
    Ok(Json(work_year))
}

/// DELETE /work-years/{id}
async fn delete_work_year(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let mut uow = state.begin().await?;
    usecases::delete_work_year(uow.as_mut(), id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Work-year routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/work-years", get(list_work_years).post(create_work_year))
        .route("/work-years/current", get(current_work_year))
        .route(
            "/work-years/{id}",
            get(get_work_year)
                .put(update_work_year)
                .delete(delete_work_year),
        )
}
