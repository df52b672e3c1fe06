//! Lesson catalog route handlers. All public.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use afterschool_core::{Lesson, LessonId, SortDirection, SortKey};

use super::ApiQuery;
use crate::error::{AppError, Result};
use crate::services::CatalogService;
use crate::state::AppState;

/// Query parameters for the lesson list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<SortKey>,
    pub order: Option<SortDirection>,
}

/// Query parameters for search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// List all lessons.
///
/// # Route
///
/// `GET /lessons?sort=subject|location|price|spaces&order=asc|desc`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Lesson>>> {
    let lessons = CatalogService::new(state.store())
        .list(params.sort, params.order.unwrap_or_default())
        .await?;
    Ok(Json(lessons))
}

/// Show one lesson.
///
/// # Route
///
/// `GET /lessons/{id}`
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Lesson>> {
    let not_found = || AppError::NotFound("Lesson not found".to_string());

    let id = id.parse::<i32>().map(LessonId::new).map_err(|_| not_found())?;
    CatalogService::new(state.store())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Free-text lesson search.
///
/// # Route
///
/// `GET /search?q=`
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<Lesson>>> {
    let query = params.q.unwrap_or_default();
    let lessons = CatalogService::new(state.store()).search(&query).await?;
    Ok(Json(lessons))
}
