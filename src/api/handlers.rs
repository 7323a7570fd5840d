use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        CatalogFilter, CatalogItem, CatalogSort, ContentType, Movie, MovieRequest, Notification,
        PriorityRequest, RecommendationResponse, Series, SeriesRequest, SeriesStatus, WatchStatus,
        WatchStatusRequest,
    },
    services::TriggerOutcome,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default = "default_recommendation_count")]
    pub count: usize,
    #[serde(default)]
    pub added_by: Option<String>,
}

fn default_recommendation_count() -> usize {
    1
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub watch_status: Option<WatchStatus>,
    #[serde(default)]
    pub added_by: Option<String>,
    #[serde(default)]
    pub has_new_seasons: Option<bool>,
    #[serde(default)]
    pub series_status: Option<SeriesStatus>,
    #[serde(default)]
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

// Catalog

/// Movies and series in one list, unwatched first
pub async fn get_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    let sort = CatalogSort::parse(query.sort_by.as_deref().unwrap_or_default())?;
    let filter = CatalogFilter {
        content_type: query.content_type,
        genre: query.genre,
        watch_status: query.watch_status,
        added_by: query.added_by,
        has_new_seasons: query.has_new_seasons,
        series_status: query.series_status,
    };
    Ok(Json(state.catalog.catalog(&filter, sort).await?))
}

pub async fn search_catalog(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<CatalogItem>>> {
    Ok(Json(state.catalog.search(&query.query).await?))
}

// Series

pub async fn list_series(State(state): State<AppState>) -> AppResult<Json<Vec<Series>>> {
    Ok(Json(state.catalog.list_series().await?))
}

pub async fn create_series(
    State(state): State<AppState>,
    Json(request): Json<SeriesRequest>,
) -> AppResult<(StatusCode, Json<Series>)> {
    let series = state.catalog.add_series(request).await?;
    Ok((StatusCode::CREATED, Json(series)))
}

pub async fn get_series(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Series>> {
    Ok(Json(state.catalog.get_series(id).await?))
}

pub async fn update_series(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SeriesRequest>,
) -> AppResult<Json<Series>> {
    Ok(Json(state.catalog.update_series_details(id, request).await?))
}

pub async fn delete_series(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.catalog.delete_series(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_season_watch_status(
    State(state): State<AppState>,
    Path((id, season_number)): Path<(Uuid, u32)>,
    Json(request): Json<WatchStatusRequest>,
) -> AppResult<Json<Series>> {
    let series = state
        .catalog
        .set_season_watch_status(id, season_number, request.watch_status)
        .await?;
    Ok(Json(series))
}

pub async fn set_series_watch_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<WatchStatusRequest>,
) -> AppResult<Json<Series>> {
    let series = state
        .catalog
        .set_series_watch_status(id, request.watch_status)
        .await?;
    Ok(Json(series))
}

pub async fn set_series_priority(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PriorityRequest>,
) -> AppResult<Json<Series>> {
    Ok(Json(
        state.catalog.set_series_priority(id, request.priority).await?,
    ))
}

pub async fn add_season(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Series>)> {
    let series = state.catalog.add_season(id).await?;
    Ok((StatusCode::CREATED, Json(series)))
}

pub async fn remove_last_season(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Series>> {
    Ok(Json(state.catalog.remove_last_season(id).await?))
}

/// Reconciles one series against the metadata provider
pub async fn refresh_series(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TriggerOutcome>> {
    Ok(Json(state.trigger.on_manual_trigger(Some(id)).await?))
}

/// Reconciles every series; 409 while another run is in flight
pub async fn refresh_all_series(State(state): State<AppState>) -> AppResult<Json<TriggerOutcome>> {
    Ok(Json(state.trigger.on_manual_trigger(None).await?))
}

// Movies

pub async fn list_movies(State(state): State<AppState>) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(state.catalog.list_movies().await?))
}

pub async fn create_movie(
    State(state): State<AppState>,
    Json(request): Json<MovieRequest>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let movie = state.catalog.add_movie(request).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.catalog.get_movie(id).await?))
}

pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MovieRequest>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.catalog.update_movie_details(id, request).await?))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.catalog.delete_movie(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_movie_watch_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<WatchStatusRequest>,
) -> AppResult<Json<Movie>> {
    Ok(Json(
        state
            .catalog
            .set_movie_watch_status(id, request.watch_status)
            .await?,
    ))
}

pub async fn set_movie_priority(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PriorityRequest>,
) -> AppResult<Json<Movie>> {
    Ok(Json(
        state.catalog.set_movie_priority(id, request.priority).await?,
    ))
}

// Recommendations

/// Weighted-random picks from unwatched movies and series
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<RecommendationResponse>>> {
    let picks = state
        .recommendations
        .recommend(query.count, query.added_by.as_deref())
        .await?;
    Ok(Json(picks))
}

// Notifications

pub async fn list_notifications(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(state.notifications.active().await?))
}

pub async fn dismiss_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.notifications.dismiss(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
