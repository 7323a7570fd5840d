use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Catalog
        .route("/catalog", get(handlers::get_catalog))
        .route("/catalog/search", get(handlers::search_catalog))
        // Series
        .route(
            "/series",
            get(handlers::list_series).post(handlers::create_series),
        )
        .route("/series/refresh", post(handlers::refresh_all_series))
        .route(
            "/series/:id",
            get(handlers::get_series)
                .put(handlers::update_series)
                .delete(handlers::delete_series),
        )
        .route(
            "/series/:id/watch-status",
            patch(handlers::set_series_watch_status),
        )
        .route("/series/:id/priority", patch(handlers::set_series_priority))
        .route("/series/:id/seasons", post(handlers::add_season))
        .route(
            "/series/:id/seasons/last",
            delete(handlers::remove_last_season),
        )
        .route(
            "/series/:id/seasons/:number/watch-status",
            patch(handlers::set_season_watch_status),
        )
        .route("/series/:id/refresh", post(handlers::refresh_series))
        // Movies
        .route(
            "/movies",
            get(handlers::list_movies).post(handlers::create_movie),
        )
        .route(
            "/movies/:id",
            get(handlers::get_movie)
                .put(handlers::update_movie)
                .delete(handlers::delete_movie),
        )
        .route(
            "/movies/:id/watch-status",
            patch(handlers::set_movie_watch_status),
        )
        .route("/movies/:id/priority", patch(handlers::set_movie_priority))
        // Recommendations
        .route("/recommendations", get(handlers::get_recommendations))
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route(
            "/notifications/:id",
            delete(handlers::dismiss_notification),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}
