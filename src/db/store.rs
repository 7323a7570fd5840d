use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Movie, Notification, Series},
};

/// Key-addressed store of catalog aggregates
///
/// Each save is atomic for a single document; nothing spans entities.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns `NotFound` for unknown ids
    async fn get_series(&self, id: Uuid) -> AppResult<Series>;

    /// All series, ordered by date added then id
    async fn all_series(&self) -> AppResult<Vec<Series>>;

    /// Upserts the series document
    async fn save_series(&self, series: Series) -> AppResult<Series>;

    async fn series_exists(&self, id: Uuid) -> AppResult<bool>;

    /// Returns `NotFound` for unknown ids
    async fn delete_series(&self, id: Uuid) -> AppResult<()>;

    async fn get_movie(&self, id: Uuid) -> AppResult<Movie>;

    /// All movies, ordered by date added then id
    async fn all_movies(&self) -> AppResult<Vec<Movie>>;

    async fn save_movie(&self, movie: Movie) -> AppResult<Movie>;

    async fn movie_exists(&self, id: Uuid) -> AppResult<bool>;

    async fn delete_movie(&self, id: Uuid) -> AppResult<()>;
}

/// Persistence for new-season notifications
#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    async fn save_notification(&self, notification: Notification) -> AppResult<Notification>;

    async fn get_notification(&self, id: Uuid) -> AppResult<Notification>;

    /// Notifications not yet dismissed, newest first
    async fn active_notifications(&self) -> AppResult<Vec<Notification>>;
}
