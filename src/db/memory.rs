use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{CatalogStore, NotificationStore};
use crate::{
    error::{AppError, AppResult},
    models::{Movie, Notification, Series},
};

/// Process-local store used when no database is configured, and in tests
#[derive(Default)]
pub struct InMemoryStore {
    series: RwLock<HashMap<Uuid, Series>>,
    movies: RwLock<HashMap<Uuid, Movie>>,
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_series(&self, id: Uuid) -> AppResult<Series> {
        self.series
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Series not found with id: {}", id)))
    }

    async fn all_series(&self) -> AppResult<Vec<Series>> {
        let mut all: Vec<Series> = self.series.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.date_added.cmp(&b.date_added).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn save_series(&self, series: Series) -> AppResult<Series> {
        self.series.write().await.insert(series.id, series.clone());
        Ok(series)
    }

    async fn series_exists(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.series.read().await.contains_key(&id))
    }

    async fn delete_series(&self, id: Uuid) -> AppResult<()> {
        self.series
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Series not found with id: {}", id)))
    }

    async fn get_movie(&self, id: Uuid) -> AppResult<Movie> {
        self.movies
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Movie not found with id: {}", id)))
    }

    async fn all_movies(&self) -> AppResult<Vec<Movie>> {
        let mut all: Vec<Movie> = self.movies.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.date_added.cmp(&b.date_added).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn save_movie(&self, movie: Movie) -> AppResult<Movie> {
        self.movies.write().await.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn movie_exists(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.movies.read().await.contains_key(&id))
    }

    async fn delete_movie(&self, id: Uuid) -> AppResult<()> {
        self.movies
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Movie not found with id: {}", id)))
    }
}

#[async_trait::async_trait]
impl NotificationStore for InMemoryStore {
    async fn save_notification(&self, notification: Notification) -> AppResult<Notification> {
        self.notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn get_notification(&self, id: Uuid) -> AppResult<Notification> {
        self.notifications
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Notification not found with id: {}", id)))
    }

    async fn active_notifications(&self) -> AppResult<Vec<Notification>> {
        let mut active: Vec<Notification> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| !n.dismissed)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieRequest, SeriesRequest};
    use chrono::{Duration, Utc};

    fn series(title: &str, days_ago: i64) -> Series {
        Series::from_request(
            SeriesRequest {
                title: title.to_string(),
                ..Default::default()
            },
            Utc::now() - Duration::days(days_ago),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_series_crud() {
        let store = InMemoryStore::new();
        let saved = store.save_series(series("Dark", 0)).await.unwrap();

        assert!(store.series_exists(saved.id).await.unwrap());
        assert_eq!(store.get_series(saved.id).await.unwrap(), saved);

        store.delete_series(saved.id).await.unwrap();
        assert!(!store.series_exists(saved.id).await.unwrap());
        assert!(matches!(
            store.get_series(saved.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_series(saved.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_all_series_ordered_by_date_added() {
        let store = InMemoryStore::new();
        store.save_series(series("Newest", 1)).await.unwrap();
        store.save_series(series("Oldest", 30)).await.unwrap();
        store.save_series(series("Middle", 10)).await.unwrap();

        let titles: Vec<String> = store
            .all_series()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Oldest", "Middle", "Newest"]);
    }

    #[tokio::test]
    async fn test_movie_crud() {
        let store = InMemoryStore::new();
        let movie = Movie::from_request(
            MovieRequest {
                title: "Heat".to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();

        store.save_movie(movie.clone()).await.unwrap();
        assert_eq!(store.all_movies().await.unwrap(), vec![movie.clone()]);
        store.delete_movie(movie.id).await.unwrap();
        assert!(store.all_movies().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_notifications_newest_first() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let older = Notification::new_seasons(Uuid::new_v4(), "A", 1, now - Duration::hours(2));
        let newer = Notification::new_seasons(Uuid::new_v4(), "B", 1, now);
        let mut dismissed = Notification::new_seasons(Uuid::new_v4(), "C", 1, now);
        dismissed.dismissed = true;

        store.save_notification(older.clone()).await.unwrap();
        store.save_notification(newer.clone()).await.unwrap();
        store.save_notification(dismissed).await.unwrap();

        let active = store.active_notifications().await.unwrap();
        assert_eq!(active, vec![newer, older]);
    }
}
