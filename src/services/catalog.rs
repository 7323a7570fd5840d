use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{
        CatalogFilter, CatalogItem, CatalogSort, ContentType, Movie, MovieRequest, Series,
        SeriesRequest, WatchStatus,
    },
    services::{clock::Clock, job_lock::KeyedMutex},
};

/// User-facing edits to movies and series.
///
/// Every read-modify-write holds a per-document lock. Series edits share
/// theirs with reconciliation, so a watch-status change and a season sync
/// never overwrite each other.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    series_locks: Arc<KeyedMutex<Uuid>>,
    movie_locks: KeyedMutex<Uuid>,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
        series_locks: Arc<KeyedMutex<Uuid>>,
    ) -> Self {
        Self {
            store,
            clock,
            series_locks,
            movie_locks: KeyedMutex::new(),
        }
    }

    async fn update_series<F>(&self, id: Uuid, edit: F) -> AppResult<Series>
    where
        F: FnOnce(Series) -> AppResult<Series> + Send,
    {
        let _guard = self.series_locks.lock(&id).await?;
        let series = self.store.get_series(id).await?;
        self.store.save_series(edit(series)?).await
    }

    async fn update_movie<F>(&self, id: Uuid, edit: F) -> AppResult<Movie>
    where
        F: FnOnce(Movie) -> AppResult<Movie> + Send,
    {
        let _guard = self.movie_locks.lock(&id).await?;
        let movie = self.store.get_movie(id).await?;
        self.store.save_movie(edit(movie)?).await
    }

    /// Movies and series as one list, filtered and sorted
    pub async fn catalog(
        &self,
        filter: &CatalogFilter,
        sort: CatalogSort,
    ) -> AppResult<Vec<CatalogItem>> {
        let mut items = Vec::new();
        if filter.includes(ContentType::Movie) {
            items.extend(self.store.all_movies().await?.iter().map(CatalogItem::from));
        }
        if filter.includes(ContentType::Series) {
            items.extend(self.store.all_series().await?.iter().map(CatalogItem::from));
        }
        items.retain(|item| filter.matches(item));
        sort.apply(&mut items);

        tracing::info!(filter = ?filter, sort = ?sort, count = items.len(), "Catalog listed");
        Ok(items)
    }

    /// Movies and series whose title, comment or a genre contains `query`,
    /// ignoring case
    pub async fn search(&self, query: &str) -> AppResult<Vec<CatalogItem>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(AppError::InvalidInput("Search query is required".to_string()));
        }

        let movies = self.store.all_movies().await?;
        let series = self.store.all_series().await?;
        let mut items: Vec<CatalogItem> = movies
            .iter()
            .map(CatalogItem::from)
            .chain(series.iter().map(CatalogItem::from))
            .filter(|item| item.mentions(&needle))
            .collect();
        CatalogSort::default().apply(&mut items);

        tracing::info!(query = %needle, count = items.len(), "Catalog searched");
        Ok(items)
    }

    pub async fn list_series(&self) -> AppResult<Vec<Series>> {
        self.store.all_series().await
    }

    pub async fn get_series(&self, id: Uuid) -> AppResult<Series> {
        self.store.get_series(id).await
    }

    pub async fn add_series(&self, request: SeriesRequest) -> AppResult<Series> {
        let series = Series::from_request(request, self.clock.now())?;
        let saved = self.store.save_series(series).await?;

        tracing::info!(
            series_id = %saved.id,
            title = %saved.title,
            external_id = ?saved.external_id,
            seasons = saved.seasons.len(),
            "Series added"
        );
        Ok(saved)
    }

    /// Replaces a series' editable fields
    pub async fn update_series_details(
        &self,
        id: Uuid,
        request: SeriesRequest,
    ) -> AppResult<Series> {
        let updated = self
            .update_series(id, |series| series.with_update(request))
            .await?;

        tracing::info!(series_id = %id, title = %updated.title, "Series updated");
        Ok(updated)
    }

    pub async fn set_season_watch_status(
        &self,
        id: Uuid,
        season_number: u32,
        status: WatchStatus,
    ) -> AppResult<Series> {
        let updated = self
            .update_series(id, |series| {
                series.with_season_watch_status(season_number, status)
            })
            .await?;

        tracing::info!(series_id = %id, season_number, status = %status, "Season watch status updated");
        Ok(updated)
    }

    pub async fn set_series_watch_status(&self, id: Uuid, status: WatchStatus) -> AppResult<Series> {
        let updated = self
            .update_series(id, |series| Ok(series.with_all_seasons(status)))
            .await?;

        tracing::info!(series_id = %id, status = %status, "Series watch status updated");
        Ok(updated)
    }

    /// Appends the next season number, unwatched
    pub async fn add_season(&self, id: Uuid) -> AppResult<Series> {
        let updated = self
            .update_series(id, Series::with_next_season)
            .await?;

        tracing::info!(series_id = %id, season_number = updated.max_season_number(), "Season added");
        Ok(updated)
    }

    pub async fn remove_last_season(&self, id: Uuid) -> AppResult<Series> {
        let updated = self
            .update_series(id, Series::without_last_season)
            .await?;

        tracing::info!(series_id = %id, seasons = updated.seasons.len(), "Last season removed");
        Ok(updated)
    }

    pub async fn set_series_priority(&self, id: Uuid, priority: i32) -> AppResult<Series> {
        self.update_series(id, |mut series| {
            series.priority = priority;
            Ok(series)
        })
        .await
    }

    pub async fn delete_series(&self, id: Uuid) -> AppResult<()> {
        let _guard = self.series_locks.lock(&id).await?;
        if !self.store.series_exists(id).await? {
            return Err(AppError::NotFound(format!("Series not found with id: {}", id)));
        }
        self.store.delete_series(id).await?;
        tracing::info!(series_id = %id, "Series deleted");
        Ok(())
    }

    pub async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        self.store.all_movies().await
    }

    pub async fn get_movie(&self, id: Uuid) -> AppResult<Movie> {
        self.store.get_movie(id).await
    }

    pub async fn add_movie(&self, request: MovieRequest) -> AppResult<Movie> {
        let movie = Movie::from_request(request, self.clock.now())?;
        let saved = self.store.save_movie(movie).await?;
        tracing::info!(movie_id = %saved.id, title = %saved.title, "Movie added");
        Ok(saved)
    }

    /// Replaces a movie's editable fields
    pub async fn update_movie_details(&self, id: Uuid, request: MovieRequest) -> AppResult<Movie> {
        let updated = self
            .update_movie(id, |movie| movie.with_update(request))
            .await?;

        tracing::info!(movie_id = %id, title = %updated.title, "Movie updated");
        Ok(updated)
    }

    pub async fn set_movie_watch_status(&self, id: Uuid, status: WatchStatus) -> AppResult<Movie> {
        self.update_movie(id, |mut movie| {
            movie.watch_status = status;
            Ok(movie)
        })
        .await
    }

    pub async fn set_movie_priority(&self, id: Uuid, priority: i32) -> AppResult<Movie> {
        self.update_movie(id, |mut movie| {
            movie.priority = priority;
            Ok(movie)
        })
        .await
    }

    pub async fn delete_movie(&self, id: Uuid) -> AppResult<()> {
        let _guard = self.movie_locks.lock(&id).await?;
        if !self.store.movie_exists(id).await? {
            return Err(AppError::NotFound(format!("Movie not found with id: {}", id)));
        }
        self.store.delete_movie(id).await?;
        tracing::info!(movie_id = %id, "Movie deleted");
        Ok(())
    }
}
