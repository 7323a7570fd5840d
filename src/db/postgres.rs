use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use super::store::{CatalogStore, NotificationStore};
use crate::{
    error::{AppError, AppResult},
    models::{Movie, Notification, Series},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Document store over Postgres
///
/// Each aggregate lives in one JSONB column keyed by its id, mirroring
/// the single-document atomicity the catalog relies on.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgStore {
    async fn get_series(&self, id: Uuid) -> AppResult<Series> {
        let doc: Option<Json<Series>> =
            sqlx::query_scalar("SELECT doc FROM series WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        doc.map(|Json(series)| series)
            .ok_or_else(|| AppError::NotFound(format!("Series not found with id: {}", id)))
    }

    async fn all_series(&self) -> AppResult<Vec<Series>> {
        let docs: Vec<Json<Series>> =
            sqlx::query_scalar("SELECT doc FROM series ORDER BY date_added, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(docs.into_iter().map(|Json(series)| series).collect())
    }

    async fn save_series(&self, series: Series) -> AppResult<Series> {
        sqlx::query(
            r#"
            INSERT INTO series (id, doc, date_added)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET doc = EXCLUDED.doc, date_added = EXCLUDED.date_added
            "#,
        )
        .bind(series.id)
        .bind(Json(&series))
        .bind(series.date_added)
        .execute(&self.pool)
        .await?;

        tracing::debug!(series_id = %series.id, "Series saved");
        Ok(series)
    }

    async fn series_exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM series WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn delete_series(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM series WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Series not found with id: {}",
                id
            )));
        }
        Ok(())
    }

    async fn get_movie(&self, id: Uuid) -> AppResult<Movie> {
        let doc: Option<Json<Movie>> = sqlx::query_scalar("SELECT doc FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        doc.map(|Json(movie)| movie)
            .ok_or_else(|| AppError::NotFound(format!("Movie not found with id: {}", id)))
    }

    async fn all_movies(&self) -> AppResult<Vec<Movie>> {
        let docs: Vec<Json<Movie>> =
            sqlx::query_scalar("SELECT doc FROM movies ORDER BY date_added, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(docs.into_iter().map(|Json(movie)| movie).collect())
    }

    async fn save_movie(&self, movie: Movie) -> AppResult<Movie> {
        sqlx::query(
            r#"
            INSERT INTO movies (id, doc, date_added)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET doc = EXCLUDED.doc, date_added = EXCLUDED.date_added
            "#,
        )
        .bind(movie.id)
        .bind(Json(&movie))
        .bind(movie.date_added)
        .execute(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn movie_exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn delete_movie(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Movie not found with id: {}", id)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotificationStore for PgStore {
    async fn save_notification(&self, notification: Notification) -> AppResult<Notification> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, doc, dismissed, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET doc = EXCLUDED.doc, dismissed = EXCLUDED.dismissed
            "#,
        )
        .bind(notification.id)
        .bind(Json(&notification))
        .bind(notification.dismissed)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_notification(&self, id: Uuid) -> AppResult<Notification> {
        let doc: Option<Json<Notification>> =
            sqlx::query_scalar("SELECT doc FROM notifications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        doc.map(|Json(notification)| notification)
            .ok_or_else(|| AppError::NotFound(format!("Notification not found with id: {}", id)))
    }

    async fn active_notifications(&self) -> AppResult<Vec<Notification>> {
        let docs: Vec<Json<Notification>> = sqlx::query_scalar(
            "SELECT doc FROM notifications WHERE dismissed = FALSE ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(docs.into_iter().map(|Json(n)| n).collect())
    }
}
