use crate::{error::AppResult, models::SeasonInfo};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Authoritative source of season counts and lifecycle status
///
/// Transport concerns (TLS, timeouts) live in the implementation; callers
/// only see a `SeasonInfo` or an `ExternalProvider` error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Current season count and status for the series with `external_id`
    async fn series_season_info(&self, external_id: u64) -> AppResult<SeasonInfo>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
