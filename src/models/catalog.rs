use std::cmp::{Ordering, Reverse};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ContentType, Movie, Season, Series, SeriesStatus, WatchStatus};
use crate::error::{AppError, AppResult};

/// One row of the combined movie and series listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: Uuid,
    pub content_type: ContentType,
    pub title: String,
    pub link: Option<String>,
    pub comment: Option<String>,
    pub cover_image: Option<String>,
    pub genres: Vec<String>,
    /// Overall status for series
    pub watch_status: WatchStatus,
    pub added_by: Option<String>,
    pub date_added: DateTime<Utc>,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Vec<Season>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_new_seasons: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_status: Option<SeriesStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_available_seasons: Option<u32>,
}

impl From<&Movie> for CatalogItem {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            content_type: ContentType::Movie,
            title: movie.title.clone(),
            link: movie.link.clone(),
            comment: movie.comment.clone(),
            cover_image: movie.cover_image.clone(),
            genres: movie.genres.clone(),
            watch_status: movie.watch_status,
            added_by: movie.added_by.clone(),
            date_added: movie.date_added,
            priority: movie.priority,
            length: movie.length,
            external_id: None,
            seasons: None,
            has_new_seasons: None,
            series_status: None,
            total_available_seasons: None,
        }
    }
}

impl From<&Series> for CatalogItem {
    fn from(series: &Series) -> Self {
        Self {
            id: series.id,
            content_type: ContentType::Series,
            title: series.title.clone(),
            link: series.external_link.clone(),
            comment: series.comment.clone(),
            cover_image: series.cover_image.clone(),
            genres: series.genres.clone(),
            watch_status: series.overall_watch_status,
            added_by: series.added_by.clone(),
            date_added: series.date_added,
            priority: series.priority,
            length: None,
            external_id: series.external_id,
            seasons: Some(series.seasons.clone()),
            has_new_seasons: Some(series.has_new_seasons),
            series_status: series.series_status,
            total_available_seasons: series.total_available_seasons,
        }
    }
}

impl CatalogItem {
    /// Case-insensitive substring match on title, comment and genres.
    /// `needle` must already be lowercase.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .comment
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
            || self
                .genres
                .iter()
                .any(|g| g.to_lowercase().contains(needle))
    }
}

/// Narrowing options for the catalog listing. Unset fields match everything;
/// the series-only fields exclude movies when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub content_type: Option<ContentType>,
    pub genre: Option<String>,
    pub watch_status: Option<WatchStatus>,
    pub added_by: Option<String>,
    pub has_new_seasons: Option<bool>,
    pub series_status: Option<SeriesStatus>,
}

impl CatalogFilter {
    pub fn includes(&self, content_type: ContentType) -> bool {
        let series_only = self.has_new_seasons.is_some() || self.series_status.is_some();
        match content_type {
            ContentType::Movie if series_only => false,
            _ => self.content_type.map_or(true, |wanted| wanted == content_type),
        }
    }

    /// Filters shared by movies and series
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if !self.includes(item.content_type) {
            return false;
        }
        if let Some(genre) = non_blank(&self.genre) {
            if !item.genres.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
                return false;
            }
        }
        if let Some(added_by) = non_blank(&self.added_by) {
            if !item
                .added_by
                .as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case(added_by))
            {
                return false;
            }
        }
        if self.watch_status.is_some_and(|s| s != item.watch_status) {
            return false;
        }
        if self
            .has_new_seasons
            .is_some_and(|wanted| item.has_new_seasons != Some(wanted))
        {
            return false;
        }
        if self.series_status.is_some() && item.series_status != self.series_status {
            return false;
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Secondary ordering of the catalog. Unwatched items always come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogSort {
    /// Highest priority first, then oldest first
    #[default]
    Priority,
    /// Alphabetical, ignoring case
    Title,
    /// Newest first
    DateAdded,
    /// Longest first; series and movies without a length count as 0
    Length,
}

impl CatalogSort {
    /// Parses the `sort_by` query value, case-insensitively
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "priority" => Ok(CatalogSort::Priority),
            "title" => Ok(CatalogSort::Title),
            "dateadded" | "date_added" => Ok(CatalogSort::DateAdded),
            "length" => Ok(CatalogSort::Length),
            other => Err(AppError::InvalidInput(format!(
                "Unknown sort field: {}",
                other
            ))),
        }
    }

    fn compare(&self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        match self {
            CatalogSort::Priority => Reverse(a.priority)
                .cmp(&Reverse(b.priority))
                .then(a.date_added.cmp(&b.date_added)),
            CatalogSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            CatalogSort::DateAdded => b.date_added.cmp(&a.date_added),
            CatalogSort::Length => b.length.unwrap_or(0).cmp(&a.length.unwrap_or(0)),
        }
    }

    /// Stable sort: unwatched first, then by `self`
    pub fn apply(&self, items: &mut [CatalogItem]) {
        items.sort_by(|a, b| {
            let is_watched = |item: &CatalogItem| item.watch_status != WatchStatus::Unwatched;
            is_watched(a)
                .cmp(&is_watched(b))
                .then_with(|| self.compare(a, b))
        });
    }
}
