use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::WatchStatus;
use crate::error::{AppError, AppResult};

/// Matches the series segment of a TMDB link, e.g. `https://www.themoviedb.org/tv/1399-game-of-thrones`
static TV_LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/tv/(\d+)").expect("valid TV link pattern"));

/// Highest season number a series may track. Provider counts above it are
/// treated as a broken response.
pub const MAX_PLAUSIBLE_SEASONS: u32 = 1000;

/// Lifecycle of a series upstream
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesStatus {
    Complete,
    Ongoing,
}

impl SeriesStatus {
    /// Maps the provider's free-text status onto the closed vocabulary.
    /// Unknown values yield `None`.
    pub fn from_external(status: &str) -> Option<Self> {
        match status.trim().to_lowercase().as_str() {
            "ended" | "canceled" | "cancelled" => Some(SeriesStatus::Complete),
            "returning series" | "in production" | "planned" => Some(SeriesStatus::Ongoing),
            _ => None,
        }
    }
}

/// One season of a series and whether it has been watched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Season {
    pub season_number: u32,
    #[serde(default)]
    pub watch_status: WatchStatus,
}

impl Season {
    pub fn unwatched(season_number: u32) -> Self {
        Self {
            season_number,
            watch_status: WatchStatus::Unwatched,
        }
    }
}

/// A tracked multi-season series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub id: Uuid,
    pub title: String,
    /// Stable id at the metadata provider
    pub external_id: Option<u64>,
    /// Where the series can be found; may encode the external id
    pub external_link: Option<String>,
    pub comment: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Ordered by season number, never empty
    pub seasons: Vec<Season>,
    /// WATCHED iff every season is watched
    pub overall_watch_status: WatchStatus,
    /// Last season count reported by the provider
    pub total_available_seasons: Option<u32>,
    pub has_new_seasons: bool,
    pub series_status: Option<SeriesStatus>,
    pub last_reconciled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: i32,
    pub added_by: Option<String>,
    pub date_added: DateTime<Utc>,
}

/// Payload for creating a series
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesRequest {
    pub title: String,
    #[serde(default)]
    pub external_id: Option<u64>,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub seasons: Option<Vec<Season>>,
    #[serde(default)]
    pub added_by: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
}

/// Extracts the provider id from a series link, if the link carries one
pub fn parse_external_id(link: &str) -> Option<u64> {
    let captures = TV_LINK_PATTERN.captures(link)?;
    match captures[1].parse::<u64>() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(link = %link, error = %e, "Failed to parse external id from link");
            None
        }
    }
}

impl Series {
    /// Builds a new series from a creation request.
    ///
    /// A request without seasons gets a single unwatched season 1.
    pub fn from_request(request: SeriesRequest, now: DateTime<Utc>) -> AppResult<Self> {
        if request.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Series title is required".to_string()));
        }

        let seasons = match request.seasons {
            Some(seasons) if !seasons.is_empty() => normalize_seasons(seasons)?,
            _ => {
                tracing::info!(
                    title = %request.title,
                    "No seasons provided, creating default season 1"
                );
                vec![Season::unwatched(1)]
            }
        };

        let external_id = request
            .external_id
            .or_else(|| request.external_link.as_deref().and_then(parse_external_id));

        let series = Self {
            id: Uuid::new_v4(),
            title: request.title,
            external_id,
            external_link: request.external_link,
            comment: request.comment,
            cover_image: request.cover_image,
            genres: request.genres,
            seasons,
            overall_watch_status: WatchStatus::Unwatched,
            total_available_seasons: None,
            has_new_seasons: false,
            series_status: None,
            last_reconciled_at: None,
            priority: request.priority.unwrap_or(0),
            added_by: request.added_by,
            date_added: now,
        };

        Ok(series.with_derived_status())
    }

    /// Replaces the editable fields of a stored series. Id, `date_added` and
    /// reconciliation state are kept; seasons and priority change only when
    /// supplied, and a supplied season list may not be empty.
    pub fn with_update(mut self, request: SeriesRequest) -> AppResult<Self> {
        if request.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Series title is required".to_string()));
        }

        if let Some(seasons) = request.seasons {
            if seasons.is_empty() {
                return Err(AppError::InvalidInput(
                    "Series must contain at least one season".to_string(),
                ));
            }
            self.seasons = normalize_seasons(seasons)?;
        }

        self.external_id = request
            .external_id
            .or_else(|| request.external_link.as_deref().and_then(parse_external_id));
        self.title = request.title;
        self.external_link = request.external_link;
        self.comment = request.comment;
        self.cover_image = request.cover_image;
        self.genres = request.genres;
        self.added_by = request.added_by;
        if let Some(priority) = request.priority {
            self.priority = priority;
        }

        Ok(self.with_derived_status())
    }

    /// Resolves the id to query the provider with: the stored id first,
    /// then whatever the link encodes.
    pub fn resolve_external_id(&self) -> Option<u64> {
        self.external_id
            .or_else(|| self.external_link.as_deref().and_then(parse_external_id))
    }

    /// Highest season number currently tracked, 0 when there are none
    pub fn max_season_number(&self) -> u32 {
        self.seasons
            .iter()
            .map(|s| s.season_number)
            .max()
            .unwrap_or(0)
    }

    pub fn has_watched_season(&self) -> bool {
        self.seasons
            .iter()
            .any(|s| s.watch_status == WatchStatus::Watched)
    }

    /// Recomputes `overall_watch_status` from the seasons.
    ///
    /// A fully watched series never keeps the new-seasons flag.
    pub fn with_derived_status(mut self) -> Self {
        let all_watched = !self.seasons.is_empty()
            && self
                .seasons
                .iter()
                .all(|s| s.watch_status == WatchStatus::Watched);

        if all_watched {
            self.overall_watch_status = WatchStatus::Watched;
            self.has_new_seasons = false;
        } else {
            self.overall_watch_status = WatchStatus::Unwatched;
        }
        self
    }

    /// Sets one season's status, creating the season when missing
    pub fn with_season_watch_status(
        mut self,
        season_number: u32,
        status: WatchStatus,
    ) -> AppResult<Self> {
        check_season_number(season_number)?;

        let mut by_number = self.season_map();
        by_number
            .entry(season_number)
            .or_insert_with(|| Season::unwatched(season_number))
            .watch_status = status;
        self.seasons = by_number.into_values().collect();

        Ok(self.with_derived_status())
    }

    /// Sets every season to the same status
    pub fn with_all_seasons(mut self, status: WatchStatus) -> Self {
        for season in &mut self.seasons {
            season.watch_status = status;
        }
        self.with_derived_status()
    }

    /// Appends the next sequential season, unwatched
    pub fn with_next_season(mut self) -> AppResult<Self> {
        let next = self
            .max_season_number()
            .checked_add(1)
            .filter(|n| *n <= MAX_PLAUSIBLE_SEASONS)
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Series cannot have more than {} seasons",
                    MAX_PLAUSIBLE_SEASONS
                ))
            })?;
        self.seasons.push(Season::unwatched(next));
        Ok(self.with_derived_status())
    }

    /// Drops the highest-numbered season. The last remaining season cannot be removed.
    pub fn without_last_season(mut self) -> AppResult<Self> {
        if self.seasons.len() <= 1 {
            return Err(AppError::InvalidInput(
                "Series must contain at least one season".to_string(),
            ));
        }
        let last = self.max_season_number();
        self.seasons.retain(|s| s.season_number != last);
        Ok(self.with_derived_status())
    }

    /// Season list keyed by number for O(1) diffing
    pub fn season_map(&self) -> BTreeMap<u32, Season> {
        self.seasons
            .iter()
            .map(|s| (s.season_number, *s))
            .collect()
    }

    /// Whether two snapshots differ in anything reconciliation writes,
    /// ignoring the reconciliation timestamp
    pub fn reconciliation_differs(&self, other: &Series) -> bool {
        self.seasons != other.seasons
            || self.has_new_seasons != other.has_new_seasons
            || self.total_available_seasons != other.total_available_seasons
            || self.series_status != other.series_status
            || self.overall_watch_status != other.overall_watch_status
            || self.external_id != other.external_id
    }
}

fn check_season_number(season_number: u32) -> AppResult<()> {
    if season_number == 0 {
        return Err(AppError::InvalidInput(
            "Season numbers start at 1".to_string(),
        ));
    }
    if season_number > MAX_PLAUSIBLE_SEASONS {
        return Err(AppError::InvalidInput(format!(
            "Season number {} exceeds the maximum of {}",
            season_number, MAX_PLAUSIBLE_SEASONS
        )));
    }
    Ok(())
}

/// Validates client-supplied seasons and orders them by number
fn normalize_seasons(seasons: Vec<Season>) -> AppResult<Vec<Season>> {
    let mut by_number = BTreeMap::new();
    for season in seasons {
        check_season_number(season.season_number)?;
        if by_number.insert(season.season_number, season).is_some() {
            return Err(AppError::InvalidInput(format!(
                "Duplicate season number {}",
                season.season_number
            )));
        }
    }
    Ok(by_number.into_values().collect())
}
