use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod catalog;
pub mod movie;
pub mod notification;
pub mod recommendation;
pub mod reconciliation;
pub mod series;

pub use catalog::{CatalogFilter, CatalogItem, CatalogSort};
pub use movie::{Movie, MovieRequest};
pub use notification::Notification;
pub use recommendation::{Candidate, RecommendationResponse};
pub use reconciliation::{BulkReconciliationResult, SeasonInfo};
pub use series::{Season, Series, SeriesRequest, SeriesStatus, MAX_PLAUSIBLE_SEASONS};

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Movie,
    Series,
}

/// Watch state of a movie, a season, or (derived) a whole series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchStatus {
    Watched,
    #[default]
    Unwatched,
}

impl Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchStatus::Watched => write!(f, "WATCHED"),
            WatchStatus::Unwatched => write!(f, "UNWATCHED"),
        }
    }
}

/// Body of the watch-status edit endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct WatchStatusRequest {
    pub watch_status: WatchStatus,
}

/// Body of the priority edit endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PriorityRequest {
    pub priority: i32,
}
