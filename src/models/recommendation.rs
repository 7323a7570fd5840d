use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ContentType, Movie, Series};

/// An unwatched movie or series eligible for recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: Uuid,
    pub kind: ContentType,
    pub title: String,
    pub link: Option<String>,
    pub added_by: Option<String>,
    pub date_added: DateTime<Utc>,
    pub priority: i32,
    /// Always false for movies
    pub has_new_seasons: bool,
    pub total_available_seasons: Option<u32>,
}

impl From<&Movie> for Candidate {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            kind: ContentType::Movie,
            title: movie.title.clone(),
            link: movie.link.clone(),
            added_by: movie.added_by.clone(),
            date_added: movie.date_added,
            priority: movie.priority,
            has_new_seasons: false,
            total_available_seasons: None,
        }
    }
}

impl From<&Series> for Candidate {
    fn from(series: &Series) -> Self {
        Self {
            id: series.id,
            kind: ContentType::Series,
            title: series.title.clone(),
            link: series.external_link.clone(),
            added_by: series.added_by.clone(),
            date_added: series.date_added,
            priority: series.priority,
            has_new_seasons: series.has_new_seasons,
            total_available_seasons: series.total_available_seasons,
        }
    }
}

/// A recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub id: Uuid,
    pub content_type: ContentType,
    pub title: String,
    pub link: Option<String>,
    pub added_by: Option<String>,
    pub priority: i32,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_new_seasons: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_available_seasons: Option<u32>,
}

impl RecommendationResponse {
    pub fn new(candidate: Candidate, weight: f64) -> Self {
        let has_new_seasons = match candidate.kind {
            ContentType::Series => Some(candidate.has_new_seasons),
            ContentType::Movie => None,
        };
        Self {
            id: candidate.id,
            content_type: candidate.kind,
            title: candidate.title,
            link: candidate.link,
            added_by: candidate.added_by,
            priority: candidate.priority,
            weight,
            has_new_seasons,
            total_available_seasons: candidate.total_available_seasons,
        }
    }
}
