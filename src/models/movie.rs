use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WatchStatus;
use crate::error::{AppError, AppResult};

/// A movie in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub link: Option<String>,
    pub comment: Option<String>,
    pub cover_image: Option<String>,
    /// Runtime in minutes
    pub length: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub watch_status: WatchStatus,
    #[serde(default)]
    pub priority: i32,
    pub added_by: Option<String>,
    pub date_added: DateTime<Utc>,
}

/// Payload for creating a movie
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieRequest {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub watch_status: Option<WatchStatus>,
    #[serde(default)]
    pub added_by: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl Movie {
    pub fn from_request(request: MovieRequest, now: DateTime<Utc>) -> AppResult<Self> {
        if request.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Movie title is required".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            title: request.title,
            link: request.link,
            comment: request.comment,
            cover_image: request.cover_image,
            length: request.length,
            genres: request.genres,
            watch_status: request.watch_status.unwrap_or_default(),
            priority: request.priority.unwrap_or(0),
            added_by: request.added_by,
            date_added: now,
        })
    }

    /// Replaces the editable fields. Id and `date_added` are kept; priority
    /// and watch status change only when supplied.
    pub fn with_update(mut self, request: MovieRequest) -> AppResult<Self> {
        if request.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Movie title is required".to_string()));
        }

        self.title = request.title;
        self.link = request.link;
        self.comment = request.comment;
        self.cover_image = request.cover_image;
        self.length = request.length;
        self.genres = request.genres;
        self.added_by = request.added_by;
        if let Some(priority) = request.priority {
            self.priority = priority;
        }
        if let Some(status) = request.watch_status {
            self.watch_status = status;
        }
        Ok(self)
    }
}
