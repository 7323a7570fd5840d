use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert that a followed series has new seasons
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub series_id: Uuid,
    pub series_title: String,
    pub message: String,
    pub new_seasons_count: u32,
    pub created_at: DateTime<Utc>,
    pub dismissed: bool,
}

impl Notification {
    pub fn new_seasons(
        series_id: Uuid,
        series_title: &str,
        new_seasons_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let plural = if new_seasons_count > 1 { "s" } else { "" };
        Self {
            id: Uuid::new_v4(),
            series_id,
            series_title: series_title.to_string(),
            message: format!("New season{} available for {}", plural, series_title),
            new_seasons_count,
            created_at: now,
            dismissed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_pluralization() {
        let one = Notification::new_seasons(Uuid::new_v4(), "Dark", 1, Utc::now());
        assert_eq!(one.message, "New season available for Dark");

        let many = Notification::new_seasons(Uuid::new_v4(), "Dark", 2, Utc::now());
        assert_eq!(many.message, "New seasons available for Dark");
        assert!(!many.dismissed);
    }
}
