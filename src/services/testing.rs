use std::sync::Mutex;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Notification,
    services::notifications::NotificationEmitter,
};

/// Emitter that remembers every call and optionally fails them
#[derive(Default)]
pub struct RecordingEmitter {
    calls: Mutex<Vec<(Uuid, String, u32)>>,
    fail: bool,
}

impl RecordingEmitter {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::default(),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(Uuid, String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationEmitter for RecordingEmitter {
    async fn notify_new_seasons(
        &self,
        series_id: Uuid,
        series_title: &str,
        new_seasons_count: u32,
    ) -> AppResult<Notification> {
        self.calls
            .lock()
            .unwrap()
            .push((series_id, series_title.to_string(), new_seasons_count));

        if self.fail {
            return Err(AppError::Internal("notification sink offline".to_string()));
        }
        Ok(Notification::new_seasons(
            series_id,
            series_title,
            new_seasons_count,
            chrono::Utc::now(),
        ))
    }
}
