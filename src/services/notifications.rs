use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::NotificationStore,
    error::AppResult,
    models::Notification,
    services::clock::Clock,
};

/// Records an alert when reconciliation finds new seasons
#[async_trait::async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn notify_new_seasons(
        &self,
        series_id: Uuid,
        series_title: &str,
        new_seasons_count: u32,
    ) -> AppResult<Notification>;
}

/// Emitter that persists notifications for the client to poll
pub struct StoreNotificationEmitter {
    store: Arc<dyn NotificationStore>,
    clock: Arc<dyn Clock>,
}

impl StoreNotificationEmitter {
    pub fn new(store: Arc<dyn NotificationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait::async_trait]
impl NotificationEmitter for StoreNotificationEmitter {
    async fn notify_new_seasons(
        &self,
        series_id: Uuid,
        series_title: &str,
        new_seasons_count: u32,
    ) -> AppResult<Notification> {
        let notification = Notification::new_seasons(
            series_id,
            series_title,
            new_seasons_count,
            self.clock.now(),
        );
        let saved = self.store.save_notification(notification).await?;

        tracing::info!(
            notification_id = %saved.id,
            series_id = %series_id,
            new_seasons_count,
            "New season notification created"
        );

        Ok(saved)
    }
}

/// Read and dismiss operations behind the notifications endpoints
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn active(&self) -> AppResult<Vec<Notification>> {
        let notifications = self.store.active_notifications().await?;
        tracing::debug!(count = notifications.len(), "Active notifications loaded");
        Ok(notifications)
    }

    /// Marks a notification dismissed. Dismissing twice is a no-op.
    pub async fn dismiss(&self, id: Uuid) -> AppResult<Notification> {
        let mut notification = self.store.get_notification(id).await?;
        if notification.dismissed {
            return Ok(notification);
        }

        notification.dismissed = true;
        let saved = self.store.save_notification(notification).await?;
        tracing::info!(notification_id = %id, "Notification dismissed");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::InMemoryStore, error::AppError, services::clock::FixedClock};
    use chrono::Utc;

    #[tokio::test]
    async fn test_emit_then_dismiss() {
        let store = Arc::new(InMemoryStore::new());
        let emitter = StoreNotificationEmitter::new(store.clone(), Arc::new(FixedClock(Utc::now())));
        let service = NotificationService::new(store.clone());

        let series_id = Uuid::new_v4();
        let created = emitter
            .notify_new_seasons(series_id, "The Bear", 2)
            .await
            .unwrap();
        assert_eq!(created.series_id, series_id);
        assert_eq!(created.new_seasons_count, 2);

        assert_eq!(service.active().await.unwrap().len(), 1);

        let dismissed = service.dismiss(created.id).await.unwrap();
        assert!(dismissed.dismissed);
        assert!(service.active().await.unwrap().is_empty());

        // idempotent
        assert!(service.dismiss(created.id).await.unwrap().dismissed);
    }

    #[tokio::test]
    async fn test_dismiss_unknown() {
        let service = NotificationService::new(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            service.dismiss(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
