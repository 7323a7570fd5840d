use std::sync::Arc;

use crate::{
    db::{CatalogStore, NotificationStore},
    services::{
        BulkReconciliationRunner, CatalogService, Clock, JobLock, KeyedMutex, MetadataProvider,
        NotificationService, RecommendationService, ReconciliationTrigger, SeasonReconciler,
        StoreNotificationEmitter,
    },
};

/// Collaborators the services are wired from
pub struct AppDependencies {
    pub catalog_store: Arc<dyn CatalogStore>,
    pub notification_store: Arc<dyn NotificationStore>,
    pub provider: Arc<dyn MetadataProvider>,
    pub job_lock: Arc<dyn JobLock>,
    pub clock: Arc<dyn Clock>,
    pub reconcile_concurrency: usize,
    pub notify_unstarted_series: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub recommendations: Arc<RecommendationService>,
    pub notifications: Arc<NotificationService>,
    pub trigger: Arc<ReconciliationTrigger>,
    /// Also driven by the scheduler
    pub runner: Arc<BulkReconciliationRunner>,
}

impl AppState {
    pub fn new(deps: AppDependencies) -> Self {
        let series_locks = Arc::new(KeyedMutex::new());

        let emitter = Arc::new(StoreNotificationEmitter::new(
            deps.notification_store.clone(),
            deps.clock.clone(),
        ));
        let reconciler = Arc::new(
            SeasonReconciler::new(
                deps.catalog_store.clone(),
                deps.provider,
                emitter,
                deps.clock.clone(),
            )
            .with_series_locks(series_locks.clone())
            .with_notify_unstarted_series(deps.notify_unstarted_series),
        );
        let runner = Arc::new(
            BulkReconciliationRunner::new(deps.catalog_store.clone(), reconciler.clone(), deps.job_lock)
                .with_concurrency(deps.reconcile_concurrency),
        );

        Self {
            catalog: Arc::new(CatalogService::new(
                deps.catalog_store.clone(),
                deps.clock.clone(),
                series_locks,
            )),
            recommendations: Arc::new(RecommendationService::new(
                deps.catalog_store,
                deps.clock,
            )),
            notifications: Arc::new(NotificationService::new(deps.notification_store)),
            trigger: Arc::new(ReconciliationTrigger::new(reconciler, runner.clone())),
            runner,
        }
    }
}
