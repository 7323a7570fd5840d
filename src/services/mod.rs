pub mod bulk_reconciliation;
pub mod catalog;
pub mod clock;
pub mod job_lock;
pub mod notifications;
pub mod providers;
pub mod recommendations;
pub mod reconciler;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use bulk_reconciliation::BulkReconciliationRunner;
pub use catalog::CatalogService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use job_lock::{
    JobLease, JobLock, KeyedGuard, KeyedMutex, LocalJobLock, RECONCILIATION_JOB_KEY,
};
pub use notifications::{NotificationEmitter, NotificationService, StoreNotificationEmitter};
pub use providers::{MetadataProvider, TmdbProvider};
pub use recommendations::{RecommendationService, WeightedRecommendationSelector};
pub use reconciler::{reconcile_seasons, SeasonDiff, SeasonReconciler};
pub use scheduler::{
    ReconciliationScheduler, ReconciliationTrigger, SchedulerHandle, TriggerOutcome,
    WeeklySchedule,
};
