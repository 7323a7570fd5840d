use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use serde::Serialize;
use tokio::{sync::oneshot, task::JoinHandle};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BulkReconciliationResult, Series},
    services::{
        bulk_reconciliation::BulkReconciliationRunner, clock::Clock, reconciler::SeasonReconciler,
    },
};

/// A weekly UTC fire time, e.g. Monday 00:00
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    weekday: Weekday,
    time: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, hour: u32) -> AppResult<Self> {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| {
            AppError::InvalidInput(format!("Schedule hour must be 0-23, got {}", hour))
        })?;
        Ok(Self { weekday, time })
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// First fire time strictly after `now`
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        (0..=7)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .filter(|date| date.weekday() == self.weekday)
            .map(|date| date.and_time(self.time).and_utc())
            .find(|at| *at > now)
            .unwrap_or_else(|| now + chrono::Duration::weeks(1))
    }
}

/// Runs the bulk reconciliation on a weekly schedule
pub struct ReconciliationScheduler {
    runner: Arc<BulkReconciliationRunner>,
    clock: Arc<dyn Clock>,
    schedule: WeeklySchedule,
    run_on_startup: bool,
}

/// Stops a spawned scheduler loop
pub struct SchedulerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the loop and waits for it to exit. A run already in flight
    /// finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Reconciliation scheduler task failed");
        }
    }
}

impl ReconciliationScheduler {
    pub fn new(
        runner: Arc<BulkReconciliationRunner>,
        clock: Arc<dyn Clock>,
        schedule: WeeklySchedule,
    ) -> Self {
        Self {
            runner,
            clock,
            schedule,
            run_on_startup: false,
        }
    }

    pub fn with_run_on_startup(mut self, enabled: bool) -> Self {
        self.run_on_startup = enabled;
        self
    }

    /// One scheduled run. Errors are logged, never returned; a run that
    /// overlaps another is skipped.
    pub async fn on_schedule_fire(&self) -> Option<BulkReconciliationResult> {
        match self.runner.run_all().await {
            Ok(result) => Some(result),
            Err(AppError::ReconciliationInProgress) => {
                tracing::info!("Reconciliation already running, skipping scheduled run");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled reconciliation failed");
                None
            }
        }
    }

    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            if self.run_on_startup {
                tracing::info!("Running startup reconciliation");
                self.on_schedule_fire().await;
            }

            loop {
                let now = self.clock.now();
                let next = self.schedule.next_fire_after(now);
                let delay = (next - now).to_std().unwrap_or_default();

                tracing::info!(next_run = %next, "Next reconciliation scheduled");

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        self.on_schedule_fire().await;
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Reconciliation scheduler stopped");
                        break;
                    }
                }
            }
        });

        SchedulerHandle { shutdown, task }
    }
}

/// What a manual trigger ran
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TriggerOutcome {
    Series(Box<Series>),
    Bulk(BulkReconciliationResult),
}

/// On-demand entry point for single-series and full refreshes
pub struct ReconciliationTrigger {
    reconciler: Arc<SeasonReconciler>,
    runner: Arc<BulkReconciliationRunner>,
}

impl ReconciliationTrigger {
    pub fn new(reconciler: Arc<SeasonReconciler>, runner: Arc<BulkReconciliationRunner>) -> Self {
        Self { reconciler, runner }
    }

    /// `Some(id)` reconciles that series and surfaces its error; `None`
    /// runs the whole catalog.
    pub async fn on_manual_trigger(&self, series_id: Option<Uuid>) -> AppResult<TriggerOutcome> {
        match series_id {
            Some(id) => {
                tracing::info!(series_id = %id, "Manual series reconciliation");
                let series = self.reconciler.reconcile_by_id(id).await?;
                Ok(TriggerOutcome::Series(Box::new(series)))
            }
            None => {
                tracing::info!("Manual bulk reconciliation");
                Ok(TriggerOutcome::Bulk(self.runner.run_all().await?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{CatalogStore, InMemoryStore},
        models::{SeasonInfo, SeriesRequest},
        services::{
            clock::FixedClock,
            job_lock::{JobLock, LocalJobLock, RECONCILIATION_JOB_KEY},
            providers::MockMetadataProvider,
            testing::RecordingEmitter,
        },
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_next_fire_after() {
        let monday_midnight = WeeklySchedule::new(Weekday::Mon, 0).unwrap();

        // 2024-06-05 is a Wednesday
        assert_eq!(
            monday_midnight.next_fire_after(at("2024-06-05T15:30:00Z")),
            at("2024-06-10T00:00:00Z")
        );
        // Exactly on the fire time moves to the following week
        assert_eq!(
            monday_midnight.next_fire_after(at("2024-06-03T00:00:00Z")),
            at("2024-06-10T00:00:00Z")
        );
        assert_eq!(
            monday_midnight.next_fire_after(at("2024-06-02T23:59:59Z")),
            at("2024-06-03T00:00:00Z")
        );

        let monday_evening = WeeklySchedule::new(Weekday::Mon, 18).unwrap();
        assert_eq!(
            monday_evening.next_fire_after(at("2024-06-03T09:00:00Z")),
            at("2024-06-03T18:00:00Z")
        );
    }

    #[test]
    fn test_invalid_hour() {
        assert!(matches!(
            WeeklySchedule::new(Weekday::Fri, 24),
            Err(AppError::InvalidInput(_))
        ));
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        reconciler: Arc<SeasonReconciler>,
        runner: Arc<BulkReconciliationRunner>,
        job_lock: Arc<LocalJobLock>,
        calls: Arc<AtomicUsize>,
    }

    async fn harness(now: DateTime<Utc>) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut provider = MockMetadataProvider::new();
        {
            let calls = calls.clone();
            provider.expect_series_season_info().returning(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(SeasonInfo {
                    available_seasons: Some(2),
                    status: Some("Ended".to_string()),
                })
            });
        }

        let store = Arc::new(InMemoryStore::new());
        let series = Series::from_request(
            SeriesRequest {
                title: "Mindhunter".to_string(),
                external_id: Some(67744),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        store.save_series(series).await.unwrap();

        let reconciler = Arc::new(SeasonReconciler::new(
            store.clone(),
            Arc::new(provider),
            Arc::new(RecordingEmitter::default()),
            Arc::new(FixedClock(now)),
        ));
        let job_lock = Arc::new(LocalJobLock::new());
        let runner = Arc::new(BulkReconciliationRunner::new(
            store.clone(),
            reconciler.clone(),
            job_lock.clone(),
        ));

        Harness {
            store,
            reconciler,
            runner,
            job_lock,
            calls,
        }
    }

    #[tokio::test]
    async fn test_on_schedule_fire_swallows_overlap() {
        let now = at("2024-06-02T00:00:00Z");
        let harness = harness(now).await;
        let scheduler = ReconciliationScheduler::new(
            harness.runner.clone(),
            Arc::new(FixedClock(now)),
            WeeklySchedule::new(Weekday::Mon, 0).unwrap(),
        );

        let held = harness
            .job_lock
            .try_acquire(RECONCILIATION_JOB_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(scheduler.on_schedule_fire().await, None);
        assert_eq!(harness.calls.load(Ordering::SeqCst), 0);

        held.release().await.unwrap();
        let result = scheduler.on_schedule_fire().await.unwrap();
        assert_eq!(result.success_count, 1);
    }

    /// Wall clock that moves with tokio's (paused) timer
    struct TimerClock {
        base: DateTime<Utc>,
        started: tokio::time::Instant,
    }

    impl TimerClock {
        fn starting_at(base: DateTime<Utc>) -> Self {
            Self {
                base,
                started: tokio::time::Instant::now(),
            }
        }
    }

    impl Clock for TimerClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + chrono::Duration::from_std(self.started.elapsed()).unwrap()
        }
    }

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_fires_weekly_until_shutdown() {
        // Sunday midnight; fires are due Monday 06-03 and Monday 06-10
        let now = at("2024-06-02T00:00:00Z");
        let harness = harness(now).await;
        let scheduler = Arc::new(ReconciliationScheduler::new(
            harness.runner.clone(),
            Arc::new(TimerClock::starting_at(now)),
            WeeklySchedule::new(Weekday::Mon, 0).unwrap(),
        ));

        let handle = scheduler.spawn();
        tokio::time::sleep(HOUR * 23).await;
        assert_eq!(harness.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(HOUR * 13).await;
        assert_eq!(harness.calls.load(Ordering::SeqCst), 1);

        // Still one run just before the following Monday
        tokio::time::sleep(HOUR * 150).await;
        assert_eq!(harness.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(HOUR * 12).await;
        assert_eq!(harness.calls.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
        tokio::time::sleep(HOUR * 24 * 8).await;
        assert_eq!(harness.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_on_startup() {
        let now = at("2024-06-02T00:00:00Z");
        let harness = harness(now).await;
        let scheduler = Arc::new(
            ReconciliationScheduler::new(
                harness.runner.clone(),
                Arc::new(FixedClock(now)),
                WeeklySchedule::new(Weekday::Mon, 0).unwrap(),
            )
            .with_run_on_startup(true),
        );

        let handle = scheduler.spawn();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(harness.calls.load(Ordering::SeqCst), 1);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_manual_trigger_single_and_bulk() {
        let now = at("2024-06-02T00:00:00Z");
        let harness = harness(now).await;
        let trigger = ReconciliationTrigger::new(harness.reconciler.clone(), harness.runner.clone());

        let id = harness.store.all_series().await.unwrap()[0].id;
        match trigger.on_manual_trigger(Some(id)).await.unwrap() {
            TriggerOutcome::Series(series) => {
                assert_eq!(series.seasons.len(), 2);
                assert!(series.has_new_seasons);
            }
            other => panic!("expected series outcome, got {:?}", other),
        }

        match trigger.on_manual_trigger(None).await.unwrap() {
            TriggerOutcome::Bulk(result) => {
                assert_eq!(result.total_processed, 1);
                assert_eq!(result.updated_count, 1);
            }
            other => panic!("expected bulk outcome, got {:?}", other),
        }

        assert!(matches!(
            trigger.on_manual_trigger(Some(Uuid::new_v4())).await,
            Err(AppError::NotFound(_))
        ));
    }
}
