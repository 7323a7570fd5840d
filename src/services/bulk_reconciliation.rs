use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{BulkReconciliationResult, Series},
    services::{
        job_lock::{JobLock, RECONCILIATION_JOB_KEY},
        reconciler::SeasonReconciler,
    },
};

/// Reconciles the whole catalog, one series at a time by default.
///
/// A run never fails because of a single series: per-series errors are
/// logged and counted. Only one run may be in flight per job lock.
pub struct BulkReconciliationRunner {
    store: Arc<dyn CatalogStore>,
    reconciler: Arc<SeasonReconciler>,
    job_lock: Arc<dyn JobLock>,
    concurrency: usize,
}

impl BulkReconciliationRunner {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        reconciler: Arc<SeasonReconciler>,
        job_lock: Arc<dyn JobLock>,
    ) -> Self {
        Self {
            store,
            reconciler,
            job_lock,
            concurrency: 1,
        }
    }

    /// Number of series reconciled at once; clamped to at least 1
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Reconciles every stored series.
    ///
    /// Fails with `ReconciliationInProgress` when another run holds the job
    /// lock, and with the store error when the series cannot be listed.
    pub async fn run_all(&self) -> AppResult<BulkReconciliationResult> {
        let lease = self
            .job_lock
            .try_acquire(RECONCILIATION_JOB_KEY)
            .await?
            .ok_or(AppError::ReconciliationInProgress)?;

        tracing::info!(concurrency = self.concurrency, "Starting bulk reconciliation");
        let outcome = self.run_locked().await;

        if let Err(e) = lease.release().await {
            tracing::warn!(error = %e, "Failed to release reconciliation job lock");
        }

        let result = outcome?;
        tracing::info!(
            total = result.total_processed,
            succeeded = result.success_count,
            failed = result.failure_count,
            updated = result.updated_count,
            "Bulk reconciliation finished"
        );
        Ok(result)
    }

    async fn run_locked(&self) -> AppResult<BulkReconciliationResult> {
        let all_series = self.store.all_series().await?;

        let result = stream::iter(all_series)
            .map(|series| async move {
                let outcome = self.reconciler.reconcile(&series).await;
                (series, outcome)
            })
            .buffer_unordered(self.concurrency)
            .fold(
                BulkReconciliationResult::default(),
                |mut result, (before, outcome)| async move {
                    record_outcome(&mut result, &before, outcome);
                    result
                },
            )
            .await;

        Ok(result)
    }
}

fn record_outcome(
    result: &mut BulkReconciliationResult,
    before: &Series,
    outcome: AppResult<Series>,
) {
    result.total_processed += 1;
    match outcome {
        Ok(after) => {
            result.success_count += 1;
            if before.reconciliation_differs(&after) {
                result.updated_count += 1;
            }
        }
        Err(e) => {
            result.failure_count += 1;
            tracing::warn!(
                series_id = %before.id,
                title = %before.title,
                error = %e,
                "Failed to reconcile series"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InMemoryStore,
        models::{SeasonInfo, SeriesRequest},
        services::{
            clock::FixedClock, job_lock::LocalJobLock, providers::MockMetadataProvider,
            testing::RecordingEmitter,
        },
    };
    use chrono::Utc;

    async fn seed(store: &InMemoryStore, title: &str, external_id: Option<u64>) -> Series {
        let series = Series::from_request(
            SeriesRequest {
                title: title.to_string(),
                external_id,
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        store.save_series(series).await.unwrap()
    }

    fn runner(
        store: Arc<InMemoryStore>,
        provider: MockMetadataProvider,
        job_lock: Arc<LocalJobLock>,
    ) -> BulkReconciliationRunner {
        let reconciler = SeasonReconciler::new(
            store.clone(),
            Arc::new(provider),
            Arc::new(RecordingEmitter::default()),
            Arc::new(FixedClock(Utc::now())),
        );
        BulkReconciliationRunner::new(store, Arc::new(reconciler), job_lock)
    }

    fn provider() -> MockMetadataProvider {
        let mut provider = MockMetadataProvider::new();
        provider.expect_series_season_info().returning(|id| match id {
            500 => Err(AppError::ExternalProvider {
                external_id: id,
                message: "TMDB returned status 500".to_string(),
            }),
            // unchanged count for a single-season series
            1 => Ok(SeasonInfo {
                available_seasons: Some(1),
                status: None,
            }),
            _ => Ok(SeasonInfo {
                available_seasons: Some(3),
                status: Some("Returning Series".to_string()),
            }),
        });
        provider
    }

    #[tokio::test]
    async fn test_run_all_counts_failures_without_aborting() {
        let store = Arc::new(InMemoryStore::new());
        let grows = seed(&store, "Severance", Some(95396)).await;
        seed(&store, "Broken", Some(500)).await;
        seed(&store, "No Reference", None).await;

        let runner = runner(store.clone(), provider(), Arc::new(LocalJobLock::new()));
        let result = runner.run_all().await.unwrap();

        assert_eq!(result.total_processed, 3);
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 2);
        assert_eq!(result.updated_count, 1);
        assert_eq!(store.get_series(grows.id).await.unwrap().seasons.len(), 3);
    }

    #[tokio::test]
    async fn test_run_all_counts_unchanged_series_as_not_updated() {
        let store = Arc::new(InMemoryStore::new());
        let stable = seed(&store, "Stable", Some(1)).await;

        let runner = runner(store.clone(), provider(), Arc::new(LocalJobLock::new()));

        let first = runner.run_all().await.unwrap();
        assert_eq!(first.success_count, 1);
        // total_available_seasons is recorded the first time
        assert_eq!(first.updated_count, 1);

        let second = runner.run_all().await.unwrap();
        assert_eq!(second.success_count, 1);
        assert_eq!(second.updated_count, 0);

        let stored = store.get_series(stable.id).await.unwrap();
        assert_eq!(stored.total_available_seasons, Some(1));
        assert!(!stored.has_new_seasons);
    }

    #[tokio::test]
    async fn test_run_all_concurrent_matches_sequential() {
        let store = Arc::new(InMemoryStore::new());
        for i in 0..8 {
            seed(&store, &format!("Series {}", i), Some(100 + i)).await;
        }
        seed(&store, "Broken", Some(500)).await;

        let runner =
            runner(store.clone(), provider(), Arc::new(LocalJobLock::new())).with_concurrency(4);
        let result = runner.run_all().await.unwrap();

        assert_eq!(result.total_processed, 9);
        assert_eq!(result.success_count, 8);
        assert_eq!(result.failure_count, 1);
    }

    #[tokio::test]
    async fn test_run_all_empty_catalog() {
        let runner = runner(
            Arc::new(InMemoryStore::new()),
            MockMetadataProvider::new(),
            Arc::new(LocalJobLock::new()),
        );
        assert_eq!(
            runner.run_all().await.unwrap(),
            BulkReconciliationResult::default()
        );
    }

    #[tokio::test]
    async fn test_run_all_rejects_overlapping_runs() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "Severance", Some(95396)).await;
        let job_lock = Arc::new(LocalJobLock::new());
        let runner = runner(store, provider(), job_lock.clone());

        let held = job_lock
            .try_acquire(RECONCILIATION_JOB_KEY)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            runner.run_all().await,
            Err(AppError::ReconciliationInProgress)
        ));

        held.release().await.unwrap();
        assert_eq!(runner.run_all().await.unwrap().total_processed, 1);
    }
}
