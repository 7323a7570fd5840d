use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Season, SeasonInfo, Series, SeriesStatus, MAX_PLAUSIBLE_SEASONS},
    services::{
        clock::Clock, job_lock::KeyedMutex, notifications::NotificationEmitter,
        providers::MetadataProvider,
    },
};

/// What a reconciliation changed in the season list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonDiff {
    pub previous_max_season: u32,
    pub available_seasons: u32,
    pub added: Vec<u32>,
    pub removed: Vec<u32>,
}

impl SeasonDiff {
    pub fn new_seasons_detected(&self) -> bool {
        self.available_seasons > self.previous_max_season
    }

    /// Seasons beyond the previously known maximum
    pub fn new_seasons_count(&self) -> u32 {
        self.available_seasons.saturating_sub(self.previous_max_season)
    }
}

/// Rewrites a series snapshot to match the provider's view.
///
/// Existing seasons keep their watch state; seasons above the reported
/// count are dropped; missing ones are added unwatched. `has_new_seasons`
/// is overwritten on every call, so a flag set by an earlier run is
/// cleared when the count has not grown since.
pub fn reconcile_seasons(
    series: &Series,
    resolved_external_id: u64,
    info: &SeasonInfo,
    now: DateTime<Utc>,
) -> (Series, SeasonDiff) {
    let available = info.normalized_season_count();
    let previous_max_season = series.max_season_number();

    let mut by_number = series.season_map();
    let removed: Vec<u32> = by_number.split_off(&(available + 1)).into_keys().collect();

    let mut added = Vec::new();
    for number in 1..=available {
        by_number.entry(number).or_insert_with(|| {
            added.push(number);
            Season::unwatched(number)
        });
    }

    let diff = SeasonDiff {
        previous_max_season,
        available_seasons: available,
        added,
        removed,
    };

    let mut updated = series.clone();
    updated.seasons = by_number.into_values().collect();
    updated.has_new_seasons = diff.new_seasons_detected();
    updated.total_available_seasons = Some(available);
    updated.series_status = info.status.as_deref().and_then(SeriesStatus::from_external);
    updated.last_reconciled_at = Some(now);
    if updated.external_id.is_none() {
        updated.external_id = Some(resolved_external_id);
    }

    (updated.with_derived_status(), diff)
}

/// Synchronises one series with the metadata provider and persists it
pub struct SeasonReconciler {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn MetadataProvider>,
    notifier: Arc<dyn NotificationEmitter>,
    clock: Arc<dyn Clock>,
    series_locks: Arc<KeyedMutex<Uuid>>,
    notify_unstarted_series: bool,
}

impl SeasonReconciler {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        provider: Arc<dyn MetadataProvider>,
        notifier: Arc<dyn NotificationEmitter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            provider,
            notifier,
            clock,
            series_locks: Arc::new(KeyedMutex::new()),
            notify_unstarted_series: false,
        }
    }

    /// Shares per-series locks with other writers of series documents
    pub fn with_series_locks(mut self, series_locks: Arc<KeyedMutex<Uuid>>) -> Self {
        self.series_locks = series_locks;
        self
    }

    /// Also notify for series without any watched season
    pub fn with_notify_unstarted_series(mut self, enabled: bool) -> Self {
        self.notify_unstarted_series = enabled;
        self
    }

    /// Loads the series by id and reconciles it
    pub async fn reconcile_by_id(&self, id: Uuid) -> AppResult<Series> {
        let series = self.store.get_series(id).await?;
        self.reconcile(&series).await
    }

    /// Reconciles `series` and returns the persisted result.
    ///
    /// Reconciliations of the same series are serialised, and the latest
    /// stored document is re-read under that lock so that edits made after
    /// `series` was loaded are kept. Nothing is written on failure.
    pub async fn reconcile(&self, series: &Series) -> AppResult<Series> {
        let _guard = self.series_locks.lock(&series.id).await?;
        let current = self.store.get_series(series.id).await?;

        let external_id = current
            .resolve_external_id()
            .ok_or(AppError::MissingExternalReference {
                series_id: current.id,
            })?;

        tracing::debug!(series_id = %current.id, external_id, "Reconciling series");

        let info = self.provider.series_season_info(external_id).await?;
        if let Some(count) = info.available_seasons {
            if count > i64::from(MAX_PLAUSIBLE_SEASONS) {
                return Err(AppError::ExternalProvider {
                    external_id,
                    message: format!("Implausible season count {}", count),
                });
            }
        }

        let (updated, diff) = reconcile_seasons(&current, external_id, &info, self.clock.now());
        let saved = self.store.save_series(updated).await?;

        tracing::info!(
            series_id = %saved.id,
            external_id,
            available_seasons = diff.available_seasons,
            added = ?diff.added,
            removed = ?diff.removed,
            has_new_seasons = saved.has_new_seasons,
            "Series reconciled"
        );

        if diff.new_seasons_detected()
            && (self.notify_unstarted_series || current.has_watched_season())
        {
            if let Err(e) = self
                .notifier
                .notify_new_seasons(saved.id, &saved.title, diff.new_seasons_count())
                .await
            {
                tracing::warn!(
                    series_id = %saved.id,
                    error = %e,
                    "Failed to record new season notification"
                );
            }
        }

        Ok(saved)
    }
}
