use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Candidate, RecommendationResponse, WatchStatus},
    services::clock::Clock,
};

/// Multiplier applied to series with freshly detected seasons
pub const NEW_SEASONS_BOOST: f64 = 10.0;

/// Sampling weight of a candidate.
///
/// `ln(days_old + 2) + 1` is always above 1, so even brand-new items can be
/// drawn. A positive priority multiplies by `1 + priority`; new seasons
/// multiply by [`NEW_SEASONS_BOOST`].
pub fn candidate_weight(days_old: i64, priority: i32, has_new_seasons: bool) -> f64 {
    let mut weight = (days_old.max(0) as f64 + 2.0).ln() + 1.0;
    if priority > 0 {
        weight *= 1.0 + f64::from(priority);
    }
    if has_new_seasons {
        weight *= NEW_SEASONS_BOOST;
    }
    weight
}

/// Whole days between `date_added` and `now`, never negative
pub fn days_old(date_added: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - date_added).num_days().max(0)
}

/// Index of the first weight whose running total reaches `r`, for `r`
/// drawn uniformly from `[0, total)`
fn pick_index<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || !(total > 0.0) {
        return None;
    }

    let r = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative >= r {
            return Some(i);
        }
    }
    // float accumulation can land just short of `r`
    Some(weights.len() - 1)
}

/// Weighted-random pick over unwatched candidates
pub struct WeightedRecommendationSelector {
    clock: Arc<dyn Clock>,
}

impl WeightedRecommendationSelector {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn weight(&self, candidate: &Candidate) -> f64 {
        self.weight_at(candidate, self.clock.now())
    }

    fn weight_at(&self, candidate: &Candidate, now: DateTime<Utc>) -> f64 {
        candidate_weight(
            days_old(candidate.date_added, now),
            candidate.priority,
            candidate.has_new_seasons,
        )
    }

    /// Draws one candidate. Walks `candidates` in the given order, so a
    /// seeded `rng` makes the draw reproducible.
    pub fn select_one<'a, R: Rng>(
        &self,
        candidates: &'a [Candidate],
        rng: &mut R,
    ) -> AppResult<(&'a Candidate, f64)> {
        let now = self.clock.now();
        let weights: Vec<f64> = candidates.iter().map(|c| self.weight_at(c, now)).collect();

        let index = pick_index(&weights, rng).ok_or(AppError::NoUnwatchedContent)?;
        Ok((&candidates[index], weights[index]))
    }

    /// Draws up to `count` distinct candidates, in draw order
    pub fn select_many<R: Rng>(
        &self,
        mut candidates: Vec<Candidate>,
        count: usize,
        rng: &mut R,
    ) -> AppResult<Vec<(Candidate, f64)>> {
        if candidates.is_empty() {
            return Err(AppError::NoUnwatchedContent);
        }

        let now = self.clock.now();
        let mut weights: Vec<f64> = candidates.iter().map(|c| self.weight_at(c, now)).collect();
        let mut picked = Vec::with_capacity(count.min(candidates.len()));

        while picked.len() < count {
            let Some(index) = pick_index(&weights, rng) else {
                break;
            };
            let weight = weights.remove(index);
            picked.push((candidates.remove(index), weight));
        }

        Ok(picked)
    }
}

/// Builds the candidate pool from the catalog and draws from it
pub struct RecommendationService {
    store: Arc<dyn CatalogStore>,
    selector: WeightedRecommendationSelector,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            selector: WeightedRecommendationSelector::new(clock),
        }
    }

    /// Unwatched movies followed by unwatched series, optionally limited to
    /// items added by one person (case-insensitive)
    pub async fn candidates(&self, added_by: Option<&str>) -> AppResult<Vec<Candidate>> {
        let movies = self.store.all_movies().await?;
        let series = self.store.all_series().await?;

        let matches_added_by = |value: &Option<String>| match added_by {
            Some(wanted) => value
                .as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case(wanted.trim())),
            None => true,
        };

        let candidates = movies
            .iter()
            .filter(|m| m.watch_status == WatchStatus::Unwatched && matches_added_by(&m.added_by))
            .map(Candidate::from)
            .chain(
                series
                    .iter()
                    .filter(|s| {
                        s.overall_watch_status == WatchStatus::Unwatched
                            && matches_added_by(&s.added_by)
                    })
                    .map(Candidate::from),
            )
            .collect();

        Ok(candidates)
    }

    pub async fn recommend(
        &self,
        count: usize,
        added_by: Option<&str>,
    ) -> AppResult<Vec<RecommendationResponse>> {
        if count == 0 {
            return Err(AppError::InvalidInput(
                "Recommendation count must be at least 1".to_string(),
            ));
        }

        let added_by = added_by.map(str::trim).filter(|s| !s.is_empty());
        let candidates = self.candidates(added_by).await?;
        let pool_size = candidates.len();

        let picked = self
            .selector
            .select_many(candidates, count, &mut rand::rng())?;

        tracing::info!(
            requested = count,
            returned = picked.len(),
            pool_size,
            added_by = added_by.unwrap_or_default(),
            "Recommendations selected"
        );

        Ok(picked
            .into_iter()
            .map(|(candidate, weight)| RecommendationResponse::new(candidate, weight))
            .collect())
    }
}
