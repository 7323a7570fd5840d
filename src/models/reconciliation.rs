use serde::{Deserialize, Serialize};

use super::series::MAX_PLAUSIBLE_SEASONS;

/// Season count and lifecycle text reported by the metadata provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonInfo {
    pub available_seasons: Option<i64>,
    pub status: Option<String>,
}

impl SeasonInfo {
    /// Reported season count clamped to `1..=MAX_PLAUSIBLE_SEASONS`, so a
    /// series always keeps a representable season list
    pub fn normalized_season_count(&self) -> u32 {
        match self.available_seasons {
            Some(n) if n >= 1 => u32::try_from(n)
                .unwrap_or(u32::MAX)
                .min(MAX_PLAUSIBLE_SEASONS),
            _ => 1,
        }
    }
}

/// Counters for one bulk reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReconciliationResult {
    pub total_processed: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub updated_count: u32,
}
