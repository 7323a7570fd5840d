use chrono::Weekday;
use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. The in-memory store is used when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for the reconciliation run lock.
    /// The lock is held in-process when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB API read access token
    pub tmdb_api_token: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Per-request timeout for TMDB calls
    #[serde(default = "default_tmdb_timeout_secs")]
    pub tmdb_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Day of the week the periodic reconciliation fires on
    #[serde(default = "default_reconcile_weekday")]
    pub reconcile_weekday: Weekday,

    /// Hour of day (UTC) the periodic reconciliation fires at
    #[serde(default)]
    pub reconcile_hour: u32,

    #[serde(default)]
    pub reconcile_on_startup: bool,

    /// Number of series reconciled in parallel within one run
    #[serde(default = "default_reconcile_concurrency")]
    pub reconcile_concurrency: usize,

    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,

    /// Also notify for series the user has not started watching
    #[serde(default)]
    pub notify_unstarted_series: bool,

    /// Expiry of the Redis run lock, guarding against crashed holders
    #[serde(default = "default_reconcile_lock_ttl_secs")]
    pub reconcile_lock_ttl_secs: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_reconcile_weekday() -> Weekday {
    Weekday::Mon
}

fn default_reconcile_concurrency() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_reconcile_lock_ttl_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the scheduler and runner cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.reconcile_hour > 23 {
            anyhow::bail!(
                "RECONCILE_HOUR must be between 0 and 23, got {}",
                self.reconcile_hour
            );
        }
        if self.reconcile_concurrency == 0 {
            anyhow::bail!("RECONCILE_CONCURRENCY must be at least 1");
        }
        Ok(())
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref().filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        envy::from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[("TMDB_API_TOKEN", "token")]);

        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.port, 3000);
        assert_eq!(config.reconcile_weekday, Weekday::Mon);
        assert_eq!(config.reconcile_hour, 0);
        assert_eq!(config.reconcile_concurrency, 1);
        assert!(config.scheduler_enabled);
        assert!(!config.notify_unstarted_series);
        assert_eq!(config.database_url(), None);
        assert_eq!(config.redis_url(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("TMDB_API_TOKEN", "token"),
            ("RECONCILE_WEEKDAY", "Fri"),
            ("RECONCILE_HOUR", "6"),
            ("RECONCILE_CONCURRENCY", "4"),
            ("DATABASE_URL", "postgres://localhost/watchnext"),
        ]);

        assert_eq!(config.reconcile_weekday, Weekday::Fri);
        assert_eq!(config.reconcile_hour, 6);
        assert_eq!(config.reconcile_concurrency, 4);
        assert_eq!(config.database_url(), Some("postgres://localhost/watchnext"));
    }

    #[test]
    fn test_empty_urls_are_ignored() {
        let config = from_pairs(&[
            ("TMDB_API_TOKEN", "token"),
            ("DATABASE_URL", ""),
            ("REDIS_URL", ""),
        ]);

        assert_eq!(config.database_url(), None);
        assert_eq!(config.redis_url(), None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = from_pairs(&[("TMDB_API_TOKEN", "token")]);
        config.reconcile_hour = 24;
        assert!(config.validate().is_err());

        config.reconcile_hour = 3;
        config.reconcile_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
