/// TMDB provider
///
/// Reads `number_of_seasons` and `status` from `/tv/{id}`. Authenticates
/// with a v4 read access token sent as a bearer header.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::SeasonInfo,
    services::providers::MetadataProvider,
};

const LANGUAGE: &str = "en-US";

/// Subset of TMDB's TV details payload
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeriesDetails {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number_of_seasons: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl From<TmdbSeriesDetails> for SeasonInfo {
    fn from(details: TmdbSeriesDetails) -> Self {
        SeasonInfo {
            available_seasons: details.number_of_seasons,
            status: details.status,
        }
    }
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_token: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_token: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_token,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_details(&self, external_id: u64) -> AppResult<TmdbSeriesDetails> {
        let url = format!("{}/tv/{}", self.api_url, external_id);

        tracing::debug!(external_id, "Fetching series details from TMDB");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("language", LANGUAGE)])
            .send()
            .await
            .map_err(|e| AppError::ExternalProvider {
                external_id,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                external_id,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::ExternalProvider {
                external_id,
                message: format!("TMDB returned status {}: {}", status, body),
            });
        }

        response
            .json::<TmdbSeriesDetails>()
            .await
            .map_err(|e| AppError::ExternalProvider {
                external_id,
                message: format!("Invalid TMDB response: {}", e),
            })
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn series_season_info(&self, external_id: u64) -> AppResult<SeasonInfo> {
        let details = self.fetch_details(external_id).await?;

        tracing::info!(
            external_id,
            name = details.name.as_deref().unwrap_or_default(),
            seasons = ?details.number_of_seasons,
            status = ?details.status,
            provider = self.name(),
            "Series details fetched"
        );

        Ok(details.into())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
