use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::cancel::SearchSupersession;
use crate::error::ApiError;
use crate::filters::SearchFilters;
use crate::rate_limit::{RateGate, DEFAULT_MIN_INTERVAL};
use crate::traits::{AnimeCatalog, AnimeSeason};
use crate::types::{self, AnimeDetail, Recommendation, ResultPage, SeasonArchiveEntry};

pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Results per page for search and season listings (the service maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 25;

const USER_AGENT: &str = concat!("kisetsu/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`JikanClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub min_request_interval: Duration,
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(15),
            min_request_interval: DEFAULT_MIN_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Jikan v4 REST client.
pub struct JikanClient {
    http: Client,
    config: ClientConfig,
    gate: Arc<RateGate>,
    searches: SearchSupersession,
}

impl JikanClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let gate = Arc::new(RateGate::new(config.min_request_interval));
        Self::with_gate(config, gate)
    }

    /// Build a client that draws from an existing rate budget.
    pub fn with_gate(config: ClientConfig, gate: Arc<RateGate>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            config,
            gate,
            searches: SearchSupersession::new(),
        })
    }

    pub fn gate(&self) -> Arc<RateGate> {
        self.gate.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Cancel the pending search, if any. It resolves as cancelled.
    pub fn cancel_search(&self) {
        self.searches.cancel();
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Check the HTTP response for errors, pulling the upstream message out
    /// of the error envelope when there is one.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = types::error_message(&body);
            tracing::warn!(
                status,
                message = message.as_deref().unwrap_or_default(),
                "anime API error"
            );
            Err(ApiError::from_status(status, message))
        }
    }

    /// GET through the rate gate and return the raw body.
    async fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, ApiError> {
        self.gate.acquire().await;
        tracing::debug!(url, ?query, "GET");

        let resp = self.http.get(url).query(query).send().await?;
        let resp = Self::check_response(resp).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}

impl AnimeCatalog for JikanClient {
    async fn search(
        &self,
        query: &str,
        page: u32,
        filters: &SearchFilters,
    ) -> Result<ResultPage, ApiError> {
        // Claim the slot before waiting on the gate so an older search
        // queued behind us is cancelled rather than sent.
        let ticket = self.searches.begin();

        let mut params = vec![
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("limit", self.config.page_size.to_string()),
        ];
        params.extend(filters.to_query_pairs());
        let url = self.endpoint("/anime");

        match ticket.run(self.fetch(&url, &params)).await {
            Ok(body) => types::parse_page(&body, page),
            Err(ApiError::NotFound) => Ok(ResultPage::empty(page)),
            Err(e) => {
                if e.is_cancelled() {
                    tracing::debug!(query, page, "search superseded");
                }
                Err(e)
            }
        }
    }

    async fn get_by_id(&self, id: u64) -> Result<AnimeDetail, ApiError> {
        let body = self.fetch(&self.endpoint(&format!("/anime/{id}/full")), &[]).await?;
        types::parse_single(&body)
    }

    async fn get_by_season(
        &self,
        year: u32,
        season: AnimeSeason,
        page: u32,
    ) -> Result<ResultPage, ApiError> {
        let url = self.endpoint(&format!("/seasons/{year}/{}", season.as_str()));
        let params = [
            ("page", page.to_string()),
            ("limit", self.config.page_size.to_string()),
        ];
        let body = self.fetch(&url, &params).await?;
        types::parse_page(&body, page)
    }

    async fn get_top(&self, limit: u32, page: u32) -> Result<ResultPage, ApiError> {
        let params = [("limit", limit.to_string()), ("page", page.to_string())];
        let body = self.fetch(&self.endpoint("/top/anime"), &params).await?;
        types::parse_page(&body, page)
    }

    async fn get_recommendations(&self, id: u64) -> Result<Vec<Recommendation>, ApiError> {
        let url = self.endpoint(&format!("/anime/{id}/recommendations"));
        let body = self.fetch(&url, &[]).await?;
        types::parse_list(&body)
    }

    async fn list_available_seasons(&self) -> Result<Vec<SeasonArchiveEntry>, ApiError> {
        let body = self.fetch(&self.endpoint("/seasons"), &[]).await?;
        types::parse_season_archive(&body)
    }
}
