use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::models::RateLimitState;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("github-account-sync/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// One page of a paginated GitHub listing
#[derive(Debug)]
pub struct Page<T> {
    pub number: u32,
    pub items: Vec<T>,
    /// Set when the page came back shorter than requested, or empty
    pub is_last: bool,
    pub rate_limit: Option<RateLimitState>,
}

/// Token-scoped GitHub REST client. One is built per sync run.
pub struct GitHubClient {
    client: Client,
    token: String,
    base_url: String,
    per_page: u32,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        Self::with_config(token, &SyncConfig::default())
    }

    pub fn with_config(token: String, config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(GitHubClient {
            client,
            token,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
        })
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Absolute URL for `endpoint` (which may carry its own query) at `page`
    pub fn page_url(&self, endpoint: &str, page: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn make_request(&self, url: Url) -> Result<Response> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", ACCEPT)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SyncError::UpstreamError {
                status: status.as_u16(),
                message: if message.is_empty() {
                    format!("GET {}", url.path())
                } else {
                    message
                },
            });
        }

        Ok(response)
    }

    /// Rate limit headers of a response, if GitHub sent them
    pub fn rate_limit_state(&self, response: &Response) -> Option<RateLimitState> {
        let headers = response.headers();
        let header = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

        let remaining = header("X-RateLimit-Remaining")?.parse::<u32>().ok()?;

        let limit = header("X-RateLimit-Limit")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(5000);

        let reset_time = header("X-RateLimit-Reset")
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
            .unwrap_or_else(|| Utc::now() + chrono::Duration::hours(1));

        Some(RateLimitState {
            remaining,
            limit,
            reset_time,
            is_limited: remaining == 0,
        })
    }

    /// Fetch a single page of `endpoint`.
    ///
    /// A non-2xx response is an `UpstreamError` and is not retried. A body
    /// that is not a JSON array is treated as an empty, final page.
    pub async fn fetch_page<T: DeserializeOwned>(&self, endpoint: &str, page: u32) -> Result<Page<T>> {
        let url = self.page_url(endpoint, page)?;
        let response = self.make_request(url).await?;
        let rate_limit = self.rate_limit_state(&response);

        if let Some(ref state) = rate_limit {
            if state.remaining < 10 {
                warn!(
                    remaining = state.remaining,
                    reset_time = %state.reset_time,
                    "GitHub rate limit running low"
                );
            }
        }

        let bytes = response.bytes().await?;
        let body: serde_json::Value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        let items: Vec<T> = match body {
            serde_json::Value::Array(_) => serde_json::from_value(body)?,
            _ => {
                debug!(endpoint, page, "Non-array body, treating as last page");
                Vec::new()
            }
        };

        let is_last = items.len() < self.per_page as usize;
        Ok(Page {
            number: page,
            items,
            is_last,
            rate_limit,
        })
    }
}
