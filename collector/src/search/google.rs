// Google Custom Search JSON API backend.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{SearchBackend, SearchHit};
use crate::config::{SearchConfig, SearchCredentials, MAX_PAGE_SIZE};
use crate::errors::{SearchError, SetupError};

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Search backend for the Google Custom Search JSON API.
#[derive(Debug, Clone)]
pub struct GoogleSearchBackend {
    client: reqwest::Client,
    endpoint: String,
    credentials: SearchCredentials,
}

impl GoogleSearchBackend {
    /// Creates a backend from configuration and credentials.
    ///
    /// Rejects a page size the API would not honour, so the paging client and
    /// the backend always agree on what a full page is.
    pub fn new(config: &SearchConfig, credentials: SearchCredentials) -> Result<Self, SetupError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SetupError::Config(format!("cannot build search HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl SearchBackend for GoogleSearchBackend {
    async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let start = (offset + 1).to_string();
        let num = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        debug!(query, start = start.as_str(), "Custom Search request");

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.credentials.api_key.as_str()),
                ("cx", self.credentials.engine_id.as_str()),
                ("q", query),
                ("start", start.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let data: CseResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.without_url().to_string()))?;

        Ok(data
            .items
            .into_iter()
            .filter(|item| !item.link.is_empty())
            .map(|item| SearchHit {
                title: item.title,
                url: item.link,
                snippet: item.snippet,
            })
            .collect())
    }
}
