//! Search backends and the paginating search client.
//!
//! A [`SearchBackend`] answers one page of results for a query. The
//! [`SearchClient`] walks pages in fixed-size chunks and turns per-page
//! failures into a truncated [`SearchOutcome`] instead of an error.

mod google;

pub use google::GoogleSearchBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SearchError;

/// One ranked result item from a search backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title.
    #[serde(default)]
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Result snippet.
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    /// Creates a new hit.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Protocol for a paginated search API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Fetches one page of results starting at the zero-based `offset`.
    async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

/// Hits gathered for one query, plus how pagination ended.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Hits in backend order, at most `max_results`.
    pub hits: Vec<SearchHit>,
    /// Number of pages that returned successfully.
    pub pages: usize,
    /// The error that cut pagination short, if any.
    pub error: Option<SearchError>,
}

impl SearchOutcome {
    /// Whether the first page already failed.
    #[must_use]
    pub fn failed_immediately(&self) -> bool {
        self.pages == 0 && self.error.is_some()
    }
}

/// Pages through a [`SearchBackend`].
#[derive(Debug)]
pub struct SearchClient<B> {
    backend: B,
    page_size: usize,
}

impl<B: SearchBackend> SearchClient<B> {
    /// Creates a client requesting `page_size` results per page.
    #[must_use]
    pub fn new(backend: B, page_size: usize) -> Self {
        Self {
            backend,
            page_size: page_size.max(1),
        }
    }

    /// The underlying backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gathers up to `max_results` hits for `query`.
    ///
    /// Stops on a short page (end of results) or on the first page error;
    /// hits gathered before the error are kept.
    pub async fn search(&self, query: &str, max_results: usize) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();

        while outcome.hits.len() < max_results {
            let offset = outcome.pages * self.page_size;
            match self.backend.fetch_page(query, offset, self.page_size).await {
                Ok(items) => {
                    outcome.pages += 1;
                    let short_page = items.len() < self.page_size;
                    debug!(query, offset, count = items.len(), "Search page received");
                    outcome.hits.extend(items);
                    if short_page {
                        break;
                    }
                }
                Err(err) => {
                    warn!(query, offset, error = %err, "Search page failed; keeping earlier hits");
                    outcome.error = Some(err);
                    break;
                }
            }
        }

        outcome.hits.truncate(max_results);
        outcome
    }
}
