//! Scripted search backend and fetcher.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::{FetchError, SearchError};
use crate::fetch::{FetchedResource, Fetcher, ResourceContent};
use crate::search::{SearchBackend, SearchHit};

/// A search backend that pages through canned hit lists.
///
/// Unknown queries return an empty first page. A query with a scripted
/// failure fails on every page.
#[derive(Debug, Default)]
pub struct ScriptedSearchBackend {
    results: HashMap<String, Vec<SearchHit>>,
    failures: HashMap<String, SearchError>,
    fail_all: Option<SearchError>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedSearchBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every request fails.
    #[must_use]
    pub fn unreachable(error: SearchError) -> Self {
        Self {
            fail_all: Some(error),
            ..Self::default()
        }
    }

    /// Scripts the full hit list for `query`.
    #[must_use]
    pub fn with_hits(mut self, query: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        self.results.insert(query.into(), hits);
        self
    }

    /// Scripts a failure for `query`.
    #[must_use]
    pub fn with_failure(mut self, query: impl Into<String>, error: SearchError) -> Self {
        self.failures.insert(query.into(), error);
        self
    }

    /// Every `(query, offset)` requested so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().clone()
    }

    /// Distinct queries requested, in first-request order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        let mut queries: Vec<String> = Vec::new();
        for (query, _) in self.calls.lock().iter() {
            if !queries.contains(query) {
                queries.push(query.clone());
            }
        }
        queries
    }
}

#[async_trait]
impl SearchBackend for ScriptedSearchBackend {
    async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        page_size: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.lock().push((query.to_string(), offset));

        if let Some(err) = self.fail_all.as_ref().or_else(|| self.failures.get(query)) {
            return Err(err.clone());
        }
        let hits = self.results.get(query).map_or(&[][..], Vec::as_slice);
        let start = offset.min(hits.len());
        let end = offset.saturating_add(page_size).min(hits.len());
        Ok(hits[start..end].to_vec())
    }
}

/// A fetcher that answers from a URL table. Unknown URLs are a 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Result<ResourceContent, FetchError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    /// An empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a page whose extracted text is `text`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses
            .insert(url.into(), Ok(ResourceContent::Text(text.into())));
        self
    }

    /// Scripts a saved document.
    #[must_use]
    pub fn with_document(mut self, url: impl Into<String>, path: impl Into<PathBuf>, bytes: usize) -> Self {
        self.responses.insert(
            url.into(),
            Ok(ResourceContent::Document {
                path: path.into(),
                bytes,
            }),
        );
        self
    }

    /// Scripts a failure.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    /// URLs requested so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError> {
        self.calls.lock().push(url.to_string());

        let content = match self.responses.get(url) {
            Some(Ok(content)) => content.clone(),
            Some(Err(err)) => return Err(err.clone()),
            None => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
            }
        };

        Ok(FetchedResource {
            url: url.to_string(),
            final_url: url.to_string(),
            content_type: None,
            content,
            duration_ms: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(n: usize) -> Vec<SearchHit> {
        (0..n)
            .map(|i| SearchHit::new(format!("t{i}"), format!("https://a.com/{i}"), ""))
            .collect()
    }

    #[tokio::test]
    async fn test_scripted_backend_pages() {
        let backend = ScriptedSearchBackend::new().with_hits("q", hits(12));

        assert_eq!(backend.fetch_page("q", 0, 10).await.unwrap().len(), 10);
        assert_eq!(backend.fetch_page("q", 10, 10).await.unwrap().len(), 2);
        assert!(backend.fetch_page("q", 20, 10).await.unwrap().is_empty());
        assert!(backend.fetch_page("other", 0, 10).await.unwrap().is_empty());
        assert_eq!(backend.queries(), vec!["q".to_string(), "other".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_backend_failures() {
        let backend = ScriptedSearchBackend::new()
            .with_failure("bad", SearchError::Transport("reset".to_string()));
        assert!(backend.fetch_page("bad", 0, 10).await.is_err());
        assert!(backend.fetch_page("good", 0, 10).await.is_ok());

        let down = ScriptedSearchBackend::unreachable(SearchError::Transport("dns".to_string()));
        assert!(down.fetch_page("anything", 0, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_fetcher() {
        let fetcher = ScriptedFetcher::new()
            .with_page("https://a.com", "text")
            .with_failure(
                "https://b.com",
                FetchError::Timeout {
                    url: "https://b.com".to_string(),
                },
            );

        assert_eq!(fetcher.fetch("https://a.com").await.unwrap().text(), Some("text"));
        assert_eq!(fetcher.fetch("https://b.com").await.unwrap_err().kind(), "timeout");
        assert!(matches!(
            fetcher.fetch("https://c.com").await,
            Err(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(fetcher.calls().len(), 3);
    }
}
