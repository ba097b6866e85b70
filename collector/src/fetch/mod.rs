//! Retrieval of the content behind search hits.
//!
//! This module provides:
//! - The [`Fetcher`] protocol and its reqwest-backed [`HttpFetcher`]
//! - Visible-text extraction for HTML pages
//! - Document downloads to name-derived, content-addressed paths
//! - A fixed-interval politeness limiter

mod html;
mod politeness;

pub use html::{truncate_chars, visible_text};
pub use politeness::Politeness;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

use crate::config::FetchConfig;
use crate::errors::{FetchError, SetupError};

/// What a fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceContent {
    /// Decoded, markup-free text, capped at the configured length.
    Text(String),
    /// A binary document saved to disk.
    Document {
        /// Where the document was written.
        path: PathBuf,
        /// Size in bytes.
        bytes: usize,
    },
}

/// A fetched resource. Transient: dropped once fields are extracted.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// Content type from headers.
    pub content_type: Option<String>,
    /// The payload.
    pub content: ResourceContent,
    /// Time taken to fetch in milliseconds.
    pub duration_ms: f64,
}

impl FetchedResource {
    /// The text payload, if this was a page.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ResourceContent::Text(text) => Some(text),
            ResourceContent::Document { .. } => None,
        }
    }
}

/// Protocol for resource fetching.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a URL. Failures are values, never panics.
    async fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError>;
}

/// Fetcher over HTTP(S) with a politeness delay between requests.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
    politeness: Politeness,
}

impl HttpFetcher {
    /// Creates a fetcher from configuration.
    pub fn new(config: FetchConfig) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SetupError::Config(format!("cannot build fetch HTTP client: {e}")))?;

        Ok(Self {
            client,
            politeness: Politeness::new(config.politeness_delay()),
            config,
        })
    }

    /// Gets the configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn save_document(&self, url: &str, body: &[u8]) -> Result<PathBuf, FetchError> {
        let path = self.config.download_dir.join(document_file_name(url));
        let io_err = |e: std::io::Error| FetchError::Io {
            url: url.to_string(),
            path: path.display().to_string(),
            message: e.to_string(),
        };
        tokio::fs::create_dir_all(&self.config.download_dir)
            .await
            .map_err(io_err)?;
        tokio::fs::write(&path, body).await.map_err(io_err)?;
        Ok(path)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError> {
        self.politeness.wait().await;
        let started = Instant::now();

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());
        let kind = classify(url, content_type.as_deref(), &self.config.document_suffixes);

        let content = match kind {
            ContentKind::Document => {
                let body = resp.bytes().await.map_err(|e| FetchError::from_reqwest(url, &e))?;
                let path = self.save_document(url, &body).await?;
                ResourceContent::Document {
                    path,
                    bytes: body.len(),
                }
            }
            ContentKind::Html => {
                let body = resp.text().await.map_err(|e| FetchError::from_reqwest(url, &e))?;
                ResourceContent::Text(truncate_chars(visible_text(&body), self.config.max_text_chars))
            }
            ContentKind::PlainText => {
                let body = resp.text().await.map_err(|e| FetchError::from_reqwest(url, &e))?;
                ResourceContent::Text(truncate_chars(body, self.config.max_text_chars))
            }
            ContentKind::Unsupported => {
                return Err(FetchError::Unsupported {
                    url: url.to_string(),
                    content_type: content_type.unwrap_or_default(),
                });
            }
        };

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(url, duration_ms, "Fetched resource");

        Ok(FetchedResource {
            url: url.to_string(),
            final_url,
            content_type,
            content,
            duration_ms,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Document,
    Html,
    PlainText,
    Unsupported,
}

const DOCUMENT_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument",
];

fn classify(url: &str, content_type: Option<&str>, suffixes: &[String]) -> ContentKind {
    if is_document_url(url, suffixes) {
        return ContentKind::Document;
    }
    let Some(ct) = content_type else {
        return ContentKind::Html;
    };
    if DOCUMENT_TYPES.iter().any(|t| ct.starts_with(t)) {
        ContentKind::Document
    } else if ct.contains("html") {
        ContentKind::Html
    } else if ct.starts_with("text/") || ct.contains("json") || ct.contains("xml") {
        ContentKind::PlainText
    } else {
        ContentKind::Unsupported
    }
}

/// Whether the URL path ends with one of the document suffixes.
#[must_use]
pub fn is_document_url(url: &str, suffixes: &[String]) -> bool {
    let path = url::Url::parse(url).map_or_else(
        |_| url.split(['?', '#']).next().unwrap_or(url).to_string(),
        |parsed| parsed.path().to_string(),
    );
    let path = path.to_ascii_lowercase();
    suffixes
        .iter()
        .any(|suffix| path.ends_with(&suffix.to_ascii_lowercase()))
}

/// File name for a downloaded document: a 12-hex SHA-256 prefix of the URL
/// followed by the sanitized last path segment.
#[must_use]
pub fn document_file_name(url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let segment = url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(String::from))
        })
        .unwrap_or_default();
    let name: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let name = name.trim_matches('.');

    if name.is_empty() {
        format!("{}-document", &digest[..12])
    } else {
        format!("{}-{}", &digest[..12], name)
    }
}

/// Resolves where [`document_file_name`] would place a URL inside `dir`.
#[must_use]
pub fn document_path(dir: &Path, url: &str) -> PathBuf {
    dir.join(document_file_name(url))
}
