//! Configuration types for searching, fetching, extraction and output.
//!
//! A [`CollectorConfig`] is built once at process start (defaults, then an
//! optional JSON file, then CLI overrides) and handed to each component.
//! Credentials live in [`SearchCredentials`] and are never serialized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::SetupError;
use crate::extract::{default_rules, FieldRule};

/// Environment variable holding the search API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable holding the search engine id.
pub const ENGINE_ID_ENV: &str = "GOOGLE_CSE_ID";

/// Largest page the search API serves; it refuses `num` above ten.
pub const MAX_PAGE_SIZE: usize = 10;

/// Configuration for the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search API endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Number of results requested per page, at most [`MAX_PAGE_SIZE`].
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: f64,
}

fn default_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_page_size() -> usize {
    10
}

fn default_search_timeout() -> f64 {
    30.0
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_size: default_page_size(),
            timeout_seconds: default_search_timeout(),
        }
    }
}

impl SearchConfig {
    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Gets timeout as Duration. Unusable values fall back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_search_timeout()))
    }

    /// Checks the page size against the API limit and the timeout.
    pub fn validate(&self) -> Result<(), SetupError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(SetupError::Config(format!(
                "search.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        check_timeout("search.timeout_seconds", self.timeout_seconds)
    }
}

fn check_timeout(name: &str, seconds: f64) -> Result<(), SetupError> {
    if seconds.is_finite() && seconds > 0.0 {
        Ok(())
    } else {
        Err(SetupError::Config(format!(
            "{name} must be a positive number of seconds, got {seconds}"
        )))
    }
}

/// Credentials for the search backend.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchCredentials {
    /// API key.
    pub api_key: String,
    /// Search engine id (`cx`).
    pub engine_id: String,
}

impl SearchCredentials {
    /// Creates credentials, rejecting blank values.
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Result<Self, SetupError> {
        let api_key = api_key.into();
        let engine_id = engine_id.into();
        if api_key.trim().is_empty() {
            return Err(SetupError::MissingCredential(API_KEY_ENV.to_string()));
        }
        if engine_id.trim().is_empty() {
            return Err(SetupError::MissingCredential(ENGINE_ID_ENV.to_string()));
        }
        Ok(Self { api_key, engine_id })
    }

    /// Resolves credentials from explicit values, falling back to the
    /// environment (a `.env` file is honoured).
    pub fn resolve(api_key: Option<String>, engine_id: Option<String>) -> Result<Self, SetupError> {
        dotenvy::dotenv().ok();
        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or_else(|| SetupError::MissingCredential(API_KEY_ENV.to_string()))?;
        let engine_id = engine_id
            .or_else(|| std::env::var(ENGINE_ID_ENV).ok())
            .ok_or_else(|| SetupError::MissingCredential(ENGINE_ID_ENV.to_string()))?;
        Self::new(api_key, engine_id)
    }
}

impl fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.api_key.chars().take(4).collect();
        f.debug_struct("SearchCredentials")
            .field("api_key", &format!("{preview}..."))
            .field("engine_id", &self.engine_id)
            .finish()
    }
}

/// Configuration for resource fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: f64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum characters of page text kept for extraction.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// Minimum delay between consecutive fetches in milliseconds.
    #[serde(default = "default_politeness_delay")]
    pub politeness_delay_ms: u64,
    /// Directory receiving downloaded documents.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// URL suffixes treated as binary documents.
    #[serde(default = "default_document_suffixes")]
    pub document_suffixes: Vec<String>,
}

fn default_fetch_timeout() -> f64 {
    20.0
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; research-collector/0.1)".to_string()
}

fn default_max_text_chars() -> usize {
    100_000
}

fn default_politeness_delay() -> u64 {
    2_000
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_document_suffixes() -> Vec<String> {
    vec![".pdf".to_string(), ".doc".to_string(), ".docx".to_string()]
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            max_text_chars: default_max_text_chars(),
            politeness_delay_ms: default_politeness_delay(),
            download_dir: default_download_dir(),
            document_suffixes: default_document_suffixes(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the politeness delay.
    #[must_use]
    pub fn with_politeness_delay_ms(mut self, delay_ms: u64) -> Self {
        self.politeness_delay_ms = delay_ms;
        self
    }

    /// Sets the download directory.
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Sets the text cap.
    #[must_use]
    pub fn with_max_text_chars(mut self, max: usize) -> Self {
        self.max_text_chars = max;
        self
    }

    /// Gets timeout as Duration. Unusable values fall back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_fetch_timeout()))
    }

    /// Checks the timeout.
    pub fn validate(&self) -> Result<(), SetupError> {
        check_timeout("fetch.timeout_seconds", self.timeout_seconds)
    }

    /// Gets the politeness delay as Duration.
    #[must_use]
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// Configuration for field extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Field rules applied to every fetched text.
    #[serde(default = "default_rules")]
    pub rules: Vec<FieldRule>,
    /// Also run the rules over each hit's title and snippet.
    #[serde(default)]
    pub include_snippets: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            include_snippets: false,
        }
    }
}

impl ExtractionConfig {
    /// Replaces the rules with the contents of a JSON rule file.
    pub fn load_rules(&mut self, path: &Path) -> Result<(), SetupError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SetupError::Config(format!("{}: {e}", path.display())))?;
        self.rules = serde_json::from_str(&text)
            .map_err(|e| SetupError::Config(format!("{}: {e}", path.display())))?;
        Ok(())
    }
}

/// Where results are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Canonical JSON output.
    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,
    /// Optional flat CSV mirror.
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
    /// Optional per-hit provenance log.
    #[serde(default)]
    pub hits_path: Option<PathBuf>,
    /// Snapshot the JSON output after every topic.
    #[serde(default)]
    pub checkpoint: bool,
}

fn default_json_path() -> PathBuf {
    PathBuf::from("research_results.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: default_json_path(),
            csv_path: None,
            hits_path: None,
            checkpoint: false,
        }
    }
}

/// Combined configuration for a collector run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Maximum hits gathered per query.
    #[serde(default = "default_results_per_topic")]
    pub results_per_topic: usize,
    /// Query templates tried in order; `{topic}` is substituted.
    #[serde(default = "default_query_templates")]
    pub query_templates: Vec<String>,
    /// Search configuration.
    #[serde(default)]
    pub search: SearchConfig,
    /// Fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Extraction configuration.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

pub(crate) fn default_results_per_topic() -> usize {
    10
}

/// Default fallback chain of query templates.
#[must_use]
pub fn default_query_templates() -> Vec<String> {
    vec![
        "{topic} trust certification requirements".to_string(),
        "{topic} certification of trust statute".to_string(),
        "{topic} uniform trust code".to_string(),
    ]
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            results_per_topic: default_results_per_topic(),
            query_templates: default_query_templates(),
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            extraction: ExtractionConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, SetupError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SetupError::Config(format!("{}: {e}", path.display())))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| SetupError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would misbehave at run time.
    pub fn validate(&self) -> Result<(), SetupError> {
        self.search.validate()?;
        self.fetch.validate()
    }

    /// Sets the per-topic result limit.
    #[must_use]
    pub fn with_results_per_topic(mut self, limit: usize) -> Self {
        self.results_per_topic = limit;
        self
    }

    /// Replaces the query templates.
    #[must_use]
    pub fn with_query_templates(mut self, templates: Vec<String>) -> Self {
        self.query_templates = templates;
        self
    }
}
