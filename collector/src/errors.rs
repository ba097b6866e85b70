//! Error types for the collector.
//!
//! Errors are split by the boundary that catches them. Only [`SetupError`]
//! is allowed to abort a run; search and fetch errors are caught by the
//! collector, logged, and turned into empty contributions.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for collector operations.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// A fatal setup problem detected before or at the start of a run.
    #[error("{0}")]
    Setup(#[from] SetupError),

    /// A search backend request failed.
    #[error("{0}")]
    Search(#[from] SearchError),

    /// A resource fetch failed.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// The result store already finished flushing and accepts no more writes.
    #[error("Result store is closed")]
    StoreClosed,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollectorError {
    /// Whether this error must abort the run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors that prevent a run from starting.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    /// A required credential was not supplied.
    #[error("Missing credential: {0} (set it in the environment or pass it as a flag)")]
    MissingCredential(String),

    /// A field rule pattern failed to compile.
    #[error("Invalid pattern for field '{field}': {message}")]
    InvalidRule {
        /// Field the rule populates.
        field: String,
        /// Pattern source.
        pattern: String,
        /// Compiler message.
        message: String,
    },

    /// The search backend failed on the very first request of the run.
    #[error("Search backend unreachable on first query '{query}': {message}")]
    BackendUnreachable {
        /// Query that was attempted.
        query: String,
        /// Underlying failure.
        message: String,
    },

    /// The topic list could not be loaded.
    #[error("Cannot load topics from {path}: {message}")]
    TopicSource {
        /// Path of the topic source.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// Configuration is invalid or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors returned by a search backend for a single page.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The request never produced a response.
    #[error("Search transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Search backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The response body was not in the expected shape.
    #[error("Search response decode error: {0}")]
    Decode(String),
}

/// Errors returned while fetching a single hit.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The request timed out.
    #[error("Timed out fetching {url}")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Connection, TLS or redirect failure.
    #[error("Transport error fetching {url}: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying failure.
        message: String,
    },

    /// The body could not be decoded as text.
    #[error("Cannot decode body of {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Underlying failure.
        message: String,
    },

    /// The content type is neither text nor a known document type.
    #[error("Unsupported content type '{content_type}' at {url}")]
    Unsupported {
        /// Requested URL.
        url: String,
        /// Reported content type.
        content_type: String,
    },

    /// Saving a downloaded document failed.
    #[error("Cannot save {url} to {path}: {message}")]
    Io {
        /// Requested URL.
        url: String,
        /// Destination path.
        path: String,
        /// Underlying failure.
        message: String,
    },
}

impl FetchError {
    /// Creates a fetch error from a reqwest error.
    #[must_use]
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_decode() || err.is_body() {
            Self::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Short label for the failure class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::Transport { .. } => "transport",
            Self::Decode { .. } => "decode",
            Self::Unsupported { .. } => "unsupported",
            Self::Io { .. } => "io",
        }
    }

    /// The URL that failed.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::Decode { url, .. }
            | Self::Unsupported { url, .. }
            | Self::Io { url, .. } => url,
        }
    }

    /// Converts to a dictionary for event payloads.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind()));
        map.insert("url".to_string(), serde_json::json!(self.url()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Self::Status { status, .. } = self {
            map.insert("status".to_string(), serde_json::json!(status));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_errors_are_fatal() {
        let err: CollectorError = SetupError::MissingCredential("GOOGLE_API_KEY".to_string()).into();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_search_and_fetch_errors_are_not_fatal() {
        let search: CollectorError = SearchError::Transport("connection reset".to_string()).into();
        assert!(!search.is_fatal());

        let fetch: CollectorError = FetchError::Timeout {
            url: "https://example.com".to_string(),
        }
        .into();
        assert!(!fetch.is_fatal());
        assert!(!CollectorError::StoreClosed.is_fatal());
    }

    #[test]
    fn test_fetch_error_kind_and_url() {
        let err = FetchError::Status {
            url: "https://example.com/a".to_string(),
            status: 404,
        };
        assert_eq!(err.kind(), "status");
        assert_eq!(err.url(), "https://example.com/a");
        assert_eq!(err.to_string(), "HTTP 404 fetching https://example.com/a");
    }

    #[test]
    fn test_fetch_error_to_dict() {
        let err = FetchError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        let dict = err.to_dict();
        assert_eq!(dict.get("kind"), Some(&serde_json::json!("status")));
        assert_eq!(dict.get("status"), Some(&serde_json::json!(503)));

        let timeout = FetchError::Timeout {
            url: "https://example.com".to_string(),
        };
        assert!(!timeout.to_dict().contains_key("status"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: CollectorError = parse.unwrap_err().into();
        assert!(matches!(err, CollectorError::Serialization(_)));
    }

    #[test]
    fn test_invalid_rule_message() {
        let err = SetupError::InvalidRule {
            field: "forms".to_string(),
            pattern: "(".to_string(),
            message: "unclosed group".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid pattern for field 'forms': unclosed group");
    }
}
