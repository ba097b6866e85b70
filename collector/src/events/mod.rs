//! Progress events for a collection run.
//!
//! The collector reports what it is doing through an [`EventSink`] handed to
//! it at construction. Events are typed; each has a stable dotted name and a
//! JSON payload.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::Serialize;
use serde_json::Value;

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// The run began.
    RunStarted {
        /// Run identifier.
        run_id: String,
        /// Number of topics queued.
        topics: usize,
    },
    /// A topic began processing.
    TopicStarted {
        /// The topic.
        topic: String,
        /// 1-based position in the run.
        index: usize,
        /// Total topics.
        total: usize,
    },
    /// A query finished paging.
    SearchCompleted {
        /// The topic.
        topic: String,
        /// The query string.
        query: String,
        /// Hits returned.
        hits: usize,
    },
    /// A query failed part way through or on its first page.
    SearchFailed {
        /// The topic.
        topic: String,
        /// The query string.
        query: String,
        /// Hits gathered before the failure.
        hits: usize,
        /// Failure message.
        error: String,
    },
    /// A page was fetched and its text extracted.
    FetchCompleted {
        /// The hit URL.
        url: String,
        /// Characters of text extracted.
        chars: usize,
    },
    /// A hit could not be fetched.
    FetchFailed {
        /// The hit URL.
        url: String,
        /// Failure class.
        kind: String,
        /// Failure message.
        error: String,
    },
    /// A binary document was written to disk.
    DocumentSaved {
        /// The hit URL.
        url: String,
        /// Destination path.
        path: String,
        /// Size in bytes.
        bytes: usize,
    },
    /// A topic finished.
    TopicCompleted {
        /// The topic.
        topic: String,
        /// Hits seen for the winning query.
        hits: usize,
        /// Fields with at least one value.
        fields_populated: usize,
    },
    /// The run finished.
    RunCompleted {
        /// Run identifier.
        run_id: String,
        /// Topics processed.
        topics: usize,
        /// Wall time in milliseconds.
        duration_ms: f64,
    },
}

impl RunEvent {
    /// Stable dotted event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run.started",
            Self::TopicStarted { .. } => "topic.started",
            Self::SearchCompleted { .. } => "search.completed",
            Self::SearchFailed { .. } => "search.failed",
            Self::FetchCompleted { .. } => "fetch.completed",
            Self::FetchFailed { .. } => "fetch.failed",
            Self::DocumentSaved { .. } => "document.saved",
            Self::TopicCompleted { .. } => "topic.completed",
            Self::RunCompleted { .. } => "run.completed",
        }
    }

    /// The event payload without the tag.
    #[must_use]
    pub fn payload(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.remove("event");
        }
        value
    }
}
