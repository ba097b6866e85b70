//! Run counters and timing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Counters reported at the end of every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Topics taken through the pipeline.
    pub topics_processed: usize,
    /// Topics whose winning query returned at least one hit.
    pub topics_with_hits: usize,
    /// Queries sent to the search backend.
    pub queries_issued: usize,
    /// Hits returned across all winning queries.
    pub hits_seen: usize,
    /// Hits whose content was retrieved.
    pub hits_fetched: usize,
    /// Hits whose fetch failed.
    pub fetch_failures: usize,
    /// Binary documents saved to disk.
    pub documents_saved: usize,
    /// Non-empty fields across the result set.
    pub fields_populated: usize,
    /// Wall time in milliseconds.
    pub duration_ms: f64,
}

impl RunSummary {
    /// A zeroed summary with a fresh run id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            topics_processed: 0,
            topics_with_hits: 0,
            queries_issued: 0,
            hits_seen: 0,
            hits_fetched: 0,
            fetch_failures: 0,
            documents_saved: 0,
            fields_populated: 0,
            duration_ms: 0.0,
        }
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} ({:.1}s)", self.run_id, self.duration_ms / 1000.0)?;
        writeln!(
            f,
            "  topics processed: {} ({} with hits)",
            self.topics_processed, self.topics_with_hits
        )?;
        writeln!(f, "  queries issued:   {}", self.queries_issued)?;
        writeln!(
            f,
            "  hits fetched:     {} of {} ({} failed, {} documents)",
            self.hits_fetched, self.hits_seen, self.fetch_failures, self.documents_saved
        )?;
        write!(f, "  fields populated: {}", self.fields_populated)
    }
}

/// Measures the wall time of a named span.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: &'static str,
}

impl SpanTimer {
    /// Starts timing.
    #[must_use]
    pub fn start(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// The span name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Elapsed milliseconds so far.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
