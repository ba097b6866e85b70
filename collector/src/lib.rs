//! # Collector
//!
//! A structured web research collector.
//!
//! For each topic the collector runs a small, sequential pipeline:
//!
//! - **Query**: expand the topic into a fallback chain of search queries
//! - **Search**: page through a search backend until enough hits are found
//! - **Fetch**: retrieve each hit, stripping HTML to text or saving documents
//! - **Extract**: apply a data-driven table of field rules to the text
//! - **Persist**: merge fields per topic and write JSON, CSV and a hit log
//!
//! Failures below setup never end a run; they are logged, reported as events
//! and counted.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use collector::prelude::*;
//!
//! let config = CollectorConfig::default();
//! let credentials = SearchCredentials::resolve(None, None)?;
//! let backend = GoogleSearchBackend::new(&config.search, credentials)?;
//! let fetcher = HttpFetcher::new(config.fetch.clone())?;
//! let collector = Collector::from_config(&config, backend, fetcher)?;
//!
//! let topics = TopicSource::Preset(Preset::States).load()?;
//! let mut store = ResultStore::new();
//! let summary = collector.run(&topics, &mut store).await?;
//! store.flush(&config.output)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod query;
pub mod search;
pub mod store;
pub mod testing;
pub mod topics;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        CollectorConfig, ExtractionConfig, FetchConfig, OutputConfig, SearchConfig,
        SearchCredentials,
    };
    pub use crate::errors::{CollectorError, FetchError, SearchError, SetupError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, RunEvent};
    pub use crate::extract::{default_rules, FieldExtractor, FieldMap, FieldRule};
    pub use crate::fetch::{FetchedResource, Fetcher, HttpFetcher, ResourceContent};
    pub use crate::pipeline::{Collector, RunSummary};
    pub use crate::query::QueryBuilder;
    pub use crate::search::{GoogleSearchBackend, SearchBackend, SearchClient, SearchHit};
    pub use crate::store::{ExtractedRecord, HitOutcome, HitRecord, ResultStore, StoreState};
    pub use crate::topics::{Preset, Topic, TopicSource};
}

/// Version of the collector crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
