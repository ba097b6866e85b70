//! The collection run: topics to queries to hits to fields.
//!
//! [`Collector`] drives one sequential pass over a topic list:
//!
//! 1. Expand the topic into its query fallback chain
//! 2. Search each query in turn until one returns hits
//! 3. Fetch every hit and extract fields from page text
//! 4. Merge the fields into the [`ResultStore`]
//!
//! Only a setup error ends a run early. Search and fetch failures are
//! logged, reported as events and counted in the [`RunSummary`].

mod summary;

pub use summary::{RunSummary, SpanTimer};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{default_results_per_topic, CollectorConfig, OutputConfig};
use crate::errors::{CollectorError, SetupError};
use crate::events::{EventSink, NoOpEventSink, RunEvent};
use crate::extract::FieldExtractor;
use crate::fetch::{Fetcher, ResourceContent};
use crate::query::QueryBuilder;
use crate::search::{SearchBackend, SearchClient, SearchHit};
use crate::store::{HitOutcome, HitRecord, ResultStore};
use crate::topics::Topic;

/// Orchestrates a run over a search backend and a fetcher.
pub struct Collector<B, F> {
    search: SearchClient<B>,
    queries: QueryBuilder,
    fetcher: F,
    extractor: FieldExtractor,
    events: Arc<dyn EventSink>,
    results_per_topic: usize,
    include_snippets: bool,
    checkpoint: Option<OutputConfig>,
}

/// Per-run bookkeeping that is not part of the summary.
#[derive(Debug, Default)]
struct RunState {
    backend_verified: bool,
}

/// The query that produced hits for a topic.
struct TopicHits {
    query: String,
    hits: Vec<SearchHit>,
}

impl<B: SearchBackend, F: Fetcher> Collector<B, F> {
    /// Creates a collector with default queries and no event sink.
    #[must_use]
    pub fn new(search: SearchClient<B>, fetcher: F, extractor: FieldExtractor) -> Self {
        Self {
            search,
            queries: QueryBuilder::default(),
            fetcher,
            extractor,
            events: Arc::new(NoOpEventSink),
            results_per_topic: default_results_per_topic(),
            include_snippets: false,
            checkpoint: None,
        }
    }

    /// Builds a collector from configuration. Compiles the rule table.
    pub fn from_config(config: &CollectorConfig, backend: B, fetcher: F) -> Result<Self, SetupError> {
        let extractor = FieldExtractor::new(&config.extraction.rules)?;
        let collector = Self::new(SearchClient::new(backend, config.search.page_size), fetcher, extractor)
            .with_queries(QueryBuilder::new(config.query_templates.clone()))
            .with_results_per_topic(config.results_per_topic)
            .with_snippets(config.extraction.include_snippets)
            .with_checkpoint(config.output.checkpoint.then(|| config.output.clone()));
        Ok(collector)
    }

    /// Sets the query builder.
    #[must_use]
    pub fn with_queries(mut self, queries: QueryBuilder) -> Self {
        self.queries = queries;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets how many hits are processed per topic.
    #[must_use]
    pub fn with_results_per_topic(mut self, limit: usize) -> Self {
        self.results_per_topic = limit;
        self
    }

    /// Also extracts fields from hit titles and snippets.
    #[must_use]
    pub fn with_snippets(mut self, include: bool) -> Self {
        self.include_snippets = include;
        self
    }

    /// Snapshots the JSON output after every topic.
    #[must_use]
    pub fn with_checkpoint(mut self, output: Option<OutputConfig>) -> Self {
        self.checkpoint = output;
        self
    }

    /// The compiled extractor.
    #[must_use]
    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Processes every topic in order, accumulating into `store`.
    ///
    /// Returns a setup error if the search backend fails on the very first
    /// request of the run. The store is left untouched in that case.
    pub async fn run(&self, topics: &[Topic], store: &mut ResultStore) -> Result<RunSummary, CollectorError> {
        let timer = SpanTimer::start("collector.run");
        let mut summary = RunSummary::new();
        let mut state = RunState::default();
        let run_id = summary.run_id.to_string();

        info!(run_id = %run_id, topics = topics.len(), "Run started");
        self.events
            .emit(&RunEvent::RunStarted {
                run_id: run_id.clone(),
                topics: topics.len(),
            })
            .await;

        for (i, topic) in topics.iter().enumerate() {
            self.events
                .emit(&RunEvent::TopicStarted {
                    topic: topic.to_string(),
                    index: i + 1,
                    total: topics.len(),
                })
                .await;
            info!(topic = %topic, index = i + 1, total = topics.len(), "Processing topic");

            self.process_topic(topic, store, &mut summary, &mut state).await?;

            if let Some(output) = &self.checkpoint {
                if let Err(err) = store.checkpoint(output) {
                    warn!(topic = %topic, error = %err, "Checkpoint failed");
                }
            }
        }

        summary.fields_populated = store.fields_populated();
        summary.duration_ms = timer.elapsed_ms();

        self.events
            .emit(&RunEvent::RunCompleted {
                run_id,
                topics: summary.topics_processed,
                duration_ms: summary.duration_ms,
            })
            .await;
        info!(
            run_id = %summary.run_id,
            topics = summary.topics_processed,
            hits_fetched = summary.hits_fetched,
            fetch_failures = summary.fetch_failures,
            fields_populated = summary.fields_populated,
            duration_ms = summary.duration_ms,
            "Run completed"
        );
        Ok(summary)
    }

    async fn process_topic(
        &self,
        topic: &Topic,
        store: &mut ResultStore,
        summary: &mut RunSummary,
        state: &mut RunState,
    ) -> Result<(), CollectorError> {
        let found = self.search_topic(topic, summary, state).await?;
        store.ensure(topic, self.extractor.fields())?;
        summary.topics_processed += 1;

        let hit_count = found.as_ref().map_or(0, |f| f.hits.len());
        if let Some(TopicHits { query, hits }) = found {
            summary.topics_with_hits += 1;
            summary.hits_seen += hits.len();
            for hit in hits {
                self.process_hit(topic, &query, hit, store, summary).await?;
            }
        } else {
            info!(topic = %topic, "No query returned hits");
        }

        let fields_populated = store.get(topic).map_or(0, |r| r.fields_populated());
        self.events
            .emit(&RunEvent::TopicCompleted {
                topic: topic.to_string(),
                hits: hit_count,
                fields_populated,
            })
            .await;
        Ok(())
    }

    /// Walks the query chain, stopping at the first query with hits.
    async fn search_topic(
        &self,
        topic: &Topic,
        summary: &mut RunSummary,
        state: &mut RunState,
    ) -> Result<Option<TopicHits>, CollectorError> {
        for query in self.queries.build_queries(topic) {
            let outcome = self.search.search(&query, self.results_per_topic).await;
            summary.queries_issued += 1;

            if !state.backend_verified {
                if let (true, Some(err)) = (outcome.failed_immediately(), &outcome.error) {
                    return Err(SetupError::BackendUnreachable {
                        query,
                        message: err.to_string(),
                    }
                    .into());
                }
                state.backend_verified = outcome.pages > 0;
            }

            match &outcome.error {
                Some(err) => {
                    warn!(topic = %topic, query = %query, hits = outcome.hits.len(), error = %err, "Search failed");
                    self.events
                        .emit(&RunEvent::SearchFailed {
                            topic: topic.to_string(),
                            query: query.clone(),
                            hits: outcome.hits.len(),
                            error: err.to_string(),
                        })
                        .await;
                }
                None => {
                    info!(topic = %topic, query = %query, hits = outcome.hits.len(), "Search completed");
                    self.events
                        .emit(&RunEvent::SearchCompleted {
                            topic: topic.to_string(),
                            query: query.clone(),
                            hits: outcome.hits.len(),
                        })
                        .await;
                }
            }

            if !outcome.hits.is_empty() {
                return Ok(Some(TopicHits {
                    query,
                    hits: outcome.hits,
                }));
            }
        }
        Ok(None)
    }

    async fn process_hit(
        &self,
        topic: &Topic,
        query: &str,
        hit: SearchHit,
        store: &mut ResultStore,
        summary: &mut RunSummary,
    ) -> Result<(), CollectorError> {
        let outcome = match self.fetcher.fetch(&hit.url).await {
            Ok(resource) => match resource.content {
                ResourceContent::Text(text) => {
                    summary.hits_fetched += 1;
                    let chars = text.chars().count();
                    store.add(topic, self.extractor.extract(&text))?;
                    self.events
                        .emit(&RunEvent::FetchCompleted {
                            url: hit.url.clone(),
                            chars,
                        })
                        .await;
                    HitOutcome::Text { chars }
                }
                ResourceContent::Document { path, bytes } => {
                    summary.hits_fetched += 1;
                    summary.documents_saved += 1;
                    info!(url = %hit.url, path = %path.display(), bytes, "Document saved");
                    self.events
                        .emit(&RunEvent::DocumentSaved {
                            url: hit.url.clone(),
                            path: path.display().to_string(),
                            bytes,
                        })
                        .await;
                    HitOutcome::Document { path }
                }
            },
            Err(err) => {
                summary.fetch_failures += 1;
                warn!(topic = %topic, url = %hit.url, kind = err.kind(), error = %err, "Fetch failed");
                self.events
                    .emit(&RunEvent::FetchFailed {
                        url: hit.url.clone(),
                        kind: err.kind().to_string(),
                        error: err.to_string(),
                    })
                    .await;
                HitOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        if self.include_snippets {
            let text = format!("{} {}", hit.title, hit.snippet);
            store.add(topic, self.extractor.extract(&text))?;
        }

        store.record_hit(HitRecord {
            topic: topic.clone(),
            query: query.to_string(),
            title: hit.title,
            url: hit.url,
            snippet: hit.snippet,
            outcome,
        })
    }
}
