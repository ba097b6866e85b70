use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use collector::config::{CollectorConfig, SearchCredentials, API_KEY_ENV, ENGINE_ID_ENV};
use collector::errors::CollectorError;
use collector::events::LoggingEventSink;
use collector::fetch::HttpFetcher;
use collector::pipeline::{Collector, RunSummary};
use collector::search::GoogleSearchBackend;
use collector::store::ResultStore;
use collector::topics::{Preset, Topic, TopicSource};

/// Research topics through a search API and extract structured fields from the results.
#[derive(Parser, Debug)]
#[command(name = "collector", version, about)]
struct Cli {
    /// Topic to research (repeatable).
    #[arg(long = "topic", value_name = "TOPIC")]
    topics: Vec<String>,

    /// File of topics: one per line, or a JSON array if it ends in .json.
    #[arg(long)]
    topics_file: Option<PathBuf>,

    /// Built-in topic list: "states" or "institutions".
    #[arg(long)]
    preset: Option<String>,

    /// Query template, {topic} is substituted or prepended (repeatable, tried in order).
    #[arg(long = "query-template", value_name = "TEMPLATE")]
    query_templates: Vec<String>,

    /// Hits processed per topic.
    #[arg(long)]
    max_results: Option<usize>,

    /// JSON output path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a CSV mirror.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write a per-hit provenance log.
    #[arg(long)]
    hits_output: Option<PathBuf>,

    /// JSON array of {"field", "pattern"} rules replacing the built-in table.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// JSON configuration file; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Search API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Search engine id.
    #[arg(long, env = ENGINE_ID_ENV)]
    cse_id: Option<String>,

    /// Directory for downloaded documents.
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Minimum delay between fetches in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Write the JSON output after every topic.
    #[arg(long)]
    checkpoint: bool,

    /// Also extract fields from result titles and snippets.
    #[arg(long)]
    include_snippets: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn apply(&self, config: &mut CollectorConfig) -> Result<()> {
        if let Some(limit) = self.max_results {
            config.results_per_topic = limit;
        }
        if !self.query_templates.is_empty() {
            config.query_templates.clone_from(&self.query_templates);
        }
        if let Some(path) = &self.output {
            config.output.json_path.clone_from(path);
        }
        if self.csv.is_some() {
            config.output.csv_path.clone_from(&self.csv);
        }
        if self.hits_output.is_some() {
            config.output.hits_path.clone_from(&self.hits_output);
        }
        if let Some(path) = &self.rules {
            config.extraction.load_rules(path)?;
        }
        if let Some(dir) = &self.download_dir {
            config.fetch.download_dir.clone_from(dir);
        }
        if let Some(delay) = self.delay_ms {
            config.fetch.politeness_delay_ms = delay;
        }
        config.output.checkpoint |= self.checkpoint;
        config.extraction.include_snippets |= self.include_snippets;
        Ok(())
    }

    fn topic_sources(&self) -> Result<Vec<TopicSource>> {
        let mut sources = Vec::new();
        if !self.topics.is_empty() {
            sources.push(TopicSource::Inline(self.topics.clone()));
        }
        if let Some(path) = &self.topics_file {
            sources.push(TopicSource::File(path.clone()));
        }
        if let Some(name) = &self.preset {
            let Some(preset) = Preset::from_name(name) else {
                bail!("unknown preset '{name}' (expected 'states' or 'institutions')");
            };
            sources.push(TopicSource::Preset(preset));
        }
        if sources.is_empty() {
            info!("No topics given; using the states preset");
            sources.push(TopicSource::Preset(Preset::States));
        }
        Ok(sources)
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "collector=debug" } else { "collector=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_topics(sources: &[TopicSource]) -> Result<Vec<Topic>> {
    let mut topics: Vec<Topic> = Vec::new();
    for source in sources {
        for topic in source.load()? {
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
    }
    Ok(topics)
}

enum RunEnd {
    Finished(Result<RunSummary, CollectorError>),
    Interrupted,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = match &cli.config {
        Some(path) => CollectorConfig::from_file(path)?,
        None => CollectorConfig::default(),
    };
    cli.apply(&mut config)?;
    config.validate()?;

    let topics = load_topics(&cli.topic_sources()?)?;
    let credentials = SearchCredentials::resolve(cli.api_key.clone(), cli.cse_id.clone())?;
    let backend = GoogleSearchBackend::new(&config.search, credentials)?;
    let fetcher = HttpFetcher::new(config.fetch.clone())?;
    let pipeline = Collector::from_config(&config, backend, fetcher)?
        .with_events(Arc::new(LoggingEventSink::default()));

    info!(
        version = collector::VERSION,
        topics = topics.len(),
        output = %config.output.json_path.display(),
        "Collector starting"
    );

    let mut store = ResultStore::new();
    let end = tokio::select! {
        result = pipeline.run(&topics, &mut store) => RunEnd::Finished(result),
        _ = tokio::signal::ctrl_c() => RunEnd::Interrupted,
    };

    match end {
        RunEnd::Finished(Ok(summary)) => {
            store.flush(&config.output).context("writing results")?;
            println!("{summary}");
        }
        RunEnd::Finished(Err(err)) if err.is_fatal() => {
            return Err(err.into());
        }
        RunEnd::Finished(Err(err)) => {
            warn!(error = %err, topics = store.len(), "Run stopped early; writing partial results");
            store.flush(&config.output).context("writing partial results")?;
            return Err(err.into());
        }
        RunEnd::Interrupted => {
            warn!(topics = store.len(), "Interrupted; writing partial results");
            store.flush(&config.output).context("writing partial results")?;
        }
    }

    Ok(())
}
