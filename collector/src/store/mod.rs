//! Per-topic result accumulation and persistence.
//!
//! A [`ResultStore`] moves through `Init -> Collecting -> Flushing -> Done`.
//! Whatever has been accumulated can be flushed at any point before `Done`,
//! so an interrupted run still produces valid output.

pub mod csv;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::OutputConfig;
use crate::errors::CollectorError;
use crate::extract::FieldMap;
use crate::topics::Topic;

/// Lifecycle of a store within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Nothing added yet.
    Init,
    /// Accepting records.
    Collecting,
    /// Writing output.
    Flushing,
    /// Output written; no further writes.
    Done,
}

/// The accumulated output for one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    /// The topic.
    pub topic: Topic,
    /// Field name to values, merged across every hit.
    pub fields: FieldMap,
}

impl ExtractedRecord {
    /// An empty record.
    #[must_use]
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            fields: FieldMap::new(),
        }
    }

    /// Unions `fields` into this record. Existing values keep their
    /// position; new values are appended in the order given.
    pub fn merge(&mut self, fields: FieldMap) {
        for (field, values) in fields {
            let slot = self.fields.entry(field).or_default();
            for value in values {
                if !slot.contains(&value) {
                    slot.push(value);
                }
            }
        }
    }

    /// Number of fields with at least one value.
    #[must_use]
    pub fn fields_populated(&self) -> usize {
        self.fields.values().filter(|v| !v.is_empty()).count()
    }
}

/// How a hit was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitOutcome {
    /// Page text was extracted.
    Text {
        /// Characters of text.
        chars: usize,
    },
    /// A document was saved.
    Document {
        /// Where it was saved.
        path: PathBuf,
    },
    /// The fetch failed.
    Failed {
        /// Failure message.
        error: String,
    },
}

/// Provenance for one processed hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    /// The topic.
    pub topic: Topic,
    /// The query that produced the hit.
    pub query: String,
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Result snippet.
    pub snippet: String,
    /// What happened when it was fetched.
    pub outcome: HitOutcome,
}

/// Ordered mapping from topic to record.
#[derive(Debug)]
pub struct ResultStore {
    records: Vec<ExtractedRecord>,
    index: HashMap<Topic, usize>,
    hits: Vec<HitRecord>,
    state: StoreState,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore {
    /// An empty store in `Init`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            hits: Vec::new(),
            state: StoreState::Init,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StoreState {
        self.state
    }

    fn writable(&mut self) -> Result<(), CollectorError> {
        match self.state {
            StoreState::Init => {
                self.state = StoreState::Collecting;
                Ok(())
            }
            StoreState::Collecting => Ok(()),
            StoreState::Flushing | StoreState::Done => Err(CollectorError::StoreClosed),
        }
    }

    fn record_mut(&mut self, topic: &Topic) -> &mut ExtractedRecord {
        let idx = match self.index.get(topic) {
            Some(&idx) => idx,
            None => {
                self.records.push(ExtractedRecord::new(topic.clone()));
                let idx = self.records.len() - 1;
                self.index.insert(topic.clone(), idx);
                idx
            }
        };
        &mut self.records[idx]
    }

    /// Creates the record for `topic` if missing, with every field in
    /// `fields` present.
    pub fn ensure(&mut self, topic: &Topic, fields: &[String]) -> Result<(), CollectorError> {
        self.writable()?;
        let record = self.record_mut(topic);
        for field in fields {
            record.fields.entry(field.clone()).or_default();
        }
        Ok(())
    }

    /// Merges `fields` into the record for `topic`.
    pub fn add(&mut self, topic: &Topic, fields: FieldMap) -> Result<(), CollectorError> {
        self.writable()?;
        self.record_mut(topic).merge(fields);
        Ok(())
    }

    /// Appends a hit provenance entry.
    pub fn record_hit(&mut self, hit: HitRecord) -> Result<(), CollectorError> {
        self.writable()?;
        self.hits.push(hit);
        Ok(())
    }

    /// The record for `topic`.
    #[must_use]
    pub fn get(&self, topic: &Topic) -> Option<&ExtractedRecord> {
        self.index.get(topic).map(|&idx| &self.records[idx])
    }

    /// Records in first-seen order.
    #[must_use]
    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    /// Hit log entries in processing order.
    #[must_use]
    pub fn hits(&self) -> &[HitRecord] {
        &self.hits
    }

    /// Number of topics held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no topic is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total non-empty fields across all records.
    #[must_use]
    pub fn fields_populated(&self) -> usize {
        self.records.iter().map(ExtractedRecord::fields_populated).sum()
    }

    /// The canonical `{topic: {field: [values]}}` form.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        for record in &self.records {
            let fields: serde_json::Map<String, Value> = record
                .fields
                .iter()
                .map(|(field, values)| (field.clone(), Value::from(values.clone())))
                .collect();
            map.insert(record.topic.to_string(), Value::Object(fields));
        }
        Value::Object(map)
    }

    /// Writes the JSON output without changing state.
    pub fn checkpoint(&self, output: &OutputConfig) -> Result<(), CollectorError> {
        let body = serde_json::to_vec_pretty(&self.to_json_value())?;
        write_atomic(&output.json_path, &body)?;
        debug!(path = %output.json_path.display(), topics = self.len(), "Checkpoint written");
        Ok(())
    }

    /// Writes every configured output and closes the store.
    ///
    /// Callable from any state but `Done`; a failed flush leaves the store in
    /// `Flushing` so it can be retried.
    pub fn flush(&mut self, output: &OutputConfig) -> Result<(), CollectorError> {
        if self.state == StoreState::Done {
            return Err(CollectorError::StoreClosed);
        }
        self.state = StoreState::Flushing;

        self.checkpoint(output)?;

        if let Some(csv_path) = &output.csv_path {
            let mut body = Vec::new();
            csv::write_records(&mut body, &self.records)?;
            write_atomic(csv_path, &body)?;
        }

        if let Some(hits_path) = &output.hits_path {
            let body = serde_json::to_vec_pretty(&self.hits)?;
            write_atomic(hits_path, &body)?;
        }

        self.state = StoreState::Done;
        info!(
            path = %output.json_path.display(),
            topics = self.len(),
            hits = self.hits.len(),
            "Results written"
        );
        Ok(())
    }

    /// Reads a previously flushed JSON file into a collecting store.
    pub fn load(path: &Path) -> Result<Self, CollectorError> {
        let text = std::fs::read_to_string(path)?;
        let map: serde_json::Map<String, Value> = serde_json::from_str(&text)?;

        let mut store = Self::new();
        for (topic, fields) in map {
            let fields: FieldMap = serde_json::from_value(fields)?;
            store.add(&Topic::new(topic), fields)?;
        }
        Ok(store)
    }
}

/// Writes `body` next to `path` and renames it into place.
fn write_atomic(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(body)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &[&str])]) -> FieldMap {
        pairs
            .iter()
            .map(|(f, vs)| ((*f).to_string(), vs.iter().map(|v| (*v).to_string()).collect()))
            .collect()
    }

    fn output(dir: &Path) -> OutputConfig {
        OutputConfig {
            json_path: dir.join("out.json"),
            csv_path: Some(dir.join("out.csv")),
            hits_path: Some(dir.join("hits.json")),
            checkpoint: false,
        }
    }

    #[test]
    fn test_add_merges_union() {
        let mut store = ResultStore::new();
        let topic = Topic::new("Arizona");
        store.add(&topic, fields(&[("requirements", &["a", "b"])])).unwrap();
        store.add(&topic, fields(&[("requirements", &["b", "c"]), ("forms", &["x"])])).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&topic).unwrap().fields,
            fields(&[("requirements", &["a", "b", "c"]), ("forms", &["x"])])
        );
        assert_eq!(store.state(), StoreState::Collecting);
    }

    #[test]
    fn test_merge_order_independent_as_sets() {
        let parts = [
            fields(&[("requirements", &["a", "b"])]),
            fields(&[("requirements", &["c"]), ("forms", &["x"])]),
            fields(&[("requirements", &["b", "d"])]),
        ];

        let mut forward = ExtractedRecord::new(Topic::new("T"));
        for p in parts.iter().cloned() {
            forward.merge(p);
        }
        let mut backward = ExtractedRecord::new(Topic::new("T"));
        for p in parts.iter().rev().cloned() {
            backward.merge(p);
        }

        for (field, values) in &forward.fields {
            let mut a = values.clone();
            let mut b = backward.fields[field].clone();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
        assert_eq!(forward.fields.len(), backward.fields.len());
    }

    #[test]
    fn test_ensure_keeps_existing_values() {
        let mut store = ResultStore::new();
        let topic = Topic::new("Ohio");
        store.add(&topic, fields(&[("forms", &["x"])])).unwrap();
        store
            .ensure(&topic, &["forms".to_string(), "requirements".to_string()])
            .unwrap();

        let record = store.get(&topic).unwrap();
        assert_eq!(record.fields["forms"], vec!["x".to_string()]);
        assert!(record.fields["requirements"].is_empty());
        assert_eq!(record.fields_populated(), 1);
    }

    #[test]
    fn test_empty_store_flushes_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let out = output(dir.path());
        let mut store = ResultStore::new();
        store.flush(&out).unwrap();

        let text = std::fs::read_to_string(&out.json_path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({}));
        assert_eq!(std::fs::read_to_string(dir.path().join("hits.json")).unwrap().trim(), "[]");
        assert_eq!(store.state(), StoreState::Done);
    }

    #[test]
    fn test_flush_closes_store() {
        let dir = tempfile::tempdir().unwrap();
        let out = output(dir.path());
        let mut store = ResultStore::new();
        store.add(&Topic::new("Iowa"), FieldMap::new()).unwrap();
        store.flush(&out).unwrap();

        assert!(matches!(
            store.add(&Topic::new("Iowa"), FieldMap::new()),
            Err(CollectorError::StoreClosed)
        ));
        assert!(matches!(store.flush(&out), Err(CollectorError::StoreClosed)));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let out = output(dir.path());
        let mut store = ResultStore::new();
        store
            .add(&Topic::new("Wyoming"), fields(&[("requirements", &["must include", "required fields"])]))
            .unwrap();
        store.add(&Topic::new("Alabama"), fields(&[("forms", &[])])).unwrap();
        let before = store.to_json_value();
        store.flush(&out).unwrap();

        let loaded = ResultStore::load(&out.json_path).unwrap();
        assert_eq!(loaded.to_json_value(), before);
        let topics: Vec<_> = loaded.records().iter().map(|r| r.topic.as_str()).collect();
        assert_eq!(topics, vec!["Wyoming", "Alabama"]);
    }

    #[test]
    fn test_checkpoint_does_not_close() {
        let dir = tempfile::tempdir().unwrap();
        let out = output(dir.path());
        let mut store = ResultStore::new();
        store.add(&Topic::new("Utah"), fields(&[("forms", &["x"])])).unwrap();
        store.checkpoint(&out).unwrap();

        assert_eq!(store.state(), StoreState::Collecting);
        assert!(out.json_path.exists());
        assert!(!dir.path().join("out.csv").exists());
        store.add(&Topic::new("Utah"), fields(&[("forms", &["y"])])).unwrap();
    }

    #[test]
    fn test_flush_writes_csv_and_hits() {
        let dir = tempfile::tempdir().unwrap();
        let out = output(dir.path());
        let mut store = ResultStore::new();
        let topic = Topic::new("Texas");
        store.add(&topic, fields(&[("forms", &["a", "b"])])).unwrap();
        store
            .record_hit(HitRecord {
                topic: topic.clone(),
                query: "Texas trust".to_string(),
                title: "Guide".to_string(),
                url: "https://a.com".to_string(),
                snippet: String::new(),
                outcome: HitOutcome::Text { chars: 42 },
            })
            .unwrap();
        store.flush(&out).unwrap();

        let csv = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(csv, "topic,forms\nTexas,a; b\n");

        let hits: Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join("hits.json")).unwrap()).unwrap();
        assert_eq!(hits[0]["outcome"], serde_json::json!({"kind": "text", "chars": 42}));
        assert_eq!(hits[0]["topic"], serde_json::json!("Texas"));
    }

    #[test]
    fn test_load_rejects_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(ResultStore::load(&path), Err(CollectorError::Serialization(_))));
    }
}
